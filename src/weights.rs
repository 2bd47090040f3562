//! Edge weights of a decoded instance, wherever they come from.
//!
//! An [`EdgeWeightResolver`] is built once per instance and picks the source of its
//! weights from `EDGE_WEIGHT_TYPE`: the explicit matrix of the file, a closed-form
//! [`Metric`] over the node coordinates, or a caller-supplied function for `SPECIAL`.

use thiserror::Error;

use crate::distance::Metric;
use crate::format::EdgeWeightType;
use crate::instance::{EdgeWeights, Instance, NodeCoords};
use crate::triangular::compact_len;

#[derive(Debug, Error, PartialEq)]
pub enum WeightError {
    #[error("edge weight type {0} has no distance function")]
    Unsupported(EdgeWeightType),

    #[error("edge weight type SPECIAL requires a distance function supplied by the caller")]
    MissingSpecialFunction,

    #[error("a distance function was supplied, but the edge weight type is {0}")]
    UnexpectedSpecialFunction(EdgeWeightType),

    #[error("instance has neither EDGE_WEIGHT_TYPE nor EDGE_WEIGHT_SECTION")]
    MissingWeightType,

    #[error("edge weight type EXPLICIT, but the instance has no EDGE_WEIGHT_SECTION")]
    MissingEdgeWeights,

    #[error("edge weight type {weight_type} requires NODE_COORD_SECTION")]
    MissingNodeCoords { weight_type: EdgeWeightType },

    #[error("edge weight type {weight_type} requires {expected}D coordinates, found {found}D")]
    CoordDimensionMismatch {
        weight_type: EdgeWeightType,
        expected: usize,
        found: usize,
    },
}

/// Distance function of `SPECIAL` instances, called with the coordinates of two nodes.
pub type SpecialFunction<'a> = Box<dyn Fn(&[f64], &[f64]) -> i64 + Send + Sync + 'a>;

enum WeightSource<'a> {
    Explicit(&'a EdgeWeights),
    Metric {
        metric: Metric,
        coords: &'a NodeCoords,
    },
    Special {
        coords: &'a NodeCoords,
        function: SpecialFunction<'a>,
    },
}

pub struct EdgeWeightResolver<'a> {
    dimension: usize,
    weight_type: EdgeWeightType,
    source: WeightSource<'a>,
}

impl<'a> EdgeWeightResolver<'a> {
    /// Resolver for every weight type except `SPECIAL`.
    pub fn new(instance: &'a Instance) -> Result<Self, WeightError> {
        Self::build(instance, None)
    }

    /// Resolver for a `SPECIAL` instance; `function` maps two coordinate tuples to a weight.
    pub fn with_special_function(
        instance: &'a Instance,
        function: impl Fn(&[f64], &[f64]) -> i64 + Send + Sync + 'a,
    ) -> Result<Self, WeightError> {
        Self::build(instance, Some(Box::new(function)))
    }

    fn build(
        instance: &'a Instance,
        special: Option<SpecialFunction<'a>>,
    ) -> Result<Self, WeightError> {
        let weight_type = match instance.edge_weight_type() {
            Some(weight_type) => weight_type,
            None if instance.edge_weights().is_some() => EdgeWeightType::Explicit,
            None => return Err(WeightError::MissingWeightType),
        };

        if special.is_some() && weight_type != EdgeWeightType::Special {
            return Err(WeightError::UnexpectedSpecialFunction(weight_type));
        }

        let coords = || {
            instance
                .node_coords()
                .ok_or(WeightError::MissingNodeCoords { weight_type })
        };

        let source = match weight_type {
            EdgeWeightType::Explicit => WeightSource::Explicit(
                instance
                    .edge_weights()
                    .ok_or(WeightError::MissingEdgeWeights)?,
            ),

            EdgeWeightType::Special => {
                let function = special.ok_or(WeightError::MissingSpecialFunction)?;
                WeightSource::Special {
                    coords: coords()?,
                    function,
                }
            }

            _ => {
                let metric = Metric::from_weight_type(weight_type)
                    .ok_or(WeightError::Unsupported(weight_type))?;
                let coords = coords()?;

                if coords.point_dimensions() < metric.point_dimensions() {
                    return Err(WeightError::CoordDimensionMismatch {
                        weight_type,
                        expected: metric.point_dimensions(),
                        found: coords.point_dimensions(),
                    });
                }

                WeightSource::Metric { metric, coords }
            }
        };

        Ok(Self {
            dimension: instance.dimension(),
            weight_type,
            source,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The weight type in effect; `EXPLICIT` if the file only has an `EDGE_WEIGHT_SECTION`.
    pub fn weight_type(&self) -> EdgeWeightType {
        self.weight_type
    }

    /// Weight of the edge from `i` to `j`.
    ///
    /// # Panics
    /// If `i` or `j` is not a node of the instance.
    pub fn weight(&self, i: usize, j: usize) -> i64 {
        match &self.source {
            WeightSource::Explicit(weights) => weights.get(i, j),
            WeightSource::Metric { metric, coords } => {
                metric.distance(coords.point(i), coords.point(j))
            }
            WeightSource::Special { coords, function } => {
                function(coords.point(i), coords.point(j))
            }
        }
    }

    /// Length of the closed tour, including the edge from the last node back to the first.
    pub fn tour_value(&self, tour: &[usize]) -> i64 {
        if tour.len() < 2 {
            return 0;
        }

        tour.iter()
            .zip(tour.iter().skip(1).chain(tour.first()))
            .map(|(&u, &v)| self.weight(u, v))
            .sum()
    }

    /// Evaluates all weights. Symmetric sources yield the compact array, an asymmetric
    /// explicit matrix is copied as is.
    pub fn materialize_matrix(&self) -> EdgeWeights {
        if let WeightSource::Explicit(weights) = &self.source {
            if !weights.is_symmetric() {
                return EdgeWeights::clone(weights);
            }
        }

        let n = self.dimension;
        let mut weights = Vec::with_capacity(compact_len(n));
        for i in 0..n {
            for j in i + 1..n {
                weights.push(self.weight(i, j));
            }
        }

        EdgeWeights::Compact {
            dimension: n,
            weights,
        }
    }
}
