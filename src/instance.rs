use std::collections::BTreeSet;

use crate::format::*;
use crate::triangular::{compact_len, to_index};

/// Keys of the specification part. Unset keys are `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Specification {
    pub name: Option<String>,
    pub problem_type: Option<ProblemType>,
    pub comment: String,
    pub dimension: Option<usize>,
    pub capacity: Option<i64>,
    pub edge_weight_type: Option<EdgeWeightType>,
    pub edge_weight_format: Option<EdgeWeightFormat>,
    pub edge_data_format: Option<EdgeDataFormat>,
    pub node_coord_type: Option<NodeCoordType>,
    pub display_data_type: Option<DisplayDataType>,
}

/// Node coordinates, indexed by 0-based node.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeCoords {
    TwoD(Vec<[f64; 2]>),
    ThreeD(Vec<[f64; 3]>),
}

impl NodeCoords {
    pub fn len(&self) -> usize {
        match self {
            NodeCoords::TwoD(points) => points.len(),
            NodeCoords::ThreeD(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of components per point (2 or 3).
    pub fn point_dimensions(&self) -> usize {
        match self {
            NodeCoords::TwoD(_) => 2,
            NodeCoords::ThreeD(_) => 3,
        }
    }

    pub fn point(&self, node: usize) -> &[f64] {
        match self {
            NodeCoords::TwoD(points) => &points[node],
            NodeCoords::ThreeD(points) => &points[node],
        }
    }
}

/// Content of `EDGE_DATA_SECTION`, shaped by `EDGE_DATA_FORMAT`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EdgeData {
    EdgeList(Vec<(usize, usize)>),
    /// Each entry is a node followed by its neighbours.
    AdjList(Vec<(usize, Vec<usize>)>),
}

impl EdgeData {
    /// All edges as node pairs, in file order.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        match self {
            EdgeData::EdgeList(edges) => edges.clone(),
            EdgeData::AdjList(lists) => lists
                .iter()
                .flat_map(|(node, neighbours)| neighbours.iter().map(move |&n| (*node, n)))
                .collect(),
        }
    }
}

/// Explicit edge weights in canonical storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EdgeWeights {
    /// Row-major strict upper triangle of a symmetric matrix with zero diagonal.
    Compact { dimension: usize, weights: Vec<i64> },
    /// Row-major `dimension x dimension` matrix of an asymmetric problem.
    Full { dimension: usize, weights: Vec<i64> },
}

impl EdgeWeights {
    pub fn dimension(&self) -> usize {
        match self {
            EdgeWeights::Compact { dimension, .. } | EdgeWeights::Full { dimension, .. } => {
                *dimension
            }
        }
    }

    pub fn is_symmetric(&self) -> bool {
        matches!(self, EdgeWeights::Compact { .. })
    }

    /// Weight of the edge from `i` to `j`.
    ///
    /// # Panics
    /// If `i` or `j` is not below the dimension.
    pub fn get(&self, i: usize, j: usize) -> i64 {
        match self {
            EdgeWeights::Compact { dimension, weights } => {
                assert!(i < *dimension && j < *dimension);
                match i.cmp(&j) {
                    std::cmp::Ordering::Equal => 0,
                    std::cmp::Ordering::Less => weights[to_index(i, j, *dimension)],
                    std::cmp::Ordering::Greater => weights[to_index(j, i, *dimension)],
                }
            }
            EdgeWeights::Full { dimension, weights } => {
                assert!(i < *dimension && j < *dimension);
                weights[i * dimension + j]
            }
        }
    }

    /// The raw storage; its layout depends on the variant.
    pub fn as_slice(&self) -> &[i64] {
        match self {
            EdgeWeights::Compact { weights, .. } | EdgeWeights::Full { weights, .. } => weights,
        }
    }

    pub(crate) fn expected_len(&self) -> usize {
        match self {
            EdgeWeights::Compact { dimension, .. } => compact_len(*dimension),
            EdgeWeights::Full { dimension, .. } => dimension * dimension,
        }
    }
}

/// A decoded TSPLIB file. Built once by the reader and never mutated afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Instance {
    pub(crate) spec: Specification,
    pub(crate) node_coords: Option<NodeCoords>,
    pub(crate) display_coords: Option<Vec<[f64; 2]>>,
    pub(crate) depots: BTreeSet<usize>,
    pub(crate) demands: Option<Vec<i64>>,
    pub(crate) edges: Option<EdgeData>,
    pub(crate) fixed_edges: Vec<(usize, usize)>,
    pub(crate) edge_weights: Option<EdgeWeights>,
    pub(crate) tours: Vec<Vec<usize>>,
}

impl Instance {
    pub fn specification(&self) -> &Specification {
        &self.spec
    }

    pub fn name(&self) -> Option<&str> {
        self.spec.name.as_deref()
    }

    pub fn problem_type(&self) -> Option<ProblemType> {
        self.spec.problem_type
    }

    pub fn comment(&self) -> &str {
        &self.spec.comment
    }

    /// Number of nodes; `0` if the file never declared or implied one.
    pub fn dimension(&self) -> usize {
        self.spec.dimension.unwrap_or(0)
    }

    pub fn capacity(&self) -> Option<i64> {
        self.spec.capacity
    }

    pub fn edge_weight_type(&self) -> Option<EdgeWeightType> {
        self.spec.edge_weight_type
    }

    pub fn edge_weight_format(&self) -> Option<EdgeWeightFormat> {
        self.spec.edge_weight_format
    }

    pub fn node_coords(&self) -> Option<&NodeCoords> {
        self.node_coords.as_ref()
    }

    pub fn display_coords(&self) -> Option<&[[f64; 2]]> {
        self.display_coords.as_deref()
    }

    pub fn depots(&self) -> &BTreeSet<usize> {
        &self.depots
    }

    /// Demand per node (CVRP only).
    pub fn demands(&self) -> Option<&[i64]> {
        self.demands.as_deref()
    }

    pub fn edges(&self) -> Option<&EdgeData> {
        self.edges.as_ref()
    }

    pub fn fixed_edges(&self) -> &[(usize, usize)] {
        &self.fixed_edges
    }

    pub fn edge_weights(&self) -> Option<&EdgeWeights> {
        self.edge_weights.as_ref()
    }

    pub fn tours(&self) -> &[Vec<usize>] {
        &self.tours
    }

    /// Whether `{i, j}` is an edge of the graph: listed in the edge data if the file has
    /// any, otherwise every pair of distinct nodes.
    pub fn has_edge(&self, i: usize, j: usize) -> bool {
        let n = self.dimension();
        if i >= n || j >= n || i == j {
            return false;
        }

        match &self.edges {
            Some(EdgeData::EdgeList(edges)) => edges
                .iter()
                .any(|&(a, b)| (a, b) == (i, j) || (a, b) == (j, i)),
            Some(EdgeData::AdjList(lists)) => lists.iter().any(|(node, neighbours)| {
                (*node == i && neighbours.contains(&j)) || (*node == j && neighbours.contains(&i))
            }),
            None => true,
        }
    }
}
