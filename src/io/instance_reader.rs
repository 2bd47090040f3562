use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use thiserror::Error;
use tracing::{debug, warn};

use super::edge_weights::{EdgeWeightError, decode_edge_weights};
use super::tokenizer::{TokenError, Tokenizer, is_delimiter};
use crate::format::*;
use crate::instance::{EdgeData, Instance, NodeCoords};

#[derive(Debug, Error)]
pub enum InstanceReaderError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Malformed input: {0}")]
    Token(#[from] TokenError),

    #[error("Instance {}, line {}: {violation}", name.as_deref().unwrap_or("<unnamed>"), lineno + 1)]
    Format {
        name: Option<String>,
        lineno: usize,
        violation: FormatViolation,
    },

    #[error("Warning while reading instance (paranoid mode): {0}")]
    Warning(InstanceReaderWarning),
}

#[derive(Debug, Error)]
pub enum FormatViolation {
    #[error("unknown keyword `{keyword}`")]
    UnknownKeyword { keyword: String },

    #[error("`{value}` is not a valid value of {key}")]
    UnknownValue { key: &'static str, value: String },

    #[error("DIMENSION must not be negative, found {value}")]
    InvalidDimension { value: i64 },

    #[error("found {section} before DIMENSION")]
    DimensionMissing { section: &'static str },

    #[error("DIMENSION changes from {declared} to {found} after node data was read")]
    DimensionChanged { declared: usize, found: usize },

    #[error("node {node} in {section} is outside of 1..={dimension}")]
    NodeOutOfRange {
        section: &'static str,
        node: i64,
        dimension: usize,
    },

    #[error("found node {found} in {section}, expected {expected}")]
    NonSequentialNode {
        section: &'static str,
        found: i64,
        expected: usize,
    },

    #[error("found NODE_COORD_SECTION without NODE_COORD_TYPE, and its first line has {tokens} tokens (expected 3 or 4)")]
    CoordTypeUndetected { tokens: usize },

    #[error("found NODE_COORD_SECTION, but NODE_COORD_TYPE is NO_COORDS")]
    NoCoords,

    #[error("found DISPLAY_DATA_SECTION, but DISPLAY_DATA_TYPE is {display_type}")]
    DisplayTypeMismatch { display_type: DisplayDataType },

    #[error("found EDGE_DATA_SECTION, but EDGE_DATA_FORMAT is not set")]
    EdgeDataFormatMissing,

    #[error("found EDGE_WEIGHT_SECTION, but EDGE_WEIGHT_FORMAT is not set")]
    EdgeWeightFormatMissing,

    #[error("{0}")]
    EdgeWeights(EdgeWeightError),

    #[error("Tour {tour} has {found} nodes, expected {expected}")]
    TourLengthMismatch {
        tour: usize,
        found: usize,
        expected: usize,
    },
}

/// Irregularities found in archive files that do not prevent decoding.
#[derive(Debug, Error, PartialEq)]
pub enum InstanceReaderWarning {
    #[error("Input ended without EOF keyword")]
    MissingEof,

    #[error("Line {}: list in {section} is not terminated by -1", lineno + 1)]
    MissingSentinel { section: &'static str, lineno: usize },

    #[error("Line {}: ignored text `{text}` after TOUR_SECTION", lineno + 1)]
    TrailingText { lineno: usize, text: String },

    #[error("Line {}: ignored text `{text}` after the TYPE value", lineno + 1)]
    TrailingTypeText { lineno: usize, text: String },

    #[error("DISPLAY_DATA_SECTION without DISPLAY_DATA_TYPE; assuming TWOD_DISPLAY")]
    InferredDisplayType,

    #[error("Line {}: {key} is declared again, the later value is used", lineno + 1)]
    RedeclaredKey { key: &'static str, lineno: usize },

    #[error("Depot {} is listed more than once", node + 1)]
    DuplicateDepot { node: usize },

    #[error("Node {} has more than one demand, the later value is used", node + 1)]
    DuplicateDemand { node: usize },
}

impl Instance {
    pub fn read(path: &Path, paranoid: bool) -> Result<Self, InstanceReaderError> {
        debug!("Read instance from {path:?}");
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file), paranoid)
    }

    pub fn read_from(reader: impl BufRead, paranoid: bool) -> Result<Self, InstanceReaderError> {
        let (instance, mut warnings) = Self::read_with_warnings(reader)?;

        for w in &warnings {
            warn!(" {w}");
        }

        if paranoid && !warnings.is_empty() {
            return Err(InstanceReaderError::Warning(warnings.remove(0)));
        }

        Ok(instance)
    }

    /// Decodes an instance and returns it together with all tolerated irregularities,
    /// without logging them.
    pub fn read_with_warnings(
        reader: impl BufRead,
    ) -> Result<(Self, Vec<InstanceReaderWarning>), InstanceReaderError> {
        SectionParser::new(reader).parse()
    }
}

//////////////////////////////////////////////////////////////////

const NODE_COORD_SECTION: &str = "NODE_COORD_SECTION";
const DEPOT_SECTION: &str = "DEPOT_SECTION";
const DEMAND_SECTION: &str = "DEMAND_SECTION";
const EDGE_DATA_SECTION: &str = "EDGE_DATA_SECTION";
const FIXED_EDGES_SECTION: &str = "FIXED_EDGES_SECTION";
const DISPLAY_DATA_SECTION: &str = "DISPLAY_DATA_SECTION";
const EDGE_WEIGHT_SECTION: &str = "EDGE_WEIGHT_SECTION";
const TOUR_SECTION: &str = "TOUR_SECTION";

struct SectionParser<R> {
    tokens: Tokenizer<R>,
    instance: Instance,
    warnings: Vec<InstanceReaderWarning>,
    /// Set once a section sized by the dimension was read.
    dimension_fixed: bool,
}

impl<R: BufRead> SectionParser<R> {
    fn new(reader: R) -> Self {
        Self {
            tokens: Tokenizer::new(reader),
            instance: Instance::default(),
            warnings: Vec::new(),
            dimension_fixed: false,
        }
    }

    fn parse(mut self) -> Result<(Instance, Vec<InstanceReaderWarning>), InstanceReaderError> {
        let mut after_tours = false;

        loop {
            let Some(keyword) = self.tokens.next_token()? else {
                self.warn(InstanceReaderWarning::MissingEof);
                break;
            };
            let lineno = self.tokens.lineno();

            // free text is tolerated only directly behind the tours
            let follows_tours = std::mem::take(&mut after_tours);

            match keyword.as_str() {
                "NAME" => {
                    let name = self.tokens.rest_of_line();
                    self.declare("NAME", lineno, |s| &mut s.name, name);
                }
                "TYPE" => {
                    let problem_type = self.keyword_value::<ProblemType>("TYPE")?;
                    let text = self.tokens.rest_of_line();
                    if !text.is_empty() {
                        self.warn(InstanceReaderWarning::TrailingTypeText { lineno, text });
                    }
                    self.declare("TYPE", lineno, |s| &mut s.problem_type, problem_type);
                }
                "COMMENT" => {
                    let text = self.tokens.rest_of_line();
                    let comment = &mut self.instance.spec.comment;
                    if !comment.is_empty() {
                        comment.push('\n');
                    }
                    comment.push_str(&text);
                }
                "DIMENSION" => {
                    let value = self.tokens.next_int("dimension")?;
                    let Ok(dimension) = usize::try_from(value) else {
                        return Err(self.violation(FormatViolation::InvalidDimension { value }));
                    };
                    match self.instance.spec.dimension {
                        Some(declared) if self.dimension_fixed && declared != dimension => {
                            return Err(self.violation(FormatViolation::DimensionChanged {
                                declared,
                                found: dimension,
                            }));
                        }
                        _ => {}
                    }
                    self.declare("DIMENSION", lineno, |s| &mut s.dimension, dimension);
                }
                "CAPACITY" => {
                    let capacity = self.tokens.next_int("capacity")?;
                    self.declare("CAPACITY", lineno, |s| &mut s.capacity, capacity);
                }
                "EDGE_WEIGHT_TYPE" => {
                    let value = self.keyword_value::<EdgeWeightType>("EDGE_WEIGHT_TYPE")?;
                    self.declare("EDGE_WEIGHT_TYPE", lineno, |s| &mut s.edge_weight_type, value);
                }
                "EDGE_WEIGHT_FORMAT" => {
                    let value = self.keyword_value::<EdgeWeightFormat>("EDGE_WEIGHT_FORMAT")?;
                    self.declare("EDGE_WEIGHT_FORMAT", lineno, |s| &mut s.edge_weight_format, value);
                }
                "EDGE_DATA_FORMAT" => {
                    let value = self.keyword_value::<EdgeDataFormat>("EDGE_DATA_FORMAT")?;
                    self.declare("EDGE_DATA_FORMAT", lineno, |s| &mut s.edge_data_format, value);
                }
                "NODE_COORD_TYPE" => {
                    let value = self.keyword_value::<NodeCoordType>("NODE_COORD_TYPE")?;
                    self.declare("NODE_COORD_TYPE", lineno, |s| &mut s.node_coord_type, value);
                }
                "DISPLAY_DATA_TYPE" => {
                    let value = self.keyword_value::<DisplayDataType>("DISPLAY_DATA_TYPE")?;
                    self.declare("DISPLAY_DATA_TYPE", lineno, |s| &mut s.display_data_type, value);
                }

                NODE_COORD_SECTION => self.read_node_coords()?,
                DEPOT_SECTION => self.read_depots()?,
                DEMAND_SECTION => self.read_demands()?,
                EDGE_DATA_SECTION => self.read_edge_data()?,
                // some archive files (e.g. alb4000.hcp) omit the `_SECTION` suffix
                FIXED_EDGES_SECTION | "FIXED_EDGES" => self.read_fixed_edges()?,
                DISPLAY_DATA_SECTION => self.read_display_data()?,
                EDGE_WEIGHT_SECTION => self.read_edge_weights()?,
                TOUR_SECTION => {
                    self.read_tours()?;
                    after_tours = true;
                }

                "EOF" => break,

                _ if follows_tours => {
                    let rest = self.tokens.rest_of_line();
                    let text = if rest.is_empty() {
                        keyword
                    } else {
                        format!("{keyword} {rest}")
                    };
                    self.warn(InstanceReaderWarning::TrailingText { lineno, text });
                    after_tours = true;
                }

                _ => return Err(self.violation(FormatViolation::UnknownKeyword { keyword })),
            }
        }

        debug!(
            "Read instance {:?} with {} nodes and {} tours",
            self.instance.spec.name,
            self.instance.dimension(),
            self.instance.tours.len()
        );

        Ok((self.instance, self.warnings))
    }

    fn warn(&mut self, warning: InstanceReaderWarning) {
        // nested lists hitting the end of input report the same position twice
        if self.warnings.last() != Some(&warning) {
            self.warnings.push(warning);
        }
    }

    fn violation(&self, violation: FormatViolation) -> InstanceReaderError {
        InstanceReaderError::Format {
            name: self.instance.spec.name.clone(),
            lineno: self.tokens.lineno(),
            violation,
        }
    }

    fn declare<T>(
        &mut self,
        key: &'static str,
        lineno: usize,
        field: impl FnOnce(&mut crate::instance::Specification) -> &mut Option<T>,
        value: T,
    ) {
        let slot = field(&mut self.instance.spec);
        let redeclared = slot.replace(value).is_some();
        if redeclared {
            self.warn(InstanceReaderWarning::RedeclaredKey { key, lineno });
        }
    }

    fn keyword_value<T>(&mut self, key: &'static str) -> Result<T, InstanceReaderError>
    where
        T: std::str::FromStr<Err = ParseKeywordError>,
    {
        let value = self.tokens.expect_token(key)?;
        match value.parse::<T>() {
            Ok(parsed) => Ok(parsed),
            Err(_) => Err(self.violation(FormatViolation::UnknownValue { key, value })),
        }
    }

    fn require_dimension(&mut self, section: &'static str) -> Result<usize, InstanceReaderError> {
        let Some(dimension) = self.instance.spec.dimension else {
            return Err(self.violation(FormatViolation::DimensionMissing { section }));
        };
        self.dimension_fixed = true;
        Ok(dimension)
    }

    /// Translates a 1-based node index of the file into a 0-based node.
    fn node_index(
        &self,
        section: &'static str,
        node: i64,
        dimension: usize,
    ) -> Result<usize, InstanceReaderError> {
        match usize::try_from(node) {
            Ok(index) if (1..=dimension).contains(&index) => Ok(index - 1),
            _ => Err(self.violation(FormatViolation::NodeOutOfRange {
                section,
                node,
                dimension,
            })),
        }
    }

    /// Next element of a `-1` terminated list, or `None` at its end. A list cut short by
    /// the end of input or by a non-integer token ends there, with a warning.
    fn next_list_entry(
        &mut self,
        section: &'static str,
    ) -> Result<Option<i64>, InstanceReaderError> {
        match self.tokens.next_int_if_present()? {
            Some(-1) => Ok(None),
            Some(value) => Ok(Some(value)),
            None => {
                let lineno = self.tokens.lineno();
                self.warn(InstanceReaderWarning::MissingSentinel { section, lineno });
                Ok(None)
            }
        }
    }

    /// Reads `(index, x_1, .., x_D)` rows for nodes `start..dimension`; indices must be sequential.
    fn read_coord_rows<const D: usize>(
        &mut self,
        section: &'static str,
        start: usize,
        dimension: usize,
        points: &mut Vec<[f64; D]>,
    ) -> Result<(), InstanceReaderError> {
        for expected in start..dimension {
            let found = self.tokens.next_int("node index")?;
            if found != expected as i64 + 1 {
                return Err(self.violation(FormatViolation::NonSequentialNode {
                    section,
                    found,
                    expected: expected + 1,
                }));
            }

            let mut point = [0.0; D];
            for x in point.iter_mut() {
                *x = self.tokens.next_float("coordinate")?;
            }
            points.push(point);
        }

        Ok(())
    }

    /// Inspects the first row of an untyped coordinate section. Returns the detected
    /// type and the coordinates of node 1.
    fn detect_coord_type(&mut self) -> Result<(NodeCoordType, Vec<f64>), InstanceReaderError> {
        let Some(line) = self.tokens.next_line()? else {
            return Err(TokenError::UnexpectedEof {
                lineno: self.tokens.lineno(),
                expected: "node coordinates",
            }
            .into());
        };

        let parts: Vec<&str> = line.split(is_delimiter).filter(|p| !p.is_empty()).collect();
        let coord_type = match parts.len() {
            3 => NodeCoordType::TwoDCoords,
            4 => NodeCoordType::ThreeDCoords,
            tokens => return Err(self.violation(FormatViolation::CoordTypeUndetected { tokens })),
        };

        let found = parts[0]
            .parse::<i64>()
            .map_err(|_| self.tokens.unexpected("node index", parts[0].to_string()))?;
        if found != 1 {
            return Err(self.violation(FormatViolation::NonSequentialNode {
                section: NODE_COORD_SECTION,
                found,
                expected: 1,
            }));
        }

        let coords = parts[1..]
            .iter()
            .map(|p| {
                p.parse::<f64>()
                    .map_err(|_| self.tokens.unexpected("coordinate", p.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((coord_type, coords))
    }

    fn read_node_coords(&mut self) -> Result<(), InstanceReaderError> {
        debug!("Line {}: {NODE_COORD_SECTION}", self.tokens.lineno() + 1);
        let dimension = self.require_dimension(NODE_COORD_SECTION)?;

        let (coord_type, first) = match self.instance.spec.node_coord_type {
            Some(coord_type) => (coord_type, None),
            None if dimension == 0 => (NodeCoordType::TwoDCoords, None),
            None => {
                let (coord_type, first) = self.detect_coord_type()?;
                debug!(" detected {coord_type}");
                self.instance.spec.node_coord_type = Some(coord_type);
                (coord_type, Some(first))
            }
        };

        let coords = match coord_type {
            NodeCoordType::TwoDCoords => {
                let mut points = Vec::new();
                if let Some(p) = first {
                    points.push([p[0], p[1]]);
                }
                self.read_coord_rows(NODE_COORD_SECTION, points.len(), dimension, &mut points)?;
                NodeCoords::TwoD(points)
            }
            NodeCoordType::ThreeDCoords => {
                let mut points = Vec::new();
                if let Some(p) = first {
                    points.push([p[0], p[1], p[2]]);
                }
                self.read_coord_rows(NODE_COORD_SECTION, points.len(), dimension, &mut points)?;
                NodeCoords::ThreeD(points)
            }
            NodeCoordType::NoCoords => return Err(self.violation(FormatViolation::NoCoords)),
        };

        self.instance.node_coords = Some(coords);
        Ok(())
    }

    fn read_display_data(&mut self) -> Result<(), InstanceReaderError> {
        debug!("Line {}: {DISPLAY_DATA_SECTION}", self.tokens.lineno() + 1);
        let dimension = self.require_dimension(DISPLAY_DATA_SECTION)?;

        match self.instance.spec.display_data_type {
            Some(DisplayDataType::TwoDDisplay) => {}
            Some(display_type) => {
                return Err(self.violation(FormatViolation::DisplayTypeMismatch { display_type }));
            }
            None => {
                self.warn(InstanceReaderWarning::InferredDisplayType);
                self.instance.spec.display_data_type = Some(DisplayDataType::TwoDDisplay);
            }
        }

        let mut points = Vec::new();
        self.read_coord_rows(DISPLAY_DATA_SECTION, 0, dimension, &mut points)?;
        self.instance.display_coords = Some(points);
        Ok(())
    }

    fn read_depots(&mut self) -> Result<(), InstanceReaderError> {
        debug!("Line {}: {DEPOT_SECTION}", self.tokens.lineno() + 1);
        let dimension = self.require_dimension(DEPOT_SECTION)?;

        while let Some(value) = self.next_list_entry(DEPOT_SECTION)? {
            let node = self.node_index(DEPOT_SECTION, value, dimension)?;
            if !self.instance.depots.insert(node) {
                self.warn(InstanceReaderWarning::DuplicateDepot { node });
            }
        }

        Ok(())
    }

    fn read_demands(&mut self) -> Result<(), InstanceReaderError> {
        debug!("Line {}: {DEMAND_SECTION}", self.tokens.lineno() + 1);
        let dimension = self.require_dimension(DEMAND_SECTION)?;

        let mut entries = Vec::new();
        for _ in 0..dimension {
            let value = self.tokens.next_int("node index")?;
            let node = self.node_index(DEMAND_SECTION, value, dimension)?;
            entries.push((node, self.tokens.next_int("demand")?));
        }

        // all entries are read before anything is sized by the dimension
        let mut demands = vec![None; dimension];
        for (node, demand) in entries {
            if demands[node].replace(demand).is_some() {
                self.warn(InstanceReaderWarning::DuplicateDemand { node });
            }
        }

        self.instance.demands = Some(demands.into_iter().map(|d| d.unwrap_or(0)).collect());
        Ok(())
    }

    /// Sentinel-terminated list of node pairs, shared by edge lists and fixed edges.
    fn read_pairs(
        &mut self,
        section: &'static str,
        dimension: usize,
    ) -> Result<Vec<(usize, usize)>, InstanceReaderError> {
        let mut pairs = Vec::new();

        while let Some(first) = self.next_list_entry(section)? {
            let u = self.node_index(section, first, dimension)?;
            let second = self.tokens.next_int("node index")?;
            let v = self.node_index(section, second, dimension)?;
            pairs.push((u, v));
        }

        Ok(pairs)
    }

    fn read_edge_data(&mut self) -> Result<(), InstanceReaderError> {
        debug!("Line {}: {EDGE_DATA_SECTION}", self.tokens.lineno() + 1);
        let Some(format) = self.instance.spec.edge_data_format else {
            return Err(self.violation(FormatViolation::EdgeDataFormatMissing));
        };
        let dimension = self.require_dimension(EDGE_DATA_SECTION)?;

        let edges = match format {
            EdgeDataFormat::EdgeList => {
                EdgeData::EdgeList(self.read_pairs(EDGE_DATA_SECTION, dimension)?)
            }
            EdgeDataFormat::AdjList => {
                let mut lists = Vec::new();
                while let Some(first) = self.next_list_entry(EDGE_DATA_SECTION)? {
                    let node = self.node_index(EDGE_DATA_SECTION, first, dimension)?;
                    let mut neighbours = Vec::new();
                    while let Some(value) = self.next_list_entry(EDGE_DATA_SECTION)? {
                        neighbours.push(self.node_index(EDGE_DATA_SECTION, value, dimension)?);
                    }
                    lists.push((node, neighbours));
                }
                EdgeData::AdjList(lists)
            }
        };

        self.instance.edges = Some(edges);
        Ok(())
    }

    fn read_fixed_edges(&mut self) -> Result<(), InstanceReaderError> {
        debug!("Line {}: {FIXED_EDGES_SECTION}", self.tokens.lineno() + 1);
        let dimension = self.require_dimension(FIXED_EDGES_SECTION)?;
        self.instance.fixed_edges = self.read_pairs(FIXED_EDGES_SECTION, dimension)?;
        Ok(())
    }

    fn read_edge_weights(&mut self) -> Result<(), InstanceReaderError> {
        debug!("Line {}: {EDGE_WEIGHT_SECTION}", self.tokens.lineno() + 1);
        let dimension = self.require_dimension(EDGE_WEIGHT_SECTION)?;
        let Some(format) = self.instance.spec.edge_weight_format else {
            return Err(self.violation(FormatViolation::EdgeWeightFormatMissing));
        };
        let problem_type = self.instance.spec.problem_type;

        // SOP files repeat the node count in front of the matrix
        if problem_type == Some(ProblemType::Sop) {
            let found = self.tokens.next_int("matrix size")?;
            if found != dimension as i64 {
                return Err(self.violation(FormatViolation::EdgeWeights(
                    EdgeWeightError::SizeMismatch {
                        expected: dimension,
                        found,
                    },
                )));
            }
        }

        let asymmetric = problem_type.is_some_and(|p| p.is_asymmetric());
        let tokens = &mut self.tokens;
        match decode_edge_weights(format, dimension, asymmetric, || {
            tokens.next_int("edge weight")
        }) {
            Ok(weights) => {
                self.instance.edge_weights = Some(weights);
                Ok(())
            }
            Err(EdgeWeightError::Token(e)) => Err(e.into()),
            Err(e) => Err(self.violation(FormatViolation::EdgeWeights(e))),
        }
    }

    fn read_tours(&mut self) -> Result<(), InstanceReaderError> {
        debug!("Line {}: {TOUR_SECTION}", self.tokens.lineno() + 1);

        // the section ends at a lone -1, at the end of input, or at the next keyword
        while let Some(first) = self.tokens.next_int_if_present()? {
            if first == -1 {
                break;
            }

            let mut nodes = vec![first];
            while let Some(value) = self.next_list_entry(TOUR_SECTION)? {
                nodes.push(value);
            }

            let dimension = *self.instance.spec.dimension.get_or_insert(nodes.len());
            self.dimension_fixed = true;
            if nodes.len() != dimension {
                return Err(self.violation(FormatViolation::TourLengthMismatch {
                    tour: self.instance.tours.len() + 1,
                    found: nodes.len(),
                    expected: dimension,
                }));
            }

            let tour = nodes
                .into_iter()
                .map(|node| self.node_index(TOUR_SECTION, node, dimension))
                .collect::<Result<Vec<_>, _>>()?;
            self.instance.tours.push(tour);
        }

        Ok(())
    }
}
