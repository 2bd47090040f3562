//! Keywords of the specification part of a TSPLIB file.
//!
//! Each enum maps one-to-one onto the values accepted after the corresponding key
//! (e.g. `EDGE_WEIGHT_TYPE : EUC_2D`). Parsing is exact and case sensitive.

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("`{value}` is not a valid {kind}")]
pub struct ParseKeywordError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! keyword_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal, { $($(#[$vmeta:meta])* $variant:ident => $keyword:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $keyword),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseKeywordError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($keyword => Ok($name::$variant),)+
                    _ => Err(ParseKeywordError {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

keyword_enum!(
    /// Value of the `TYPE` key.
    ProblemType, "problem type", {
        /// Asymmetric travelling salesman problem
        Atsp => "ATSP",
        /// Capacitated vehicle routing problem
        Cvrp => "CVRP",
        /// Hamiltonian cycle problem
        Hcp => "HCP",
        /// Sequential ordering problem
        Sop => "SOP",
        /// A collection of tours
        Tour => "TOUR",
        /// Symmetric travelling salesman problem
        Tsp => "TSP",
    }
);

impl ProblemType {
    /// Problems whose explicit weights may differ between `(i, j)` and `(j, i)`.
    pub fn is_asymmetric(&self) -> bool {
        matches!(self, ProblemType::Atsp | ProblemType::Sop)
    }
}

keyword_enum!(
    /// Value of the `EDGE_WEIGHT_TYPE` key.
    EdgeWeightType, "edge weight type", {
        Explicit => "EXPLICIT",
        Euc2d => "EUC_2D",
        Euc3d => "EUC_3D",
        Max2d => "MAX_2D",
        Max3d => "MAX_3D",
        Man2d => "MAN_2D",
        Man3d => "MAN_3D",
        Ceil2d => "CEIL_2D",
        Geo => "GEO",
        /// Pseudo-Euclidean distance of att48 and att532
        Att => "ATT",
        Xray1 => "XRAY1",
        Xray2 => "XRAY2",
        /// Distance function supplied by the caller
        Special => "SPECIAL",
    }
);

keyword_enum!(
    /// Value of the `EDGE_WEIGHT_FORMAT` key.
    EdgeWeightFormat, "edge weight format", {
        Function => "FUNCTION",
        FullMatrix => "FULL_MATRIX",
        UpperRow => "UPPER_ROW",
        LowerRow => "LOWER_ROW",
        UpperDiagRow => "UPPER_DIAG_ROW",
        LowerDiagRow => "LOWER_DIAG_ROW",
        UpperCol => "UPPER_COL",
        LowerCol => "LOWER_COL",
        UpperDiagCol => "UPPER_DIAG_COL",
        LowerDiagCol => "LOWER_DIAG_COL",
    }
);

impl EdgeWeightFormat {
    /// Whether the layout lists the diagonal entries.
    pub fn has_diagonal(&self) -> bool {
        matches!(
            self,
            EdgeWeightFormat::FullMatrix
                | EdgeWeightFormat::UpperDiagRow
                | EdgeWeightFormat::LowerDiagRow
                | EdgeWeightFormat::UpperDiagCol
                | EdgeWeightFormat::LowerDiagCol
        )
    }
}

keyword_enum!(
    /// Value of the `EDGE_DATA_FORMAT` key.
    EdgeDataFormat, "edge data format", {
        EdgeList => "EDGE_LIST",
        AdjList => "ADJ_LIST",
    }
);

keyword_enum!(
    /// Value of the `NODE_COORD_TYPE` key.
    NodeCoordType, "node coordinate type", {
        TwoDCoords => "TWOD_COORDS",
        ThreeDCoords => "THREED_COORDS",
        NoCoords => "NO_COORDS",
    }
);

keyword_enum!(
    /// Value of the `DISPLAY_DATA_TYPE` key.
    DisplayDataType, "display data type", {
        CoordDisplay => "COORD_DISPLAY",
        TwoDDisplay => "TWOD_DISPLAY",
        NoDisplay => "NO_DISPLAY",
    }
);
