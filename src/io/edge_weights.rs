//! Decoding of `EDGE_WEIGHT_SECTION` payloads into canonical [`EdgeWeights`].
//!
//! Every triangular layout is written into the compact strict-upper-triangular array,
//! so consumers never see the on-disk layout. A full matrix is checked for symmetry and
//! compacted as well, unless the problem is asymmetric (ATSP, SOP); then it is kept as is.

use thiserror::Error;

use super::tokenizer::TokenError;
use crate::format::EdgeWeightFormat;
use crate::instance::EdgeWeights;
use crate::triangular::{compact_len, to_index};

#[derive(Debug, Error)]
pub enum EdgeWeightError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("found EDGE_WEIGHT_SECTION, but EDGE_WEIGHT_FORMAT is FUNCTION")]
    FunctionFormat,

    #[error("diagonal entry of node {} is {value}, expected 0", node + 1)]
    NonZeroDiagonal { node: usize, value: i64 },

    #[error("matrix is not symmetric: entry ({}, {}) is {upper}, but entry ({}, {}) is {lower}", row + 1, col + 1, col + 1, row + 1)]
    Asymmetric {
        row: usize,
        col: usize,
        upper: i64,
        lower: i64,
    },

    #[error("EDGE_WEIGHT_SECTION announces {found} nodes, expected {expected}")]
    SizeMismatch { expected: usize, found: i64 },

    #[error("a {dimension} x {dimension} matrix does not fit into memory")]
    TooLarge { dimension: usize },
}

/// Reads the weights of a `dimension x dimension` matrix in the given layout. Each value
/// is obtained from `next_weight`, in the order the layout stores them.
pub fn decode_edge_weights(
    format: EdgeWeightFormat,
    dimension: usize,
    asymmetric: bool,
    mut next_weight: impl FnMut() -> Result<i64, TokenError>,
) -> Result<EdgeWeights, EdgeWeightError> {
    let n = dimension;
    let count = stream_len(format, n)?;

    // buffers grow with the values actually read, never with the declared dimension
    let mut stream = Vec::new();
    for _ in 0..count {
        stream.push(next_weight()?);
    }

    if format == EdgeWeightFormat::FullMatrix {
        if asymmetric {
            return Ok(EdgeWeights::Full {
                dimension: n,
                weights: stream,
            });
        }
        return compact_full_matrix(n, &stream);
    }

    let mut compact = CompactWriter::new(n);
    for ((i, j), value) in traversal(format, n).zip(stream) {
        compact.put(i, j, value)?;
    }

    Ok(compact.finish())
}

/// Number of values the layout stores for an `n x n` matrix.
fn stream_len(format: EdgeWeightFormat, n: usize) -> Result<usize, EdgeWeightError> {
    let len = match format {
        EdgeWeightFormat::Function => return Err(EdgeWeightError::FunctionFormat),
        EdgeWeightFormat::FullMatrix => n.checked_mul(n),
        f if f.has_diagonal() => n.checked_add(1).and_then(|m| n.checked_mul(m)).map(|x| x / 2),
        _ => n.checked_mul(n.saturating_sub(1)).map(|x| x / 2),
    };

    len.ok_or(EdgeWeightError::TooLarge { dimension: n })
}

/// Matrix positions `(row, col)` in the order a triangular layout stores them.
fn traversal(format: EdgeWeightFormat, n: usize) -> Box<dyn Iterator<Item = (usize, usize)>> {
    use EdgeWeightFormat::*;

    match format {
        Function => Box::new(std::iter::empty()),
        FullMatrix => Box::new((0..n).flat_map(move |i| (0..n).map(move |j| (i, j)))),
        UpperRow => Box::new((0..n).flat_map(move |i| (i + 1..n).map(move |j| (i, j)))),
        LowerRow => Box::new((0..n).flat_map(|i| (0..i).map(move |j| (i, j)))),
        UpperDiagRow => Box::new((0..n).flat_map(move |i| (i..n).map(move |j| (i, j)))),
        LowerDiagRow => Box::new((0..n).flat_map(|i| (0..=i).map(move |j| (i, j)))),
        UpperCol => Box::new((0..n).flat_map(|j| (0..j).map(move |i| (i, j)))),
        LowerCol => Box::new((0..n).flat_map(move |j| (j + 1..n).map(move |i| (i, j)))),
        UpperDiagCol => Box::new((0..n).flat_map(|j| (0..=j).map(move |i| (i, j)))),
        LowerDiagCol => Box::new((0..n).flat_map(move |j| (j..n).map(move |i| (i, j)))),
    }
}

/// Checks a row-major full matrix for a zero diagonal and symmetry, then compacts it.
fn compact_full_matrix(n: usize, weights: &[i64]) -> Result<EdgeWeights, EdgeWeightError> {
    let mut compact = CompactWriter::new(n);

    for i in 0..n {
        let value = weights[i * n + i];
        if value != 0 {
            return Err(EdgeWeightError::NonZeroDiagonal { node: i, value });
        }

        for j in i + 1..n {
            let (upper, lower) = (weights[i * n + j], weights[j * n + i]);
            if upper != lower {
                return Err(EdgeWeightError::Asymmetric {
                    row: i,
                    col: j,
                    upper,
                    lower,
                });
            }
            compact.put(i, j, upper)?;
        }
    }

    Ok(compact.finish())
}

struct CompactWriter {
    dimension: usize,
    weights: Vec<i64>,
}

impl CompactWriter {
    fn new(dimension: usize) -> Self {
        Self {
            dimension,
            weights: vec![0; compact_len(dimension)],
        }
    }

    /// Stores the weight of `{i, j}`; diagonal entries are only checked.
    fn put(&mut self, i: usize, j: usize, value: i64) -> Result<(), EdgeWeightError> {
        if i == j {
            if value != 0 {
                return Err(EdgeWeightError::NonZeroDiagonal { node: i, value });
            }
            return Ok(());
        }

        let (row, col) = if i < j { (i, j) } else { (j, i) };
        self.weights[to_index(row, col, self.dimension)] = value;
        Ok(())
    }

    fn finish(self) -> EdgeWeights {
        let weights = EdgeWeights::Compact {
            dimension: self.dimension,
            weights: self.weights,
        };
        debug_assert_eq!(weights.as_slice().len(), weights.expected_len());
        weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATRIX: [[i64; 4]; 4] = [[0, 1, 2, 3], [1, 0, 4, 5], [2, 4, 0, 6], [3, 5, 6, 0]];

    fn decode(
        format: EdgeWeightFormat,
        n: usize,
        asymmetric: bool,
        values: &[i64],
    ) -> Result<EdgeWeights, EdgeWeightError> {
        let mut it = values.iter().copied();
        decode_edge_weights(format, n, asymmetric, || {
            it.next().ok_or(TokenError::UnexpectedEof {
                lineno: 0,
                expected: "edge weight",
            })
        })
    }

    /// Writes `matrix` in the given layout, enumerating the entries independently of the
    /// decoder: sweep lines are rows or columns, and each keeps the entries on the chosen
    /// side of (and optionally on) the diagonal.
    fn encode(format: EdgeWeightFormat, matrix: &[Vec<i64>]) -> Vec<i64> {
        use EdgeWeightFormat::*;
        let n = matrix.len();
        let mut out = Vec::new();

        for line in 0..n {
            for other in 0..n {
                let (i, j) = match format {
                    UpperRow | LowerRow | UpperDiagRow | LowerDiagRow | FullMatrix => (line, other),
                    _ => (other, line),
                };
                let keep = match format {
                    FullMatrix => true,
                    UpperRow | UpperCol => i < j,
                    LowerRow | LowerCol => i > j,
                    UpperDiagRow | UpperDiagCol => i <= j,
                    LowerDiagRow | LowerDiagCol => i >= j,
                    Function => unreachable!(),
                };
                if keep {
                    out.push(matrix[i][j]);
                }
            }
        }

        out
    }

    macro_rules! assert_layout {
        ($name : ident, $format : expr, $stream : expr) => {
            #[test]
            fn $name() {
                let stream: &[i64] = &$stream;
                let matrix: Vec<Vec<i64>> = MATRIX.iter().map(|r| r.to_vec()).collect();
                assert_eq!(encode($format, &matrix), stream);

                let weights = decode($format, 4, false, stream).unwrap();
                assert_eq!(
                    weights,
                    EdgeWeights::Compact {
                        dimension: 4,
                        weights: vec![1, 2, 3, 4, 5, 6]
                    }
                );
            }
        };
    }

    assert_layout!(upper_row, EdgeWeightFormat::UpperRow, [1, 2, 3, 4, 5, 6]);
    assert_layout!(lower_row, EdgeWeightFormat::LowerRow, [1, 2, 4, 3, 5, 6]);
    assert_layout!(
        upper_diag_row,
        EdgeWeightFormat::UpperDiagRow,
        [0, 1, 2, 3, 0, 4, 5, 0, 6, 0]
    );
    assert_layout!(
        lower_diag_row,
        EdgeWeightFormat::LowerDiagRow,
        [0, 1, 0, 2, 4, 0, 3, 5, 6, 0]
    );
    assert_layout!(upper_col, EdgeWeightFormat::UpperCol, [1, 2, 4, 3, 5, 6]);
    assert_layout!(lower_col, EdgeWeightFormat::LowerCol, [1, 2, 3, 4, 5, 6]);
    assert_layout!(
        upper_diag_col,
        EdgeWeightFormat::UpperDiagCol,
        [0, 1, 0, 2, 4, 0, 3, 5, 6, 0]
    );
    assert_layout!(
        lower_diag_col,
        EdgeWeightFormat::LowerDiagCol,
        [0, 1, 2, 3, 0, 4, 5, 0, 6, 0]
    );
    assert_layout!(
        full_matrix,
        EdgeWeightFormat::FullMatrix,
        [0, 1, 2, 3, 1, 0, 4, 5, 2, 4, 0, 6, 3, 5, 6, 0]
    );

    #[test]
    fn all_layouts_agree() {
        for n in [0usize, 1, 2, 3, 7, 12] {
            let matrix: Vec<Vec<i64>> = (0..n)
                .map(|i| {
                    (0..n)
                        .map(|j| if i == j { 0 } else { (10 * i.min(j) + i.max(j)) as i64 })
                        .collect()
                })
                .collect();

            let mut previous = None;
            for &format in EdgeWeightFormat::ALL {
                if format == EdgeWeightFormat::Function {
                    continue;
                }

                let stream = encode(format, &matrix);
                let weights = decode(format, n, false, &stream).unwrap();

                for i in 0..n {
                    for j in 0..n {
                        assert_eq!(weights.get(i, j), matrix[i][j], "{format} n={n}");
                    }
                }

                if let Some(previous) = previous.as_ref() {
                    assert_eq!(&weights, previous, "{format} n={n}");
                }
                previous = Some(weights);
            }
        }
    }

    #[test]
    fn asymmetric_full_matrix_is_rejected() {
        let result = decode(EdgeWeightFormat::FullMatrix, 2, false, &[0, 5, 6, 0]);
        assert!(matches!(
            result,
            Err(EdgeWeightError::Asymmetric {
                row: 0,
                col: 1,
                upper: 5,
                lower: 6
            })
        ));
    }

    #[test]
    fn asymmetric_problem_keeps_full_matrix() {
        let weights = decode(EdgeWeightFormat::FullMatrix, 2, true, &[9999, 5, 6, 9999]).unwrap();
        assert_eq!(
            weights,
            EdgeWeights::Full {
                dimension: 2,
                weights: vec![9999, 5, 6, 9999]
            }
        );
        assert_eq!(weights.get(1, 0), 6);
    }

    #[test]
    fn nonzero_diagonal() {
        assert!(matches!(
            decode(EdgeWeightFormat::FullMatrix, 2, false, &[0, 5, 5, 3]),
            Err(EdgeWeightError::NonZeroDiagonal { node: 1, value: 3 })
        ));
        assert!(matches!(
            decode(EdgeWeightFormat::LowerDiagRow, 3, false, &[0, 1, 7, 2, 3, 0]),
            Err(EdgeWeightError::NonZeroDiagonal { node: 1, value: 7 })
        ));
    }

    #[test]
    fn function_format() {
        assert!(matches!(
            decode(EdgeWeightFormat::Function, 2, false, &[]),
            Err(EdgeWeightError::FunctionFormat)
        ));
    }

    #[test]
    fn traversal_matches_stream_len() {
        for &format in EdgeWeightFormat::ALL {
            if format == EdgeWeightFormat::Function {
                continue;
            }
            for n in [0usize, 1, 2, 5] {
                assert_eq!(
                    traversal(format, n).count(),
                    stream_len(format, n).unwrap(),
                    "{format} n={n}"
                );
            }
        }
    }

    #[test]
    fn oversized_dimension() {
        for format in [EdgeWeightFormat::FullMatrix, EdgeWeightFormat::UpperRow] {
            assert!(matches!(
                decode(format, usize::MAX / 2, false, &[]),
                Err(EdgeWeightError::TooLarge { .. })
            ));
        }

        // a count that fits is only backed by the values actually supplied
        assert!(matches!(
            decode(EdgeWeightFormat::LowerDiagCol, 1 << 20, false, &[0, 1, 2]),
            Err(EdgeWeightError::Token(TokenError::UnexpectedEof { .. }))
        ));
    }

    #[test]
    fn truncated_stream() {
        assert!(matches!(
            decode(EdgeWeightFormat::UpperRow, 4, false, &[1, 2, 3]),
            Err(EdgeWeightError::Token(TokenError::UnexpectedEof { .. }))
        ));
    }
}
