//! Bijection between the strict upper triangle of an `n x n` matrix and a compact array.
//!
//! The pairs `(i, j)` with `0 <= i < j < n` are enumerated row by row, so the compact
//! array of a matrix of dimension `n` has `n(n-1)/2` entries:
//!
//! ```text
//! n = 4:   . 0 1 2
//!          . . 3 4
//!          . . . 5
//!          . . . .
//! ```
//!
//! Both mappings are pure and never panic; inputs outside the documented ranges yield
//! unspecified values, so callers validate indices themselves.

/// Number of entries of the strict upper triangle of an `n x n` matrix.
pub fn compact_len(n: usize) -> usize {
    n.saturating_mul(n.saturating_sub(1)) / 2
}

/// Returns the position of `(i, j)` in the compact array, assuming `0 <= i < j < n`.
pub fn to_index(i: usize, j: usize, n: usize) -> usize {
    // entries of rows 0..i, then the offset of j inside row i
    let rows_left = n.wrapping_sub(i);
    let total = n.wrapping_mul(n.wrapping_sub(1)) / 2;
    let tail = rows_left.wrapping_mul(rows_left.wrapping_sub(1)) / 2;

    total
        .wrapping_sub(tail)
        .wrapping_add(j.wrapping_sub(i).wrapping_sub(1))
}

/// Returns the matrix coordinates `(i, j)` of position `k`, assuming `0 <= k < n(n-1)/2`.
pub fn to_coords(k: usize, n: usize) -> (usize, usize) {
    if k < n.saturating_sub(1) {
        return (0, k + 1);
    }

    let nf = n as f64;
    let discriminant = (2.0 * nf - 1.0).powi(2) - 8.0 * k as f64;
    let mut i = (nf - 0.5 - discriminant.sqrt() / 2.0).floor() as usize;

    // guard against rounding of the square root for very large n
    while i > 0 && row_start(i, n) > k {
        i -= 1;
    }
    while i + 1 < n && row_start(i + 1, n) <= k {
        i += 1;
    }

    let j = (i + 1).wrapping_add(k.wrapping_sub(row_start(i, n)));
    (i, j)
}

/// Position of `(i, i + 1)`, i.e. the first entry of row `i`.
fn row_start(i: usize, n: usize) -> usize {
    n.wrapping_mul(i)
        .wrapping_sub(i.wrapping_mul(i.wrapping_add(1)) / 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_indices() {
        assert_eq!(to_index(0, 1, 2), 0);

        let expected_n5 = [
            (0, 1),
            (0, 2),
            (0, 3),
            (0, 4),
            (1, 2),
            (1, 3),
            (1, 4),
            (2, 3),
            (2, 4),
            (3, 4),
        ];

        for (k, &(i, j)) in expected_n5.iter().enumerate() {
            assert_eq!(to_index(i, j, 5), k);
            assert_eq!(to_coords(k, 5), (i, j));
        }

        assert_eq!(to_coords(3, 4), (1, 2));
        assert_eq!(to_coords(5, 4), (2, 3));
    }

    #[test]
    fn roundtrip_from_coords() {
        for n in 2..=100 {
            let mut k = 0;
            for i in 0..n {
                for j in i + 1..n {
                    assert_eq!(to_index(i, j, n), k, "n={n} i={i} j={j}");
                    assert_eq!(to_coords(to_index(i, j, n), n), (i, j));
                    k += 1;
                }
            }
            assert_eq!(k, compact_len(n));
        }
    }

    #[test]
    fn roundtrip_from_index() {
        for n in 2..=100 {
            for k in 0..compact_len(n) {
                let (i, j) = to_coords(k, n);
                assert!(i < j && j < n, "n={n} k={k} -> ({i}, {j})");
                assert_eq!(to_index(i, j, n), k);
            }
        }
    }

    #[test]
    fn large_dimension() {
        let n = 85_900;
        let last = compact_len(n) - 1;
        assert_eq!(to_coords(last, n), (n - 2, n - 1));
        assert_eq!(to_coords(to_index(12_345, 54_321, n), n), (12_345, 54_321));
    }

    #[test]
    fn out_of_range_does_not_panic() {
        let _ = to_index(5, 2, 4);
        let _ = to_index(7, 9, 3);
        let _ = to_coords(100, 4);
        let _ = to_coords(usize::MAX, 0);
        assert_eq!(compact_len(0), 0);
        assert_eq!(compact_len(1), 0);
    }
}
