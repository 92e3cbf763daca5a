//! Dense linear algebra for small correlation matrices
//!
//! Matrices are row-major `Vec<Vec<f64>>`; pulsar counts are in the tens,
//! so the cubic Cholesky is never the bottleneck next to the FFTs.

use crate::types::{InjectError, InjectResult};

/// Relative tolerance for treating a Cholesky pivot as zero.
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Cholesky factor `L` (lower triangular) with `L·Lᵗ = a`.
///
/// Semidefinite input is accepted: a pivot within tolerance of zero yields a
/// zero column, provided the rest of that column is consistent with rank
/// deficiency. Anything else returns [`InjectError::NotPositiveDefinite`].
pub fn cholesky(a: &[Vec<f64>]) -> InjectResult<Vec<Vec<f64>>> {
    let n = a.len();
    for row in a {
        if row.len() != n {
            return Err(InjectError::LengthMismatch {
                what: "matrix row",
                expected: n,
                actual: row.len(),
            });
        }
    }

    let scale = (0..n).map(|i| a[i][i].abs()).fold(1.0_f64, f64::max);
    let tol = PIVOT_TOLERANCE * scale;

    let mut l = vec![vec![0.0; n]; n];
    for j in 0..n {
        let mut sum = 0.0;
        for k in 0..j {
            sum += l[j][k] * l[j][k];
        }
        let pivot = a[j][j] - sum;

        if pivot > tol {
            let d = pivot.sqrt();
            l[j][j] = d;
            for i in (j + 1)..n {
                let mut s = 0.0;
                for k in 0..j {
                    s += l[i][k] * l[j][k];
                }
                l[i][j] = (a[i][j] - s) / d;
            }
        } else if pivot >= -tol {
            // Rank-deficient column: the remaining entries must vanish too
            for i in (j + 1)..n {
                let mut s = 0.0;
                for k in 0..j {
                    s += l[i][k] * l[j][k];
                }
                if (a[i][j] - s).abs() > tol.sqrt() {
                    return Err(InjectError::NotPositiveDefinite { row: j, pivot });
                }
            }
        } else {
            return Err(InjectError::NotPositiveDefinite { row: j, pivot });
        }
    }
    Ok(l)
}

/// Matrix-vector product `a·x`.
pub fn mat_vec(a: &[Vec<f64>], x: &[f64]) -> Vec<f64> {
    a.iter()
        .map(|row| row.iter().zip(x).map(|(r, v)| r * v).sum())
        .collect()
}

/// `l·lᵗ`, used to check a factorization.
pub fn outer_self(l: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = l.len();
    let mut out = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            out[i][j] = (0..n).map(|k| l[i][k] * l[j][k]).sum();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_reconstructs(a: &[Vec<f64>]) {
        let l = cholesky(a).unwrap();
        let back = outer_self(&l);
        for i in 0..a.len() {
            for j in 0..a.len() {
                assert_relative_eq!(back[i][j], a[i][j], epsilon = 1e-12);
            }
            for j in (i + 1)..a.len() {
                assert_eq!(l[i][j], 0.0, "factor must be lower triangular");
            }
        }
    }

    #[test]
    fn test_cholesky_positive_definite() {
        let a = vec![
            vec![4.0, 2.0, 0.4],
            vec![2.0, 3.0, 0.5],
            vec![0.4, 0.5, 2.0],
        ];
        assert_reconstructs(&a);
    }

    #[test]
    fn test_cholesky_diagonal() {
        let a = vec![vec![2.0, 0.0], vec![0.0, 2.0]];
        let l = cholesky(&a).unwrap();
        assert_relative_eq!(l[0][0], 2.0_f64.sqrt(), epsilon = 1e-15);
        assert_relative_eq!(l[1][1], 2.0_f64.sqrt(), epsilon = 1e-15);
        assert_eq!(l[1][0], 0.0);
    }

    #[test]
    fn test_cholesky_semidefinite() {
        // Two identical lines of sight plus an independent one
        let a = vec![
            vec![2.0, 2.0, 0.3],
            vec![2.0, 2.0, 0.3],
            vec![0.3, 0.3, 2.0],
        ];
        assert_reconstructs(&a);
        let l = cholesky(&a).unwrap();
        assert_eq!(l[1][1], 0.0);
    }

    #[test]
    fn test_cholesky_indefinite_rejected() {
        let a = vec![vec![2.0, 3.0], vec![3.0, 2.0]];
        let err = cholesky(&a).unwrap_err();
        assert!(matches!(err, InjectError::NotPositiveDefinite { row: 1, .. }));
    }

    #[test]
    fn test_cholesky_ragged_rejected() {
        let a = vec![vec![2.0, 0.0], vec![0.0]];
        assert!(cholesky(&a).unwrap_err().is_configuration());
    }

    #[test]
    fn test_mat_vec() {
        let a = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        assert_eq!(mat_vec(&a, &[1.0, -1.0]), vec![-1.0, -1.0]);
    }
}
