//! Small dense linear algebra for parameter covariance estimates
//!
//! Matrices are row-major `Vec<Vec<f64>>`; the dimensions involved are the
//! number of model coefficients, so nothing here needs to be fast.

use crate::{MathError, Result};

/// Central-difference Hessian of `f` at `x`.
///
/// The step for coordinate `i` is `rel_step * max(|x_i|, 1)`.
pub fn numerical_hessian<F>(f: F, x: &[f64], rel_step: f64) -> Vec<Vec<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let n = x.len();
    let steps: Vec<f64> = x.iter().map(|v| rel_step * v.abs().max(1.0)).collect();
    let f0 = f(x);
    let mut hessian = vec![vec![0.0; n]; n];
    let mut point = x.to_vec();

    for i in 0..n {
        let hi = steps[i];

        point[i] = x[i] + hi;
        let f_plus = f(&point);
        point[i] = x[i] - hi;
        let f_minus = f(&point);
        point[i] = x[i];
        hessian[i][i] = (f_plus - 2.0 * f0 + f_minus) / (hi * hi);

        for j in (i + 1)..n {
            let hj = steps[j];
            let mut corner = |si: f64, sj: f64| {
                point[i] = x[i] + si * hi;
                point[j] = x[j] + sj * hj;
                let value = f(&point);
                point[i] = x[i];
                point[j] = x[j];
                value
            };
            let mixed =
                (corner(1.0, 1.0) - corner(1.0, -1.0) - corner(-1.0, 1.0) + corner(-1.0, -1.0))
                    / (4.0 * hi * hj);
            hessian[i][j] = mixed;
            hessian[j][i] = mixed;
        }
    }

    hessian
}

/// Invert a square matrix by Gauss-Jordan elimination with partial pivoting
pub fn invert_matrix(matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    let n = matrix.len();
    if matrix.iter().any(|row| row.len() != n) {
        return Err(MathError::InvalidInput(
            "Matrix must be square".to_string(),
        ));
    }

    let mut a: Vec<Vec<f64>> = matrix.to_vec();
    let mut inv: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    let scale = matrix
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&r1, &r2| {
                a[r1][col]
                    .abs()
                    .partial_cmp(&a[r2][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);

        if !a[pivot][col].is_finite() || a[pivot][col].abs() <= 1e-12 * scale.max(1e-300) {
            return Err(MathError::CalculationError(
                "Matrix is singular".to_string(),
            ));
        }

        a.swap(col, pivot);
        inv.swap(col, pivot);

        let p = a[col][col];
        for k in 0..n {
            a[col][k] /= p;
            inv[col][k] /= p;
        }

        for row in 0..n {
            if row != col {
                let factor = a[row][col];
                if factor != 0.0 {
                    for k in 0..n {
                        a[row][k] -= factor * a[col][k];
                        inv[row][k] -= factor * inv[col][k];
                    }
                }
            }
        }
    }

    Ok(inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hessian_of_quadratic() {
        // f = x^2 + 3xy + 2y^2 has Hessian [[2, 3], [3, 4]].
        let h = numerical_hessian(
            |p| p[0] * p[0] + 3.0 * p[0] * p[1] + 2.0 * p[1] * p[1],
            &[0.5, -1.0],
            1e-4,
        );

        assert_relative_eq!(h[0][0], 2.0, epsilon = 1e-5);
        assert_relative_eq!(h[0][1], 3.0, epsilon = 1e-5);
        assert_relative_eq!(h[1][0], 3.0, epsilon = 1e-5);
        assert_relative_eq!(h[1][1], 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_invert_two_by_two() {
        let inv = invert_matrix(&[vec![4.0, 7.0], vec![2.0, 6.0]]).unwrap();

        assert_relative_eq!(inv[0][0], 0.6, epsilon = 1e-12);
        assert_relative_eq!(inv[0][1], -0.7, epsilon = 1e-12);
        assert_relative_eq!(inv[1][0], -0.2, epsilon = 1e-12);
        assert_relative_eq!(inv[1][1], 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_invert_needs_pivoting() {
        let inv = invert_matrix(&[vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();

        assert_relative_eq!(inv[0][1], 1.0);
        assert_relative_eq!(inv[1][0], 1.0);
    }

    #[test]
    fn test_singular_and_non_square() {
        let singular = invert_matrix(&[vec![1.0, 2.0], vec![2.0, 4.0]]);
        assert!(matches!(singular, Err(MathError::CalculationError(_))));

        let ragged = invert_matrix(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(ragged, Err(MathError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_matrix() {
        assert!(invert_matrix(&[]).unwrap().is_empty());
    }
}
