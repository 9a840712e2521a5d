//! Ordinary least squares on a dense design matrix.
//!
//! Used by the unit-root regressions and by state initialisation of the
//! exponential smoothing models.

use crate::error::{ForecastError, Result};

/// Result of an OLS regression.
#[derive(Debug, Clone)]
pub struct OLSResult {
    /// Coefficients, one per design-matrix column.
    pub coefficients: Vec<f64>,
    /// Standard errors of the coefficients.
    pub std_errors: Vec<f64>,
    /// Residuals y - Xb.
    pub residuals: Vec<f64>,
    /// Residual sum of squares.
    pub sse: f64,
}

impl OLSResult {
    /// Number of observations used.
    pub fn nobs(&self) -> usize {
        self.residuals.len()
    }

    /// t-statistic of coefficient `i`.
    pub fn t_stat(&self, i: usize) -> f64 {
        match (self.coefficients.get(i), self.std_errors.get(i)) {
            (Some(&b), Some(&se)) if se > 0.0 => b / se,
            _ => f64::NAN,
        }
    }
}

/// Fit `y = X b + e` where each entry of `rows` is one observation.
pub fn ols_fit(rows: &[Vec<f64>], y: &[f64]) -> Result<OLSResult> {
    let n = y.len();
    if rows.len() != n {
        return Err(ForecastError::DimensionMismatch {
            expected: n,
            got: rows.len(),
        });
    }
    let k = rows.first().map(|r| r.len()).unwrap_or(0);
    if k == 0 || n < k {
        return Err(ForecastError::InsufficientData {
            needed: k.max(1),
            got: n,
        });
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &yi) in rows.iter().zip(y) {
        if row.len() != k {
            return Err(ForecastError::DimensionMismatch {
                expected: k,
                got: row.len(),
            });
        }
        for i in 0..k {
            xty[i] += row[i] * yi;
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[j][i] = xtx[i][j];
        }
    }

    let chol = cholesky(&xtx).ok_or_else(|| {
        ForecastError::ComputationError("OLS normal equations are singular".into())
    })?;
    let coefficients = cholesky_solve(&chol, &xty);

    let residuals: Vec<f64> = rows
        .iter()
        .zip(y)
        .map(|(row, &yi)| yi - dot(row, &coefficients))
        .collect();
    let sse: f64 = residuals.iter().map(|r| r * r).sum();

    let dof = n.saturating_sub(k);
    let sigma2 = if dof > 0 { sse / dof as f64 } else { f64::NAN };
    let std_errors = (0..k)
        .map(|i| {
            let mut e = vec![0.0; k];
            e[i] = 1.0;
            let col = cholesky_solve(&chol, &e);
            (sigma2 * col[i]).max(0.0).sqrt()
        })
        .collect();

    Ok(OLSResult {
        coefficients,
        std_errors,
        residuals,
        sse,
    })
}

/// Solve a general square system with partial pivoting.
pub fn solve_linear(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if a.len() != n || a.iter().any(|r| r.len() != n) {
        return None;
    }
    let mut m: Vec<Vec<f64>> = a
        .iter()
        .zip(b)
        .map(|(row, &bi)| {
            let mut r = row.clone();
            r.push(bi);
            r
        })
        .collect();

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| {
            m[i][col]
                .abs()
                .partial_cmp(&m[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if m[pivot][col].abs() < 1e-12 {
            return None;
        }
        m.swap(col, pivot);
        for row in (col + 1)..n {
            let factor = m[row][col] / m[col][col];
            for c in col..=n {
                m[row][c] -= factor * m[col][c];
            }
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|j| m[i][j] * x[j]).sum();
        x[i] = (m[i][n] - tail) / m[i][i];
    }
    Some(x)
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Lower-triangular factor L with A = L L'.
fn cholesky(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let scale = (0..n).map(|i| a[i][i].abs()).fold(0.0, f64::max).max(1.0);
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let sum = a[i][j] - (0..j).map(|k| l[i][k] * l[j][k]).sum::<f64>();
            if i == j {
                if sum <= 1e-13 * scale {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }
    Some(l)
}

fn cholesky_solve(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();
    let mut z = vec![0.0; n];
    for i in 0..n {
        let s: f64 = (0..i).map(|j| l[i][j] * z[j]).sum();
        z[i] = (b[i] - s) / l[i][i];
    }
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let s: f64 = ((i + 1)..n).map(|j| l[j][i] * x[j]).sum();
        x[i] = (z[i] - s) / l[i][i];
    }
    x
}
