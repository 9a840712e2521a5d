//! Derivative-free minimisation for likelihood-based parameter estimation.

/// Outcome of a Nelder-Mead run.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// Best point found.
    pub optimal_point: Vec<f64>,
    /// Objective value at `optimal_point`.
    pub optimal_value: f64,
    /// Iterations used across all restarts.
    pub iterations: usize,
    /// Whether the simplex met the tolerance before `max_iter`.
    pub converged: bool,
}

/// Settings for [`nelder_mead`].
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Iteration cap per restart.
    pub max_iter: usize,
    /// Convergence tolerance on the spread of objective values.
    pub tolerance: f64,
    /// Initial simplex step, relative to each coordinate (absolute near zero).
    pub initial_step: f64,
    /// Number of times the search is restarted from the incumbent point.
    pub restarts: usize,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            initial_step: 0.05,
            restarts: 1,
        }
    }
}

impl NelderMeadConfig {
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_initial_step(mut self, step: f64) -> Self {
        self.initial_step = step;
        self
    }
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimise `objective` starting from `initial`.
///
/// Coordinates are clamped to `bounds` when given. Non-finite objective
/// values are treated as +infinity so infeasible regions are rejected.
///
/// # Example
/// ```
/// use shopping_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
/// assert!((result.optimal_point[0] - 2.0).abs() < 1e-3);
/// assert!((result.optimal_point[1] + 1.0).abs() < 1e-3);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let eval = |x: &[f64]| {
        let v = objective(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    if initial.is_empty() {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: eval(&[]),
            iterations: 0,
            converged: true,
        };
    }

    let mut best = clamp(initial.to_vec(), bounds);
    let mut best_value = eval(&best);
    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..=config.restarts {
        let (point, value, iters, done) = run_simplex(&eval, &best, bounds, &config);
        iterations += iters;
        converged = done;
        let improved = value < best_value - config.tolerance;
        if value <= best_value {
            best = point;
            best_value = value;
        }
        if !improved {
            break;
        }
    }

    NelderMeadResult {
        optimal_point: best,
        optimal_value: best_value,
        iterations,
        converged,
    }
}

fn run_simplex<F>(
    eval: &F,
    start: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &NelderMeadConfig,
) -> (Vec<f64>, f64, usize, bool)
where
    F: Fn(&[f64]) -> f64,
{
    let n = start.len();
    let mut vertices: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    vertices.push((start.to_vec(), eval(start)));
    for i in 0..n {
        let mut v = start.to_vec();
        v[i] += if v[i].abs() > 1e-8 {
            config.initial_step * v[i].abs()
        } else {
            config.initial_step
        };
        if let Some(b) = bounds.and_then(|b| b.get(i)) {
            if v[i] > b.1 {
                v[i] = start[i] - (v[i] - start[i]);
            }
        }
        let v = clamp(v, bounds);
        let f = eval(&v);
        vertices.push((v, f));
    }

    let mut iter = 0;
    while iter < config.max_iter {
        iter += 1;
        vertices.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let (lo, hi) = (vertices[0].1, vertices[n].1);
        if (hi - lo).abs() <= config.tolerance * (1.0 + lo.abs()) && hi.is_finite() {
            return (vertices[0].0.clone(), lo, iter, true);
        }

        let centroid: Vec<f64> = (0..n)
            .map(|j| vertices[..n].iter().map(|v| v.0[j]).sum::<f64>() / n as f64)
            .collect();
        let worst = vertices[n].0.clone();

        let reflected = clamp(towards(&centroid, &worst, -REFLECT), bounds);
        let f_r = eval(&reflected);

        if f_r < vertices[0].1 {
            let expanded = clamp(towards(&centroid, &worst, -EXPAND), bounds);
            let f_e = eval(&expanded);
            vertices[n] = if f_e < f_r {
                (expanded, f_e)
            } else {
                (reflected, f_r)
            };
            continue;
        }
        if f_r < vertices[n - 1].1 {
            vertices[n] = (reflected, f_r);
            continue;
        }

        let (contracted, f_c) = if f_r < vertices[n].1 {
            let c = clamp(towards(&centroid, &reflected, CONTRACT), bounds);
            let f = eval(&c);
            (c, f)
        } else {
            let c = clamp(towards(&centroid, &worst, CONTRACT), bounds);
            let f = eval(&c);
            (c, f)
        };
        if f_c < vertices[n].1.min(f_r) {
            vertices[n] = (contracted, f_c);
            continue;
        }

        let anchor = vertices[0].0.clone();
        for v in vertices.iter_mut().skip(1) {
            let p = clamp(towards(&anchor, &v.0, SHRINK), bounds);
            let f = eval(&p);
            *v = (p, f);
        }
    }

    vertices.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    let (point, value) = vertices.swap_remove(0);
    (point, value, iter, false)
}

/// Point `from + t * (to - from)`.
fn towards(from: &[f64], to: &[f64], t: f64) -> Vec<f64> {
    from.iter().zip(to).map(|(a, b)| a + t * (b - a)).collect()
}

fn clamp(mut point: Vec<f64>, bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    if let Some(bounds) = bounds {
        for (x, &(lo, hi)) in point.iter_mut().zip(bounds) {
            *x = x.clamp(lo, hi);
        }
    }
    point
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn minimises_shifted_quadratic() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            None,
            NelderMeadConfig::default(),
        );
        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 2.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_point[1], 3.0, epsilon = 1e-3);
    }

    #[test]
    fn rosenbrock_valley() {
        let result = nelder_mead(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2),
            &[-1.2, 1.0],
            None,
            NelderMeadConfig::default().with_max_iter(5000).with_tolerance(1e-12),
        );
        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-2);
        assert_relative_eq!(result.optimal_point[1], 1.0, epsilon = 2e-2);
    }

    #[test]
    fn respects_bounds() {
        let bounds = [(0.0, 1.0)];
        let result = nelder_mead(
            |x| (x[0] - 5.0).powi(2),
            &[0.5],
            Some(&bounds),
            NelderMeadConfig::default(),
        );
        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn infeasible_values_are_avoided() {
        let result = nelder_mead(
            |x| if x[0] < 0.0 { f64::NAN } else { (x[0] - 0.3).powi(2) },
            &[0.8],
            None,
            NelderMeadConfig::default(),
        );
        assert!(result.optimal_value.is_finite());
        assert_relative_eq!(result.optimal_point[0], 0.3, epsilon = 1e-3);
    }
}
