//! Derivative-free minimization on top of `argmin`'s Nelder-Mead solver
//!
//! Objectives are plain closures over a parameter slice. Non-finite
//! objective values are replaced by a large finite penalty so the simplex
//! ordering stays well defined.

use crate::{MathError, Result};
use argmin::core::{CostFunction, Error, Executor, State, TerminationReason, TerminationStatus};
use argmin::solver::neldermead::NelderMead;

/// Cost reported for parameter vectors where the objective is not finite
pub const PENALTY: f64 = 1e100;

/// Nelder-Mead tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NelderMeadOptions {
    /// Iteration cap
    pub max_iters: u64,
    /// Stop once the standard deviation of simplex costs falls below this
    pub sd_tolerance: f64,
    /// Offset of each initial simplex vertex from the starting point
    pub initial_step: f64,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iters: 5000,
            sd_tolerance: 1e-10,
            initial_step: 0.1,
        }
    }
}

/// Best point found by [`minimize`]
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    /// Parameter vector
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Iterations performed
    pub iterations: u64,
}

struct Objective<F> {
    f: F,
}

impl<F> CostFunction for Objective<F>
where
    F: Fn(&[f64]) -> f64,
{
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> std::result::Result<Self::Output, Error> {
        let value = (self.f)(param);
        Ok(if value.is_finite() { value } else { PENALTY })
    }
}

/// Minimize `objective` starting from `initial`.
///
/// The search is fully deterministic for a given objective and start.
/// An empty `initial` evaluates the objective once and returns.
pub fn minimize<F>(objective: F, initial: &[f64], options: &NelderMeadOptions) -> Result<Minimum>
where
    F: Fn(&[f64]) -> f64,
{
    if initial.is_empty() {
        let value = objective(initial);
        return Ok(Minimum {
            point: Vec::new(),
            value,
            iterations: 0,
        });
    }

    if initial.iter().any(|x| !x.is_finite()) {
        return Err(MathError::InvalidInput(
            "Initial point must be finite".to_string(),
        ));
    }

    let mut simplex = Vec::with_capacity(initial.len() + 1);
    simplex.push(initial.to_vec());
    for i in 0..initial.len() {
        let mut vertex = initial.to_vec();
        vertex[i] += options.initial_step * initial[i].abs().max(1.0);
        simplex.push(vertex);
    }

    let solver = NelderMead::new(simplex)
        .with_sd_tolerance(options.sd_tolerance)
        .map_err(|e| MathError::OptimizationError(e.to_string()))?;

    let result = Executor::new(Objective { f: objective }, solver)
        .configure(|state| state.max_iters(options.max_iters))
        .run()
        .map_err(|e| MathError::OptimizationError(e.to_string()))?;

    let state = result.state();
    if let TerminationStatus::Terminated(TerminationReason::MaxItersReached) =
        state.get_termination_status()
    {
        return Err(MathError::OptimizationError(format!(
            "Nelder-Mead did not converge within {} iterations",
            options.max_iters
        )));
    }

    let point = state.get_best_param().cloned().ok_or_else(|| {
        MathError::OptimizationError("Solver finished without a best point".to_string())
    })?;
    let value = state.get_best_cost();

    if value >= PENALTY {
        return Err(MathError::OptimizationError(
            "Objective was not finite anywhere the simplex visited".to_string(),
        ));
    }

    tracing::trace!(iterations = state.get_iter(), value, "nelder-mead finished");

    Ok(Minimum {
        point,
        value,
        iterations: state.get_iter(),
    })
}

/// Map an unconstrained real onto `(0, 1)`
pub fn to_unit_interval(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Inverse of [`to_unit_interval`]; `p` is clamped away from 0 and 1
pub fn from_unit_interval(p: f64) -> f64 {
    let p = p.clamp(1e-9, 1.0 - 1e-9);
    (p / (1.0 - p)).ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_minimize_quadratic() {
        let min = minimize(
            |x| (x[0] - 2.0).powi(2) + (x[1] + 3.0).powi(2),
            &[0.0, 0.0],
            &NelderMeadOptions::default(),
        )
        .unwrap();

        assert_relative_eq!(min.point[0], 2.0, epsilon = 1e-3);
        assert_relative_eq!(min.point[1], -3.0, epsilon = 1e-3);
        assert!(min.value < 1e-6);
    }

    #[test]
    fn test_minimize_is_deterministic() {
        let f = |x: &[f64]| (x[0] - 0.7).powi(2) + 0.5 * (x[0] * x[1] - 1.0).powi(2);
        let opts = NelderMeadOptions::default();
        let a = minimize(f, &[0.1, 0.1], &opts).unwrap();
        let b = minimize(f, &[0.1, 0.1], &opts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_minimize_without_parameters() {
        let min = minimize(|_| 4.0, &[], &NelderMeadOptions::default()).unwrap();
        assert!(min.point.is_empty());
        assert_eq!(min.value, 4.0);
    }

    #[test]
    fn test_non_finite_start_rejected() {
        let result = minimize(|x| x[0], &[f64::NAN], &NelderMeadOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_interval_maps_round_trip() {
        for p in [0.01, 0.3, 0.5, 0.99] {
            assert_relative_eq!(to_unit_interval(from_unit_interval(p)), p, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_iteration_cap_is_an_error() {
        let rosenbrock =
            |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let options = NelderMeadOptions {
            max_iters: 5,
            ..NelderMeadOptions::default()
        };
        let result = minimize(rosenbrock, &[-1.2, 1.0], &options);
        assert!(matches!(result, Err(MathError::OptimizationError(_))));
    }
}
