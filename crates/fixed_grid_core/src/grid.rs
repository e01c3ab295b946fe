//! Minimal driving loop over a fixed time grid.
//!
//! No interpolation happens here: states are reported at the grid points
//! only, and every interval is covered by exactly one solver step.

use crate::error::GridError;
use crate::traits::{DerivativeFunction, Scalar, State, Steppable};
use anyhow::Result;
use log::{debug, trace};

/// Builds a grid from `start` towards `end` with spacing `step`.
///
/// The last point is forced to exactly `end`, so the final interval may be
/// shorter than `step`. A span that divides into `step` up to round-off is
/// split evenly. Integrating backwards needs a negative `step`.
pub fn uniform_grid<T: Scalar>(start: T, end: T, step: T) -> Result<Vec<T>, GridError> {
    if !start.is_finite() {
        return Err(GridError::NonFinite { index: 0 });
    }
    if !end.is_finite() {
        return Err(GridError::NonFinite { index: 1 });
    }
    if start == end {
        return Err(GridError::TooShort(1));
    }
    let span = end - start;
    if !step.is_finite() || step == T::zero() || span.signum() != step.signum() {
        return Err(GridError::BadStepSize);
    }

    // A span that is a whole number of steps up to round-off gets exactly that
    // many intervals, instead of a sliver at the end.
    let ratio = span / step;
    let nearest = ratio.round();
    let slack = T::lit(64.0) * T::epsilon() * ratio.max(T::one());
    let intervals = if nearest >= T::one() && (ratio - nearest).abs() <= slack {
        nearest
    } else {
        ratio.ceil()
    };
    let intervals = intervals.to_usize().ok_or(GridError::BadStepSize)?;

    let mut grid = Vec::with_capacity(intervals + 1);
    for i in 0..intervals {
        let t = start + T::from_usize(i).ok_or(GridError::BadStepSize)? * step;
        // Only points strictly before `end` in the direction of travel.
        if (end - t) * step.signum() > T::zero() {
            grid.push(t);
        }
    }
    grid.push(end);
    Ok(grid)
}

/// Checks that `grid` has at least two finite, strictly monotonic points.
pub fn validate_grid<T: Scalar>(grid: &[T]) -> Result<(), GridError> {
    if grid.len() < 2 {
        return Err(GridError::TooShort(grid.len()));
    }
    if let Some(index) = grid.iter().position(|t| !t.is_finite()) {
        return Err(GridError::NonFinite { index });
    }
    let forward = grid[1] > grid[0];
    for (i, pair) in grid.windows(2).enumerate() {
        let ok = if forward {
            pair[1] > pair[0]
        } else {
            pair[1] < pair[0]
        };
        if !ok {
            return Err(GridError::NotMonotonic { index: i + 1 });
        }
    }
    Ok(())
}

/// Integrates `f` across `grid`, returning the state at every grid point.
///
/// Each interval is one call to [`Steppable::step`] with `dt = t1 - t0`.
/// The first failing step aborts the whole integration.
pub fn integrate<T, S, F, M>(solver: &M, f: &F, grid: &[T], y0: &S) -> Result<Vec<S>>
where
    T: Scalar,
    S: State<T>,
    F: DerivativeFunction<T, S> + ?Sized,
    M: Steppable<T> + ?Sized,
{
    validate_grid(grid)?;
    debug!(
        "integrating over {} grid intervals with an order {} method",
        grid.len() - 1,
        solver.order()
    );

    let mut states = Vec::with_capacity(grid.len());
    states.push(y0.clone());
    let mut y = y0.clone();
    for pair in grid.windows(2) {
        let (t0, t1) = (pair[0], pair[1]);
        let dt = t1 - t0;
        trace!("step {:?} -> {:?}", t0, t1);
        let step = solver.step(f, t0, dt, t1, &y)?;
        y = y.plus(&step.increment);
        states.push(y.clone());
    }

    debug!("reached t = {:?}", grid[grid.len() - 1]);
    Ok(states)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perturb::{Continuous, Perturb};
    use crate::solvers::{MethodKind, Solver};
    use anyhow::bail;
    use std::cell::Cell;

    fn growth(_t: f64, y: &f64, _p: Perturb) -> Result<f64> {
        Ok(*y)
    }

    fn solver(kind: MethodKind) -> Solver<f64> {
        Solver::new(kind, false).expect("valid method")
    }

    fn assert_err_contains<T: std::fmt::Debug>(result: Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn euler_and_rk4_on_exponential_growth() {
        let grid = uniform_grid(0.0, 1.0, 0.25).unwrap();
        assert_eq!(grid, vec![0.0, 0.25, 0.5, 0.75, 1.0]);

        let euler = integrate(&solver(MethodKind::Euler), &growth, &grid, &1.0).unwrap();
        assert_eq!(euler.len(), 5);
        assert!((euler[4] - 1.25_f64.powi(4)).abs() < 1e-12);
        assert!((euler[4] - 2.4414).abs() < 1e-4);

        let rk4 = integrate(&solver(MethodKind::Rk4), &growth, &grid, &1.0).unwrap();
        let e = std::f64::consts::E;
        assert!((rk4[4] - e).abs() < 1e-4);
        assert!((rk4[4] - euler[4]).abs() > 0.2);
    }

    #[test]
    fn backward_integration_retraces_forward() {
        let grid = uniform_grid(1.0, 0.0, -0.05).unwrap();
        assert_eq!(grid.len(), 21);
        assert_eq!(grid[20], 0.0);

        for kind in [MethodKind::Heun3, MethodKind::Rk4] {
            let states =
                integrate(&solver(kind), &growth, &grid, &std::f64::consts::E).unwrap();
            assert!((states[20] - 1.0).abs() < 1e-4, "{kind}: {}", states[20]);
        }
    }

    #[test]
    fn continuous_adapter_plugs_into_the_driver() {
        let f = Continuous(|t: f64, _y: &f64| -> Result<f64> { Ok(2.0 * t) });
        let grid = [0.0, 0.5, 1.0, 2.0];
        for kind in [MethodKind::Midpoint, MethodKind::Heun2, MethodKind::Heun3] {
            let states = integrate(&solver(kind), &f, &grid, &0.0).unwrap();
            // Second-order methods integrate a linear right-hand side exactly.
            for (t, y) in grid.iter().zip(&states) {
                assert!((y - t * t).abs() < 1e-12, "{kind} at t = {t}");
            }
        }
    }

    #[test]
    fn uniform_grid_keeps_the_endpoint_exact() {
        let grid = uniform_grid(0.0_f64, 1.0, 0.3).unwrap();
        assert_eq!(grid.len(), 5);
        assert_eq!(grid[4], 1.0);
        assert!((grid[3] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn uniform_grid_does_not_leave_a_sliver_from_round_off() {
        // 2.1 / 0.3 and 2.7 / 0.3 both land a few ulps above a whole number.
        let grid = uniform_grid(0.0_f64, 2.1, 0.3).unwrap();
        assert_eq!(grid.len(), 8);
        assert_eq!(grid[7], 2.1);
        assert!((grid[7] - grid[6] - 0.3).abs() < 1e-12);
        assert_eq!(validate_grid(&grid), Ok(()));

        let grid = uniform_grid(0.0_f64, 2.7, 0.3).unwrap();
        assert_eq!(grid.len(), 10);
        assert_eq!(grid[9], 2.7);
        assert!((grid[9] - grid[8] - 0.3).abs() < 1e-12);

        let states = integrate(&solver(MethodKind::Rk4), &growth, &grid, &1.0).unwrap();
        assert_eq!(states.len(), 10);
        assert!((states[9] / 2.7_f64.exp() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn uniform_grid_backward_with_uneven_span() {
        let grid = uniform_grid(1.0_f64, 0.0, -0.3).unwrap();
        assert_eq!(grid.len(), 5);
        assert_eq!(grid[4], 0.0);
        assert!((grid[3] - 0.1).abs() < 1e-12);
        assert_eq!(validate_grid(&grid), Ok(()));
    }

    #[test]
    fn uniform_grid_rejects_bad_input() {
        assert_eq!(uniform_grid(0.0, 1.0, -0.1), Err(GridError::BadStepSize));
        assert_eq!(uniform_grid(0.0, 1.0, 0.0), Err(GridError::BadStepSize));
        assert_eq!(uniform_grid(0.0, 0.0, 0.1), Err(GridError::TooShort(1)));
        assert_eq!(
            uniform_grid(f64::NAN, 1.0, 0.1),
            Err(GridError::NonFinite { index: 0 })
        );
    }

    #[test]
    fn integrate_rejects_malformed_grids() {
        let s = solver(MethodKind::Euler);
        assert_err_contains(integrate(&s, &growth, &[0.0], &1.0), "at least two points");
        assert_err_contains(
            integrate(&s, &growth, &[0.0, 1.0, 1.0], &1.0),
            "not strictly monotonic at index 2",
        );
        assert_err_contains(
            integrate(&s, &growth, &[0.0, f64::INFINITY], &1.0),
            "grid point 1 is not finite",
        );
    }

    #[test]
    fn integration_stops_at_first_failing_step() {
        let steps = Cell::new(0);
        let f = |t: f64, y: &f64, _p: Perturb| -> Result<f64> {
            if t >= 0.5 {
                bail!("sensor offline at t = {t}");
            }
            steps.set(steps.get() + 1);
            Ok(*y)
        };
        let grid = [0.0, 0.25, 0.5, 0.75];
        let result = integrate(&solver(MethodKind::Euler), &f, &grid, &1.0);
        assert_err_contains(result, "sensor offline at t = 0.5");
        assert_eq!(steps.get(), 2);
    }
}
