//! Which one-sided value of the right-hand side an evaluation asks for.
//!
//! Every derivative evaluation inside a step carries a [`Perturb`] tag. Grid
//! boundaries are the only places a jump in `f` matters: the step start is
//! evaluated as the limit from inside the step beyond `t0`, a stage landing
//! exactly on `t1` as the limit from inside the step before `t1`, and
//! everything in between untagged. Which of `Next`/`Prev` that is depends on
//! the sign of `dt`.

use crate::traits::{DerivativeFunction, Scalar};
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Perturb {
    /// Natural value of `f` at `t`.
    #[default]
    None,
    /// Right-hand limit: the value just after a jump at `t`.
    Next,
    /// Left-hand limit: the value just before a jump at `t`.
    Prev,
}

impl Perturb {
    /// Tag for the evaluation at `t0` that opens every step.
    ///
    /// A forward step leaves `t0` upwards and wants the right-hand limit; a
    /// backward step (`dt < 0`) leaves downwards and wants the left-hand one.
    pub fn at_start<T: Scalar>(enabled: bool, dt: T) -> Self {
        if !enabled {
            Perturb::None
        } else if dt < T::zero() {
            Perturb::Prev
        } else {
            Perturb::Next
        }
    }

    /// Tag for an evaluation placed exactly on `t1`, approached from inside the step.
    pub fn at_end<T: Scalar>(enabled: bool, dt: T) -> Self {
        if !enabled {
            Perturb::None
        } else if dt < T::zero() {
            Perturb::Next
        } else {
            Perturb::Prev
        }
    }

    /// Tag for an intermediate stage at fraction `c` of the interval.
    ///
    /// Only `c == 1` touches the far boundary; any other node is interior.
    /// Stage 1 (`c == 0`) never reaches here because it reuses `f0`.
    pub fn for_node<T: Scalar>(c: T, enabled: bool, dt: T) -> Self {
        if c == T::one() {
            Self::at_end(enabled, dt)
        } else {
            Perturb::None
        }
    }
}

/// Adapter for right-hand sides that are continuous in `t`.
///
/// The perturbation tag is dropped, so every side of a grid point sees the
/// same value.
pub struct Continuous<F>(pub F);

impl<T, S, F> DerivativeFunction<T, S> for Continuous<F>
where
    T: Scalar,
    F: Fn(T, &S) -> Result<S>,
{
    fn eval(&self, t: T, y: &S, _perturb: Perturb) -> Result<S> {
        (self.0)(t, y)
    }
}

/// Adapter that resolves one-sided limits by moving `t` by one ulp.
///
/// A piecewise right-hand side such as `if t < 1.0 { a } else { b }` returns
/// `b` at exactly `t = 1.0`. Wrapped in `Nudged`, a `Prev` evaluation at
/// `1.0` sees `a` instead, which is the branch the step ending there
/// actually integrated.
pub struct Nudged<F>(pub F);

impl<T, S, F> DerivativeFunction<T, S> for Nudged<F>
where
    T: Scalar,
    F: Fn(T, &S) -> Result<S>,
{
    fn eval(&self, t: T, y: &S, perturb: Perturb) -> Result<S> {
        let t = match perturb {
            Perturb::None => t,
            Perturb::Next => t.nudge_up(),
            Perturb::Prev => t.nudge_down(),
        };
        (self.0)(t, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_protocol_is_always_none() {
        for dt in [0.5_f64, -0.5] {
            assert_eq!(Perturb::at_start(false, dt), Perturb::None);
            assert_eq!(Perturb::at_end(false, dt), Perturb::None);
            assert_eq!(Perturb::for_node(1.0, false, dt), Perturb::None);
        }
        assert_eq!(Perturb::default(), Perturb::None);
    }

    #[test]
    fn enabled_protocol_tags_boundaries_only() {
        assert_eq!(Perturb::at_start(true, 0.5_f64), Perturb::Next);
        assert_eq!(Perturb::at_end(true, 0.5_f64), Perturb::Prev);
        assert_eq!(Perturb::for_node(1.0_f64, true, 0.5), Perturb::Prev);
        assert_eq!(Perturb::for_node(0.5_f64, true, 0.5), Perturb::None);
        assert_eq!(Perturb::for_node(2.0 / 3.0_f64, true, 0.5), Perturb::None);
    }

    #[test]
    fn backward_steps_swap_the_boundary_sides() {
        assert_eq!(Perturb::at_start(true, -0.5_f64), Perturb::Prev);
        assert_eq!(Perturb::at_end(true, -0.5_f64), Perturb::Next);
        assert_eq!(Perturb::for_node(1.0_f64, true, -0.5), Perturb::Next);
        assert_eq!(Perturb::for_node(1.0_f64 / 3.0, true, -0.5), Perturb::None);
    }

    #[test]
    fn nudged_resolves_one_sided_limits_of_a_step_function() {
        let f = Nudged(|t: f64, _y: &f64| -> Result<f64> {
            Ok(if t < 1.0 { 2.0 } else { -3.0 })
        });
        assert_eq!(f.eval(1.0, &0.0, Perturb::None).unwrap(), -3.0);
        assert_eq!(f.eval(1.0, &0.0, Perturb::Next).unwrap(), -3.0);
        assert_eq!(f.eval(1.0, &0.0, Perturb::Prev).unwrap(), 2.0);
    }

    #[test]
    fn continuous_ignores_the_tag() {
        let f = Continuous(|t: f64, y: &f64| -> Result<f64> { Ok(t * y) });
        for p in [Perturb::None, Perturb::Next, Perturb::Prev] {
            assert_eq!(f.eval(2.0, &3.0, p).unwrap(), 6.0);
        }
    }

    #[test]
    fn nudging_moves_by_exactly_one_representable_value() {
        let t = 0.5_f64;
        assert!(t.nudge_up() > t);
        assert!(t.nudge_down() < t);
        assert_eq!(t.nudge_up().nudge_down(), t);
        assert!((-0.0_f64).nudge_up() > 0.0);
        assert!(0.0_f64.nudge_down() < 0.0);
        assert!((-2.0_f32).nudge_up() > -2.0);
    }
}
