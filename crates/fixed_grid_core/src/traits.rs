use crate::perturb::Perturb;
use crate::solvers::StepResult;
use anyhow::Result;
use nalgebra::{DVector, RealField, SVector};
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as time and coefficient scalars.
/// Must support basic arithmetic, debug printing, and exact construction from f64 literals.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {
    /// Converts a tableau literal, rounding to the nearest representable value.
    fn lit(x: f64) -> Self;

    /// Smallest representable value strictly greater than `self`.
    fn nudge_up(self) -> Self;

    /// Largest representable value strictly less than `self`.
    fn nudge_down(self) -> Self;
}

macro_rules! impl_scalar {
    ($t:ty) => {
        impl Scalar for $t {
            fn lit(x: f64) -> Self {
                x as $t
            }

            fn nudge_up(self) -> Self {
                if self.is_nan() || self == <$t>::INFINITY {
                    return self;
                }
                if self == 0.0 {
                    // Covers -0.0 as well: the successor of either zero is the smallest subnormal.
                    return <$t>::from_bits(1);
                }
                let bits = self.to_bits();
                if self > 0.0 {
                    <$t>::from_bits(bits + 1)
                } else {
                    <$t>::from_bits(bits - 1)
                }
            }

            fn nudge_down(self) -> Self {
                -Scalar::nudge_up(-self)
            }
        }
    };
}

impl_scalar!(f32);
impl_scalar!(f64);

/// A value that can be advanced by a Runge-Kutta step.
///
/// Only scaling by a scalar and addition are required; the stepping code never
/// inspects the shape of the state.
pub trait State<T: Scalar>: Clone {
    /// Returns `self * k`.
    fn scaled(&self, k: T) -> Self;

    /// Returns `self + rhs`.
    fn plus(&self, rhs: &Self) -> Self;

    /// Returns `Σ weights[j] * states[j]`, accumulated in ascending `j`.
    ///
    /// Zero weights still contribute a term. Returns `None` when there is
    /// nothing to sum or the slices disagree in length.
    fn weighted_sum(weights: &[T], states: &[Self]) -> Option<Self> {
        if weights.len() != states.len() {
            return None;
        }
        let (first, rest) = states.split_first()?;
        let mut acc = first.scaled(weights[0]);
        for (w, s) in weights[1..].iter().zip(rest) {
            acc = acc.plus(&s.scaled(*w));
        }
        Some(acc)
    }
}

macro_rules! impl_scalar_state {
    ($t:ty) => {
        impl State<$t> for $t {
            fn scaled(&self, k: $t) -> Self {
                self * k
            }

            fn plus(&self, rhs: &Self) -> Self {
                self + rhs
            }
        }
    };
}

impl_scalar_state!(f32);
impl_scalar_state!(f64);

impl<T: Scalar + RealField> State<T> for DVector<T> {
    fn scaled(&self, k: T) -> Self {
        self * k
    }

    fn plus(&self, rhs: &Self) -> Self {
        self + rhs
    }
}

impl<T: Scalar + RealField, const D: usize> State<T> for SVector<T, D> {
    fn scaled(&self, k: T) -> Self {
        self * k
    }

    fn plus(&self, rhs: &Self) -> Self {
        self + rhs
    }
}

/// Right-hand side `dy/dt = f(t, y)` of an ODE.
///
/// `perturb` tells the function which one-sided value is wanted when `t` sits
/// exactly on a grid point. Functions without discontinuities may ignore it.
pub trait DerivativeFunction<T: Scalar, S> {
    fn eval(&self, t: T, y: &S, perturb: Perturb) -> Result<S>;
}

impl<T, S, F> DerivativeFunction<T, S> for F
where
    T: Scalar,
    F: Fn(T, &S, Perturb) -> Result<S>,
{
    fn eval(&self, t: T, y: &S, perturb: Perturb) -> Result<S> {
        self(t, y, perturb)
    }
}

/// A trait for fixed-grid solvers that advance a state across one grid interval.
pub trait Steppable<T: Scalar> {
    /// Local truncation error order of the method.
    fn order(&self) -> u32;

    /// Performs one step from `t0` to `t1`.
    /// dt: `t1 - t0`, passed separately so the caller controls its rounding
    /// t1: authoritative right endpoint, used for boundary perturbation decisions
    /// y0: state at `t0`, left untouched
    fn step<S, F>(&self, f: &F, t0: T, dt: T, t1: T, y0: &S) -> Result<StepResult<S>>
    where
        S: State<T>,
        F: DerivativeFunction<T, S> + ?Sized;
}
