//! Butcher tableaux for explicit Runge-Kutta methods.
//!
//! Stage `i` (0-based) is evaluated at `t0 + c[i] * dt` with the state
//! `y0 + dt * Σ_{j<i} a[i][j] * k[j]`; the step increment is
//! `dt * Σ_j b[j] * k[j]`.

use crate::error::TableauError;
use crate::traits::Scalar;

/// Immutable coefficients of an explicit (strictly lower-triangular) RK method.
#[derive(Debug, Clone, PartialEq)]
pub struct ButcherTableau<T: Scalar> {
    c: Vec<T>,
    a: Vec<Vec<T>>,
    b: Vec<T>,
}

impl<T: Scalar> ButcherTableau<T> {
    /// Builds a tableau, rejecting any row whose length does not match its
    /// stage index. Nothing is padded or truncated.
    pub fn new(c: Vec<T>, a: Vec<Vec<T>>, b: Vec<T>) -> Result<Self, TableauError> {
        let s = a.len();
        if s == 0 {
            return Err(TableauError::Empty);
        }
        if c.len() != s {
            return Err(TableauError::NodeCount {
                expected: s,
                found: c.len(),
            });
        }
        for (row, coeffs) in a.iter().enumerate() {
            if coeffs.len() != row {
                return Err(TableauError::RowLength {
                    row,
                    expected: row,
                    found: coeffs.len(),
                });
            }
        }
        if b.len() != s {
            return Err(TableauError::WeightCount {
                expected: s,
                found: b.len(),
            });
        }
        // The evaluator reuses the caller's f(t0, y0) as stage 1.
        if c[0] != T::zero() {
            return Err(TableauError::FirstNode(c[0].to_f64().unwrap_or(f64::NAN)));
        }
        Ok(Self { c, a, b })
    }

    /// Heun's second-order method (explicit trapezoid).
    pub fn heun2() -> Result<Self, TableauError> {
        let half = T::one() / T::lit(2.0);
        Self::new(
            vec![T::zero(), T::one()],
            vec![vec![], vec![T::one()]],
            vec![half, half],
        )
    }

    /// Heun's third-order method.
    pub fn heun3() -> Result<Self, TableauError> {
        let third = T::one() / T::lit(3.0);
        let two_thirds = T::lit(2.0) / T::lit(3.0);
        Self::new(
            vec![T::zero(), third, two_thirds],
            vec![vec![], vec![third], vec![T::zero(), two_thirds]],
            vec![T::one() / T::lit(4.0), T::zero(), T::lit(3.0) / T::lit(4.0)],
        )
    }

    /// Kutta's 3/8-rule, the tableau behind [`crate::solvers::Rk4`].
    pub fn three_eighths() -> Result<Self, TableauError> {
        let third = T::one() / T::lit(3.0);
        let two_thirds = T::lit(2.0) / T::lit(3.0);
        let eighth = T::one() / T::lit(8.0);
        let three_eighths = T::lit(3.0) / T::lit(8.0);
        Self::new(
            vec![T::zero(), third, two_thirds, T::one()],
            vec![
                vec![],
                vec![third],
                vec![-third, T::one()],
                vec![T::one(), -T::one(), T::one()],
            ],
            vec![eighth, three_eighths, three_eighths, eighth],
        )
    }

    /// Number of stages `s`.
    pub fn stages(&self) -> usize {
        self.a.len()
    }

    /// Node `c_i`: where stage `i` sits as a fraction of the step.
    pub fn node(&self, i: usize) -> T {
        self.c[i]
    }

    /// Coefficients `a_i,0..i` combining earlier stages into stage `i`'s state.
    pub fn coeffs(&self, i: usize) -> &[T] {
        &self.a[i]
    }

    pub fn coeff(&self, i: usize, j: usize) -> T {
        self.a[i][j]
    }

    /// Output weights `b`.
    pub fn weights(&self) -> &[T] {
        &self.b
    }

    pub fn weight(&self, j: usize) -> T {
        self.b[j]
    }
}
