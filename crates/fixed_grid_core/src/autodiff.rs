use crate::traits::State;
use nalgebra::DVector;
use std::ops::{Add, Mul, Neg, Sub};

/// Simple Dual Number for Forward Mode AD
/// val: real part
/// eps: derivative with respect to whatever was seeded
///
/// Stepping a `Dual` state carries `d y / d seed` along with the trajectory,
/// so the branch a right-hand side picked at a jump shows up in `eps`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Dual {
    pub val: f64,
    pub eps: f64,
}

impl Dual {
    pub fn new(val: f64, eps: f64) -> Self {
        Self { val, eps }
    }

    /// A value that does not depend on the seed.
    pub fn constant(val: f64) -> Self {
        Self::new(val, 0.0)
    }

    /// The seeded variable itself.
    pub fn variable(val: f64) -> Self {
        Self::new(val, 1.0)
    }
}

impl Add for Dual {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.val + rhs.val, self.eps + rhs.eps)
    }
}

impl Sub for Dual {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.val - rhs.val, self.eps - rhs.eps)
    }
}

impl Mul for Dual {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.val * rhs.val, self.val * rhs.eps + self.eps * rhs.val)
    }
}

impl Mul<f64> for Dual {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.val * rhs, self.eps * rhs)
    }
}

impl Mul<Dual> for f64 {
    type Output = Dual;
    fn mul(self, rhs: Dual) -> Dual {
        rhs * self
    }
}

impl Neg for Dual {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.val, -self.eps)
    }
}

impl State<f64> for Dual {
    fn scaled(&self, k: f64) -> Self {
        *self * k
    }

    fn plus(&self, rhs: &Self) -> Self {
        *self + *rhs
    }
}

impl State<f64> for DVector<Dual> {
    fn scaled(&self, k: f64) -> Self {
        self.map(|d| d * k)
    }

    fn plus(&self, rhs: &Self) -> Self {
        self.zip_map(rhs, |a, b| a + b)
    }
}

/// Pairs a point with the direction to differentiate along.
pub fn seed(x: &DVector<f64>, direction: &DVector<f64>) -> DVector<Dual> {
    x.zip_map(direction, Dual::new)
}

/// Real parts of a dual vector.
pub fn value(y: &DVector<Dual>) -> DVector<f64> {
    y.map(|d| d.val)
}

/// Directional derivative carried by a dual vector.
pub fn tangent(y: &DVector<Dual>) -> DVector<f64> {
    y.map(|d| d.eps)
}
