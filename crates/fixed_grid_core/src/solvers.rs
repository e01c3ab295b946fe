use crate::error::{SettingsError, TableauError};
use crate::perturb::Perturb;
use crate::rk;
use crate::tableau::ButcherTableau;
use crate::traits::{DerivativeFunction, Scalar, State, Steppable};
use anyhow::Result;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of one grid step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult<S> {
    /// Full-step change: `y1 = y0 + increment`.
    pub increment: S,
    /// `f(t0, y0)` as evaluated at the start of the step, returned for reuse.
    pub f0: S,
}

/// Evaluates `f(t0, y0)` once, tagged for the start of a step in the direction of `dt`.
fn start_derivative<T, S, F>(f: &F, t0: T, dt: T, y0: &S, perturb: bool) -> Result<S>
where
    T: Scalar,
    S: State<T>,
    F: DerivativeFunction<T, S> + ?Sized,
{
    f.eval(t0, y0, Perturb::at_start(perturb, dt))
}

/// Forward Euler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euler {
    pub perturb: bool,
}

impl Euler {
    pub const ORDER: u32 = 1;

    pub fn new(perturb: bool) -> Self {
        Self { perturb }
    }
}

impl<T: Scalar> Steppable<T> for Euler {
    fn order(&self) -> u32 {
        Self::ORDER
    }

    fn step<S, F>(&self, f: &F, t0: T, dt: T, _t1: T, y0: &S) -> Result<StepResult<S>>
    where
        S: State<T>,
        F: DerivativeFunction<T, S> + ?Sized,
    {
        let f0 = start_derivative(f, t0, dt, y0, self.perturb)?;
        Ok(StepResult {
            increment: f0.scaled(dt),
            f0,
        })
    }
}

/// Explicit midpoint rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct Midpoint {
    pub perturb: bool,
}

impl Midpoint {
    pub const ORDER: u32 = 2;

    pub fn new(perturb: bool) -> Self {
        Self { perturb }
    }
}

impl<T: Scalar> Steppable<T> for Midpoint {
    fn order(&self) -> u32 {
        Self::ORDER
    }

    fn step<S, F>(&self, f: &F, t0: T, dt: T, _t1: T, y0: &S) -> Result<StepResult<S>>
    where
        S: State<T>,
        F: DerivativeFunction<T, S> + ?Sized,
    {
        let half_dt = T::lit(0.5) * dt;
        let f0 = start_derivative(f, t0, dt, y0, self.perturb)?;
        let y_mid = y0.plus(&f0.scaled(half_dt));
        // The midpoint is never a grid boundary.
        let f_mid = f.eval(t0 + half_dt, &y_mid, Perturb::None)?;
        Ok(StepResult {
            increment: f_mid.scaled(dt),
            f0,
        })
    }
}

/// Heun's second-order method, driven through its tableau.
#[derive(Debug, Clone)]
pub struct Heun2<T: Scalar> {
    tableau: ButcherTableau<T>,
    pub perturb: bool,
}

impl<T: Scalar> Heun2<T> {
    pub const ORDER: u32 = 2;

    pub fn new(perturb: bool) -> Result<Self, TableauError> {
        Ok(Self {
            tableau: ButcherTableau::heun2()?,
            perturb,
        })
    }

    pub fn tableau(&self) -> &ButcherTableau<T> {
        &self.tableau
    }
}

impl<T: Scalar> Steppable<T> for Heun2<T> {
    fn order(&self) -> u32 {
        Self::ORDER
    }

    fn step<S, F>(&self, f: &F, t0: T, dt: T, t1: T, y0: &S) -> Result<StepResult<S>>
    where
        S: State<T>,
        F: DerivativeFunction<T, S> + ?Sized,
    {
        let f0 = start_derivative(f, t0, dt, y0, self.perturb)?;
        rk::evaluate(f, t0, dt, t1, y0, &self.tableau, f0, self.perturb)
    }
}

/// Heun's third-order method, driven through its tableau.
#[derive(Debug, Clone)]
pub struct Heun3<T: Scalar> {
    tableau: ButcherTableau<T>,
    pub perturb: bool,
}

impl<T: Scalar> Heun3<T> {
    pub const ORDER: u32 = 3;

    pub fn new(perturb: bool) -> Result<Self, TableauError> {
        Ok(Self {
            tableau: ButcherTableau::heun3()?,
            perturb,
        })
    }

    pub fn tableau(&self) -> &ButcherTableau<T> {
        &self.tableau
    }
}

impl<T: Scalar> Steppable<T> for Heun3<T> {
    fn order(&self) -> u32 {
        Self::ORDER
    }

    fn step<S, F>(&self, f: &F, t0: T, dt: T, t1: T, y0: &S) -> Result<StepResult<S>>
    where
        S: State<T>,
        F: DerivativeFunction<T, S> + ?Sized,
    {
        let f0 = start_derivative(f, t0, dt, y0, self.perturb)?;
        rk::evaluate(f, t0, dt, t1, y0, &self.tableau, f0, self.perturb)
    }
}

/// Fourth-order Runge-Kutta in Kutta's 3/8 form.
///
/// Slightly more work than the classic variant in exchange for a smaller
/// error constant, and its last stage sits on `t1` where the boundary tag
/// applies.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rk4 {
    pub perturb: bool,
}

impl Rk4 {
    pub const ORDER: u32 = 4;

    pub fn new(perturb: bool) -> Self {
        Self { perturb }
    }
}

impl<T: Scalar> Steppable<T> for Rk4 {
    fn order(&self) -> u32 {
        Self::ORDER
    }

    fn step<S, F>(&self, f: &F, t0: T, dt: T, t1: T, y0: &S) -> Result<StepResult<S>>
    where
        S: State<T>,
        F: DerivativeFunction<T, S> + ?Sized,
    {
        let f0 = start_derivative(f, t0, dt, y0, self.perturb)?;
        let increment = rk::three_eighths_increment(f, t0, dt, t1, y0, &f0, self.perturb)?;
        Ok(StepResult { increment, f0 })
    }
}

/// Names of the available fixed-grid methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Euler,
    Midpoint,
    Heun2,
    Heun3,
    Rk4,
}

impl MethodKind {
    pub const ALL: [MethodKind; 5] = [
        MethodKind::Euler,
        MethodKind::Midpoint,
        MethodKind::Heun2,
        MethodKind::Heun3,
        MethodKind::Rk4,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MethodKind::Euler => "euler",
            MethodKind::Midpoint => "midpoint",
            MethodKind::Heun2 => "heun2",
            MethodKind::Heun3 => "heun3",
            MethodKind::Rk4 => "rk4",
        }
    }

    pub fn order(self) -> u32 {
        match self {
            MethodKind::Euler => Euler::ORDER,
            MethodKind::Midpoint => Midpoint::ORDER,
            MethodKind::Heun2 => Heun2::<f64>::ORDER,
            MethodKind::Heun3 => Heun3::<f64>::ORDER,
            MethodKind::Rk4 => Rk4::ORDER,
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MethodKind {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        MethodKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| SettingsError::UnknownMethod(s.to_string()))
    }
}

/// Settings selecting a fixed-grid method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    pub method: MethodKind,
    /// Tag boundary evaluations with the one-sided limit from inside the step.
    #[serde(default)]
    pub perturb: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            method: MethodKind::Rk4,
            perturb: false,
        }
    }
}

/// A fixed-grid method chosen at runtime.
#[derive(Debug, Clone)]
pub enum Solver<T: Scalar> {
    Euler(Euler),
    Midpoint(Midpoint),
    Heun2(Heun2<T>),
    Heun3(Heun3<T>),
    Rk4(Rk4),
}

impl<T: Scalar> Solver<T> {
    /// Builds the method, validating its tableau if it has one.
    pub fn new(kind: MethodKind, perturb: bool) -> Result<Self, TableauError> {
        let solver = match kind {
            MethodKind::Euler => Solver::Euler(Euler::new(perturb)),
            MethodKind::Midpoint => Solver::Midpoint(Midpoint::new(perturb)),
            MethodKind::Heun2 => Solver::Heun2(Heun2::new(perturb)?),
            MethodKind::Heun3 => Solver::Heun3(Heun3::new(perturb)?),
            MethodKind::Rk4 => Solver::Rk4(Rk4::new(perturb)),
        };
        debug!("built {kind} solver (order {}, perturb {perturb})", kind.order());
        Ok(solver)
    }

    pub fn from_settings(settings: &SolverSettings) -> Result<Self, TableauError> {
        Self::new(settings.method, settings.perturb)
    }

    pub fn kind(&self) -> MethodKind {
        match self {
            Solver::Euler(_) => MethodKind::Euler,
            Solver::Midpoint(_) => MethodKind::Midpoint,
            Solver::Heun2(_) => MethodKind::Heun2,
            Solver::Heun3(_) => MethodKind::Heun3,
            Solver::Rk4(_) => MethodKind::Rk4,
        }
    }

    pub fn perturb(&self) -> bool {
        match self {
            Solver::Euler(s) => s.perturb,
            Solver::Midpoint(s) => s.perturb,
            Solver::Heun2(s) => s.perturb,
            Solver::Heun3(s) => s.perturb,
            Solver::Rk4(s) => s.perturb,
        }
    }
}

impl<T: Scalar> Steppable<T> for Solver<T> {
    fn order(&self) -> u32 {
        self.kind().order()
    }

    fn step<S, F>(&self, f: &F, t0: T, dt: T, t1: T, y0: &S) -> Result<StepResult<S>>
    where
        S: State<T>,
        F: DerivativeFunction<T, S> + ?Sized,
    {
        match self {
            Solver::Euler(s) => s.step(f, t0, dt, t1, y0),
            Solver::Midpoint(s) => s.step(f, t0, dt, t1, y0),
            Solver::Heun2(s) => s.step(f, t0, dt, t1, y0),
            Solver::Heun3(s) => s.step(f, t0, dt, t1, y0),
            Solver::Rk4(s) => s.step(f, t0, dt, t1, y0),
        }
    }
}
