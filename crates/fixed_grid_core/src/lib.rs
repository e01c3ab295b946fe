//! The `fixed_grid_core` crate advances ODE states across a fixed time grid with
//! explicit Runge-Kutta methods. It is generic over the state type, and every
//! derivative evaluation is tagged with the side of a potential jump it wants,
//! so functions that switch behaviour exactly on grid points stay well-defined.
//!
//! Key components:
//! - **Traits**: `Scalar` (time type), `State` (anything that can be scaled and added),
//!   `DerivativeFunction` (the right-hand side), `Steppable` (one grid step).
//! - **Perturb**: the `Next`/`Prev`/`None` tag plus `Continuous` and `Nudged` adapters.
//! - **Tableau / RK**: validated Butcher tableaux and the shared stage evaluator.
//! - **Solvers**: Euler, Midpoint, Heun2, Heun3 and RK4 (3/8 rule), and the `Solver` enum.
//! - **Grid**: a reference driving loop and uniform grid construction.
//! - **Autodiff**: Dual numbers for differentiating a trajectory through its steps.

pub mod autodiff;
pub mod error;
pub mod grid;
pub mod perturb;
pub mod rk;
pub mod solvers;
pub mod tableau;
pub mod traits;

pub use error::{GridError, SettingsError, TableauError};
pub use perturb::Perturb;
pub use solvers::{MethodKind, Solver, SolverSettings, StepResult};
pub use traits::{DerivativeFunction, Scalar, State, Steppable};
