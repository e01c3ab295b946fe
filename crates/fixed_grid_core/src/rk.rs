//! Stage evaluation shared by the tableau-driven methods, plus the
//! hand-unrolled 3/8-rule used by [`crate::solvers::Rk4`].

use crate::perturb::Perturb;
use crate::solvers::StepResult;
use crate::tableau::ButcherTableau;
use crate::traits::{DerivativeFunction, Scalar, State};
use anyhow::{Context, Result};

/// Runs stages 2..s of an explicit RK method and reduces them to an increment.
///
/// `f0` must already be `f(t0, y0)` evaluated with the start-of-step tag; it
/// is used as stage 1 and handed back untouched in the result.
#[allow(clippy::too_many_arguments)]
pub fn evaluate<T, S, F>(
    f: &F,
    t0: T,
    dt: T,
    t1: T,
    y0: &S,
    tableau: &ButcherTableau<T>,
    f0: S,
    perturb: bool,
) -> Result<StepResult<S>>
where
    T: Scalar,
    S: State<T>,
    F: DerivativeFunction<T, S> + ?Sized,
{
    let stages = tableau.stages();
    let mut k: Vec<S> = Vec::with_capacity(stages);
    k.push(f0);

    for i in 1..stages {
        let c = tableau.node(i);
        let dy = S::weighted_sum(tableau.coeffs(i), &k[..i])
            .context("stage coefficients do not cover the computed stages")?;
        let y_i = y0.plus(&dy.scaled(dt));
        // A node at 1 is evaluated on the caller's endpoint, not a recomputed t0 + dt.
        let t_i = if c == T::one() { t1 } else { t0 + c * dt };
        let k_i = f.eval(t_i, &y_i, Perturb::for_node(c, perturb, dt))?;
        k.push(k_i);
    }

    let increment = S::weighted_sum(tableau.weights(), &k)
        .context("output weights do not cover the computed stages")?
        .scaled(dt);
    let f0 = k.swap_remove(0);
    Ok(StepResult { increment, f0 })
}

/// Kutta's 3/8-rule with `k1 = f0`.
///
/// The fourth stage lands on `t1` and is tagged as the limit from inside the
/// step when the protocol is on.
pub fn three_eighths_increment<T, S, F>(
    f: &F,
    t0: T,
    dt: T,
    t1: T,
    y0: &S,
    f0: &S,
    perturb: bool,
) -> Result<S>
where
    T: Scalar,
    S: State<T>,
    F: DerivativeFunction<T, S> + ?Sized,
{
    let third = T::one() / T::lit(3.0);
    let two_thirds = T::lit(2.0) / T::lit(3.0);
    let k1 = f0;

    let y2 = y0.plus(&k1.scaled(third).scaled(dt));
    let k2 = f.eval(t0 + dt * third, &y2, Perturb::None)?;

    let y3 = y0.plus(&k2.plus(&k1.scaled(-third)).scaled(dt));
    let k3 = f.eval(t0 + dt * two_thirds, &y3, Perturb::None)?;

    let y4 = y0.plus(&k1.plus(&k2.scaled(-T::one())).plus(&k3).scaled(dt));
    let k4 = f.eval(t1, &y4, Perturb::at_end(perturb, dt))?;

    let eighth = T::one() / T::lit(8.0);
    Ok(k1
        .plus(&k2.plus(&k3).scaled(T::lit(3.0)))
        .plus(&k4)
        .scaled(dt * eighth))
}
