// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
#![allow(non_snake_case)]

use crate::errors::{CollocationError, Result};
use crate::numerical::LM_solver::Solver;
use crate::numerical::integrator_chains::find_integrator_chains;
use crate::numerical::vectorfield::{
    consistency_error, saturation_functions, sym2num_jacobian, sym2num_vectorfield,
};
use crate::symbolic::symbolic_engine::Expr;
use log::info;
use nalgebra::{DMatrix, DVector};

/// damped pendulum: x1 angle, x2 angular velocity, u1 torque
pub fn pendulum(x: &[Expr], u: &[Expr]) -> DMatrix<Expr> {
    DMatrix::from_row_slice(
        1,
        2,
        &[
            x[1].clone(),
            -Expr::sin(x[0].clone().boxed()) - 0.1 * x[1].clone() + u[0].clone(),
        ],
    )
}

/// cart position, cart velocity, pendulum angle, angular velocity; input is the cart acceleration
pub fn cart_pendulum(x: &[Expr], u: &[Expr]) -> DMatrix<Expr> {
    let g = 9.81;
    let l = 0.5;
    let phi = x[2].clone();
    DMatrix::from_column_slice(
        4,
        1,
        &[
            x[1].clone(),
            u[0].clone(),
            x[3].clone(),
            (1.0 / l)
                * (g * Expr::sin(phi.clone().boxed()) + u[0].clone() * Expr::cos(phi.boxed())),
        ],
    )
}

/// Equilibrium of the pendulum for a constant torque: `f(x, u) = 0` solved for `x` by
/// Levenberg-Marquardt with the compiled vector field and its jacobian.
pub fn pendulum_equilibrium(u_value: f64, x0: DVector<f64>, tol: f64) -> Result<DVector<f64>> {
    let x_sym = Expr::Symbols("x1, x2");
    let u_sym = Expr::Symbols("u1");
    let n = x_sym.len();
    if x0.len() != n {
        return Err(CollocationError::shape("initial state", n, x0.len()));
    }
    let f = sym2num_vectorfield(pendulum, &x_sym, &u_sym)?;
    let df = sym2num_jacobian(pendulum, &x_sym, &u_sym)?;
    let u = DVector::from_vec(vec![u_value]);
    let u_jac = u.clone();

    // the solver keeps the length of x0, so the compiled field never sees a wrong length
    let F = move |x: &DVector<f64>| {
        f(x, &u).unwrap_or_else(|_| DVector::from_element(n, f64::NAN))
    };
    // only the state columns of ∂f/∂(x, u)
    let DF = move |x: &DVector<f64>| match df(x, &u_jac) {
        Ok(jac) => jac.columns(0, n).into_owned(),
        Err(_) => DMatrix::from_element(n, n, f64::NAN),
    };
    let mut solver = Solver::new(F, DF, x0);
    solver.set_solver_params(Some(tol), Some(100), None)?;
    solver.solve()
}

pub fn trajectory_examples(example: usize) -> Result<()> {
    match example {
        0 => {
            // integrator chains of the cart pendulum: x1 -> x2 -> u1 and x3 -> x4
            let x_sym = Expr::Symbols("x1, x2, x3, x4");
            let u_sym = Expr::Symbols("u1");
            let F = cart_pendulum(&x_sym, &u_sym);
            let fi: Vec<Expr> = F.iter().cloned().collect();
            let res = find_integrator_chains(&fi, &x_sym, &u_sym)?;
            for chain in &res.chains {
                info!("chain: {}", chain);
            }
            info!("equations solved by collocation: {:?}", res.eqind);

            let f = sym2num_vectorfield(cart_pendulum, &x_sym, &u_sym)?;
            let x = DVector::from_vec(vec![0.0, 0.0, 0.1, 0.0]);
            let u = DVector::from_vec(vec![-1.0]);
            info!("f(x, u) = {}", f(&x, &u)?);
        }
        1 => {
            let x = pendulum_equilibrium(0.5, DVector::from_vec(vec![0.3, 0.2]), 1e-10)?;
            info!("equilibrium for u = 0.5: {}, asin(0.5) = {}", x, 0.5f64.asin());
        }
        2 => {
            // constrained state |x| < 1 through a saturation function of an unconstrained solution
            let (psi, dpsi) = saturation_functions(|t: f64| 3.0 * t, |_t: f64| 3.0, -1.0, 1.0);
            for t in [-1.0, -0.1, 0.0, 0.1, 1.0] {
                info!("t = {:5.2}  psi = {:8.5}  dpsi = {:8.5}", t, psi(t), dpsi(t));
            }
            // consistency of an approximate solution of the pendulum without friction
            let ff = |x: &DVector<f64>, _u: &DVector<f64>| DVector::from_vec(vec![x[1], -x[0]]);
            let x_fnc = |t: f64| DVector::from_vec(vec![t - t.powi(3) / 6.0, 1.0 - t * t / 2.0]);
            let dx_fnc = |t: f64| DVector::from_vec(vec![1.0 - t * t / 2.0, -t]);
            let u_fnc = |_t: f64| DVector::from_vec(vec![0.0]);
            let (max_err, _) = consistency_error((0.0, 1.0), x_fnc, u_fnc, dx_fnc, ff, 100)?;
            info!("consistency error of the Taylor approximation: {}", max_err);
        }
        _ => info!("no example with number {}", example),
    }
    Ok(())
}
