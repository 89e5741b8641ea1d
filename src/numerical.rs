/// # Integrator chains
/// search for equations of the form dx_i/dt = x_j or dx_i/dt = u_j and selection of the
/// equations that have to be solved by collocation
/// Example#1
/// ```rust, ignore
/// use RustedTrajectory::numerical::integrator_chains::find_integrator_chains;
/// use RustedTrajectory::symbolic::symbolic_engine::Expr;
///    // double integrator with a nonlinear damping term
///    let x = Expr::Symbols("x1, x2");
///    let u = Expr::Symbols("u1");
///    let fi = vec![x[1].clone(), u[0].clone() - x[1].clone().pow(Expr::Const(3.0))];
///    let res = find_integrator_chains(&fi, &x, &u).unwrap();
///    for chain in &res.chains {
///        println!("chain: {}", chain);
///    }
///    println!("equations to solve: {:?}", res.eqind);
/// ```
pub mod integrator_chains;
/// # Vector fields
/// compiles a callable symbolic vector field f(x, u) into numeric closures of the state and
/// input vectors (right hand side and its jacobian), saturation functions and the consistency
/// error of an approximate solution
pub mod vectorfield;
/// products with the CSR jacobian and the dense damped normal equations
pub mod linear_sys;
/// # Levenberg-Marquardt solver
/// damped Gauss-Newton method with adaptive damping for the collocation equations
/// Example#1
/// ```rust, ignore
///    use RustedTrajectory::numerical::LM_solver::Solver;
///    use nalgebra::{DMatrix, DVector};
///    let F = |x: &DVector<f64>| DVector::from_vec(vec![x[0] * x[0] - 2.0]);
///    let DF = |x: &DVector<f64>| DMatrix::from_element(1, 1, 2.0 * x[0]);
///    let mut solver = Solver::new(F, DF, DVector::from_vec(vec![1.0]));
///    solver.set_solver_params(Some(1e-10), Some(50), None).unwrap();
///    let x = solver.solve().unwrap();
///    println!("sqrt(2) = {}", x[0]);
/// ```
pub mod LM_solver;
