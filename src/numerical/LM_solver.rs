//! LEVENBERG-MARQUARDT SOLVER FOR THE COLLOCATION EQUATIONS
//!
//! Minimizes `‖F'(x_k)(x_{k+1} - x_k) + F(x_k)‖² + μ²‖x_{k+1} - x_k‖²`.
//!
//! Every outer iteration evaluates `F` and `DF` once. The inner damping search solves
//! the damped normal equations `(JᵀJ + μ²I) s = -JᵀF` and compares the actual
//! reduction of `‖F‖²` with the reduction predicted by the linear model:
//!
//! `ρ = (‖F(x)‖² - ‖F(x+s)‖²) / (‖F(x)‖² - ‖F(x) + J s‖²)`
//!
//! - `ρ <= b0`: the model is poor, μ is doubled and the step recomputed
//! - `ρ >= b1`: the model is good, μ is halved for the next step
//!
//! The search ends as soon as `ρ >= b0`. ρ is not guarded: a degenerate ratio gives
//! NaN or ∞, and NaN ends the search because `NaN < b0` is false.
//!
//! The residual reported for iteration `k` is `‖F(x_k)‖`, i.e. the norm BEFORE the
//! accepted step. Convergence is therefore declared one iteration late. Set
//! `lagging_residual = false` to use `‖F(x_{k+1})‖` instead.
//!
//!  Example#
//! ```rust, ignore
//! use RustedTrajectory::numerical::LM_solver::Solver;
//! use nalgebra::{DMatrix, DVector};
//! let M = DMatrix::from_row_slice(2, 2, &[3.0, 1.0, 1.0, 2.0]);
//! let c = DVector::from_vec(vec![9.0, 8.0]);
//! let (M1, c1) = (M.clone(), c.clone());
//! let F = move |x: &DVector<f64>| &M1 * x - &c1;
//! let DF = move |_x: &DVector<f64>| M.clone();
//! let mut solver = Solver::new(F, DF, DVector::zeros(2));
//! solver.set_solver_params(Some(1e-8), Some(50), None).unwrap();
//! let x = solver.solve().unwrap(); // ≈ [2, 3]
//! ```
use crate::errors::{CollocationError, Result};
use crate::numerical::linear_sys::{
    LinearSolver, damped_step, jacobian_times, normal_equations, to_csr,
};
use crate::Utils::timer::{CustomTimer, Timer};
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};
use std::collections::HashMap;
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use tabled::{builder::Builder, settings::Style};

pub type ResidualFn = Box<dyn Fn(&DVector<f64>) -> DVector<f64>>;
pub type JacobianFn = Box<dyn Fn(&DVector<f64>) -> DMatrix<f64>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Algorithm {
    Newton,
    Gauss,
    Leven,
}

impl Algorithm {
    pub fn from_name(name: &str) -> Result<Self> {
        Algorithm::from_str(name.trim())
            .map_err(|_| CollocationError::UnknownAlgorithm(name.to_string()))
    }
}

/// Why the outer iteration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ExitReason {
    /// residual below `tol`
    Converged,
    /// `maxx` iterations done
    MaxIter,
    /// residual change below `reltol`
    Stalled,
}

/// One pass of the damping search.
#[derive(Debug, Clone, PartialEq)]
pub struct DampingStep {
    pub iteration: usize,
    /// μ used for the step
    pub mu: f64,
    pub rho: f64,
    /// μ after the update rules
    pub mu_next: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SolverReport {
    pub iterations: usize,
    pub mu: f64,
    pub residual_history: Vec<f64>,
    pub exit: Option<ExitReason>,
    pub damping_trace: Vec<DampingStep>,
    pub warnings: Vec<String>,
    pub timing: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverParams {
    /// absolute tolerance for the residual
    pub tol: f64,
    /// tolerance for the change of the residual, `tol` if not set
    pub reltol: Option<f64>,
    /// maximal number of outer iterations
    pub maxx: usize,
    pub algo: Algorithm,
    /// initial damping
    pub mu0: f64,
    pub b0: f64,
    pub b1: f64,
    /// cap on the passes of one damping search, unbounded if `None`
    pub max_damping_steps: Option<usize>,
    pub lagging_residual: bool,
    pub linear_sys_method: LinearSolver,
}

impl Default for SolverParams {
    fn default() -> Self {
        SolverParams {
            tol: 1e-2,
            reltol: None,
            maxx: 10,
            algo: Algorithm::Leven,
            mu0: 0.1,
            b0: 0.2,
            b1: 0.8,
            max_damping_steps: None,
            lagging_residual: true,
            linear_sys_method: LinearSolver::Lu,
        }
    }
}

impl SolverParams {
    pub fn reltol(&self) -> f64 {
        self.reltol.unwrap_or(self.tol)
    }
}

pub struct Solver {
    F: ResidualFn,
    DF: JacobianFn,
    pub x0: DVector<f64>,
    pub params: SolverParams,
    sol: Option<DVector<f64>>,
    report: SolverReport,
    pub custom_timer: CustomTimer,
}

impl Solver {
    pub fn new<Fun, Jac>(F: Fun, DF: Jac, x0: DVector<f64>) -> Solver
    where
        Fun: Fn(&DVector<f64>) -> DVector<f64> + 'static,
        Jac: Fn(&DVector<f64>) -> DMatrix<f64> + 'static,
    {
        Solver::with_params(F, DF, x0, SolverParams::default())
    }

    pub fn with_params<Fun, Jac>(F: Fun, DF: Jac, x0: DVector<f64>, params: SolverParams) -> Solver
    where
        Fun: Fn(&DVector<f64>) -> DVector<f64> + 'static,
        Jac: Fn(&DVector<f64>) -> DMatrix<f64> + 'static,
    {
        Solver {
            F: Box::new(F),
            DF: Box::new(DF),
            x0,
            params,
            sol: None,
            report: SolverReport::default(),
            custom_timer: CustomTimer::new(),
        }
    }
    ////////////////////////////SETTERS///////////////////////////////////////////////////////////////////
    pub fn set_solver_params(
        &mut self,
        tol: Option<f64>,
        maxx: Option<usize>,
        algo: Option<&str>,
    ) -> Result<()> {
        if let Some(tol) = tol {
            self.params.tol = tol;
        }
        if let Some(maxx) = maxx {
            self.params.maxx = maxx;
        }
        if let Some(algo) = algo {
            self.params.algo = Algorithm::from_name(algo)?;
        }
        Ok(())
    }

    pub fn set_params(&mut self, params: SolverParams) {
        self.params = params;
    }

    pub fn set_reltol(&mut self, reltol: f64) {
        self.params.reltol = Some(reltol);
    }

    pub fn set_max_damping_steps(&mut self, max_damping_steps: Option<usize>) {
        self.params.max_damping_steps = max_damping_steps;
    }

    pub fn set_lagging_residual(&mut self, lagging_residual: bool) {
        self.params.lagging_residual = lagging_residual;
    }

    pub fn get_result(&self) -> Option<DVector<f64>> {
        self.sol.clone()
    }

    /// Statistics of the last `solve()`.
    pub fn report(&self) -> &SolverReport {
        &self.report
    }

    fn warn(&mut self, msg: &str) {
        warn!("{}", msg);
        self.report.warnings.push(msg.to_string());
    }
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    //                                       main functions to start the solver and calculate statistics
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

    /// Runs the chosen algorithm. Newton and Gauss are not implemented and return `x0`.
    pub fn solve(&mut self) -> Result<DVector<f64>> {
        self.report = SolverReport::default();
        self.sol = None;
        self.custom_timer.start();
        match self.params.algo {
            Algorithm::Newton => {
                info!("Run Newton solver");
                self.warn(" ... not implemented");
                return Ok(self.x0.clone());
            }
            Algorithm::Gauss => {
                info!("Run Gauss solver");
                self.warn(" ... not implemented");
                return Ok(self.x0.clone());
            }
            Algorithm::Leven => {
                info!("Run Levenberg-Marquardt method");
                let _timer = Timer::new("Levenberg-Marquardt");
                self.leven()?;
            }
        }
        self.report.timing = self.custom_timer.get_all();
        self.calc_statistics();

        match self.sol.clone() {
            Some(sol) => Ok(sol),
            None => {
                self.warn("Wrong solver");
                Ok(self.x0.clone())
            }
        }
    }

    /// Damped Gauss-Newton iteration with adaptive μ, see the type level docs.
    pub fn leven(&mut self) -> Result<DVector<f64>> {
        let p = self.params.clone();
        let tol = p.tol;
        let reltol = p.reltol();
        let n = self.x0.len();
        if n == 0 {
            return Err(CollocationError::shape("unknowns", 1, 0));
        }

        let mut i: usize = 0;
        let mut x = self.x0.clone();
        let mut res: f64 = 1.0;
        let mut res_prev: f64 = 1e10;
        let mut mu = p.mu0;
        let mut rho: f64 = 0.0;
        let mut non_square_reported = false;

        while res > tol && i < p.maxx && (res - res_prev).abs() > reltol {
            i += 1;

            self.custom_timer.fun_tic();
            let Fx = (self.F)(&x);
            self.custom_timer.fun_tac();
            self.custom_timer.jac_tic();
            let DFx = (self.DF)(&x);
            self.custom_timer.jac_tac();

            if DFx.nrows() != Fx.len() {
                return Err(CollocationError::shape("jacobian rows", Fx.len(), DFx.nrows()));
            }
            if DFx.ncols() != n {
                return Err(CollocationError::shape("jacobian columns", n, DFx.ncols()));
            }
            if Fx.len() != n && !non_square_reported {
                self.warn(&format!(
                    "non-square system: {} equations, {} unknowns",
                    Fx.len(),
                    n
                ));
                non_square_reported = true;
            }

            let DFx = to_csr(&DFx);
            self.custom_timer.linear_system_tic();
            let (jt_j, jt_f) = normal_equations(&DFx, &Fx);
            self.custom_timer.linear_system_tac();
            let normFx2 = Fx.norm_squared();

            let mut s: DVector<f64> = DVector::zeros(n);
            let mut passes: usize = 0;
            while rho < p.b0 {
                if let Some(cap) = p.max_damping_steps {
                    if passes >= cap {
                        self.warn(&format!(
                            "damping search stopped after {} passes, rho= {}",
                            passes, rho
                        ));
                        break;
                    }
                }
                passes += 1;

                self.custom_timer.linear_system_tic();
                let step = damped_step(p.linear_sys_method, &jt_j, &jt_f, mu);
                self.custom_timer.linear_system_tac();
                s = step?;

                let xs = &x + &s;
                self.custom_timer.fun_tic();
                let Fxs = (self.F)(&xs);
                self.custom_timer.fun_tac();

                let predicted = (&Fx + jacobian_times(&DFx, &s)).norm_squared();
                rho = (normFx2 - Fxs.norm_squared()) / (normFx2 - predicted);

                let mu_used = mu;
                if rho <= p.b0 {
                    mu *= 2.0;
                }
                if rho >= p.b1 {
                    mu *= 0.5;
                }
                debug!("  rho= {}    mu= {}", rho, mu);
                self.report.damping_trace.push(DampingStep {
                    iteration: i,
                    mu: mu_used,
                    rho,
                    mu_next: mu,
                });
            }

            rho = 0.0;
            x += &s;
            res_prev = res;
            res = if p.lagging_residual {
                normFx2.sqrt()
            } else {
                self.custom_timer.fun_tic();
                let r = (self.F)(&x).norm();
                self.custom_timer.fun_tac();
                r
            };
            self.report.residual_history.push(res);
            info!("nIt= {}    res= {}", i, res);
        }

        let exit = if res <= tol {
            ExitReason::Converged
        } else if i >= p.maxx {
            ExitReason::MaxIter
        } else {
            ExitReason::Stalled
        };
        info!("Levenberg-Marquardt finished: {} after {} iterations", exit, i);
        self.report.iterations = i;
        self.report.mu = mu;
        self.report.exit = Some(exit);
        self.sol = Some(x.clone());
        Ok(x)
    }

    fn calc_statistics(&self) {
        let mut stats: HashMap<String, String> = self.report.timing.clone();
        stats.insert("length of x vector".to_string(), self.x0.len().to_string());
        stats.insert(
            "number of iterations".to_string(),
            self.report.iterations.to_string(),
        );
        stats.insert(
            "damping passes".to_string(),
            self.report.damping_trace.len().to_string(),
        );
        stats.insert("final mu".to_string(), format!("{:e}", self.report.mu));
        if let Some(res) = self.report.residual_history.last() {
            stats.insert("final residual".to_string(), format!("{:e}", res));
        }
        if let Some(exit) = self.report.exit {
            stats.insert("exit".to_string(), exit.to_string());
        }
        let mut table = Builder::from(stats).build();
        table.with(Style::modern_rounded());
        info!("\n \n CALC STATISTICS \n \n {}", table.to_string());
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////
//                                     TESTS
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use super::*;

    fn linear_problem() -> (DMatrix<f64>, DVector<f64>) {
        let M = DMatrix::from_row_slice(2, 2, &[3.0, 1.0, 1.0, 2.0]);
        let c = DVector::from_vec(vec![9.0, 8.0]);
        (M, c)
    }

    fn linear_solver(x0: DVector<f64>) -> Solver {
        let (M, c) = linear_problem();
        let M1 = M.clone();
        let F = move |x: &DVector<f64>| &M1 * x - &c;
        let DF = move |_x: &DVector<f64>| M.clone();
        Solver::new(F, DF, x0)
    }

    #[test]
    fn test_default_params() {
        let params = SolverParams::default();
        assert_eq!(params.tol, 1e-2);
        assert_eq!(params.reltol(), 1e-2);
        assert_eq!(params.maxx, 10);
        assert_eq!(params.algo, Algorithm::Leven);
        assert_eq!((params.mu0, params.b0, params.b1), (0.1, 0.2, 0.8));
        assert!(params.lagging_residual);
        assert_eq!(params.max_damping_steps, None);
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!(Algorithm::from_name("newton").unwrap(), Algorithm::Newton);
        assert_eq!(Algorithm::from_name("gauss").unwrap(), Algorithm::Gauss);
        assert_eq!(Algorithm::from_name("leven").unwrap(), Algorithm::Leven);
        assert_eq!(Algorithm::Leven.to_string(), "leven");
        assert_eq!(
            Algorithm::from_name("bfgs"),
            Err(CollocationError::UnknownAlgorithm("bfgs".to_string()))
        );
    }

    #[test]
    fn test_linear_system_converges() {
        let mut solver = linear_solver(DVector::zeros(2));
        solver.set_solver_params(Some(1e-8), Some(50), None).unwrap();
        let x = solver.solve().unwrap();
        assert!((x[0] - 2.0).abs() < 1e-6);
        assert!((x[1] - 3.0).abs() < 1e-6);
        assert_eq!(solver.report().exit, Some(ExitReason::Converged));
        assert_eq!(solver.get_result(), Some(x));
    }

    #[test]
    fn test_linear_system_damping_halves_mu() {
        // for a linear F the model is exact, rho = 1 on every pass
        let mut solver = linear_solver(DVector::zeros(2));
        solver.set_solver_params(Some(1e-8), Some(50), None).unwrap();
        solver.solve().unwrap();
        let report = solver.report();
        assert_eq!(report.damping_trace.len(), report.iterations);
        for step in &report.damping_trace {
            assert!((step.rho - 1.0).abs() < 1e-3);
            assert_eq!(step.mu_next, step.mu * 0.5);
        }
    }

    #[test]
    fn test_solve_is_idempotent() {
        let mut solver = linear_solver(DVector::from_vec(vec![-1.0, 5.0]));
        solver.set_solver_params(Some(1e-6), Some(30), None).unwrap();
        let first = solver.solve().unwrap();
        let first_iterations = solver.report().iterations;
        let second = solver.solve().unwrap();
        assert_eq!(first, second);
        assert_eq!(solver.report().iterations, first_iterations);
    }

    #[test]
    fn test_unimplemented_algorithms_return_x0() {
        for name in ["newton", "gauss"] {
            let x0 = DVector::from_vec(vec![0.5, -0.5]);
            let mut solver = linear_solver(x0.clone());
            solver.set_solver_params(None, None, Some(name)).unwrap();
            let x = solver.solve().unwrap();
            assert_eq!(x, x0);
            assert_eq!(solver.report().warnings.len(), 1);
            assert_eq!(solver.report().iterations, 0);
        }
    }

    #[test]
    fn test_unknown_algorithm_name() {
        let mut solver = linear_solver(DVector::zeros(2));
        let res = solver.set_solver_params(None, None, Some("trust-region"));
        assert!(matches!(res, Err(CollocationError::UnknownAlgorithm(_))));
        assert_eq!(solver.params.algo, Algorithm::Leven);
    }

    #[test]
    fn test_singular_system_propagates() {
        // rank one jacobian and no damping
        let F = |x: &DVector<f64>| DVector::from_vec(vec![x[0] + x[1] - 2.0, x[0] + x[1] - 2.0]);
        let DF = |_x: &DVector<f64>| DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        let params = SolverParams {
            mu0: 0.0,
            ..SolverParams::default()
        };
        let mut solver = Solver::with_params(F, DF, DVector::zeros(2), params);
        assert!(matches!(
            solver.solve(),
            Err(CollocationError::SingularSystem(_))
        ));
    }

    #[test]
    fn test_jacobian_shape_mismatch() {
        let F = |x: &DVector<f64>| x.clone();
        let DF = |_x: &DVector<f64>| DMatrix::identity(3, 2);
        let mut solver = Solver::new(F, DF, DVector::zeros(2));
        assert_eq!(
            solver.solve(),
            Err(CollocationError::shape("jacobian rows", 2, 3))
        );
    }

    #[test]
    fn test_empty_initial_guess() {
        let F = |x: &DVector<f64>| x.clone();
        let DF = |_x: &DVector<f64>| DMatrix::zeros(0, 0);
        let mut solver = Solver::new(F, DF, DVector::zeros(0));
        assert_eq!(solver.solve(), Err(CollocationError::shape("unknowns", 1, 0)));
        assert_eq!(solver.get_result(), None);
        assert!(solver.report().residual_history.is_empty());
    }

    #[test]
    fn test_overdetermined_system_warns_once() {
        // consistent: x = (1, 2)
        let A = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let A1 = A.clone();
        let F = move |x: &DVector<f64>| &A1 * x - &b;
        let DF = move |_x: &DVector<f64>| A.clone();
        let mut solver = Solver::new(F, DF, DVector::zeros(2));
        solver.set_solver_params(Some(1e-9), Some(50), None).unwrap();
        let x = solver.solve().unwrap();
        assert!((x[0] - 1.0).abs() < 1e-6);
        assert!((x[1] - 2.0).abs() < 1e-6);
        assert_eq!(solver.report().warnings.len(), 1);
        assert!(solver.report().warnings[0].contains("non-square"));
    }

    #[test]
    fn test_max_iterations_exit() {
        let mut solver = linear_solver(DVector::zeros(2));
        solver.set_solver_params(Some(1e-12), Some(1), None).unwrap();
        solver.solve().unwrap();
        assert_eq!(solver.report().iterations, 1);
        assert_eq!(solver.report().exit, Some(ExitReason::MaxIter));
    }
}
