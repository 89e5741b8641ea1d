//! Linear algebra of one damped Gauss-Newton step.
//!
//! The jacobian is stored in CSR form: collocation jacobians are mostly zeros, and
//! only the products `JᵀJ`, `JᵀF` and `J·s` are ever needed. The damped normal
//! equations `(JᵀJ + μ²I) s = -JᵀF` are small and dense and are solved by LU.
use crate::errors::{CollocationError, Result};
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use strum_macros::{Display, EnumString};

/// Method for the dense linear system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Default)]
#[strum(serialize_all = "lowercase")]
pub enum LinearSolver {
    #[default]
    Lu,
    Inv,
}

pub fn to_csr(jac: &DMatrix<f64>) -> CsrMatrix<f64> {
    CsrMatrix::from(jac)
}

/// `JᵀJ` and `JᵀF`
pub fn normal_equations(jac: &CsrMatrix<f64>, f: &DVector<f64>) -> (DMatrix<f64>, DVector<f64>) {
    let jac_t = jac.transpose();
    let jt_j: CsrMatrix<f64> = &jac_t * jac;
    let jt_f: DVector<f64> = &jac_t * f;
    (DMatrix::from(&jt_j), jt_f)
}

/// `J·s`
pub fn jacobian_times(jac: &CsrMatrix<f64>, s: &DVector<f64>) -> DVector<f64> {
    jac * s
}

pub fn solve_linear_system(
    method: LinearSolver,
    A: &DMatrix<f64>,
    b: &DVector<f64>,
) -> Result<DVector<f64>> {
    if A.nrows() != A.ncols() {
        return Err(CollocationError::shape(
            "linear system matrix columns",
            A.nrows(),
            A.ncols(),
        ));
    }
    if A.nrows() != b.len() {
        return Err(CollocationError::shape("linear system right hand side", A.nrows(), b.len()));
    }
    if A.nrows() == 0 {
        return Ok(DVector::zeros(0));
    }
    match method {
        LinearSolver::Lu => A.clone().lu().solve(b).ok_or_else(|| {
            CollocationError::SingularSystem(format!(
                "LU decomposition of the {}x{} damped normal matrix failed",
                A.nrows(),
                A.ncols()
            ))
        }),
        LinearSolver::Inv => {
            let A_inv = A.clone().try_inverse().ok_or_else(|| {
                CollocationError::SingularSystem(format!(
                    "the {}x{} damped normal matrix is not invertible",
                    A.nrows(),
                    A.ncols()
                ))
            })?;
            Ok(A_inv * b)
        }
    }
}

/// Solves `(JᵀJ + μ²I) s = -JᵀF`.
pub fn damped_step(
    method: LinearSolver,
    jt_j: &DMatrix<f64>,
    jt_f: &DVector<f64>,
    mu: f64,
) -> Result<DVector<f64>> {
    let n = jt_j.nrows();
    let A = jt_j + DMatrix::<f64>::identity(n, n) * (mu * mu);
    let s = solve_linear_system(method, &A, jt_f)?;
    Ok(-s)
}
