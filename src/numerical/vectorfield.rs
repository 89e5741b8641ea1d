//! # Symbolic vector fields to numeric functions
//!
//! A control system is given by a callable "symbolic" vector field
//! `f_sym(x_sym, u_sym)` that returns the right hand sides `dx/dt` as a matrix of
//! expressions (a single row or a single column). This module turns it into closures
//! evaluated with numbers:
//!
//! - `sym2num_vectorfield` - `(x, u) -> dx/dt`
//! - `sym2num_jacobian` - `(x, u) -> ∂f/∂(x, u)`
//!
//! and provides the helpers used around the collocation solver: saturation functions
//! for constrained states and the consistency error of an approximate solution.
//!
//! ```rust, ignore
//! use RustedTrajectory::numerical::vectorfield::sym2num_vectorfield;
//! use RustedTrajectory::symbolic::symbolic_engine::Expr;
//! use nalgebra::{DMatrix, DVector};
//! // pendulum on a cart, force as input
//! let f_sym = |x: &[Expr], u: &[Expr]| {
//!     DMatrix::from_row_slice(1, 2, &[x[1].clone(), -Expr::sin(x[0].clone().boxed()) + u[0].clone()])
//! };
//! let f = sym2num_vectorfield(f_sym, &Expr::Symbols("x1, x2"), &Expr::Symbols("u1")).unwrap();
//! let dx = f(&DVector::from_vec(vec![0.0, 1.0]), &DVector::from_vec(vec![0.5])).unwrap();
//! ```
use crate::errors::{CollocationError, Result};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_functions::Jacobian;
use log::debug;
use nalgebra::{DMatrix, DVector};

/// Numeric vector field `(x, u) -> dx/dt`.
pub type VectorFieldFn =
    Box<dyn Fn(&DVector<f64>, &DVector<f64>) -> Result<DVector<f64>> + Send + Sync>;
/// Numeric jacobian of a vector field with respect to `(x, u)`.
pub type VectorFieldJacobianFn =
    Box<dyn Fn(&DVector<f64>, &DVector<f64>) -> Result<DMatrix<f64>> + Send + Sync>;
/// Function of time.
pub type ScalarFn = Box<dyn Fn(f64) -> f64 + Send + Sync>;

/// Flat list of the right hand sides.
///
/// If `Fᵀ` equals the column-stacked `F` the matrix is a row (or 1x1) and its first
/// row is taken, otherwise the first row of `Fᵀ`, which is the first column of `F`.
fn flatten_vectorfield(F: &DMatrix<Expr>) -> Vec<Expr> {
    let stacked = DMatrix::from_column_slice(F.len(), 1, F.as_slice());
    if F.transpose() == stacked {
        F.row(0).iter().cloned().collect()
    } else {
        F.transpose().row(0).iter().cloned().collect()
    }
}

/// Names of `x_sym ++ u_sym`, every entry has to be a bare symbol.
fn argument_names(x_sym: &[Expr], u_sym: &[Expr]) -> Result<Vec<String>> {
    x_sym
        .iter()
        .chain(u_sym.iter())
        .map(|s| {
            s.symbol_name().map(|name| name.to_string()).ok_or_else(|| {
                CollocationError::Compile(format!("argument '{}' is not a symbol", s))
            })
        })
        .collect()
}

/// `x ++ u`, after checking both lengths against the symbolic arguments.
fn stack(x: &DVector<f64>, u: &DVector<f64>, n_x: usize, n_u: usize) -> Result<Vec<f64>> {
    if x.len() != n_x {
        return Err(CollocationError::shape("state vector", n_x, x.len()));
    }
    if u.len() != n_u {
        return Err(CollocationError::shape("input vector", n_u, u.len()));
    }
    Ok(x.iter().chain(u.iter()).copied().collect())
}

/// Turns the symbolic vector field into a numeric one.
///
/// The returned function expects `x` with `x_sym.len()` entries and `u` with
/// `u_sym.len()` entries, other lengths are a `Shape` error.
pub fn sym2num_vectorfield<S>(f_sym: S, x_sym: &[Expr], u_sym: &[Expr]) -> Result<VectorFieldFn>
where
    S: Fn(&[Expr], &[Expr]) -> DMatrix<Expr>,
{
    let F = f_sym(x_sym, u_sym);
    let rhs = flatten_vectorfield(&F);
    let names = argument_names(x_sym, u_sym)?;
    let vars: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
    debug!("vector field over {:?}: {} equations", vars, rhs.len());

    let f_num = Expr::lambdify_vector(&rhs, &vars)?;
    let (n_x, n_u) = (x_sym.len(), u_sym.len());
    Ok(Box::new(move |x: &DVector<f64>, u: &DVector<f64>| {
        let xu = stack(x, u, n_x, n_u)?;
        Ok(f_num(&xu))
    }))
}

/// Compiles the jacobian of the vector field with respect to `x ++ u`: one row per
/// equation, the state columns first, then the input columns.
pub fn sym2num_jacobian<S>(
    f_sym: S,
    x_sym: &[Expr],
    u_sym: &[Expr],
) -> Result<VectorFieldJacobianFn>
where
    S: Fn(&[Expr], &[Expr]) -> DMatrix<Expr>,
{
    let F = f_sym(x_sym, u_sym);
    let rhs = flatten_vectorfield(&F);
    let names = argument_names(x_sym, u_sym)?;
    let vars: Vec<&str> = names.iter().map(|s| s.as_str()).collect();

    let variables: Vec<Expr> = x_sym.iter().chain(u_sym.iter()).cloned().collect();
    let mut jacobian = Jacobian::from_vectors(rhs, variables);
    jacobian.calc_jacobian()?;
    let jac_num = jacobian.jacobian_generate(&vars)?;
    let (n_x, n_u) = (x_sym.len(), u_sym.len());
    Ok(Box::new(move |x: &DVector<f64>, u: &DVector<f64>| {
        let xu = stack(x, u, n_x, n_u)?;
        Ok(jac_num(&xu))
    }))
}

/// Saturation function `ψ(y(t))` mapping an unconstrained solution onto the interval
/// `(y0, y1)`, and its time derivative.
///
/// `ψ(y) = y1 - (y1 - y0) / (1 + exp(m y))` with `m = 4 / (y1 - y0)`, so that the slope
/// at `y = 0` is one.
pub fn saturation_functions<Y, DY>(y_fnc: Y, dy_fnc: DY, y0: f64, y1: f64) -> (ScalarFn, ScalarFn)
where
    Y: Fn(f64) -> f64 + Clone + Send + Sync + 'static,
    DY: Fn(f64) -> f64 + Send + Sync + 'static,
{
    let m = 4.0 / (y1 - y0);
    let y_for_psi = y_fnc.clone();
    let psi_y = move |t: f64| {
        let y = y_for_psi(t);
        y1 - (y1 - y0) / (1.0 + (m * y).exp())
    };
    let dpsi_dy = move |t: f64| {
        let y = y_fnc(t);
        let dy = dy_fnc(t);
        dy * (4.0 * (m * y).exp()) / (1.0 + (m * y).exp()).powi(2)
    };
    (Box::new(psi_y), Box::new(dpsi_dy))
}

/// Evenly spaced points on `[a, b]`, both ends included.
pub fn linspace(a: f64, b: f64, npts: usize) -> Vec<f64> {
    match npts {
        0 => Vec::new(),
        1 => vec![a],
        _ => (0..npts)
            .map(|i| a + (b - a) * i as f64 / (npts - 1) as f64)
            .collect(),
    }
}

/// How well approximate state and input functions comply with the system dynamics.
///
/// At `npts` evenly spaced points of `interval` the error `ff(x(t), u(t)) - dx(t)` is
/// computed. Returns the largest entry over all points together with the matrix of
/// errors (one row per point).
pub fn consistency_error<X, U, DX, FF>(
    interval: (f64, f64),
    x_fnc: X,
    u_fnc: U,
    dx_fnc: DX,
    ff_fnc: FF,
    npts: usize,
) -> Result<(f64, DMatrix<f64>)>
where
    X: Fn(f64) -> DVector<f64>,
    U: Fn(f64) -> DVector<f64>,
    DX: Fn(f64) -> DVector<f64>,
    FF: Fn(&DVector<f64>, &DVector<f64>) -> DVector<f64>,
{
    if npts == 0 {
        return Err(CollocationError::shape("consistency error points", 1, 0));
    }
    let tt = linspace(interval.0, interval.1, npts);
    let mut rows: Vec<DVector<f64>> = Vec::with_capacity(npts);
    for &t in &tt {
        let ff = ff_fnc(&x_fnc(t), &u_fnc(t));
        let dx = dx_fnc(t);
        if ff.len() != dx.len() {
            return Err(CollocationError::shape("state derivative", ff.len(), dx.len()));
        }
        rows.push(ff - dx);
    }
    let n = rows[0].len();
    if let Some(bad) = rows.iter().find(|r| r.len() != n) {
        return Err(CollocationError::shape("vector field output", n, bad.len()));
    }
    let error = DMatrix::from_fn(npts, n, |i, j| rows[i][j]);
    let max_con_err = error.max();
    Ok((max_con_err, error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::Rng;

    fn field_as_row(x: &[Expr], u: &[Expr]) -> DMatrix<Expr> {
        DMatrix::from_row_slice(1, 2, &[x[1].clone(), u[0].clone()])
    }

    fn field_as_column(x: &[Expr], u: &[Expr]) -> DMatrix<Expr> {
        DMatrix::from_column_slice(2, 1, &[x[1].clone(), u[0].clone()])
    }

    #[test]
    fn test_vectorfield_row_and_column_shapes() {
        let x_sym = Expr::Symbols("x1, x2");
        let u_sym = Expr::Symbols("u1");
        let f_row = sym2num_vectorfield(field_as_row, &x_sym, &u_sym).unwrap();
        let f_col = sym2num_vectorfield(field_as_column, &x_sym, &u_sym).unwrap();

        let mut rng = rand::rng();
        for _ in 0..10 {
            let (a, b, c) = (
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
            );
            let x = DVector::from_vec(vec![a, b]);
            let u = DVector::from_vec(vec![c]);
            let expected = DVector::from_vec(vec![b, c]);
            assert_eq!(f_row(&x, &u).unwrap(), expected);
            assert_eq!(f_col(&x, &u).unwrap(), expected);
        }
    }

    #[test]
    fn test_vectorfield_nonlinear() {
        let x_sym = Expr::Symbols("x1, x2");
        let u_sym = Expr::Symbols("u1");
        let f_sym = |x: &[Expr], u: &[Expr]| {
            DMatrix::from_row_slice(
                1,
                2,
                &[
                    x[1].clone(),
                    -Expr::sin(x[0].clone().boxed()) + 2.0 * u[0].clone(),
                ],
            )
        };
        let f = sym2num_vectorfield(f_sym, &x_sym, &u_sym).unwrap();
        let dx = f(&DVector::from_vec(vec![0.3, -1.0]), &DVector::from_vec(vec![0.25])).unwrap();
        assert_relative_eq!(dx[0], -1.0);
        assert_relative_eq!(dx[1], -(0.3f64).sin() + 0.5, epsilon = 1e-14);
    }

    #[test]
    fn test_vectorfield_unknown_symbol() {
        let x_sym = Expr::Symbols("x1, x2");
        let u_sym = Expr::Symbols("u1");
        let f_sym = |x: &[Expr], _u: &[Expr]| {
            DMatrix::from_row_slice(1, 2, &[x[1].clone(), Expr::Symbol("k")])
        };
        let res = sym2num_vectorfield(f_sym, &x_sym, &u_sym);
        assert!(matches!(res, Err(CollocationError::Compile(_))));
    }

    #[test]
    fn test_vectorfield_non_symbol_argument() {
        let x_sym = vec![Expr::Symbol("x1"), Expr::Symbol("x2") * 2.0];
        let u_sym = Expr::Symbols("u1");
        let res = sym2num_vectorfield(field_as_row, &x_sym, &u_sym);
        assert!(matches!(res, Err(CollocationError::Compile(_))));
    }

    #[test]
    fn test_jacobian_of_vectorfield() {
        let x_sym = Expr::Symbols("x1, x2");
        let u_sym = Expr::Symbols("u1");
        let f_sym = |x: &[Expr], u: &[Expr]| {
            DMatrix::from_column_slice(2, 1, &[x[1].clone(), x[0].clone() * u[0].clone()])
        };
        let df = sym2num_jacobian(f_sym, &x_sym, &u_sym).unwrap();
        let jac = df(&DVector::from_vec(vec![3.0, 4.0]), &DVector::from_vec(vec![5.0])).unwrap();
        let expected = DMatrix::from_row_slice(2, 3, &[0.0, 1.0, 0.0, 5.0, 0.0, 3.0]);
        assert_eq!(jac, expected);
    }

    #[test]
    fn test_vectorfield_wrong_argument_length() {
        let x_sym = Expr::Symbols("x1, x2");
        let u_sym = Expr::Symbols("u1");
        let f = sym2num_vectorfield(field_as_row, &x_sym, &u_sym).unwrap();
        let df = sym2num_jacobian(field_as_row, &x_sym, &u_sym).unwrap();
        let x_short = DVector::from_vec(vec![1.0]);
        let x = DVector::from_vec(vec![1.0, 2.0]);
        let u = DVector::from_vec(vec![3.0]);
        let u_long = DVector::from_vec(vec![3.0, 4.0]);
        // the total length matches, the split does not
        let x_long = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let u_empty = DVector::<f64>::zeros(0);

        assert_eq!(f(&x_short, &u), Err(CollocationError::shape("state vector", 2, 1)));
        assert_eq!(f(&x, &u_long), Err(CollocationError::shape("input vector", 1, 2)));
        assert_eq!(f(&x_long, &u_empty), Err(CollocationError::shape("state vector", 2, 3)));
        assert_eq!(df(&x_short, &u), Err(CollocationError::shape("state vector", 2, 1)));
        assert_eq!(df(&x, &u_long), Err(CollocationError::shape("input vector", 1, 2)));
    }

    #[test]
    fn test_saturation_functions() {
        let (y0, y1) = (-2.0, 1.0);
        let (psi, dpsi) = saturation_functions(|t: f64| t, |_t: f64| 1.0, y0, y1);
        // midpoint and unit slope at y = 0
        assert_relative_eq!(psi(0.0), (y0 + y1) / 2.0, epsilon = 1e-14);
        assert_relative_eq!(dpsi(0.0), 1.0, epsilon = 1e-14);
        // saturation towards the limits
        assert_relative_eq!(psi(50.0), y1, epsilon = 1e-10);
        assert_relative_eq!(psi(-50.0), y0, epsilon = 1e-10);
        // derivative agrees with a central difference
        let h = 1e-6;
        let t = 0.7;
        let numeric = (psi(t + h) - psi(t - h)) / (2.0 * h);
        assert_relative_eq!(dpsi(t), numeric, epsilon = 1e-7);
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_consistency_error() {
        // x(t) = (sin t, cos t) is an exact solution of dx1 = x2, dx2 = -x1
        let ff = |x: &DVector<f64>, _u: &DVector<f64>| DVector::from_vec(vec![x[1], -x[0]]);
        let x_fnc = |t: f64| DVector::from_vec(vec![t.sin(), t.cos()]);
        let u_fnc = |_t: f64| DVector::from_vec(vec![0.0]);
        let dx_exact = |t: f64| DVector::from_vec(vec![t.cos(), -t.sin()]);
        let (max_err, errors) =
            consistency_error((0.0, 2.0), x_fnc, u_fnc, dx_exact, ff, 50).unwrap();
        assert_eq!(errors.shape(), (50, 2));
        assert_relative_eq!(max_err, 0.0, epsilon = 1e-15);

        // a derivative off by a constant 0.1 in the first component
        let dx_shifted = |t: f64| DVector::from_vec(vec![t.cos() - 0.1, -t.sin()]);
        let (max_err, _) = consistency_error((0.0, 2.0), x_fnc, u_fnc, dx_shifted, ff, 50).unwrap();
        assert_relative_eq!(max_err, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_consistency_error_needs_points() {
        let ff = |x: &DVector<f64>, _u: &DVector<f64>| x.clone();
        let f = |t: f64| DVector::from_vec(vec![t]);
        let res = consistency_error((0.0, 1.0), f, f, f, ff, 0);
        assert!(matches!(res, Err(CollocationError::Shape { .. })));
    }
}
