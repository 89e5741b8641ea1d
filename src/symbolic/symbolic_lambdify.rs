//! LAMBDIFICATION - converting symbolic expressions to Rust closures
//!
//! The closure tree mirrors the expression tree: every node becomes a boxed closure
//! calling the closures of its children. Symbols are resolved to positions in the
//! argument slice once, at compile time, so evaluation does no name lookups.
use crate::errors::{CollocationError, Result};
use crate::symbolic::symbolic_engine::Expr;
use nalgebra::DVector;
use std::f64::consts::PI;

/// Compiled scalar function of an ordered argument slice.
pub type CompiledFn = Box<dyn Fn(&[f64]) -> f64 + Send + Sync>;
/// Compiled vector function of an ordered argument slice.
pub type CompiledVecFn = Box<dyn Fn(&[f64]) -> DVector<f64> + Send + Sync>;

impl Expr {
    /// Compiles the expression into a closure over `vars`.
    ///
    /// `vars` fixes the argument order: the closure is called with a slice whose i-th
    /// entry is the value of `vars[i]`. A symbol of the expression that is not listed
    /// in `vars` is a compile error.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let f = Expr::Var("x1".to_string()) * Expr::Var("u1".to_string());
    /// let f_num = f.lambdify_borrowed_thread_safe(&["x1", "u1"]).unwrap();
    /// assert_eq!(f_num(&[2.0, 3.0]), 6.0);
    /// ```
    pub fn lambdify_borrowed_thread_safe(&self, vars: &[&str]) -> Result<CompiledFn> {
        match self {
            Expr::Var(name) => {
                let index = vars.iter().position(|v| *v == name.as_str()).ok_or_else(|| {
                    CollocationError::Compile(format!(
                        "variable '{}' is not in the argument list {:?}",
                        name, vars
                    ))
                })?;
                Ok(Box::new(move |args: &[f64]| args[index]))
            }
            Expr::Const(val) => {
                let val = *val;
                Ok(Box::new(move |_: &[f64]| val))
            }
            Expr::Add(lhs, rhs) => {
                let (lf, rf) = compile_pair(lhs, rhs, vars)?;
                Ok(Box::new(move |args: &[f64]| lf(args) + rf(args)))
            }
            Expr::Sub(lhs, rhs) => {
                let (lf, rf) = compile_pair(lhs, rhs, vars)?;
                Ok(Box::new(move |args: &[f64]| lf(args) - rf(args)))
            }
            Expr::Mul(lhs, rhs) => {
                let (lf, rf) = compile_pair(lhs, rhs, vars)?;
                Ok(Box::new(move |args: &[f64]| lf(args) * rf(args)))
            }
            Expr::Div(lhs, rhs) => {
                let (lf, rf) = compile_pair(lhs, rhs, vars)?;
                Ok(Box::new(move |args: &[f64]| lf(args) / rf(args)))
            }
            Expr::Pow(base, exp) => {
                // integer exponents go through powi, which is exact for small powers
                if let Expr::Const(e) = exp.as_ref() {
                    if e.fract() == 0.0 && e.abs() <= i32::MAX as f64 {
                        let n = *e as i32;
                        let bf = base.lambdify_borrowed_thread_safe(vars)?;
                        return Ok(Box::new(move |args: &[f64]| bf(args).powi(n)));
                    }
                }
                let (bf, ef) = compile_pair(base, exp, vars)?;
                Ok(Box::new(move |args: &[f64]| bf(args).powf(ef(args))))
            }
            Expr::Exp(arg) => compile_unary(arg, vars, f64::exp),
            Expr::Ln(arg) => compile_unary(arg, vars, f64::ln),
            Expr::sin(arg) => compile_unary(arg, vars, f64::sin),
            Expr::cos(arg) => compile_unary(arg, vars, f64::cos),
            Expr::tg(arg) => compile_unary(arg, vars, f64::tan),
            Expr::ctg(arg) => compile_unary(arg, vars, |v| 1.0 / v.tan()),
            Expr::arcsin(arg) => compile_unary(arg, vars, f64::asin),
            Expr::arccos(arg) => compile_unary(arg, vars, f64::acos),
            Expr::arctg(arg) => compile_unary(arg, vars, f64::atan),
            Expr::arcctg(arg) => compile_unary(arg, vars, |v| PI / 2.0 - v.atan()),
        }
    }

    /// Compiles a list of expressions over the same argument list into one closure
    /// returning a `DVector` with one entry per expression.
    pub fn lambdify_vector(exprs: &[Expr], vars: &[&str]) -> Result<CompiledVecFn> {
        let compiled: Vec<CompiledFn> = exprs
            .iter()
            .map(|expr| expr.lambdify_borrowed_thread_safe(vars))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(move |args: &[f64]| {
            DVector::from_iterator(compiled.len(), compiled.iter().map(|f| f(args)))
        }))
    }
}

fn compile_pair(lhs: &Expr, rhs: &Expr, vars: &[&str]) -> Result<(CompiledFn, CompiledFn)> {
    Ok((
        lhs.lambdify_borrowed_thread_safe(vars)?,
        rhs.lambdify_borrowed_thread_safe(vars)?,
    ))
}

fn compile_unary(
    arg: &Expr,
    vars: &[&str],
    op: impl Fn(f64) -> f64 + Send + Sync + 'static,
) -> Result<CompiledFn> {
    let f = arg.lambdify_borrowed_thread_safe(vars)?;
    Ok(Box::new(move |args: &[f64]| op(f(args))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn x(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    #[test]
    fn test_lambdify_argument_order() {
        let f = x("a") - x("b");
        let f_ab = f.lambdify_borrowed_thread_safe(&["a", "b"]).unwrap();
        let f_ba = f.lambdify_borrowed_thread_safe(&["b", "a"]).unwrap();
        assert_eq!(f_ab(&[5.0, 2.0]), 3.0);
        assert_eq!(f_ba(&[5.0, 2.0]), -3.0);
    }

    #[test]
    fn test_lambdify_matches_eval_expression() {
        let f = Expr::sin(x("x1").boxed()) * x("x2").exp() / (x("u1").pow(Expr::Const(2.0)) + 1.0)
            + Expr::arcctg(x("x2").boxed());
        let vars = ["x1", "x2", "u1"];
        let values = [0.4, -0.7, 1.3];
        let f_num = f.lambdify_borrowed_thread_safe(&vars).unwrap();
        assert_relative_eq!(
            f_num(&values),
            f.eval_expression(&vars, &values),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_lambdify_unknown_variable_is_compile_error() {
        let f = x("x1") + x("x9");
        let res = f.lambdify_borrowed_thread_safe(&["x1"]);
        match res {
            Err(CollocationError::Compile(msg)) => assert!(msg.contains("x9")),
            _ => panic!("expected compile error"),
        }
    }

    #[test]
    fn test_lambdify_vector() {
        let exprs = vec![x("x2"), Expr::Const(3.0) * x("x1"), Expr::Const(-1.0)];
        let f = Expr::lambdify_vector(&exprs, &["x1", "x2"]).unwrap();
        assert_eq!(f(&[2.0, 7.0]), DVector::from_vec(vec![7.0, 6.0, -1.0]));
    }

    #[test]
    fn test_lambdify_integer_power() {
        let f = x("x").pow(Expr::Const(3.0));
        let f_num = f.lambdify_borrowed_thread_safe(&["x"]).unwrap();
        assert_eq!(f_num(&[-2.0]), -8.0);
    }
}
