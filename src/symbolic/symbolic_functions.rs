#![allow(non_camel_case_types)]

use crate::errors::{CollocationError, Result};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_lambdify::CompiledFn;
use nalgebra::DMatrix;

use rayon::prelude::*;

/// Compiled matrix function of an ordered argument slice.
pub type CompiledMatFn = Box<dyn Fn(&[f64]) -> DMatrix<f64> + Send + Sync>;

///
/// calculate symbolic jacobian and compile it
/// Example#
/// ```rust, ignore
/// use RustedTrajectory::symbolic::symbolic_functions::Jacobian;
/// use RustedTrajectory::symbolic::symbolic_engine::Expr;
///     let (x, names) = Expr::IndexedVars(2, "x");
///     // dx1/dt = x2, dx2/dt = -x1
///     let f = vec![x[1].clone(), -x[0].clone()];
///     let mut jac = Jacobian::from_vectors(f, x);
///     jac.calc_jacobian().unwrap();
///     let vars: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
///     let jac_num = jac.jacobian_generate(&vars).unwrap();
///     println!("{}", jac_num(&[1.0, 2.0]));
/// ```
pub struct Jacobian {
    pub vector_of_functions: Vec<Expr>, // vector of symbolic functions/expressions
    pub vector_of_variables: Vec<Expr>, // vector of symbolic variables
    pub variable_string: Vec<String>,   // names of the variables, same order
    pub symbolic_jacobian: Vec<Vec<Expr>>,
}

impl Jacobian {
    pub fn new() -> Self {
        Self {
            vector_of_functions: Vec::new(),
            vector_of_variables: Vec::new(),
            variable_string: Vec::new(),
            symbolic_jacobian: Vec::new(),
        }
    }

    pub fn from_vectors(vector_of_functions: Vec<Expr>, vector_of_variables: Vec<Expr>) -> Self {
        let variable_string = vector_of_variables.iter().map(|v| v.to_string()).collect();
        Self {
            vector_of_functions,
            vector_of_variables,
            variable_string,
            symbolic_jacobian: Vec::new(),
        }
    }
    /// Basic functionality: setting variables and functions
    pub fn set_vector_of_functions(&mut self, value: Vec<Expr>) {
        self.vector_of_functions = value;
    }

    pub fn set_variables(&mut self, varvec: &[&str]) {
        self.variable_string = varvec.iter().map(|s| s.trim().to_string()).collect();
        self.vector_of_variables = self
            .variable_string
            .iter()
            .map(|s| Expr::Var(s.clone()))
            .collect();
    }

    /// turn jacobian into readable format
    pub fn readable_jacobian(&self) -> Vec<Vec<String>> {
        self.symbolic_jacobian
            .iter()
            .map(|row| row.iter().map(|el| el.to_string()).collect())
            .collect()
    }

    /// calculate the symbolic jacobian in parallel
    ///
    /// Every variable must be a bare symbol; derivatives with respect to a composite
    /// expression are a compile error.
    pub fn calc_jacobian(&mut self) -> Result<()> {
        if let Some(bad) = self.vector_of_variables.iter().find(|v| !v.is_symbol()) {
            return Err(CollocationError::Compile(format!(
                "cannot differentiate with respect to non-symbol '{}'",
                bad
            )));
        }
        self.variable_string = self
            .vector_of_variables
            .iter()
            .filter_map(|v| v.symbol_name().map(|s| s.to_string()))
            .collect();

        let variable_string_vec = &self.variable_string;
        let new_jac: Vec<Vec<Expr>> = self
            .vector_of_functions
            .par_iter()
            .map(|func| {
                variable_string_vec
                    .par_iter()
                    .map(|var| func.diff(var).simplify())
                    .collect()
            })
            .collect();

        self.symbolic_jacobian = new_jac;
        Ok(())
    }

    /// creating function jacobian: every entry is compiled over `variable_str`, the
    /// result assembles them into a dense matrix on each call
    pub fn jacobian_generate(&self, variable_str: &[&str]) -> Result<CompiledMatFn> {
        let nrows = self.symbolic_jacobian.len();
        let ncols = self.vector_of_variables.len();
        let jacobian_functions: Vec<Vec<CompiledFn>> = self
            .symbolic_jacobian
            .par_iter()
            .map(|row| {
                row.par_iter()
                    .map(|partial| partial.lambdify_borrowed_thread_safe(variable_str))
                    .collect::<Result<Vec<CompiledFn>>>()
            })
            .collect::<Result<Vec<Vec<CompiledFn>>>>()?;

        Ok(Box::new(move |args: &[f64]| {
            DMatrix::from_fn(nrows, ncols, |i, j| jacobian_functions[i][j](args))
        }))
    }
} // end of impl

impl Default for Jacobian {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jacobian_with_extra_argument() {
        let x = Expr::Var("x".to_string());
        let y = Expr::Var("y".to_string());
        let z: Expr = Expr::Var("z".to_string());
        let eq1: Expr = z.clone() * x.clone() + Expr::exp(y.clone());
        let eq2: Expr = x + Expr::ln(z) + y;
        // eq = [z*x + e^y, x + ln(z) + y], differentiate by y, z
        // J = {{e^y, x}, {1, 1/z}}
        let mut jac = Jacobian::new();
        jac.set_vector_of_functions(vec![eq1, eq2]);
        jac.set_variables(&["y", "z"]);
        jac.calc_jacobian().unwrap();
        assert_eq!(jac.symbolic_jacobian[0][1], Expr::Var("x".to_string()));
        assert_eq!(jac.symbolic_jacobian[1][0], Expr::Const(1.0));

        let jac_num = jac.jacobian_generate(&["x", "y", "z"]).unwrap();
        assert_eq!(
            jac_num(&[10.0, 0.0, 1.0]),
            DMatrix::from_row_slice(2, 2, &[1.0, 10.0, 1.0, 1.0])
        );
    }

    #[test]
    fn test_jacobian_of_linear_field_is_constant() {
        let (x, names) = Expr::IndexedVars(2, "x");
        let f = vec![x[1].clone(), -x[0].clone()];
        let mut jac = Jacobian::from_vectors(f, x);
        jac.calc_jacobian().unwrap();
        let vars: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let jac_num = jac.jacobian_generate(&vars).unwrap();
        let expected = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, -1.0, 0.0]);
        assert_eq!(jac_num(&[3.0, -4.0]), expected);
        assert_eq!(jac_num(&[0.1, 7.0]), expected);
    }

    #[test]
    fn test_jacobian_rejects_composite_variable() {
        let x = Expr::Var("x".to_string());
        let mut jac = Jacobian::from_vectors(vec![x.clone()], vec![x * 2.0]);
        assert!(matches!(
            jac.calc_jacobian(),
            Err(CollocationError::Compile(_))
        ));
    }

    #[test]
    fn test_readable_jacobian() {
        let mut jac = Jacobian::new();
        jac.set_vector_of_functions(vec![Expr::Var("x".to_string()) * 3.0]);
        jac.set_variables(&["x"]);
        jac.calc_jacobian().unwrap();
        assert_eq!(jac.readable_jacobian(), vec![vec!["3".to_string()]]);
    }
}
