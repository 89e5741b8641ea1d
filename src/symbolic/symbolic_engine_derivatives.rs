//! # Derivatives and direct evaluation
//!
//! - `diff(var)` - analytical partial derivative (sum, product, quotient, power and
//!   chain rules)
//! - `all_arguments_are_variables()` - sorted unique names of the symbols in the tree
//! - `eval_expression(vars, values)` - evaluation without building a closure, used to
//!   cross-check compiled functions
use crate::symbolic::symbolic_engine::Expr;
use std::collections::HashMap;

impl Expr {
    /// DIFFERENTIATION

    /// Computes the analytical derivative of the expression with respect to `var`.
    ///
    /// The result is not simplified, call `simplify()` on it when a compact tree is
    /// needed (the symbolic Jacobian does).
    ///
    /// # Examples
    /// ```rust, ignore
    /// let x = Expr::Var("x".to_string());
    /// let f = x.clone().pow(Expr::Const(2.0)); // x^2
    /// let df_dx = f.diff("x").simplify(); // 2*x
    /// ```
    pub fn diff(&self, var: &str) -> Expr {
        match self {
            Expr::Var(name) => {
                if name == var {
                    Expr::Const(1.0)
                } else {
                    Expr::Const(0.0)
                }
            }
            Expr::Const(_) => Expr::Const(0.0),
            Expr::Add(lhs, rhs) => lhs.diff(var) + rhs.diff(var),
            Expr::Sub(lhs, rhs) => lhs.diff(var) - rhs.diff(var),
            Expr::Mul(lhs, rhs) => {
                let (l, r) = (lhs.as_ref().clone(), rhs.as_ref().clone());
                l.diff(var) * r.clone() + l * r.diff(var)
            }
            Expr::Div(lhs, rhs) => {
                let (l, r) = (lhs.as_ref().clone(), rhs.as_ref().clone());
                (l.diff(var) * r.clone() - l * r.diff(var)) / (r.clone() * r)
            }
            Expr::Pow(base, exp) => {
                let (b, e) = (base.as_ref().clone(), exp.as_ref().clone());
                if e.contains_variable(var) {
                    // d(b^e) = b^e * (e' * ln(b) + e * b'/b)
                    self.clone() * (e.diff(var) * b.clone().ln() + e * b.diff(var) / b)
                } else {
                    e.clone() * b.clone().pow(e - 1.0) * b.diff(var)
                }
            }
            Expr::Exp(arg) => self.clone() * arg.diff(var),
            Expr::Ln(arg) => arg.diff(var) / arg.as_ref().clone(),
            Expr::sin(arg) => Expr::cos(arg.clone()) * arg.diff(var),
            Expr::cos(arg) => -Expr::sin(arg.clone()) * arg.diff(var),
            Expr::tg(arg) => arg.diff(var) / Expr::cos(arg.clone()).pow(Expr::Const(2.0)),
            Expr::ctg(arg) => -arg.diff(var) / Expr::sin(arg.clone()).pow(Expr::Const(2.0)),
            Expr::arcsin(arg) => arg.diff(var) / one_minus_square(arg).pow(Expr::Const(0.5)),
            Expr::arccos(arg) => -arg.diff(var) / one_minus_square(arg).pow(Expr::Const(0.5)),
            Expr::arctg(arg) => arg.diff(var) / one_plus_square(arg),
            Expr::arcctg(arg) => -arg.diff(var) / one_plus_square(arg),
        }
    }

    /// Sorted, deduplicated names of all symbols in the expression.
    pub fn all_arguments_are_variables(&self) -> Vec<String> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars.sort();
        vars.dedup();
        vars
    }

    fn collect_variables(&self, acc: &mut Vec<String>) {
        match self {
            Expr::Var(name) => acc.push(name.clone()),
            _ => {
                for arg in self.args() {
                    arg.collect_variables(acc);
                }
            }
        }
    }

    /// Evaluates the expression by substituting `values` for `vars` and folding
    /// constants. Symbols missing from `vars` leave a non-constant result, which is
    /// reported as NaN.
    pub fn eval_expression(&self, vars: &[&str], values: &[f64]) -> f64 {
        let var_map: HashMap<String, f64> = vars
            .iter()
            .zip(values.iter())
            .map(|(name, val)| (name.to_string(), *val))
            .collect();
        match self.set_variable_from_map(&var_map).simplify_numbers() {
            Expr::Const(val) => val,
            _ => f64::NAN,
        }
    }
}

fn one_minus_square(arg: &Expr) -> Expr {
    Expr::Const(1.0) - arg.clone().pow(Expr::Const(2.0))
}

fn one_plus_square(arg: &Expr) -> Expr {
    Expr::Const(1.0) + arg.clone().pow(Expr::Const(2.0))
}
