//! # Symbolic Engine Module
//!
//! Expression trees for vector fields of control systems. A vector field
//! `dx/dt = f(x, u)` is written as one `Expr` per state equation, state and input
//! symbols are plain `Expr::Var` nodes.
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! - **Variables**: `Var(String)` - symbols like "x1", "u1"
//! - **Constants**: `Const(f64)`
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow`
//! - **Functions**: `Exp`, `Ln`, `sin`, `cos`, `tg`, `ctg` and the inverse trigonometric ones
//!
//! ### Key Methods
//! - `Symbols("x1, x2")` - several symbols from a comma separated string
//! - `IndexedVars(n, "x")` - x1, x2 ... xn
//! - `substitute_variable`, `set_variable_from_map` - substitution
//! - `map_args` - rebuild a node from transformed children, every recursive
//!   transformation of the engine is written on top of it
//!
//! Trigonometric names follow mathematical notation (tg, ctg, arctg, arcctg).
#![allow(non_camel_case_types)]

use std::collections::HashMap;
use std::fmt;

/// Symbolic expression tree.
///
/// # Examples
/// ```rust, ignore
/// use RustedTrajectory::symbolic::symbolic_engine::Expr;
/// let x = Expr::Var("x1".to_string());
/// let f = x.clone() * Expr::Const(2.0) + Expr::sin(x.boxed());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Var(String),
    Const(f64),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    /// base ^ exponent
    Pow(Box<Expr>, Box<Expr>),
    Exp(Box<Expr>),
    Ln(Box<Expr>),
    sin(Box<Expr>),
    cos(Box<Expr>),
    tg(Box<Expr>),
    ctg(Box<Expr>),
    arcsin(Box<Expr>),
    arccos(Box<Expr>),
    arctg(Box<Expr>),
    arcctg(Box<Expr>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Add(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
            Expr::Sub(lhs, rhs) => write!(f, "({} - {})", lhs, rhs),
            Expr::Mul(lhs, rhs) => write!(f, "({} * {})", lhs, rhs),
            Expr::Div(lhs, rhs) => write!(f, "({} / {})", lhs, rhs),
            Expr::Pow(base, exp) => write!(f, "({} ^ {})", base, exp),
            Expr::Exp(arg) => write!(f, "exp({})", arg),
            Expr::Ln(arg) => write!(f, "ln({})", arg),
            Expr::sin(arg) => write!(f, "sin({})", arg),
            Expr::cos(arg) => write!(f, "cos({})", arg),
            Expr::tg(arg) => write!(f, "tg({})", arg),
            Expr::ctg(arg) => write!(f, "ctg({})", arg),
            Expr::arcsin(arg) => write!(f, "arcsin({})", arg),
            Expr::arccos(arg) => write!(f, "arccos({})", arg),
            Expr::arctg(arg) => write!(f, "arctg({})", arg),
            Expr::arcctg(arg) => write!(f, "arcctg({})", arg),
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Add<f64> for Expr {
    type Output = Self;

    fn add(self, rhs: f64) -> Self::Output {
        Expr::Add(self.boxed(), Expr::Const(rhs).boxed())
    }
}

impl std::ops::Sub<f64> for Expr {
    type Output = Self;

    fn sub(self, rhs: f64) -> Self::Output {
        Expr::Sub(self.boxed(), Expr::Const(rhs).boxed())
    }
}

impl std::ops::Mul<f64> for Expr {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Expr::Mul(self.boxed(), Expr::Const(rhs).boxed())
    }
}

impl std::ops::Mul<Expr> for f64 {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Self::Output {
        Expr::Mul(Expr::Const(self).boxed(), rhs.boxed())
    }
}

impl std::ops::Div<f64> for Expr {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Expr::Div(self.boxed(), Expr::Const(rhs).boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(self))
    }
}

impl From<f64> for Expr {
    fn from(val: f64) -> Self {
        Expr::Const(val)
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        Expr::Var(name.to_string())
    }
}

impl Expr {
    /// BASIC FEATURES

    /// Creates symbols from a comma-separated string, empty entries are skipped.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let x_sym = Expr::Symbols("x1, x2, x3");
    /// assert_eq!(x_sym.len(), 3);
    /// ```
    pub fn Symbols(symbols: &str) -> Vec<Expr> {
        symbols
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| Expr::Var(s.to_string()))
            .collect()
    }

    pub fn Symbol(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    /// Creates `num_vars` symbols numbered from 1, the way state and input vectors
    /// of control systems are usually written: x1, x2, ... xn.
    ///
    /// Returns the symbols and their names.
    pub fn IndexedVars(num_vars: usize, var_name: &str) -> (Vec<Expr>, Vec<String>) {
        let names: Vec<String> = (1..=num_vars)
            .map(|i| format!("{}{}", var_name, i))
            .collect();
        let symbols = names.iter().map(|name| Expr::Var(name.clone())).collect();
        (symbols, names)
    }

    /// Wraps expression in a Box for the recursive variants.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn exp(self) -> Expr {
        Expr::Exp(self.boxed())
    }

    pub fn ln(self) -> Expr {
        Expr::Ln(self.boxed())
    }

    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 0.0)
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 1.0)
    }

    /// true for a bare symbol
    pub fn is_symbol(&self) -> bool {
        matches!(self, Expr::Var(_))
    }

    /// Name of a bare symbol, `None` for any composite expression or constant.
    pub fn symbol_name(&self) -> Option<&str> {
        match self {
            Expr::Var(name) => Some(name.as_str()),
            _ => None,
        }
    }

    //________________________________TREE TRAVERSAL_________________________________

    /// Direct children of the node, left to right.
    pub fn args(&self) -> Vec<&Expr> {
        match self {
            Expr::Var(_) | Expr::Const(_) => Vec::new(),
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => vec![lhs.as_ref(), rhs.as_ref()],
            Expr::Exp(arg)
            | Expr::Ln(arg)
            | Expr::sin(arg)
            | Expr::cos(arg)
            | Expr::tg(arg)
            | Expr::ctg(arg)
            | Expr::arcsin(arg)
            | Expr::arccos(arg)
            | Expr::arctg(arg)
            | Expr::arcctg(arg) => vec![arg.as_ref()],
        }
    }

    /// Rebuilds the node with every direct child replaced by `f(child)`.
    /// Leaves are cloned unchanged.
    pub fn map_args<F>(&self, mut f: F) -> Expr
    where
        F: FnMut(&Expr) -> Expr,
    {
        match self {
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => Expr::Add(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Sub(lhs, rhs) => Expr::Sub(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Mul(lhs, rhs) => Expr::Mul(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Div(lhs, rhs) => Expr::Div(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Pow(base, exp) => Expr::Pow(f(base).boxed(), f(exp).boxed()),
            Expr::Exp(arg) => Expr::Exp(f(arg).boxed()),
            Expr::Ln(arg) => Expr::Ln(f(arg).boxed()),
            Expr::sin(arg) => Expr::sin(f(arg).boxed()),
            Expr::cos(arg) => Expr::cos(f(arg).boxed()),
            Expr::tg(arg) => Expr::tg(f(arg).boxed()),
            Expr::ctg(arg) => Expr::ctg(f(arg).boxed()),
            Expr::arcsin(arg) => Expr::arcsin(f(arg).boxed()),
            Expr::arccos(arg) => Expr::arccos(f(arg).boxed()),
            Expr::arctg(arg) => Expr::arctg(f(arg).boxed()),
            Expr::arcctg(arg) => Expr::arcctg(f(arg).boxed()),
        }
    }

    //________________________________SUBSTITUTION_________________________________

    /// substitute a variable with an expression
    pub fn substitute_variable(&self, var: &str, expr: &Expr) -> Expr {
        match self {
            Expr::Var(name) if name == var => expr.clone(),
            _ => self.map_args(|arg| arg.substitute_variable(var, expr)),
        }
    }

    /// Substitutes the variables found in `var_map` with constants.
    pub fn set_variable_from_map(&self, var_map: &HashMap<String, f64>) -> Expr {
        match self {
            Expr::Var(name) => match var_map.get(name) {
                Some(val) => Expr::Const(*val),
                None => self.clone(),
            },
            _ => self.map_args(|arg| arg.set_variable_from_map(var_map)),
        }
    }

    pub fn rename_variable(&self, old_var: &str, new_var: &str) -> Expr {
        match self {
            Expr::Var(name) if name == old_var => Expr::Var(new_var.to_string()),
            _ => self.map_args(|arg| arg.rename_variable(old_var, new_var)),
        }
    }

    /// check if the expression contains a variable
    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            _ => self.args().iter().any(|arg| arg.contains_variable(var_name)),
        }
    }
}

//___________________________________MACROS____________________________________

/// Macro to create symbols from a list of identifiers
/// Usage: symbols!(x1, x2, u1) -> (Expr::Var("x1"), Expr::Var("x2"), Expr::Var("u1"))
#[macro_export]
macro_rules! symbols {
    ($($var:ident),+ $(,)?) => {
        (
            $(
                $crate::symbolic::symbolic_engine::Expr::Var(stringify!($var).to_string())
            ),+
        )
    };
}
