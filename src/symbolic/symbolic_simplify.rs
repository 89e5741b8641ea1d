//! # Simplification
//!
//! Three levels of rewriting, all bottom-up:
//!
//! - `canonicalize_unit` only removes the neutral literal `1` (`1*x`, `x*1`, `x/1`,
//!   `x^1`). It is the normalization used before comparing right-hand sides of a
//!   vector field with symbols: a field written as `1.0*x2` must be recognised as `x2`.
//! - `simplify_numbers` folds operations whose operands are all constants.
//! - `simplify` combines both and applies the zero identities. Symbolic jacobians
//!   pass through it so that structurally zero entries become `Const(0.0)`.
use crate::symbolic::symbolic_engine::Expr;
use std::f64::consts::PI;

impl Expr {
    /// Removes multiplications, divisions and powers by the literal one.
    ///
    /// - `1 * x` → `x`, `x * 1` → `x`
    /// - `x / 1` → `x`
    /// - `x ^ 1` → `x`
    ///
    /// Nothing else is rewritten, so `canonicalize_unit` never changes the value of
    /// an expression.
    pub fn canonicalize_unit(&self) -> Expr {
        let expr = self.map_args(|arg| arg.canonicalize_unit());
        match expr {
            Expr::Mul(lhs, rhs) if lhs.is_one() => *rhs,
            Expr::Mul(lhs, rhs) if rhs.is_one() => *lhs,
            Expr::Div(lhs, rhs) if rhs.is_one() => *lhs,
            Expr::Pow(base, exp) if exp.is_one() => *base,
            other => other,
        }
    }

    /// Evaluates every operation whose arguments are constants.
    ///
    /// - `Const(2) + Const(3)` → `Const(5)`
    /// - `sin(Const(0))` → `Const(0)`
    /// - `x + Const(2) + Const(3)` stays unchanged (no reassociation)
    pub fn simplify_numbers(&self) -> Expr {
        let expr = self.map_args(|arg| arg.simplify_numbers());
        fold_constants(&expr).unwrap_or(expr)
    }

    /// Constant folding plus the additive and multiplicative identities:
    /// `x + 0`, `0 + x`, `x - 0`, `x * 0`, `0 * x`, `0 / x`, `x ^ 0`, and the unit rules
    /// of [`Expr::canonicalize_unit`].
    pub fn simplify(&self) -> Expr {
        let expr = self.map_args(|arg| arg.simplify());
        if let Some(folded) = fold_constants(&expr) {
            return folded;
        }
        match expr {
            Expr::Add(lhs, rhs) if lhs.is_zero() => *rhs,
            Expr::Add(lhs, rhs) if rhs.is_zero() => *lhs,
            Expr::Sub(lhs, rhs) if rhs.is_zero() => *lhs,
            Expr::Sub(lhs, rhs) if lhs.is_zero() => Expr::Mul(Expr::Const(-1.0).boxed(), rhs),
            Expr::Sub(lhs, rhs) if lhs == rhs => Expr::Const(0.0),
            Expr::Mul(lhs, rhs) if lhs.is_zero() || rhs.is_zero() => Expr::Const(0.0),
            Expr::Mul(lhs, rhs) if lhs.is_one() => *rhs,
            Expr::Mul(lhs, rhs) if rhs.is_one() => *lhs,
            Expr::Div(lhs, _) if lhs.is_zero() => Expr::Const(0.0),
            Expr::Div(lhs, rhs) if rhs.is_one() => *lhs,
            Expr::Pow(_, exp) if exp.is_zero() => Expr::Const(1.0),
            Expr::Pow(base, exp) if exp.is_one() => *base,
            other => other,
        }
    }
}

/// Value of the node if all its direct children are constants.
fn fold_constants(expr: &Expr) -> Option<Expr> {
    let args = expr.args();
    if args.is_empty() {
        return None;
    }
    let values: Vec<f64> = args
        .iter()
        .map(|arg| match arg {
            Expr::Const(val) => Some(*val),
            _ => None,
        })
        .collect::<Option<Vec<f64>>>()?;
    let val = match expr {
        Expr::Add(_, _) => values[0] + values[1],
        Expr::Sub(_, _) => values[0] - values[1],
        Expr::Mul(_, _) => values[0] * values[1],
        Expr::Div(_, _) => values[0] / values[1],
        Expr::Pow(_, _) => values[0].powf(values[1]),
        Expr::Exp(_) => values[0].exp(),
        Expr::Ln(_) => values[0].ln(),
        Expr::sin(_) => values[0].sin(),
        Expr::cos(_) => values[0].cos(),
        Expr::tg(_) => values[0].tan(),
        Expr::ctg(_) => 1.0 / values[0].tan(),
        Expr::arcsin(_) => values[0].asin(),
        Expr::arccos(_) => values[0].acos(),
        Expr::arctg(_) => values[0].atan(),
        Expr::arcctg(_) => PI / 2.0 - values[0].atan(),
        Expr::Var(_) | Expr::Const(_) => return None,
    };
    Some(Expr::Const(val))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    #[test]
    fn test_canonicalize_unit_factor() {
        let expr = Expr::Const(1.0) * x("x2");
        assert_eq!(expr.canonicalize_unit(), x("x2"));
        let expr = x("x2") * 1.0;
        assert_eq!(expr.canonicalize_unit(), x("x2"));
    }

    #[test]
    fn test_canonicalize_unit_nested() {
        // ((1*u1)^1)/1
        let expr = (Expr::Const(1.0) * x("u1")).pow(Expr::Const(1.0)) / 1.0;
        assert_eq!(expr.canonicalize_unit(), x("u1"));
    }

    #[test]
    fn test_canonicalize_unit_keeps_other_constants() {
        let expr = Expr::Const(2.0) * x("x1");
        assert_eq!(expr.canonicalize_unit(), expr);
        let expr = x("x1") + 1.0;
        assert_eq!(expr.canonicalize_unit(), expr);
    }

    #[test]
    fn test_simplify_numbers() {
        let expr = Expr::Const(2.0) + Expr::Const(3.0);
        assert_eq!(expr.simplify_numbers(), Expr::Const(5.0));
        let expr = Expr::sin(Expr::Const(0.0).boxed()) * x("x1");
        assert_eq!(
            expr.simplify_numbers(),
            Expr::Mul(Expr::Const(0.0).boxed(), x("x1").boxed())
        );
    }

    #[test]
    fn test_simplify_identities() {
        let expr = Expr::Const(0.0) * x("x1") + x("x2") * 1.0;
        assert_eq!(expr.simplify(), x("x2"));
        let expr = x("x1").pow(Expr::Const(0.0));
        assert_eq!(expr.simplify(), Expr::Const(1.0));
        let expr = x("x1") - x("x1");
        assert_eq!(expr.simplify(), Expr::Const(0.0));
    }

    #[test]
    fn test_simplify_negation_of_zero_minus() {
        let expr = Expr::Const(0.0) - x("x1");
        assert_eq!(
            expr.simplify(),
            Expr::Mul(Expr::Const(-1.0).boxed(), x("x1").boxed())
        );
    }
}
