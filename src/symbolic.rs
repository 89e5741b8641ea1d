#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// # Symbolic engine
/// expression trees for vector fields of control systems
/// 1) builds symbolic expressions from symbols, constants and operators
/// 2) differentiates and simplifies them
/// 3) turns a symbolic expression into a Rust closure
///# Example#
/// ```rust, ignore
/// use RustedTrajectory::symbolic::symbolic_engine::Expr;
/// let (x, names) = Expr::IndexedVars(2, "x");
/// let f = x[0].clone() * x[1].clone() + Expr::sin(x[1].clone().boxed());
/// let vars: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
/// let f_num = f.lambdify_borrowed_thread_safe(&vars).unwrap();
/// println!("{}", f_num(&[1.0, 2.0]));
/// ```
pub mod symbolic_engine;
/// analytical derivatives and direct evaluation of expressions
pub mod symbolic_engine_derivatives;
/// constant folding, neutral-element identities, canonical form of the literal 1
pub mod symbolic_simplify;
/// compilation of expressions into thread safe closures over an ordered argument slice
pub mod symbolic_lambdify;
///____________________________________________________________________________________________________________________________
/// # Jacobian
/// symbolic jacobian of a vector of functions, computed in parallel, and its compiled
/// dense matrix form
pub mod symbolic_functions;
