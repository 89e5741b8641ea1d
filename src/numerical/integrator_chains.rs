//! # Integrator chains
//!
//! An integrator chain of a control system `dx/dt = f(x, u)` is a sequence of
//! variables `(v1, v2, ..., vk)` with `dv_i/dt = v_{i+1}`. The upper end `v1` is a
//! state, the lower end is either a state or an input. Along a chain only the lower
//! end carries real dynamics: the other variables are derivatives of it, so the
//! collocation problem only has to solve the equations of states that are lower
//! ends of chains.
//!
//! Chains are read off a substitution graph: equation `i` whose right hand side is
//! the bare symbol `s` gives the edge `s -> x_i` ("the derivative of `x_i` is `s`").
//! The chain starts at a node that has no outgoing edge and follows incoming edges.
//!
//! ```rust, ignore
//! use RustedTrajectory::numerical::integrator_chains::find_integrator_chains;
//! use RustedTrajectory::symbolic::symbolic_engine::Expr;
//! let x = Expr::Symbols("x1, x2");
//! let u = Expr::Symbols("u1");
//! // dx1/dt = x2, dx2/dt = -x1 + u1
//! let fi = vec![x[1].clone(), -x[0].clone() + u[0].clone()];
//! let res = find_integrator_chains(&fi, &x, &u).unwrap();
//! assert_eq!(res.chains[0].to_string(), "x1 -> x2");
//! assert_eq!(res.eqind, vec![1]);
//! ```
use crate::errors::{CollocationError, Result};
use crate::symbolic::symbolic_engine::Expr;
use itertools::Itertools;
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

/// Ordered, immutable sequence of symbols forming an integrator chain.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegChain {
    elements: Vec<Expr>,
}

impl IntegChain {
    /// A chain needs at least one element.
    pub fn new(elements: Vec<Expr>) -> Result<Self> {
        if elements.is_empty() {
            return Err(CollocationError::shape("integrator chain", 1, 0));
        }
        Ok(IntegChain { elements })
    }

    /// first element
    pub fn upper(&self) -> &Expr {
        &self.elements[0]
    }

    /// last element
    pub fn lower(&self) -> &Expr {
        &self.elements[self.elements.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, item: &Expr) -> bool {
        self.elements.contains(item)
    }

    pub fn get(&self, index: usize) -> Option<&Expr> {
        self.elements.get(index)
    }

    pub fn elements(&self) -> &[Expr] {
        &self.elements
    }
}

impl Index<usize> for IntegChain {
    type Output = Expr;

    fn index(&self, index: usize) -> &Expr {
        &self.elements[index]
    }
}

impl fmt::Display for IntegChain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.elements.iter().join(" -> "))
    }
}

/// Result of the chain search.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSet {
    pub chains: Vec<IntegChain>,
    /// sorted indices of the equations that have to be solved by collocation
    pub eqind: Vec<usize>,
}

/// Directed graph `symbol -> state`, one edge per distinct source symbol.
///
/// Recording an edge for a source that already has one replaces its target but keeps
/// the position of the first insertion, so traversal order only depends on when a
/// source was first seen.
#[derive(Debug, Default)]
struct SubstitutionGraph {
    edges: Vec<(Expr, Expr)>,
    position: HashMap<String, usize>,
}

impl SubstitutionGraph {
    fn insert(&mut self, source: &Expr, source_name: &str, target: &Expr) {
        match self.position.get(source_name) {
            Some(&idx) => self.edges[idx].1 = target.clone(),
            None => {
                self.position
                    .insert(source_name.to_string(), self.edges.len());
                self.edges.push((source.clone(), target.clone()));
            }
        }
    }

    fn is_source(&self, node: &Expr) -> bool {
        node.symbol_name()
            .is_some_and(|name| self.position.contains_key(name))
    }

    /// Targets that are not sources themselves, in insertion order.
    fn upper_ends(&self) -> Vec<Expr> {
        let mut uppers: Vec<Expr> = Vec::new();
        for (_, target) in &self.edges {
            if !self.is_source(target) && !uppers.contains(target) {
                uppers.push(target.clone());
            }
        }
        uppers
    }

    /// target name -> source
    fn inverted(&self) -> HashMap<String, Expr> {
        self.edges
            .iter()
            .filter_map(|(source, target)| {
                target
                    .symbol_name()
                    .map(|name| (name.to_string(), source.clone()))
            })
            .collect()
    }

    /// Follows incoming edges from `upper` as long as possible.
    fn walk(&self, upper: &Expr, inverted: &HashMap<String, Expr>) -> Vec<Expr> {
        let mut chain = vec![upper.clone()];
        let mut node = upper.clone();
        while let Some(next) = node.symbol_name().and_then(|name| inverted.get(name)) {
            // every node has at most one incoming edge and the walk starts at a node
            // without outgoing edge, so it cannot enter a cycle
            if chain.len() > self.edges.len() {
                break;
            }
            chain.push(next.clone());
            node = next.clone();
        }
        chain
    }
}

/// Searches for integrator chains in the vector field `fi`, i.e. equations of the form
/// `dx_i/dt = x_j` or `dx_i/dt = u_j`.
///
/// Right hand sides are compared with the symbols after removing the literal one
/// (`1.0*x2` is `x2`).
///
/// Returns the chains and the indices of the equations that have to be solved by
/// collocation: the states that are lower ends of chains. If no chain ends in a state,
/// or there are no chains at all, every equation has to be solved. A lower end named like
/// a state (`x...`) that is missing from `x_sym` is a `Compile` error.
pub fn find_integrator_chains(fi: &[Expr], x_sym: &[Expr], u_sym: &[Expr]) -> Result<ChainSet> {
    find_integrator_chains_with(fi, x_sym, u_sym, |rhs, sym| rhs == sym)
}

/// Same as [`find_integrator_chains`] with a custom test "right hand side equals symbol".
/// The right hand side passed to `is_same` is already canonicalized.
pub fn find_integrator_chains_with<P>(
    fi: &[Expr],
    x_sym: &[Expr],
    u_sym: &[Expr],
    is_same: P,
) -> Result<ChainSet>
where
    P: Fn(&Expr, &Expr) -> bool,
{
    let n = x_sym.len();
    if fi.len() != n {
        return Err(CollocationError::shape("vector field equations", n, fi.len()));
    }

    let mut graph = SubstitutionGraph::default();
    for (i, rhs) in fi.iter().enumerate() {
        let rhs = rhs.canonicalize_unit();
        for sym in x_sym.iter().chain(u_sym.iter()) {
            if let Some(name) = sym.symbol_name() {
                if is_same(&rhs, sym) {
                    graph.insert(sym, name, &x_sym[i]);
                }
            }
        }
    }

    let inverted = graph.inverted();
    let mut chains: Vec<IntegChain> = Vec::new();
    for upper in graph.upper_ends() {
        let chain = IntegChain::new(graph.walk(&upper, &inverted))?;
        debug!("--> found: {}", chain);
        chains.push(chain);
    }

    let mut eqind: Vec<usize> = Vec::new();
    for chain in &chains {
        let lower = chain.lower();
        let Some(name) = lower.symbol_name() else {
            continue;
        };
        if !name.starts_with('x') {
            continue;
        }
        match x_sym.iter().position(|x| x == lower) {
            Some(idx) => eqind.push(idx),
            None => {
                return Err(CollocationError::Compile(format!(
                    "lower end '{}' of chain {} is not a state",
                    name, chain
                )));
            }
        }
    }
    eqind.sort_unstable();
    if eqind.is_empty() {
        eqind = (0..n).collect();
    }

    Ok(ChainSet { chains, eqind })
}
