//! Error type shared by the symbolic preprocessing and the nonlinear solver.
//!
//! Computational failures (singular damped normal equations, a vector field that
//! cannot be compiled) are never recovered locally: they travel to the caller
//! carrying the message of the part that produced them.
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CollocationError {
    /// Two sequences that must have the same length do not.
    #[error("shape mismatch in {what}: expected {expected}, found {found}")]
    Shape {
        what: String,
        expected: usize,
        found: usize,
    },
    /// The damped normal-equations matrix could not be factorized.
    #[error("singular linear system: {0}")]
    SingularSystem(String),
    /// A symbolic expression could not be turned into a numeric function.
    #[error("failed to compile symbolic expression: {0}")]
    Compile(String),
    #[error("unknown algorithm '{0}', expected one of newton, gauss, leven")]
    UnknownAlgorithm(String),
    #[error("logger setup failed: {0}")]
    Logger(String),
}

impl CollocationError {
    pub fn shape(what: &str, expected: usize, found: usize) -> Self {
        CollocationError::Shape {
            what: what.to_string(),
            expected,
            found,
        }
    }
}

pub type Result<T> = std::result::Result<T, CollocationError>;
