//! examples of usage of RustedTrajectory
/// Integrator chains, compiled vector fields and the Levenberg-Marquardt solver
pub mod trajectory_examples;
