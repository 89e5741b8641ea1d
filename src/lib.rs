// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
//! # RustedTrajectory
//!
//! Core of a collocation method for feasible trajectories of nonlinear control systems:
//! symbolic vector fields, integrator chain detection, compilation of the vector field into
//! numeric functions and a Levenberg-Marquardt solver for the collocation equations.
pub mod Examples;
pub mod Utils;
pub mod errors;
pub mod numerical;
pub mod symbolic;
