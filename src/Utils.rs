//! different utility modules used throughout the project
/// terminal + file logger built on simplelog
pub mod logger;
/// scoped and cumulative timers
pub mod timer;
