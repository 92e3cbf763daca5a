//! Observability for synthesis runs
//!
//! Synthesis stages emit `tracing` events (grid sizes and bin counts at
//! `debug`, per-pulsar detail at `trace`, clamps at `warn`). This module
//! installs a subscriber for them.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
