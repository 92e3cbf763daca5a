//! Scenario-driven injection
//!
//! Builds a simulated array from a [`ScenarioConfig`] and runs every
//! injection it lists, in a fixed order: background, continuous waves,
//! lines.

pub mod config;
pub mod engine;

pub use config::{
    ContinuousSpec, EpochSpec, LineSpec, PulsarSpec, ScenarioConfig, ScenarioError, ScenarioResult,
};
pub use engine::{PulsarSummary, ScenarioEngine};
