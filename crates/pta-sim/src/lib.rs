//! # Pulsar Timing Signal Injection
//!
//! Adds simulated gravitational-wave signals to the residuals of pulsar
//! timing data.
//!
//! - **Pulsars**: the [`TimingPulsar`](pulsar::TimingPulsar) interface and a
//!   noiseless [`SimulatedPulsar`](pulsar::SimulatedPulsar)
//! - **Injection**: stochastic background, continuous waves and sinusoidal
//!   lines, with an owned, seedable random stream
//! - **Scenarios**: YAML-described arrays and signal sets
//!
//! ## Example
//!
//! ```rust,no_run
//! use pta_core::gwb::GwbConfig;
//! use pta_sim::inject::Injector;
//! use pta_sim::pulsar::SimulatedPulsar;
//!
//! let epochs: Vec<f64> = (0..260).map(|i| 53000.0 + 14.0 * i as f64).collect();
//! let mut pulsars = vec![
//!     SimulatedPulsar::new("J0030+0451", 0.13, 0.08, epochs.clone()),
//!     SimulatedPulsar::new("J1909-3744", 5.01, -0.66, epochs),
//! ];
//!
//! let mut injector = Injector::with_seed(42);
//! injector.add_gwb(&mut pulsars, &GwbConfig::new(1e-15, 13.0 / 3.0))?;
//! # Ok::<(), pta_core::InjectError>(())
//! ```

pub mod inject;
pub mod pulsar;
pub mod scenario;

pub use inject::{add_cgw, add_gwb, add_line, create_gwb, Injector};
pub use pulsar::{SimulatedPulsar, TimingPulsar};
pub use scenario::{ScenarioConfig, ScenarioEngine, ScenarioError};
