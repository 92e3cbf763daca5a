//! # Pulsar-Timing GW Signal Synthesis
//!
//! Synthesizes the timing-residual perturbations that gravitational waves
//! imprint on an array of millisecond pulsars.
//!
//! ## Overview
//!
//! - **Sky geometry**: pulsar and source directions, antenna patterns
//! - **Overlap reduction**: Hellings–Downs correlation between pulsar pairs
//! - **Stochastic background**: Cholesky-correlated Gaussian spectra shaped
//!   by a power law, inverse FFT to the time domain, resampled to each
//!   pulsar's epochs
//! - **Continuous waves**: closed-form residuals of a circular binary, with
//!   optional pulsar term and frequency evolution
//!
//! ## Signal Flow
//!
//! ```text
//! GWB: directions → ORF → Cholesky ─┐
//!      epochs → grid → h_c(f), C(f) ├→ correlated spectra → IFFT → trim → interpolate
//!      rng (pulsar-major draws) ────┘
//! CW:  source + pulsar → antenna pattern → Earth/pulsar waveforms → residuals
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use pta_core::gwb::{synthesize_background, GwbConfig};
//! use pta_core::sky::SkyDirection;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let directions = vec![
//!     SkyDirection::from_equatorial(1.2, 0.3),
//!     SkyDirection::from_equatorial(4.0, -0.8),
//! ];
//! let epochs: Vec<Vec<f64>> = (0..2)
//!     .map(|_| (0..200).map(|i| i as f64 * 14.0 * 86400.0).collect())
//!     .collect();
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let residuals =
//!     synthesize_background(&epochs, &directions, &GwbConfig::default(), &mut rng)?;
//! assert_eq!(residuals[0].len(), 200);
//! # Ok::<(), pta_core::InjectError>(())
//! ```

pub mod cw;
pub mod fft_utils;
pub mod gwb;
pub mod interp;
pub mod linalg;
pub mod observe;
pub mod orf;
pub mod quantize;
pub mod sky;
pub mod spectrum;
pub mod types;
pub mod units;

pub use cw::{cw_residuals, CwGenerator, CwOptions, CwSource, Evolution, PulsarTerm};
pub use gwb::{synthesize_background, GwbConfig, SynthesisGrid};
pub use orf::{CoincidencePolicy, OrfMatrix};
pub use quantize::{quantize, Quantized};
pub use sky::{antenna_pattern, AntennaPattern, PolarizationBasis, SkyDirection};
pub use spectrum::{FrequencyGrid, PowerLawSpectrum, Turnover};
pub use types::{InjectError, InjectResult};
