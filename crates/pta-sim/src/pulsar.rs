//! Pulsar abstraction
//!
//! Injection only needs a small slice of a timing model: the pulsar's sky
//! position, its observation epochs and a residual store to add into.
//! Anything that can supply those (a full timing package binding, a fake
//! pulsar built for simulation) implements [`TimingPulsar`].

use pta_core::sky::SkyDirection;
use pta_core::types::{InjectError, InjectResult};
use pta_core::units::{days_to_seconds, DAY};
use serde::{Deserialize, Serialize};

/// Right ascension parameter name, radians
pub const RAJ: &str = "RAJ";
/// Declination parameter name, radians
pub const DECJ: &str = "DECJ";

/// Common interface for pulsars receiving injected signals
pub trait TimingPulsar {
    /// Pulsar name (e.g. "J1909-3744")
    fn name(&self) -> &str;

    /// Observation epochs in days (MJD)
    fn toas(&self) -> &[f64];

    /// Timing-model parameter by name, `None` if the model lacks it
    fn param(&self, name: &str) -> Option<f64>;

    /// Residual store in days, co-indexed with [`toas`](Self::toas)
    fn residuals(&self) -> &[f64];

    /// Mutable residual store in days
    fn residuals_mut(&mut self) -> &mut [f64];

    /// Observation epochs in seconds
    fn toas_seconds(&self) -> Vec<f64> {
        days_to_seconds(self.toas())
    }

    /// Line-of-sight unit vector from `RAJ`/`DECJ`.
    fn sky_direction(&self) -> InjectResult<SkyDirection> {
        let lookup = |key: &str| {
            self.param(key)
                .ok_or_else(|| InjectError::MissingParameter(format!("{key} for {}", self.name())))
        };
        let ra = lookup(RAJ)?;
        let dec = lookup(DECJ)?;
        Ok(SkyDirection::from_equatorial(ra, dec))
    }
}

impl<P: TimingPulsar + ?Sized> TimingPulsar for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn toas(&self) -> &[f64] {
        (**self).toas()
    }

    fn param(&self, name: &str) -> Option<f64> {
        (**self).param(name)
    }

    fn residuals(&self) -> &[f64] {
        (**self).residuals()
    }

    fn residuals_mut(&mut self) -> &mut [f64] {
        (**self).residuals_mut()
    }
}

/// Noiseless pulsar with ideal (zero) residuals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedPulsar {
    name: String,
    /// Right ascension, radians
    ra: f64,
    /// Declination, radians
    dec: f64,
    /// Epochs, days
    toas: Vec<f64>,
    /// Observing frequency per epoch, MHz
    frequencies: Vec<f64>,
    /// Residuals, days
    residuals: Vec<f64>,
}

impl SimulatedPulsar {
    /// Default observing frequency in MHz
    pub const DEFAULT_FREQUENCY: f64 = 1440.0;

    pub fn new(name: impl Into<String>, ra: f64, dec: f64, toas: Vec<f64>) -> Self {
        let n = toas.len();
        Self {
            name: name.into(),
            ra,
            dec,
            toas,
            frequencies: vec![Self::DEFAULT_FREQUENCY; n],
            residuals: vec![0.0; n],
        }
    }

    /// Per-epoch observing frequencies (MHz).
    pub fn with_frequencies(mut self, frequencies: Vec<f64>) -> InjectResult<Self> {
        if frequencies.len() != self.toas.len() {
            return Err(InjectError::LengthMismatch {
                what: "observing frequencies",
                expected: self.toas.len(),
                actual: frequencies.len(),
            });
        }
        self.frequencies = frequencies;
        Ok(self)
    }

    pub fn ra(&self) -> f64 {
        self.ra
    }

    pub fn dec(&self) -> f64 {
        self.dec
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn len(&self) -> usize {
        self.toas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toas.is_empty()
    }

    /// Residuals converted to seconds
    pub fn residuals_seconds(&self) -> Vec<f64> {
        self.residuals.iter().map(|r| r * DAY).collect()
    }

    /// Return residuals to zero
    pub fn reset_residuals(&mut self) {
        self.residuals.iter_mut().for_each(|r| *r = 0.0);
    }
}

impl TimingPulsar for SimulatedPulsar {
    fn name(&self) -> &str {
        &self.name
    }

    fn toas(&self) -> &[f64] {
        &self.toas
    }

    fn param(&self, name: &str) -> Option<f64> {
        match name {
            RAJ => Some(self.ra),
            DECJ => Some(self.dec),
            _ => None,
        }
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn residuals_mut(&mut self) -> &mut [f64] {
        &mut self.residuals
    }
}
