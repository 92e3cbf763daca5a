//! Characteristic-strain spectra and the synthesis frequency grid
//!
//! A stochastic background is described by its characteristic strain
//!
//! ```text
//!   h_c(f) = A (f / f_1yr)^α,        α = −(γ − 3) / 2
//! ```
//!
//! optionally bent at low frequency by a turnover
//!
//! ```text
//!   h_c(f) / (1 + (f/f0)^(κ(α − β)))^(1/κ)
//! ```
//!
//! and each frequency bin of a record of length `T·howml` carries residual
//! variance
//!
//! ```text
//!   C(f) = h_c(f)² · T · howml / (96 π² f³)
//! ```

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::types::{require_finite, require_positive, InjectError, InjectResult};
use crate::units::F_1YR;

/// Low-frequency turnover of a power-law spectrum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Turnover {
    /// Turnover frequency in Hz
    pub f0: f64,
    /// Spectral index of the strain spectrum well below `f0`
    pub beta: f64,
    /// Sharpness of the bend
    pub power: f64,
}

impl Default for Turnover {
    fn default() -> Self {
        Self {
            f0: 1e-9,
            beta: 1.0,
            power: 1.0,
        }
    }
}

impl Turnover {
    pub fn validate(&self) -> InjectResult<()> {
        require_positive("f0", self.f0)?;
        require_finite("beta", self.beta)?;
        require_positive("power", self.power)?;
        Ok(())
    }
}

/// Power-law characteristic strain spectrum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLawSpectrum {
    /// Strain amplitude at `f_1yr`
    pub amplitude: f64,
    /// Spectral index of the residual power spectrum
    pub gamma: f64,
    pub turnover: Option<Turnover>,
}

impl PowerLawSpectrum {
    pub fn new(amplitude: f64, gamma: f64) -> InjectResult<Self> {
        require_positive("amplitude", amplitude)?;
        require_finite("gamma", gamma)?;
        Ok(Self {
            amplitude,
            gamma,
            turnover: None,
        })
    }

    pub fn with_turnover(mut self, turnover: Turnover) -> InjectResult<Self> {
        turnover.validate()?;
        self.turnover = Some(turnover);
        Ok(self)
    }

    /// Strain spectral index α
    pub fn alpha(&self) -> f64 {
        -0.5 * (self.gamma - 3.0)
    }

    /// Characteristic strain at frequency `f` (Hz)
    pub fn characteristic_strain(&self, f: f64) -> f64 {
        let alpha = self.alpha();
        let mut hc = self.amplitude * (f / F_1YR).powf(alpha);
        if let Some(t) = self.turnover {
            let si = alpha - t.beta;
            hc /= (1.0 + (f / t.f0).powf(t.power * si)).powf(1.0 / t.power);
        }
        hc
    }

    /// Per-bin residual variance for a record of `duration` seconds
    /// oversampled by `howml`.
    pub fn bin_variance(&self, f: f64, duration: f64, howml: f64) -> f64 {
        let hc = self.characteristic_strain(f);
        hc * hc * duration * howml / (96.0 * PI * PI * f.powi(3))
    }
}

/// Evenly spaced frequencies `k·df`, `df = 1/(duration·howml)`, below Nyquist.
///
/// Bin 0 nominally sits at DC; it is clamped to bin 1 so the power law
/// stays finite there. The synthesizer zeroes that bin regardless.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyGrid {
    frequencies: Vec<f64>,
    df: f64,
}

impl FrequencyGrid {
    /// Grid for a record of `duration` seconds sampled every `dt` seconds.
    pub fn new(duration: f64, dt: f64, howml: f64) -> InjectResult<Self> {
        require_positive("duration", duration)?;
        require_positive("dt", dt)?;
        require_positive("howml", howml)?;

        let df = 1.0 / (duration * howml);
        let nyquist = 1.0 / (2.0 * dt);
        // Number of multiples of df strictly below Nyquist, absorbing
        // round-off in nyquist/df
        let nf = ((nyquist / df) - 1e-9).ceil().max(0.0) as usize;
        if nf < 3 {
            return Err(InjectError::InvalidParameter {
                name: "howml",
                value: howml,
                reason: "frequency grid needs at least three bins below Nyquist",
            });
        }

        let mut frequencies: Vec<f64> = (0..nf).map(|k| k as f64 * df).collect();
        frequencies[0] = frequencies[1];
        Ok(Self { frequencies, df })
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Number of bins, DC through the last bin below Nyquist
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Bin spacing in Hz
    pub fn spacing(&self) -> f64 {
        self.df
    }

    /// Length of the Hermitian-extended spectrum, `2·Nf − 2`
    pub fn fft_len(&self) -> usize {
        2 * self.frequencies.len() - 2
    }

    /// Per-bin variance of `spectrum` on this grid.
    pub fn variances(&self, spectrum: &PowerLawSpectrum, duration: f64, howml: f64) -> Vec<f64> {
        self.frequencies
            .iter()
            .map(|&f| spectrum.bin_variance(f, duration, howml))
            .collect()
    }
}
