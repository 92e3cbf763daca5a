//! Continuous GW from a single circular supermassive black-hole binary
//!
//! Closed-form timing residuals for a binary of chirp mass `Mc` at
//! luminosity distance `D`, radiating at GW frequency `f` (twice the orbital
//! frequency). In geometric time units (`Mc`, `D` in seconds, `ω = π f`):
//!
//! ```text
//!   A(t) = −½ (3 + cos 2ι) sin 2Φ(t)
//!   B(t) = 2 cos ι cos 2Φ(t)
//!   α(t) = Mc^(5/3) / (D ω(t)^(1/3))
//!   r+   = α (A cos 2ψ − B sin 2ψ)
//!   r×   = α (A sin 2ψ + B cos 2ψ)
//! ```
//!
//! The residual is the antenna-weighted difference of the waveform at the
//! pulsar (retarded time `t_p = t − L(1 − cos μ)`) and at the Earth:
//!
//! ```text
//!   R(t) = F+ (r+(t_p) − r+(t)) + F× (r×(t_p) − r×(t))
//! ```
//!
//! or `−F+ r+(t) − F× r×(t)` when the pulsar term is left out.
//!
//! ## Frequency evolution
//!
//! | [`Evolution`]   | Earth term                  | Pulsar term                          |
//! |-----------------|-----------------------------|--------------------------------------|
//! | `Full`          | `ω(t) = ω0 (1 − k t)^(−3/8)` | same law at `t_p`                    |
//! | `PhaseApprox`   | fixed `ω0`                  | fixed `ω0 (1 + k L(1 − cos μ))^(−3/8)` |
//! | `Monochromatic` | fixed `ω0`                  | fixed `ω0`                           |
//!
//! with `k = 256/5 Mc^(5/3) ω0^(8/3)`. A non-positive `1 − k t` means the
//! binary has merged inside the span and is reported as an error, as is a
//! non-positive `1 + k L(1 − cos μ)` at the pulsar.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

use crate::sky::{antenna_pattern, AntennaPattern, PolarizationBasis, SkyDirection};
use crate::types::{require_finite, require_positive, InjectError, InjectResult};
use crate::units::{KPC_SECONDS, MPC_SECONDS, SOLAR_MASS_SECONDS};

/// Below this `1 − cos μ` cannot fix a pulsar distance from a phase.
const AXIS_TOLERANCE: f64 = 1e-10;

/// Orbital frequency evolution policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evolution {
    /// Chirp at both Earth and pulsar
    #[default]
    Full,
    /// Fixed frequency at Earth, chirped (but constant) at the pulsar's epoch
    PhaseApprox,
    /// No evolution
    #[serde(alias = "none")]
    Monochromatic,
}

/// How the pulsar-term delay is specified
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PulsarTerm {
    /// Pulsar distance in kpc
    Distance(f64),
    /// GW phase accumulated between pulsar and Earth, radians
    Phase(f64),
}

impl Default for PulsarTerm {
    fn default() -> Self {
        PulsarTerm::Distance(1.0)
    }
}

/// Physical parameters of a circular binary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CwSource {
    /// Polar angle of the source, radians
    pub gwtheta: f64,
    /// Azimuthal angle of the source, radians
    pub gwphi: f64,
    /// Chirp mass in solar masses
    pub chirp_mass: f64,
    /// Luminosity distance in Mpc
    pub distance: f64,
    /// GW frequency in Hz
    pub fgw: f64,
    /// Initial GW phase, radians
    pub phase0: f64,
    /// Polarization angle, radians
    pub psi: f64,
    /// Inclination, radians
    pub inc: f64,
    #[serde(default)]
    pub pulsar_term: PulsarTerm,
}

impl CwSource {
    pub fn validate(&self) -> InjectResult<()> {
        require_finite("gwtheta", self.gwtheta)?;
        require_finite("gwphi", self.gwphi)?;
        require_positive("chirp_mass", self.chirp_mass)?;
        require_positive("distance", self.distance)?;
        require_positive("fgw", self.fgw)?;
        require_finite("phase0", self.phase0)?;
        require_finite("psi", self.psi)?;
        require_finite("inc", self.inc)?;
        match self.pulsar_term {
            PulsarTerm::Distance(d) => {
                if !(d.is_finite() && d >= 0.0) {
                    return Err(InjectError::invalid(
                        "pulsar_distance",
                        d,
                        "must be finite and non-negative",
                    ));
                }
            }
            PulsarTerm::Phase(p) => {
                require_finite("pulsar_phase", p)?;
            }
        }
        Ok(())
    }
}

/// Per-call switches for waveform generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CwOptions {
    /// Include the retarded pulsar term
    pub pulsar_term: bool,
    pub evolution: Evolution,
    /// Reference time subtracted from the epochs, seconds
    pub tref: f64,
}

impl Default for CwOptions {
    fn default() -> Self {
        Self {
            pulsar_term: true,
            evolution: Evolution::Full,
            tref: 0.0,
        }
    }
}

impl CwOptions {
    pub fn earth_term_only(mut self) -> Self {
        self.pulsar_term = false;
        self
    }

    pub fn with_evolution(mut self, evolution: Evolution) -> Self {
        self.evolution = evolution;
        self
    }
}

/// Waveform generator for one source, reusable across pulsars
#[derive(Debug, Clone)]
pub struct CwGenerator {
    source: CwSource,
    options: CwOptions,
    basis: PolarizationBasis,
    /// Initial orbital angular frequency π·fgw
    w0: f64,
    /// Initial orbital phase
    phase0: f64,
    /// Chirp rate 256/5 Mc^(5/3) ω0^(8/3)
    fac1: f64,
    /// Phase scale 1/(32 Mc^(5/3))
    fac2: f64,
    /// Amplitude scale Mc^(5/3)/D
    fac3: f64,
    inc_plus: f64,
    inc_cross: f64,
    sin2psi: f64,
    cos2psi: f64,
}

impl CwGenerator {
    pub fn new(source: CwSource, options: CwOptions) -> InjectResult<Self> {
        source.validate()?;
        require_finite("tref", options.tref)?;

        let mc = source.chirp_mass * SOLAR_MASS_SECONDS;
        let dist = source.distance * MPC_SECONDS;
        let mc53 = mc.powf(5.0 / 3.0);
        let w0 = PI * source.fgw;
        let (sin2psi, cos2psi) = (2.0 * source.psi).sin_cos();

        Ok(Self {
            basis: PolarizationBasis::for_source(source.gwtheta, source.gwphi),
            w0,
            phase0: source.phase0 / 2.0,
            fac1: 256.0 / 5.0 * mc53 * w0.powf(8.0 / 3.0),
            fac2: 1.0 / 32.0 / mc53,
            fac3: mc53 / dist,
            inc_plus: -0.5 * (3.0 + (2.0 * source.inc).cos()),
            inc_cross: 2.0 * source.inc.cos(),
            sin2psi,
            cos2psi,
            source,
            options,
        })
    }

    pub fn source(&self) -> &CwSource {
        &self.source
    }

    pub fn options(&self) -> &CwOptions {
        &self.options
    }

    /// Antenna pattern of `pulsar` for this source.
    pub fn antenna(&self, pulsar: &SkyDirection) -> InjectResult<AntennaPattern> {
        antenna_pattern(pulsar, &self.basis)
    }

    /// Pulsar-term delay `L` in seconds.
    pub fn pulsar_delay(&self, cos_mu: f64) -> InjectResult<f64> {
        let kpc = match self.source.pulsar_term {
            PulsarTerm::Distance(d) => d,
            PulsarTerm::Phase(pphase) => {
                let geom = 1.0 - cos_mu;
                if geom <= AXIS_TOLERANCE {
                    return Err(InjectError::UndefinedPulsarPhase);
                }
                let kpc = pphase / (2.0 * PI * self.source.fgw * geom) / KPC_SECONDS;
                if kpc < 0.0 {
                    return Err(InjectError::invalid(
                        "pulsar_phase",
                        pphase,
                        "implies a negative pulsar distance",
                    ));
                }
                kpc
            }
        };
        Ok(kpc * KPC_SECONDS)
    }

    /// Orbital angular frequency and phase at time `t` under the chirp law.
    fn evolved(&self, t: f64) -> InjectResult<(f64, f64)> {
        let remaining = 1.0 - self.fac1 * t;
        if !(remaining > 0.0) {
            return Err(InjectError::BinaryMerged { time: t, remaining });
        }
        let omega = self.w0 * remaining.powf(-3.0 / 8.0);
        let phase = self.phase0 + self.fac2 * (self.w0.powf(-5.0 / 3.0) - omega.powf(-5.0 / 3.0));
        Ok((omega, phase))
    }

    /// Fixed orbital frequency at the pulsar and its phase offset for a
    /// light-travel `delay` (seconds).
    fn pulsar_orbit(&self, delay: f64) -> InjectResult<(f64, f64)> {
        let remaining = 1.0 + self.fac1 * delay;
        if !(remaining > 0.0) {
            return Err(InjectError::BinaryMerged {
                time: -delay,
                remaining,
            });
        }
        let omega_p = self.w0 * remaining.powf(-3.0 / 8.0);
        let offset = self.fac2 * (self.w0.powf(-5.0 / 3.0) - omega_p.powf(-5.0 / 3.0));
        Ok((omega_p, offset))
    }

    /// Plus and cross waveforms for orbital frequency `omega` and phase `phase`.
    fn polarizations(&self, omega: f64, phase: f64) -> (f64, f64) {
        let (s, c) = (2.0 * phase).sin_cos();
        let at = s * self.inc_plus;
        let bt = c * self.inc_cross;
        let alpha = self.fac3 / omega.cbrt();
        (
            alpha * (at * self.cos2psi - bt * self.sin2psi),
            alpha * (at * self.sin2psi + bt * self.cos2psi),
        )
    }

    /// Residuals in seconds for a pulsar at `pulsar`, observed at `toas`
    /// (seconds).
    pub fn residuals(&self, pulsar: &SkyDirection, toas: &[f64]) -> InjectResult<Vec<f64>> {
        let pattern = self.antenna(pulsar)?;
        let with_psr = self.options.pulsar_term;
        let delay = if with_psr {
            self.pulsar_delay(pattern.cos_mu)? * (1.0 - pattern.cos_mu)
        } else {
            0.0
        };
        debug!(
            f_plus = pattern.f_plus,
            f_cross = pattern.f_cross,
            cos_mu = pattern.cos_mu,
            delay_s = delay,
            evolution = ?self.options.evolution,
            "continuous-wave residuals"
        );

        let approx_pulsar = match self.options.evolution {
            Evolution::PhaseApprox if with_psr => Some(self.pulsar_orbit(delay)?),
            _ => None,
        };

        toas.iter()
            .map(|&toa| {
                let t = toa - self.options.tref;
                let tp = t - delay;

                let (omega, phase) = match self.options.evolution {
                    Evolution::Full => self.evolved(t)?,
                    Evolution::PhaseApprox | Evolution::Monochromatic => {
                        (self.w0, self.phase0 + self.w0 * t)
                    }
                };
                let (rplus, rcross) = self.polarizations(omega, phase);

                if !with_psr {
                    return Ok(-pattern.f_plus * rplus - pattern.f_cross * rcross);
                }

                let (omega_p, phase_p) = match (self.options.evolution, approx_pulsar) {
                    (Evolution::Full, _) => self.evolved(tp)?,
                    (Evolution::PhaseApprox, Some((omega_p, offset))) => {
                        (omega_p, self.phase0 + offset + omega_p * t)
                    }
                    _ => (self.w0, self.phase0 + self.w0 * tp),
                };
                let (rplus_p, rcross_p) = self.polarizations(omega_p, phase_p);

                Ok(pattern.f_plus * (rplus_p - rplus) + pattern.f_cross * (rcross_p - rcross))
            })
            .collect()
    }
}

/// Residuals (seconds) of `source` for one pulsar.
pub fn cw_residuals(
    pulsar: &SkyDirection,
    toas: &[f64],
    source: &CwSource,
    options: &CwOptions,
) -> InjectResult<Vec<f64>> {
    CwGenerator::new(*source, *options)?.residuals(pulsar, toas)
}
