//! Injection of synthesized signals into pulsar residuals
//!
//! Bridges the day-based residual stores of [`TimingPulsar`]s and the
//! second-based synthesis routines of `pta-core`. Every `add_*` operation
//! returns the injected signal in seconds and adds it (converted to days)
//! to the pulsar's residuals.
//!
//! ```text
//!  pulsars ─► epochs (s), directions ─► synthesize ─► residuals (s)
//!                                                        │ ÷ 86400
//!                                                        ▼
//!                                            pulsar.residuals_mut() +=
//! ```
//!
//! Randomness is owned by an [`Injector`]; the free functions build a
//! one-shot injector from an optional seed.

use pta_core::cw::{CwGenerator, CwOptions, CwSource};
use pta_core::gwb::{synthesize_background, GwbConfig};
use pta_core::sky::SkyDirection;
use pta_core::types::{InjectError, InjectResult};
use pta_core::units::DAY;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::f64::consts::PI;
use tracing::{debug, info};

use crate::pulsar::TimingPulsar;

/// Default position of a line's phase origin, as a fraction of the span
pub const DEFAULT_LINE_OFFSET: f64 = 0.5;

/// Owner of the random stream used by stochastic injections
#[derive(Debug, Clone)]
pub struct Injector {
    rng: StdRng,
}

impl Injector {
    /// Reproducible stream: the same seed and inputs give identical output.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Stream seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn from_rng(rng: StdRng) -> Self {
        Self { rng }
    }

    fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::with_seed)
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Background residuals (seconds) for each pulsar, in pulsar order.
    /// The pulsars are left untouched.
    pub fn create_gwb<P: TimingPulsar>(
        &mut self,
        pulsars: &[P],
        config: &GwbConfig,
    ) -> InjectResult<Vec<Vec<f64>>> {
        let (epochs, directions) = gather(pulsars)?;
        info!(
            pulsars = pulsars.len(),
            amplitude = config.amplitude,
            gamma = config.gamma,
            correlated = config.correlated,
            "creating GW background"
        );
        synthesize_background(&epochs, &directions, config, &mut self.rng)
    }

    /// Synthesize a background and add it to every pulsar's residuals.
    pub fn add_gwb<P: TimingPulsar>(
        &mut self,
        pulsars: &mut [P],
        config: &GwbConfig,
    ) -> InjectResult<Vec<Vec<f64>>> {
        for psr in pulsars.iter() {
            check_store(psr)?;
        }
        let residuals = self.create_gwb(pulsars, config)?;
        for (psr, res) in pulsars.iter_mut().zip(&residuals) {
            add_seconds(psr, res)?;
        }
        Ok(residuals)
    }
}

/// Epochs (seconds) and directions of every pulsar.
fn gather<P: TimingPulsar>(pulsars: &[P]) -> InjectResult<(Vec<Vec<f64>>, Vec<SkyDirection>)> {
    if pulsars.is_empty() {
        return Err(InjectError::NoPulsars);
    }
    let mut epochs = Vec::with_capacity(pulsars.len());
    let mut directions = Vec::with_capacity(pulsars.len());
    for psr in pulsars {
        directions.push(psr.sky_direction()?);
        epochs.push(psr.toas_seconds());
    }
    Ok((epochs, directions))
}

fn check_store<P: TimingPulsar + ?Sized>(pulsar: &P) -> InjectResult<()> {
    let expected = pulsar.toas().len();
    let actual = pulsar.residuals().len();
    if expected != actual {
        return Err(InjectError::LengthMismatch {
            what: "residual store",
            expected,
            actual,
        });
    }
    Ok(())
}

/// Add `signal` (seconds) to the pulsar's day-based residuals.
fn add_seconds<P: TimingPulsar + ?Sized>(pulsar: &mut P, signal: &[f64]) -> InjectResult<()> {
    check_store(pulsar)?;
    let store = pulsar.residuals_mut();
    if store.len() != signal.len() {
        return Err(InjectError::LengthMismatch {
            what: "injected signal",
            expected: store.len(),
            actual: signal.len(),
        });
    }
    for (r, s) in store.iter_mut().zip(signal) {
        *r += s / DAY;
    }
    Ok(())
}

/// One-shot [`Injector::create_gwb`]; `None` seeds from the operating system.
pub fn create_gwb<P: TimingPulsar>(
    pulsars: &[P],
    config: &GwbConfig,
    seed: Option<u64>,
) -> InjectResult<Vec<Vec<f64>>> {
    Injector::from_seed_option(seed).create_gwb(pulsars, config)
}

/// One-shot [`Injector::add_gwb`]; `None` seeds from the operating system.
pub fn add_gwb<P: TimingPulsar>(
    pulsars: &mut [P],
    config: &GwbConfig,
    seed: Option<u64>,
) -> InjectResult<Vec<Vec<f64>>> {
    Injector::from_seed_option(seed).add_gwb(pulsars, config)
}

/// Add the residuals of a circular binary to one pulsar.
///
/// `options.tref` is in seconds on the same scale as the epochs (MJD·86400).
pub fn add_cgw<P: TimingPulsar + ?Sized>(
    pulsar: &mut P,
    source: &CwSource,
    options: &CwOptions,
) -> InjectResult<Vec<f64>> {
    check_store(pulsar)?;
    let generator = CwGenerator::new(*source, *options)?;
    let direction = pulsar.sky_direction()?;
    let residuals = generator.residuals(&direction, &pulsar.toas_seconds())?;
    debug!(
        pulsar = pulsar.name(),
        fgw = source.fgw,
        chirp_mass = source.chirp_mass,
        "adding continuous wave"
    );
    add_seconds(pulsar, &residuals)?;
    Ok(residuals)
}

/// Add a sinusoid of frequency `freq` (Hz) and amplitude `amplitude`
/// (seconds).
///
/// The phase origin sits at `offset · (max − min)` days of the epoch span.
pub fn add_line<P: TimingPulsar + ?Sized>(
    pulsar: &mut P,
    freq: f64,
    amplitude: f64,
    offset: f64,
) -> InjectResult<Vec<f64>> {
    for (name, value) in [("freq", freq), ("amplitude", amplitude), ("offset", offset)] {
        if !value.is_finite() {
            return Err(InjectError::InvalidParameter {
                name,
                value,
                reason: "must be finite",
            });
        }
    }
    check_store(pulsar)?;
    let toas = pulsar.toas();
    if toas.is_empty() {
        return Err(InjectError::EmptyEpochs { index: 0 });
    }

    let (lo, hi) = toas
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| {
            (lo.min(t), hi.max(t))
        });
    let t0 = offset * (hi - lo);
    let line: Vec<f64> = toas
        .iter()
        .map(|&t| amplitude * (2.0 * PI * freq * DAY * (t - t0)).cos())
        .collect();
    debug!(pulsar = pulsar.name(), freq, amplitude, t0, "adding line");

    add_seconds(pulsar, &line)?;
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulsar::SimulatedPulsar;
    use approx::assert_relative_eq;
    use pta_core::cw::{cw_residuals, Evolution, PulsarTerm};

    fn cadence(start: f64, count: usize, step: f64) -> Vec<f64> {
        (0..count).map(|i| start + i as f64 * step).collect()
    }

    fn array() -> Vec<SimulatedPulsar> {
        vec![
            SimulatedPulsar::new("J0030+0451", 0.13, 0.08, cadence(53000.0, 200, 14.0)),
            SimulatedPulsar::new("J1909-3744", 5.01, -0.66, cadence(53100.0, 150, 20.0)),
            SimulatedPulsar::new("J1713+0747", 4.51, 0.14, cadence(52950.0, 120, 28.0)),
        ]
    }

    fn source() -> CwSource {
        CwSource {
            gwtheta: 1.1,
            gwphi: 3.9,
            chirp_mass: 5e8,
            distance: 50.0,
            fgw: 2e-8,
            phase0: 0.3,
            psi: 0.7,
            inc: 1.0,
            pulsar_term: PulsarTerm::Distance(1.2),
        }
    }

    /// Pulsar whose residual store is out of step with its epochs
    struct Truncated(SimulatedPulsar, Vec<f64>);

    impl TimingPulsar for Truncated {
        fn name(&self) -> &str {
            self.0.name()
        }
        fn toas(&self) -> &[f64] {
            self.0.toas()
        }
        fn param(&self, name: &str) -> Option<f64> {
            self.0.param(name)
        }
        fn residuals(&self) -> &[f64] {
            &self.1
        }
        fn residuals_mut(&mut self) -> &mut [f64] {
            &mut self.1
        }
    }

    #[test]
    fn test_create_gwb_reproducible() {
        let pulsars = array();
        let config = GwbConfig::new(1e-15, 4.33);
        let a = create_gwb(&pulsars, &config, Some(42)).unwrap();
        let b = Injector::with_seed(42).create_gwb(&pulsars, &config).unwrap();
        assert_eq!(a, b);
        for (res, psr) in a.iter().zip(&pulsars) {
            assert_eq!(res.len(), psr.len());
        }
        // Untouched by create
        assert!(pulsars.iter().all(|p| p.residuals().iter().all(|&r| r == 0.0)));
    }

    #[test]
    fn test_injector_stream_advances() {
        let pulsars = array();
        let config = GwbConfig::default();
        let mut injector = Injector::with_seed(5);
        let first = injector.create_gwb(&pulsars, &config).unwrap();
        let second = injector.create_gwb(&pulsars, &config).unwrap();
        assert_ne!(first, second);

        let mut fresh = Injector::from_rng(StdRng::seed_from_u64(5));
        assert_eq!(fresh.create_gwb(&pulsars, &config).unwrap(), first);
    }

    #[test]
    fn test_add_gwb_updates_residuals() {
        let mut pulsars = array();
        let config = GwbConfig::default();
        let injected = add_gwb(&mut pulsars, &config, Some(9)).unwrap();
        for (psr, res) in pulsars.iter().zip(&injected) {
            for (stored, r) in psr.residuals_seconds().iter().zip(res) {
                assert_relative_eq!(*stored, *r, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_boxed_pulsars() {
        let mut pulsars: Vec<Box<dyn TimingPulsar>> = array()
            .into_iter()
            .map(|p| Box::new(p) as Box<dyn TimingPulsar>)
            .collect();
        let config = GwbConfig::default().uncorrelated();
        let injected = Injector::with_seed(1).add_gwb(&mut pulsars, &config).unwrap();
        assert_eq!(injected.len(), 3);
        assert!(pulsars[0].residuals().iter().any(|&r| r != 0.0));
    }

    #[test]
    fn test_gwb_errors() {
        let empty: Vec<SimulatedPulsar> = Vec::new();
        assert_eq!(
            create_gwb(&empty, &GwbConfig::default(), Some(1)).unwrap_err(),
            InjectError::NoPulsars
        );

        let psr = array().remove(0);
        let mut bad = vec![Truncated(psr, vec![0.0; 3])];
        let err = add_gwb(&mut bad, &GwbConfig::default(), Some(1)).unwrap_err();
        assert!(matches!(err, InjectError::LengthMismatch { .. }));
    }

    #[test]
    fn test_add_cgw_matches_generator() {
        let mut psr = array().remove(1);
        let options = CwOptions::default();
        let injected = add_cgw(&mut psr, &source(), &options).unwrap();

        let direct = cw_residuals(
            &psr.sky_direction().unwrap(),
            &psr.toas_seconds(),
            &source(),
            &options,
        )
        .unwrap();
        assert_eq!(injected, direct);
        for (stored, r) in psr.residuals_seconds().iter().zip(&injected) {
            assert_relative_eq!(*stored, *r, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_add_cgw_on_axis_is_zero() {
        let mut psr = SimulatedPulsar::new("pole", 0.0, std::f64::consts::FRAC_PI_2, cadence(53000.0, 40, 30.0));
        let src = CwSource {
            gwtheta: 0.0,
            gwphi: 0.0,
            ..source()
        };
        let options = CwOptions::default()
            .earth_term_only()
            .with_evolution(Evolution::Monochromatic);
        add_cgw(&mut psr, &src, &options).unwrap();
        assert!(psr.residuals().iter().all(|&r| r == 0.0));
    }

    #[test]
    fn test_add_cgw_accumulates() {
        let mut psr = array().remove(0);
        let options = CwOptions::default().with_evolution(Evolution::PhaseApprox);
        let once = add_cgw(&mut psr, &source(), &options).unwrap();
        add_cgw(&mut psr, &source(), &options).unwrap();
        for (stored, r) in psr.residuals_seconds().iter().zip(&once) {
            assert_relative_eq!(*stored, 2.0 * r, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_add_line_phase_origin() {
        let mut psr = SimulatedPulsar::new("line", 1.0, 0.2, vec![0.0, 10.0, 20.0]);
        let amp = 1e-7;
        let line = add_line(&mut psr, 1e-7, amp, DEFAULT_LINE_OFFSET).unwrap();
        // Origin at 0.5·(20 − 0) = day 10
        assert_relative_eq!(line[1], amp, epsilon = 1e-20);
        assert_relative_eq!(line[0], line[2], epsilon = 1e-20);
        assert_relative_eq!(psr.residuals()[1], amp / DAY, max_relative = 1e-12);
    }

    #[test]
    fn test_add_line_rejects_bad_input() {
        let mut psr = SimulatedPulsar::new("line", 1.0, 0.2, vec![0.0, 1.0]);
        assert!(add_line(&mut psr, f64::NAN, 1e-7, 0.5).is_err());
        let mut empty = SimulatedPulsar::new("none", 1.0, 0.2, Vec::new());
        assert_eq!(
            add_line(&mut empty, 1e-8, 1e-7, 0.5).unwrap_err(),
            InjectError::EmptyEpochs { index: 0 }
        );
    }
}
