//! Scenario engine: builds the simulated array and applies each injection

use tracing::{debug, info};

use super::config::{ScenarioConfig, ScenarioError, ScenarioResult};
use crate::inject::{add_cgw, add_line, Injector};
use crate::pulsar::{SimulatedPulsar, TimingPulsar};

/// Per-pulsar outcome of a run
#[derive(Debug, Clone, PartialEq)]
pub struct PulsarSummary {
    pub name: String,
    pub epochs: usize,
    /// RMS of the accumulated residuals, seconds
    pub rms: f64,
}

/// Runs a scenario against its own simulated pulsars
#[derive(Debug)]
pub struct ScenarioEngine {
    config: ScenarioConfig,
    pulsars: Vec<SimulatedPulsar>,
    injector: Injector,
}

impl ScenarioEngine {
    /// Validate `config`, build its pulsars and install its logging
    /// configuration unless a subscriber is already in place.
    pub fn new(config: ScenarioConfig) -> ScenarioResult<Self> {
        config.validate()?;
        if !config.init_logging() {
            debug!("keeping the existing tracing subscriber");
        }
        let pulsars = config
            .pulsars
            .iter()
            .map(|spec| spec.build())
            .collect::<ScenarioResult<Vec<_>>>()?;
        let injector = Self::injector_for(&config);
        Ok(Self {
            config,
            pulsars,
            injector,
        })
    }

    fn injector_for(config: &ScenarioConfig) -> Injector {
        match config.seed {
            Some(seed) => Injector::with_seed(seed),
            None => Injector::from_entropy(),
        }
    }

    /// Inject every configured signal into the pulsars.
    pub fn run(&mut self) -> ScenarioResult<Vec<PulsarSummary>> {
        info!(
            pulsars = self.pulsars.len(),
            background = self.config.gwb.is_some(),
            continuous = self.config.continuous.len(),
            lines = self.config.lines.len(),
            "running scenario"
        );

        if let Some(gwb) = &self.config.gwb {
            self.injector.add_gwb(&mut self.pulsars, gwb)?;
        }

        for cw in &self.config.continuous {
            for psr in self.pulsars.iter_mut() {
                add_cgw(psr, &cw.source, &cw.options)?;
            }
        }

        for line in &self.config.lines {
            let mut matched = false;
            for psr in self.pulsars.iter_mut() {
                if line.pulsar.as_deref().map_or(true, |name| name == psr.name()) {
                    add_line(psr, line.freq, line.amplitude, line.offset)?;
                    matched = true;
                }
            }
            if !matched {
                return Err(ScenarioError::ValidationError(format!(
                    "line targets unknown pulsar '{}'",
                    line.pulsar.as_deref().unwrap_or_default()
                )));
            }
        }

        let summary = self.summary();
        for s in &summary {
            debug!(pulsar = %s.name, epochs = s.epochs, rms_s = s.rms, "pulsar residuals");
        }
        Ok(summary)
    }

    /// RMS of each pulsar's current residuals.
    pub fn summary(&self) -> Vec<PulsarSummary> {
        self.pulsars
            .iter()
            .map(|psr| {
                let res = psr.residuals_seconds();
                let rms = if res.is_empty() {
                    0.0
                } else {
                    (res.iter().map(|r| r * r).sum::<f64>() / res.len() as f64).sqrt()
                };
                PulsarSummary {
                    name: psr.name().to_string(),
                    epochs: res.len(),
                    rms,
                }
            })
            .collect()
    }

    /// Zero all residuals and restart the random stream.
    pub fn reset(&mut self) {
        for psr in self.pulsars.iter_mut() {
            psr.reset_residuals();
        }
        self.injector = Self::injector_for(&self.config);
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn pulsars(&self) -> &[SimulatedPulsar] {
        &self.pulsars
    }

    pub fn into_pulsars(self) -> Vec<SimulatedPulsar> {
        self.pulsars
    }
}
