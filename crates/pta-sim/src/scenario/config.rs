//! Scenario configuration
//!
//! A scenario is a YAML document describing a simulated array and the
//! signals to inject into it:
//!
//! ```yaml
//! seed: 42
//! pulsars:
//!   - name: J0030+0451
//!     ra: 0.13
//!     dec: 0.08
//!     epochs: { start: 53000.0, span: 3650.0, step: 14.0 }
//!   - name: J1909-3744
//!     ra: 5.01
//!     dec: -0.66
//!     epochs: [53005.0, 53019.0, 53033.0]
//! gwb:
//!   amplitude: 1.0e-15
//!   gamma: 4.333
//! continuous:
//!   - source: { gwtheta: 1.1, gwphi: 3.9, chirp_mass: 5.0e8, distance: 50.0,
//!               fgw: 2.0e-8, phase0: 0.0, psi: 0.7, inc: 1.0 }
//!     options: { evolution: phase_approx }
//! lines:
//!   - { pulsar: J1909-3744, freq: 3.0e-8, amplitude: 1.0e-7 }
//! logging:
//!   level: debug
//! ```
//!
//! Files are only read when the caller asks for it.

use pta_core::cw::{CwOptions, CwSource};
use pta_core::gwb::GwbConfig;
use pta_core::observe::{init_logging, LogConfig};
use pta_core::types::InjectError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::inject::DEFAULT_LINE_OFFSET;
use crate::pulsar::SimulatedPulsar;

/// Result type for scenario operations
pub type ScenarioResult<T> = Result<T, ScenarioError>;

/// Errors raised while loading or running a scenario
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scenario: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("invalid scenario: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Inject(#[from] InjectError),
}

/// Observation epochs of a pulsar, days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EpochSpec {
    /// Explicit list
    List(Vec<f64>),
    /// Regular cadence from `start` over `span`, every `step`
    Cadence { start: f64, span: f64, step: f64 },
}

impl EpochSpec {
    pub fn epochs(&self) -> Vec<f64> {
        match *self {
            EpochSpec::List(ref toas) => toas.clone(),
            EpochSpec::Cadence { start, span, step } => {
                if !(step > 0.0 && span >= 0.0) {
                    return Vec::new();
                }
                let n = (span / step + 1e-9).floor() as usize;
                (0..=n).map(|i| start + i as f64 * step).collect()
            }
        }
    }
}

/// One simulated pulsar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulsarSpec {
    pub name: String,
    /// Right ascension, radians
    pub ra: f64,
    /// Declination, radians
    pub dec: f64,
    pub epochs: EpochSpec,
    /// Observing frequency for every epoch, MHz
    #[serde(default = "default_frequency")]
    pub frequency: f64,
}

fn default_frequency() -> f64 {
    SimulatedPulsar::DEFAULT_FREQUENCY
}

impl PulsarSpec {
    pub fn build(&self) -> ScenarioResult<SimulatedPulsar> {
        let toas = self.epochs.epochs();
        let n = toas.len();
        let pulsar = SimulatedPulsar::new(self.name.clone(), self.ra, self.dec, toas)
            .with_frequencies(vec![self.frequency; n])?;
        Ok(pulsar)
    }
}

/// A continuous-wave source injected into every pulsar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousSpec {
    pub source: CwSource,
    #[serde(default)]
    pub options: CwOptions,
}

/// A sinusoid injected into one pulsar, or all when `pulsar` is absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSpec {
    #[serde(default)]
    pub pulsar: Option<String>,
    /// Hz
    pub freq: f64,
    /// Seconds
    pub amplitude: f64,
    #[serde(default = "default_line_offset")]
    pub offset: f64,
}

fn default_line_offset() -> f64 {
    DEFAULT_LINE_OFFSET
}

/// Complete injection scenario
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Seed for the stochastic background; entropy when absent
    pub seed: Option<u64>,
    pub pulsars: Vec<PulsarSpec>,
    pub gwb: Option<GwbConfig>,
    pub continuous: Vec<ContinuousSpec>,
    pub lines: Vec<LineSpec>,
    pub logging: LogConfig,
}

impl ScenarioConfig {
    /// Load a scenario from a specific file.
    pub fn load_from(path: &Path) -> ScenarioResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse a scenario from a YAML string.
    pub fn parse(yaml: &str) -> ScenarioResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Save the scenario to a file.
    pub fn save(&self, path: &Path) -> ScenarioResult<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content).map_err(|source| ScenarioError::ReadError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Install the scenario's logging configuration. Returns `false` if a
    /// subscriber was already in place.
    pub fn init_logging(&self) -> bool {
        init_logging(&self.logging)
    }

    /// Validate the scenario.
    pub fn validate(&self) -> ScenarioResult<()> {
        if self.pulsars.is_empty() {
            return Err(ScenarioError::ValidationError(
                "at least one pulsar is required".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for psr in &self.pulsars {
            if !names.insert(psr.name.as_str()) {
                return Err(ScenarioError::ValidationError(format!(
                    "duplicate pulsar '{}'",
                    psr.name
                )));
            }
            if !(psr.ra.is_finite() && psr.dec.is_finite()) {
                return Err(ScenarioError::ValidationError(format!(
                    "pulsar '{}' has a non-finite position",
                    psr.name
                )));
            }
            let toas = psr.epochs.epochs();
            if toas.is_empty() || toas.iter().any(|t| !t.is_finite()) {
                return Err(ScenarioError::ValidationError(format!(
                    "pulsar '{}' needs finite epochs",
                    psr.name
                )));
            }
            if !(psr.frequency > 0.0) {
                return Err(ScenarioError::ValidationError(format!(
                    "pulsar '{}' observing frequency must be positive",
                    psr.name
                )));
            }
        }

        if let Some(gwb) = &self.gwb {
            gwb.validate()?;
        }
        for cw in &self.continuous {
            cw.source.validate()?;
        }
        for line in &self.lines {
            if let Some(target) = &line.pulsar {
                if !names.contains(target.as_str()) {
                    return Err(ScenarioError::ValidationError(format!(
                        "line targets unknown pulsar '{target}'"
                    )));
                }
            }
            if !(line.freq.is_finite() && line.amplitude.is_finite() && line.offset.is_finite()) {
                return Err(ScenarioError::ValidationError(
                    "line parameters must be finite".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Example scenario as YAML.
    pub fn example_yaml() -> String {
        let config = Self {
            seed: Some(42),
            pulsars: vec![
                PulsarSpec {
                    name: "J0030+0451".to_string(),
                    ra: 0.1315,
                    dec: 0.0847,
                    epochs: EpochSpec::Cadence {
                        start: 53000.0,
                        span: 3650.0,
                        step: 14.0,
                    },
                    frequency: default_frequency(),
                },
                PulsarSpec {
                    name: "J1909-3744".to_string(),
                    ra: 5.0165,
                    dec: -0.6573,
                    epochs: EpochSpec::Cadence {
                        start: 53200.0,
                        span: 3000.0,
                        step: 21.0,
                    },
                    frequency: default_frequency(),
                },
            ],
            gwb: Some(GwbConfig::new(1e-15, 13.0 / 3.0)),
            ..Default::default()
        };

        serde_yaml::to_string(&config).unwrap_or_default()
    }
}
