//! Overlap Reduction Function (ORF) Matrix
//!
//! Expected cross-correlation of timing residuals induced by an isotropic
//! stochastic GW background, as a function of the angle between two pulsars
//! (the Hellings–Downs curve):
//!
//! ```text
//!   ξ = (1 − p̂ᵢ·p̂ⱼ) / 2
//!   Γᵢⱼ = 3 · (1/3 + ξ (ln ξ − 1/6))        i ≠ j
//!   Γᵢᵢ = 2                                 (Earth term + pulsar term)
//! ```
//!
//! ```text
//!  Γ
//! 1.0 ┤●
//!     │ ●
//! 0.5 ┤  ●                               ●●  (0.5 at 180°)
//!     │   ●                          ●●
//! 0.0 ┼────●───────────────────●●●──────────
//!     │      ●●●        ●●●●
//!-0.30┤          ●●●●●●
//!     └──────────────────────────────────── angle
//!     0°       ~82°                    180°
//! ```
//!
//! At zero separation ξ → 0 and `ln ξ` diverges even though `ξ ln ξ → 0`.
//! [`CoincidencePolicy`] decides what happens to such pairs.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::sky::SkyDirection;
use crate::types::{InjectError, InjectResult};

/// Self-correlation including the pulsar term
pub const ORF_DIAGONAL: f64 = 2.0;

/// Pairs with ξ at or below this are considered coincident.
const COINCIDENT_XI: f64 = 1e-12;

/// Treatment of pulsar pairs that share a line of sight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoincidencePolicy {
    /// Correlate the pair fully, using the diagonal value. The matrix stays
    /// positive semidefinite (singular).
    #[default]
    SelfTerm,
    /// Fail with [`InjectError::CoincidentPulsars`].
    Reject,
}

/// Hellings–Downs correlation for two distinct unit directions.
///
/// Returns `None` when the directions coincide.
pub fn hellings_downs(a: &SkyDirection, b: &SkyDirection) -> Option<f64> {
    let xi = (1.0 - a.dot(b)) / 2.0;
    if xi <= COINCIDENT_XI {
        return None;
    }
    Some(3.0 * (1.0 / 3.0 + xi * (xi.ln() - 1.0 / 6.0)))
}

/// Symmetric N×N correlation matrix over an ordered pulsar list
#[derive(Debug, Clone, PartialEq)]
pub struct OrfMatrix {
    rows: Vec<Vec<f64>>,
}

impl OrfMatrix {
    /// Full Hellings–Downs matrix for the given lines of sight.
    pub fn hellings_downs(
        directions: &[SkyDirection],
        policy: CoincidencePolicy,
    ) -> InjectResult<Self> {
        let n = directions.len();
        if n == 0 {
            return Err(InjectError::NoPulsars);
        }

        let build_row = |i: usize| -> InjectResult<Vec<f64>> {
            let mut row = vec![0.0; n];
            for j in 0..n {
                if i == j {
                    row[j] = ORF_DIAGONAL;
                    continue;
                }
                row[j] = match hellings_downs(&directions[i], &directions[j]) {
                    Some(value) => value,
                    None => match policy {
                        CoincidencePolicy::SelfTerm => {
                            if i < j {
                                warn!(first = i, second = j, "coincident pulsars, correlating fully");
                            }
                            ORF_DIAGONAL
                        }
                        CoincidencePolicy::Reject => {
                            return Err(InjectError::CoincidentPulsars {
                                first: i.min(j),
                                second: i.max(j),
                            })
                        }
                    },
                };
            }
            Ok(row)
        };

        #[cfg(feature = "parallel")]
        let rows = {
            use rayon::prelude::*;
            (0..n).into_par_iter().map(build_row).collect::<InjectResult<Vec<_>>>()?
        };
        #[cfg(not(feature = "parallel"))]
        let rows = (0..n).map(build_row).collect::<InjectResult<Vec<_>>>()?;

        let orf = Self { rows };
        debug_assert!(orf.check_invariants().is_ok());
        debug!(pulsars = n, "built Hellings-Downs matrix");
        Ok(orf)
    }

    /// Diagonal matrix for spatially uncorrelated realizations.
    pub fn uncorrelated(n: usize) -> InjectResult<Self> {
        if n == 0 {
            return Err(InjectError::NoPulsars);
        }
        let rows = (0..n)
            .map(|i| {
                let mut row = vec![0.0; n];
                row[i] = ORF_DIAGONAL;
                row
            })
            .collect();
        Ok(Self { rows })
    }

    /// Number of pulsars.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Entry `Γᵢⱼ`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.rows[i][j]
    }

    /// Row-major view of the matrix.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Normalized correlation coefficient `Γᵢⱼ / √(Γᵢᵢ Γⱼⱼ)`.
    pub fn correlation(&self, i: usize, j: usize) -> f64 {
        self.rows[i][j] / (self.rows[i][i] * self.rows[j][j]).sqrt()
    }

    /// Verify symmetry and the diagonal convention.
    pub fn check_invariants(&self) -> Result<(), String> {
        let n = self.rows.len();
        for i in 0..n {
            if self.rows[i][i] != ORF_DIAGONAL {
                return Err(format!("diagonal {} is {}", i, self.rows[i][i]));
            }
            for j in (i + 1)..n {
                if self.rows[i][j] != self.rows[j][i] {
                    return Err(format!(
                        "asymmetric at ({i}, {j}): {} vs {}",
                        self.rows[i][j], self.rows[j][i]
                    ));
                }
            }
        }
        Ok(())
    }
}
