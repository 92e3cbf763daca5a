//! Sky geometry and pulsar antenna response
//!
//! Pulsar lines of sight and GW source directions share one Cartesian frame
//! built from celestial polar angles:
//!
//! ```text
//!   θ = π/2 − dec,  φ = ra
//!   p̂ = (sinθ cosφ, sinθ sinφ, cosθ)
//! ```
//!
//! A plane GW from a source at (θ, φ) propagates along `Ω̂ = −p̂(θ, φ)`.
//! Its polarization tensor is spanned by the basis vectors
//!
//! ```text
//!   m = (−sinφ, cosφ, 0)
//!   n = (−cosθ cosφ, −cosθ sinφ, sinθ)
//! ```
//!
//! and a pulsar at p̂ responds with
//!
//! ```text
//!   F+ = ½ ((m·p̂)² − (n·p̂)²) / (1 + Ω̂·p̂)
//!   F× = (m·p̂)(n·p̂) / (1 + Ω̂·p̂)
//! ```

use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

use crate::types::{InjectError, InjectResult};

/// Below this, `1 + Ω̂·p̂` is treated as zero.
const AXIS_TOLERANCE: f64 = 1e-10;

/// Below this, the transverse projections `(m·p̂)² + (n·p̂)²` are treated as zero.
const TRANSVERSE_TOLERANCE: f64 = 1e-9;

#[inline]
fn dot3(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Unit vector on the celestial sphere
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyDirection {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SkyDirection {
    /// Direction from polar angle `theta` and azimuth `phi` (radians).
    pub fn from_polar(theta: f64, phi: f64) -> Self {
        let (sin_t, cos_t) = theta.sin_cos();
        let (sin_p, cos_p) = phi.sin_cos();
        Self {
            x: sin_t * cos_p,
            y: sin_t * sin_p,
            z: cos_t,
        }
    }

    /// Direction from right ascension and declination (radians).
    pub fn from_equatorial(ra: f64, dec: f64) -> Self {
        Self::from_polar(FRAC_PI_2 - dec, ra)
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn dot(&self, other: &SkyDirection) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Angular separation in radians
    pub fn separation(&self, other: &SkyDirection) -> f64 {
        self.dot(other).clamp(-1.0, 1.0).acos()
    }
}

/// Polarization frame of a GW source: basis vectors `m`, `n` and the
/// propagation direction `omega`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarizationBasis {
    pub m: [f64; 3],
    pub n: [f64; 3],
    pub omega: [f64; 3],
}

impl PolarizationBasis {
    /// Basis for a source at polar angle `gwtheta` and azimuth `gwphi`.
    pub fn for_source(gwtheta: f64, gwphi: f64) -> Self {
        let (sin_t, cos_t) = gwtheta.sin_cos();
        let (sin_p, cos_p) = gwphi.sin_cos();
        Self {
            m: [-sin_p, cos_p, 0.0],
            n: [-cos_t * cos_p, -cos_t * sin_p, sin_t],
            omega: [-sin_t * cos_p, -sin_t * sin_p, -cos_t],
        }
    }

    /// Basis from explicit vectors. No orthogonality is enforced.
    pub fn from_vectors(m: [f64; 3], n: [f64; 3], omega: [f64; 3]) -> Self {
        Self { m, n, omega }
    }
}

/// Geometric response of one pulsar to one GW source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AntennaPattern {
    pub f_plus: f64,
    pub f_cross: f64,
    /// Cosine of the angle between the pulsar and the source, `−Ω̂·p̂`
    pub cos_mu: f64,
}

impl AntennaPattern {
    /// True when neither polarization couples to the pulsar
    pub fn is_null(&self) -> bool {
        self.f_plus == 0.0 && self.f_cross == 0.0
    }
}

/// Compute the antenna pattern of `pulsar` for a wave with polarization
/// frame `basis`.
///
/// When the pulsar sits on the source axis (`1 + Ω̂·p̂ = 0`) the projections
/// onto `m` and `n` vanish as well; the response is zero and Earth and
/// pulsar terms coincide. A vanishing denominator with non-zero projections
/// can only come from a skewed basis and is rejected.
pub fn antenna_pattern(
    pulsar: &SkyDirection,
    basis: &PolarizationBasis,
) -> InjectResult<AntennaPattern> {
    let p = pulsar.as_array();
    let m_p = dot3(&basis.m, &p);
    let n_p = dot3(&basis.n, &p);
    let omega_p = dot3(&basis.omega, &p);
    let denominator = 1.0 + omega_p;

    if denominator.abs() <= AXIS_TOLERANCE {
        if m_p * m_p + n_p * n_p <= TRANSVERSE_TOLERANCE {
            return Ok(AntennaPattern {
                f_plus: 0.0,
                f_cross: 0.0,
                cos_mu: 1.0,
            });
        }
        return Err(InjectError::DegenerateAntenna { denominator });
    }

    Ok(AntennaPattern {
        f_plus: 0.5 * (m_p * m_p - n_p * n_p) / denominator,
        f_cross: m_p * n_p / denominator,
        cos_mu: -omega_p,
    })
}
