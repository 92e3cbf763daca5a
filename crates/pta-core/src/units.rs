//! Physical constants and unit conversions
//!
//! Everything inside the synthesizers runs in seconds. Pulsar epochs and
//! residual stores are kept in days.

/// Seconds per day
pub const DAY: f64 = 86_400.0;

/// Julian year in seconds
pub const YEAR: f64 = 365.25 * DAY;

/// One-year reference frequency for characteristic strain (1 / 3.16e7 s)
pub const F_1YR: f64 = 1.0 / 3.16e7;

/// Solar mass expressed as a time, G·M☉/c³ in seconds
pub const SOLAR_MASS_SECONDS: f64 = 4.9e-6;

/// One megaparsec expressed as a light-travel time in seconds
pub const MPC_SECONDS: f64 = 1.0267e14;

/// One kiloparsec expressed as a light-travel time in seconds
pub const KPC_SECONDS: f64 = 1.0267e11;

/// Convert epochs from days to seconds.
pub fn days_to_seconds(days: &[f64]) -> Vec<f64> {
    days.iter().map(|&d| d * DAY).collect()
}
