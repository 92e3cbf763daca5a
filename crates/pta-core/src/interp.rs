//! Piecewise-linear resampling of a uniformly gridded series

use crate::types::{InjectError, InjectResult};

/// Uniform grid with `values[i]` at `start + i·step`
#[derive(Debug, Clone, PartialEq)]
pub struct UniformSeries {
    start: f64,
    step: f64,
    values: Vec<f64>,
}

impl UniformSeries {
    /// Series spanning `[start, stop]` inclusive, as `linspace` would.
    pub fn linspace(start: f64, stop: f64, values: Vec<f64>) -> InjectResult<Self> {
        if values.len() < 2 {
            return Err(InjectError::LengthMismatch {
                what: "interpolation grid",
                expected: 2,
                actual: values.len(),
            });
        }
        if !(stop > start) {
            return Err(InjectError::invalid("stop", stop, "must exceed start"));
        }
        let step = (stop - start) / (values.len() - 1) as f64;
        Ok(Self {
            start,
            step,
            values,
        })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn stop(&self) -> f64 {
        self.start + self.step * (self.values.len() - 1) as f64
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at `t`; `t` must lie within the grid span.
    pub fn at(&self, t: f64) -> InjectResult<f64> {
        let last = self.values.len() - 1;
        let pos = (t - self.start) / self.step;
        // Allow a little round-off at the edges
        if !(pos >= -1e-9 && pos <= last as f64 + 1e-9) {
            return Err(InjectError::invalid(
                "epoch",
                t,
                "outside the synthesized time span",
            ));
        }
        let pos = pos.clamp(0.0, last as f64);
        let i = (pos.floor() as usize).min(last - 1);
        let mu = pos - i as f64;
        Ok(self.values[i] + mu * (self.values[i + 1] - self.values[i]))
    }

    /// Resample onto arbitrary epochs.
    pub fn resample(&self, epochs: &[f64]) -> InjectResult<Vec<f64>> {
        epochs.iter().map(|&t| self.at(t)).collect()
    }
}
