//! FFT utilities for spectral synthesis
//!
//! Wraps a planned inverse `rustfft` transform and provides the Hermitian
//! packing used to turn a one-sided spectrum into a real time series.
//!
//! ```text
//!  one-sided:  X0 X1 X2 ... X(Nf-2) X(Nf-1)
//!  packed:     X0 X1 X2 ... X(Nf-2) X(Nf-1) X*(Nf-2) ... X*2 X*1
//!              └──────────── 2·Nf − 2 samples ───────────────────┘
//! ```

use rustfft::{num_complex::Complex64, Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

/// Planned inverse FFT of a fixed size
pub struct FftProcessor {
    size: usize,
    fft_inverse: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
}

impl fmt::Debug for FftProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftProcessor")
            .field("size", &self.size)
            .finish()
    }
}

impl FftProcessor {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft_inverse = planner.plan_fft_inverse(size);
        let scratch = vec![Complex64::new(0.0, 0.0); fft_inverse.get_inplace_scratch_len()];

        Self {
            size,
            fft_inverse,
            scratch,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Inverse FFT in place, normalized by 1/N
    pub fn ifft_inplace(&mut self, buffer: &mut [Complex64]) {
        assert_eq!(buffer.len(), self.size);
        self.fft_inverse.process_with_scratch(buffer, &mut self.scratch);

        let scale = 1.0 / self.size as f64;
        for sample in buffer.iter_mut() {
            *sample *= scale;
        }
    }
}

/// Pack a one-sided spectrum of `Nf` bins into a Hermitian-symmetric
/// buffer of `2·Nf − 2` bins.
pub fn hermitian_extend(one_sided: &[Complex64]) -> Vec<Complex64> {
    let nf = one_sided.len();
    if nf < 2 {
        return one_sided.to_vec();
    }
    let mut full = Vec::with_capacity(2 * nf - 2);
    full.extend_from_slice(one_sided);
    full.extend(one_sided[1..nf - 1].iter().rev().map(|c| c.conj()));
    full
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_inverse_of_dc_is_constant() {
        let mut fft = FftProcessor::new(16);
        assert_eq!(fft.size(), 16);
        let mut buf = vec![Complex64::new(0.0, 0.0); 16];
        buf[0] = Complex64::new(8.0, 0.0);
        fft.ifft_inplace(&mut buf);
        for s in &buf {
            assert_relative_eq!(s.re, 0.5, epsilon = 1e-12);
            assert_relative_eq!(s.im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_hermitian_layout() {
        let one_sided: Vec<Complex64> = (0..5).map(|k| Complex64::new(k as f64, k as f64 + 0.5)).collect();
        let full = hermitian_extend(&one_sided);
        assert_eq!(full.len(), 8);
        assert_eq!(full[5], one_sided[3].conj());
        assert_eq!(full[7], one_sided[1].conj());
    }

    #[test]
    fn test_hermitian_spectrum_gives_real_signal() {
        let mut one_sided = vec![Complex64::new(0.0, 0.0); 9];
        one_sided[2] = Complex64::new(0.0, -4.0);
        one_sided[5] = Complex64::new(1.5, 2.0);
        let mut full = hermitian_extend(&one_sided);
        let n = full.len();
        let mut fft = FftProcessor::new(n);
        fft.ifft_inplace(&mut full);
        for s in &full {
            assert!(s.im.abs() < 1e-12);
        }
        // Bin 2 alone: 2·Re(−4j e^{iθ})/n = 8 sin(θ)/n
        let mut only_bin2 = vec![Complex64::new(0.0, 0.0); 9];
        only_bin2[2] = Complex64::new(0.0, -4.0);
        let mut full2 = hermitian_extend(&only_bin2);
        fft.ifft_inplace(&mut full2);
        let t = 3;
        let expected = 8.0 * (2.0 * PI * 2.0 * t as f64 / n as f64).sin() / n as f64;
        assert_relative_eq!(full2[t].re, expected, epsilon = 1e-12);
    }
}
