use ndarray::Array1;
use num_complex::Complex64;
use rustfft::{num_traits::Zero, Fft, FftPlanner};

/// Helper that wraps a forward/inverse `rustfft` plan pair for reuse.
pub struct FftHelper {
    forward: std::sync::Arc<dyn Fft<f64>>,
    inverse: std::sync::Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
    size: usize,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        let scratch = vec![Complex64::zero(); scratch_len];
        Self {
            forward,
            inverse,
            scratch,
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Unnormalised forward transform; input is truncated or zero-padded to `size`.
    pub fn forward(&mut self, input: &[Complex64]) -> Vec<Complex64> {
        let mut buffer = input.to_vec();
        buffer.resize(self.size, Complex64::zero());
        self.forward.process_with_scratch(&mut buffer, &mut self.scratch);
        buffer
    }

    /// Inverse transform scaled by `1/size`, so `inverse(forward(x)) == x`.
    pub fn inverse(&mut self, spectrum: &[Complex64]) -> Vec<Complex64> {
        let mut buffer = spectrum.to_vec();
        buffer.resize(self.size, Complex64::zero());
        self.inverse.process_with_scratch(&mut buffer, &mut self.scratch);
        let scale = 1.0 / self.size as f64;
        buffer.iter_mut().for_each(|value| *value *= scale);
        buffer
    }
}

/// Sample frequencies of an `n`-point transform with spacing `dt`.
///
/// Bins run from zero through the positive frequencies and then wrap to the
/// negative ones, so `f[k] = k / (n dt)` for `k <= (n - 1) / 2` and
/// `(k - n) / (n dt)` otherwise.
pub fn fft_frequencies(n: usize, dt: f64) -> Array1<f64> {
    let scale = 1.0 / (n as f64 * dt);
    let positive = (n.saturating_sub(1)) / 2 + 1;
    (0..n)
        .map(|k| {
            if k < positive {
                k as f64 * scale
            } else {
                (k as f64 - n as f64) * scale
            }
        })
        .collect()
}
