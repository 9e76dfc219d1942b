use std::f64::consts::PI;

use ndarray::Array1;
use num_complex::Complex64;

use crate::math::fft::{fft_frequencies, FftHelper};
use crate::prelude::{ProcessingError, ProcessingResult};
use crate::waveform::Signal;

/// Fixed-frequency integration (FFI) of uniformly sampled signals.
///
/// Integration is done in the frequency domain by the operator
/// `-i / (2 pi f)`. Frequencies with `|f| < cutoff` are clamped to
/// `±cutoff` so near-DC content is amplified by at most `1 / (2 pi cutoff)`.
/// The FFT plan is kept between calls and rebuilt only when the signal
/// length changes.
#[derive(Default)]
pub struct SpectralIntegrator {
    fft: Option<FftHelper>,
}

impl SpectralIntegrator {
    pub fn new() -> Self {
        Self { fft: None }
    }

    /// Integrates `signal` `order` times with low-frequency cutoff `cutoff`.
    /// Order 0 returns the input unchanged.
    pub fn integrate(
        &mut self,
        signal: &Signal,
        cutoff: f64,
        order: u32,
    ) -> ProcessingResult<Signal> {
        if !cutoff.is_finite() || cutoff <= 0.0 {
            return Err(ProcessingError::Precondition(format!(
                "cutoff frequency must be positive, got {}",
                cutoff
            )));
        }
        let dt = signal.sample_step()?;
        if order == 0 {
            return Ok(signal.clone());
        }
        let n = signal.len();

        let operator = integration_operator(n, dt, cutoff, order);
        let fft = self.plan(n);
        let samples = signal.value().to_vec();
        let mut spectrum = fft.forward(&samples);
        spectrum
            .iter_mut()
            .zip(operator.iter())
            .for_each(|(bin, factor)| *bin *= *factor);
        let integrated = fft.inverse(&spectrum);

        signal.with_value(Array1::from(integrated))
    }

    fn plan(&mut self, size: usize) -> &mut FftHelper {
        if self.fft.as_ref().map(FftHelper::size) != Some(size) {
            self.fft = Some(FftHelper::new(size));
        }
        self.fft.get_or_insert_with(|| FftHelper::new(size))
    }
}

/// Per-bin filter `D0^order` with `D0 = -i / (2 pi f_clamped)`.
fn integration_operator(n: usize, dt: f64, cutoff: f64, order: u32) -> Array1<Complex64> {
    fft_frequencies(n, dt).mapv(|f| {
        let clamped = clamp_frequency(f, cutoff);
        let d0 = Complex64::new(0.0, -1.0 / (2.0 * PI * clamped));
        d0.powu(order)
    })
}

fn clamp_frequency(f: f64, cutoff: f64) -> f64 {
    if (0.0..cutoff).contains(&f) {
        cutoff
    } else if f < 0.0 && f > -cutoff {
        -cutoff
    } else {
        f
    }
}

/// One-shot FFI with a fresh integrator.
pub fn ffi(signal: &Signal, cutoff: f64, order: u32) -> ProcessingResult<Signal> {
    SpectralIntegrator::new().integrate(signal, cutoff, order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::stats::StatsHelper;

    fn sine(samples: usize, dt: f64, frequency: f64) -> Signal {
        let time: Vec<f64> = (0..samples).map(|k| k as f64 * dt).collect();
        let value = time
            .iter()
            .map(|t| (2.0 * PI * frequency * t).sin())
            .collect();
        Signal::from_real(time, value).unwrap()
    }

    #[test]
    fn second_order_matches_two_first_order_passes() {
        let signal = sine(128, 0.1, 0.625);
        let mut integrator = SpectralIntegrator::new();

        let direct = integrator.integrate(&signal, 0.05, 2).unwrap();
        let once = integrator.integrate(&signal, 0.05, 1).unwrap();
        let twice = integrator.integrate(&once, 0.05, 1).unwrap();

        let diff = StatsHelper::max_abs_diff(
            direct.value().as_slice().unwrap(),
            twice.value().as_slice().unwrap(),
        );
        assert!(diff < 1e-9, "difference {}", diff);
        assert_eq!(direct.time(), signal.time());
    }

    #[test]
    fn sine_above_cutoff_integrates_exactly() {
        // 5 whole cycles in the window, f = 0.5 well above the cutoff
        let signal = sine(100, 0.1, 0.5);
        let omega = 2.0 * PI * 0.5;
        let integrated = ffi(&signal, 0.1, 1).unwrap();

        for (t, value) in signal.time().iter().zip(integrated.value().iter()) {
            let expected = -(omega * t).cos() / omega;
            assert!((value.re - expected).abs() < 1e-9);
            assert!(value.im.abs() < 1e-9);
        }
    }

    #[test]
    fn constant_input_is_clamped_at_cutoff() {
        let time: Vec<f64> = (0..16).map(|k| k as f64 * 0.25).collect();
        let signal = Signal::from_real(time, vec![3.0; 16]).unwrap();
        let cutoff = 0.02;
        let integrated = ffi(&signal, cutoff, 1).unwrap();

        let expected = Complex64::new(0.0, -3.0 / (2.0 * PI * cutoff));
        for value in integrated.value().iter() {
            assert!(value.re.is_finite() && value.im.is_finite());
            assert!((value - expected).norm() < 1e-9 * expected.norm());
        }
    }

    #[test]
    fn clamp_only_touches_bins_below_cutoff() {
        assert_eq!(clamp_frequency(0.0, 0.1), 0.1);
        assert_eq!(clamp_frequency(0.05, 0.1), 0.1);
        assert_eq!(clamp_frequency(-0.05, 0.1), -0.1);
        assert_eq!(clamp_frequency(0.1, 0.1), 0.1);
        assert_eq!(clamp_frequency(-0.1, 0.1), -0.1);
        assert_eq!(clamp_frequency(0.3, 0.1), 0.3);
    }

    #[test]
    fn integrate_rejects_bad_preconditions() {
        let signal = sine(8, 0.1, 1.0);
        let mut integrator = SpectralIntegrator::new();
        assert!(matches!(
            integrator.integrate(&signal, 0.0, 1),
            Err(ProcessingError::Precondition(_))
        ));
        assert!(integrator.integrate(&signal, -1.0, 1).is_err());

        let irregular = Signal::from_real(vec![0.0, 0.1, 0.3], vec![1.0; 3]).unwrap();
        assert!(integrator.integrate(&irregular, 0.1, 1).is_err());
    }

    #[test]
    fn order_zero_returns_input_unchanged() {
        let signal = sine(32, 0.1, 1.25);
        let mut integrator = SpectralIntegrator::new();
        assert_eq!(integrator.integrate(&signal, 0.1, 0).unwrap(), signal);
        assert!(integrator.integrate(&signal, 0.0, 0).is_err());
    }

    #[test]
    fn plan_is_rebuilt_when_length_changes() {
        let mut integrator = SpectralIntegrator::new();
        let short = sine(16, 0.1, 1.25);
        let long = sine(40, 0.1, 1.25);
        assert_eq!(integrator.integrate(&short, 0.1, 1).unwrap().len(), 16);
        assert_eq!(integrator.integrate(&long, 0.1, 1).unwrap().len(), 40);
    }
}
