use ndarray::Array1;
use num_complex::Complex64;

use crate::prelude::{ProcessingError, ProcessingResult};

/// Relative tolerance when checking that a time axis is uniformly sampled.
const UNIFORM_TOLERANCE: f64 = 1e-6;

/// A scalar waveform: a time axis paired with one sample per time.
///
/// Values are stored as complex numbers; real inputs carry a zero imaginary
/// part. Operations never mutate a signal and return a new one instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    time: Array1<f64>,
    value: Array1<Complex64>,
}

impl Signal {
    pub fn new(time: Array1<f64>, value: Array1<Complex64>) -> ProcessingResult<Self> {
        if time.len() != value.len() {
            return Err(ProcessingError::Precondition(format!(
                "time axis has {} samples but value has {}",
                time.len(),
                value.len()
            )));
        }
        Ok(Self { time, value })
    }

    pub fn from_real(time: Vec<f64>, value: Vec<f64>) -> ProcessingResult<Self> {
        let value = value.into_iter().map(|v| Complex64::new(v, 0.0)).collect();
        Self::new(Array1::from(time), value)
    }

    pub fn from_complex(time: Vec<f64>, value: Vec<Complex64>) -> ProcessingResult<Self> {
        Self::new(Array1::from(time), Array1::from(value))
    }

    pub fn time(&self) -> &Array1<f64> {
        &self.time
    }

    pub fn value(&self) -> &Array1<Complex64> {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// New signal on the same time axis.
    pub fn with_value(&self, value: Array1<Complex64>) -> ProcessingResult<Self> {
        Self::new(self.time.clone(), value)
    }

    pub fn into_parts(self) -> (Array1<f64>, Array1<Complex64>) {
        (self.time, self.value)
    }

    pub fn real(&self) -> Array1<f64> {
        self.value.mapv(|v| v.re)
    }

    /// Returns `dt = time[1] - time[0]` after checking the axis is usable for
    /// spectral work: at least two samples, positive step, uniform spacing.
    pub fn sample_step(&self) -> ProcessingResult<f64> {
        if self.len() < 2 {
            return Err(ProcessingError::Precondition(format!(
                "time axis needs at least 2 samples, got {}",
                self.len()
            )));
        }
        let dt = self.time[1] - self.time[0];
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ProcessingError::Precondition(format!(
                "time step {} is not positive",
                dt
            )));
        }
        let tolerance = dt * UNIFORM_TOLERANCE;
        let steps = self.time.iter().zip(self.time.iter().skip(1));
        for (idx, (previous, next)) in steps.enumerate() {
            let step = next - previous;
            if (step - dt).abs() > tolerance {
                return Err(ProcessingError::Precondition(format!(
                    "time axis is not uniform at sample {} (step {} vs {})",
                    idx, step, dt
                )));
            }
        }
        Ok(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_rejects_length_mismatch() {
        let result = Signal::from_real(vec![0.0, 1.0, 2.0], vec![1.0, 2.0]);
        assert!(matches!(result, Err(ProcessingError::Precondition(_))));
    }

    #[test]
    fn sample_step_returns_uniform_spacing() {
        let signal = Signal::from_real(vec![0.0, 0.5, 1.0, 1.5], vec![0.0; 4]).unwrap();
        assert_eq!(signal.sample_step().unwrap(), 0.5);
    }

    #[test]
    fn sample_step_rejects_short_and_irregular_axes() {
        let single = Signal::from_real(vec![0.0], vec![1.0]).unwrap();
        assert!(single.sample_step().is_err());

        let irregular = Signal::from_real(vec![0.0, 1.0, 3.0], vec![0.0; 3]).unwrap();
        assert!(matches!(
            irregular.sample_step(),
            Err(ProcessingError::Precondition(_))
        ));

        let reversed = Signal::from_real(vec![1.0, 0.0], vec![0.0; 2]).unwrap();
        assert!(reversed.sample_step().is_err());
    }

    #[test]
    fn with_value_keeps_time_axis() {
        let signal = Signal::from_real(vec![0.0, 1.0], vec![1.0, 2.0]).unwrap();
        let doubled = signal.with_value(signal.value().mapv(|v| v * 2.0)).unwrap();
        assert_eq!(doubled.time(), signal.time());
        assert_eq!(doubled.real().to_vec(), vec![2.0, 4.0]);
    }
}
