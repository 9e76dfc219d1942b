use num_complex::Complex64;

pub struct StatsHelper;

impl StatsHelper {
    pub fn rms(samples: &[Complex64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples.iter().map(|v| v.norm_sqr()).sum();
        (sum_sq / samples.len() as f64).sqrt()
    }

    pub fn peak(samples: &[Complex64]) -> f64 {
        samples.iter().map(|v| v.norm()).fold(0.0, f64::max)
    }

    pub fn max_abs_diff(lhs: &[Complex64], rhs: &[Complex64]) -> f64 {
        lhs.iter()
            .zip(rhs.iter())
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }
}
