use nrcore::Complex64;

/// Single-frequency mode `amplitude * exp(-i omega t)` sampled on `time`.
pub fn circular_mode(time: &[f64], amplitude: f64, omega: f64) -> Vec<Complex64> {
    time.iter()
        .map(|&t| Complex64::from_polar(amplitude, -omega * t))
        .collect()
}
