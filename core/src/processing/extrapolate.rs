use ndarray::Array1;
use num_complex::Complex64;

use crate::prelude::{ProcessingError, ProcessingResult};
use crate::processing::integrator::SpectralIntegrator;
use crate::waveform::{Mode, Radius, Signal};

/// Isotropic-to-areal radius `r_A = r0 (1 + M / (2 r0))^2`.
pub fn areal_radius(r0: f64, total_mass: f64) -> f64 {
    r0 * (1.0 + total_mass / (2.0 * r0)).powi(2)
}

/// First-order finite-radius correction towards null infinity.
///
/// Each output sample is `C * (source - (l-1)(l+2) / (2 r_A) * hdot)` with
/// `C = 1 - 2M / r_A`. `hdot` must be the once-integrated counterpart of
/// `source` on the same time axis.
pub fn extrapolate(
    source: &Signal,
    hdot: &Signal,
    extraction_radius: f64,
    mode: Mode,
    total_mass: f64,
) -> ProcessingResult<Signal> {
    if source.time() != hdot.time() {
        return Err(ProcessingError::Precondition(
            "source and hdot must share one time axis".into(),
        ));
    }
    if !extraction_radius.is_finite() || extraction_radius <= 0.0 {
        return Err(ProcessingError::Precondition(format!(
            "extraction radius must be positive, got {}",
            extraction_radius
        )));
    }
    let r_a = areal_radius(extraction_radius, total_mass);
    let lapse = 1.0 - 2.0 * total_mass / r_a;
    if lapse <= 0.0 {
        return Err(ProcessingError::Precondition(format!(
            "radius {} lies inside 2M for total mass {}",
            extraction_radius, total_mass
        )));
    }

    let l = f64::from(mode.l);
    let coupling = (l - 1.0) * (l + 2.0) / (2.0 * r_a);
    let value: Array1<Complex64> = source
        .value()
        .iter()
        .zip(hdot.value().iter())
        .map(|(&s, &h)| (s - h * coupling) * lapse)
        .collect();

    source.with_value(value)
}

/// Integrates `psi4` once at `cutoff` and extrapolates it from `radius`.
pub fn extrapolate_psi4(
    psi4: &Signal,
    cutoff: f64,
    radius: &Radius,
    mode: Mode,
    total_mass: f64,
) -> ProcessingResult<Signal> {
    let hdot = SpectralIntegrator::new().integrate(psi4, cutoff, 1)?;
    extrapolate(psi4, &hdot, radius.to_f64()?, mode, total_mass)
}
