use std::collections::BTreeMap;
use std::path::Path;

use ndarray::Array1;

use crate::math::stats::StatsHelper;
use crate::prelude::{AssemblyConfig, ProcessingError, ProcessingResult, StrainPolicy};
use crate::processing::integrator::SpectralIntegrator;
use crate::processing::record::{CutoffProvenance, ResolvedCutoff, SimulationRecord};
use crate::source::{CatalogSource, Metadata, WaveformSource};
use crate::telemetry::log::LogManager;
use crate::waveform::{Mode, Quantity, Radius};

/// Builds a `SimulationRecord` from a waveform source.
///
/// Assembly validates the requested modes and radius against what the source
/// offers, resolves the cutoff frequency, and derives psi4, hdot and h for
/// every mode. It either succeeds for all modes or returns the first error.
pub struct SimulationAssembler {
    integrator: SpectralIntegrator,
    logger: LogManager,
}

impl SimulationAssembler {
    pub fn new() -> Self {
        Self {
            integrator: SpectralIntegrator::new(),
            logger: LogManager::new(),
        }
    }

    pub fn assemble<S: WaveformSource + ?Sized>(
        &mut self,
        source: &S,
        config: &AssemblyConfig,
    ) -> ProcessingResult<SimulationRecord> {
        let modes = dedup_modes(&config.modes);
        if modes.len() != config.modes.len() {
            self.logger.warn(&format!(
                "{}: duplicate modes in request, keeping {} unique",
                source.id(),
                modes.len()
            ));
        }
        if modes.is_empty() {
            return Err(ProcessingError::Usage("no modes requested".into()));
        }

        check_modes(&modes, &source.available_modes()?)?;
        check_radius(&config.radius, &source.available_radii()?)?;

        let metadata = source.load_metadata()?;
        let cutoff = resolve_cutoff(config.cutoff_frequency, &metadata)?;
        if let Some(resolved) = cutoff {
            self.logger.record(&format!(
                "{}: using {:?} cutoff frequency f0 = {:.4}",
                source.id(),
                resolved.provenance,
                resolved.value
            ));
        }

        let radius = &config.radius;
        let mut axis = SharedAxis::default();
        let mut psi4_table = BTreeMap::new();
        let mut hdot_table = BTreeMap::new();
        let mut h_table = BTreeMap::new();

        for &mode in &modes {
            let psi4 = source.read_waveform(Quantity::Psi4, mode, radius)?;
            axis.observe(mode, psi4.time())?;

            let f0 = cutoff.ok_or_else(missing_cutoff)?.value;
            let hdot = self.integrator.integrate(&psi4, f0, 1)?;

            let h = match config.strain {
                StrainPolicy::FromFile => {
                    let h = source.read_waveform(Quantity::H, mode, radius)?;
                    axis.observe(mode, h.time())?;
                    h
                }
                StrainPolicy::FromPsi4 => self.integrator.integrate(&psi4, f0, 2)?,
            };

            if let Some(values) = hdot.value().as_slice() {
                self.logger.record(&format!(
                    "{}: mode {} hdot RMS {:.4e}",
                    source.id(),
                    mode,
                    StatsHelper::rms(values)
                ));
            }

            psi4_table.insert(mode, psi4.into_parts().1);
            hdot_table.insert(mode, hdot.into_parts().1);
            h_table.insert(mode, h.into_parts().1);
        }

        let time = axis.into_time().ok_or_else(|| {
            ProcessingError::Source(format!("{} returned no time axis", source.id()))
        })?;
        let cutoff = cutoff.ok_or_else(missing_cutoff)?;

        Ok(SimulationRecord {
            id: source.id().to_string(),
            time,
            psi4: psi4_table,
            hdot: hdot_table,
            h: h_table,
            requested_modes: modes,
            radius: radius.clone(),
            cutoff,
            strain: config.strain,
            metadata,
        })
    }
}

impl Default for SimulationAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Opens the catalog simulation at `path` and assembles it.
pub fn assemble_catalog<P: AsRef<Path>>(
    path: P,
    config: &AssemblyConfig,
) -> ProcessingResult<SimulationRecord> {
    let source = CatalogSource::open(path)?;
    SimulationAssembler::new().assemble(&source, config)
}

/// Time axis that every mode must share; the first mode seen sets it.
#[derive(Default)]
struct SharedAxis {
    reference: Option<(Mode, Array1<f64>)>,
}

impl SharedAxis {
    fn observe(&mut self, mode: Mode, time: &Array1<f64>) -> ProcessingResult<()> {
        if let Some((reference_mode, reference)) = &self.reference {
            if reference != time {
                return Err(ProcessingError::TimeAxisMismatch {
                    mode,
                    reference: *reference_mode,
                });
            }
            return Ok(());
        }
        self.reference = Some((mode, time.clone()));
        Ok(())
    }

    fn into_time(self) -> Option<Array1<f64>> {
        self.reference.map(|(_, time)| time)
    }
}

fn dedup_modes(requested: &[Mode]) -> Vec<Mode> {
    let mut modes = Vec::with_capacity(requested.len());
    for &mode in requested {
        if !modes.contains(&mode) {
            modes.push(mode);
        }
    }
    modes
}

fn check_modes(wanted: &[Mode], available: &[Mode]) -> ProcessingResult<()> {
    let missing: Vec<Mode> = wanted
        .iter()
        .filter(|mode| !available.contains(mode))
        .copied()
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ProcessingError::ModesUnavailable {
            missing,
            available: available.to_vec(),
        })
    }
}

fn check_radius(wanted: &Radius, available: &[Radius]) -> ProcessingResult<()> {
    if available.contains(wanted) {
        Ok(())
    } else {
        Err(ProcessingError::RadiusUnavailable {
            requested: wanted.clone(),
            available: available.to_vec(),
        })
    }
}

fn resolve_cutoff(
    explicit: Option<f64>,
    metadata: &Metadata,
) -> ProcessingResult<Option<ResolvedCutoff>> {
    let resolved = match explicit {
        Some(value) => Some(ResolvedCutoff {
            value,
            provenance: CutoffProvenance::Explicit,
        }),
        None => metadata.cutoff_frequency()?.map(|value| ResolvedCutoff {
            value,
            provenance: CutoffProvenance::Metadata,
        }),
    };
    if let Some(cutoff) = resolved {
        if !cutoff.value.is_finite() || cutoff.value <= 0.0 {
            return Err(ProcessingError::Precondition(format!(
                "cutoff frequency must be positive, got {}",
                cutoff.value
            )));
        }
    }
    Ok(resolved)
}

fn missing_cutoff() -> ProcessingError {
    ProcessingError::Configuration(
        "FFI requires a cutoff frequency: none was given and metadata has no `f0`".into(),
    )
}
