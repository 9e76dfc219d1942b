use std::collections::BTreeMap;

use ndarray::Array1;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::prelude::{ProcessingError, ProcessingResult, StrainPolicy};
use crate::processing::extrapolate::extrapolate;
use crate::source::Metadata;
use crate::waveform::{Mode, Quantity, Radius, Signal};

/// Where the cutoff frequency used for integration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutoffProvenance {
    Explicit,
    Metadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCutoff {
    pub value: f64,
    pub provenance: CutoffProvenance,
}

/// psi4, hdot and h for a set of modes at one extraction radius.
///
/// Every stored array has the length of the shared time axis. Records are
/// only produced by `SimulationAssembler` and are read-only afterwards.
#[derive(Debug, Clone)]
pub struct SimulationRecord {
    pub(crate) id: String,
    pub(crate) time: Array1<f64>,
    pub(crate) psi4: BTreeMap<Mode, Array1<Complex64>>,
    pub(crate) hdot: BTreeMap<Mode, Array1<Complex64>>,
    pub(crate) h: BTreeMap<Mode, Array1<Complex64>>,
    pub(crate) requested_modes: Vec<Mode>,
    pub(crate) radius: Radius,
    pub(crate) cutoff: ResolvedCutoff,
    pub(crate) strain: StrainPolicy,
    pub(crate) metadata: Metadata,
}

impl SimulationRecord {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn time(&self) -> &Array1<f64> {
        &self.time
    }

    /// Requested modes in the order they were asked for.
    pub fn modes(&self) -> &[Mode] {
        &self.requested_modes
    }

    pub fn radius(&self) -> &Radius {
        &self.radius
    }

    pub fn cutoff(&self) -> ResolvedCutoff {
        self.cutoff
    }

    pub fn strain_policy(&self) -> StrainPolicy {
        self.strain
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn signal(&self, mode: Mode, quantity: Quantity) -> ProcessingResult<Signal> {
        let table = match quantity {
            Quantity::Psi4 => &self.psi4,
            Quantity::Hdot => &self.hdot,
            Quantity::H => &self.h,
        };
        let value = table.get(&mode).ok_or_else(|| {
            ProcessingError::Usage(format!(
                "mode {} was not requested for simulation {}",
                mode, self.id
            ))
        })?;
        Signal::new(self.time.clone(), value.clone())
    }

    /// Same as [`signal`](Self::signal) with the quantity given by its tag
    /// (`psi4`, `hdot` or `h`).
    pub fn get_signal(&self, mode: Mode, tag: &str) -> ProcessingResult<Signal> {
        self.signal(mode, tag.parse()?)
    }

    /// psi4 of `mode` corrected from the record's radius towards infinity,
    /// using the stored hdot and the total mass from metadata.
    pub fn extrapolated_psi4(&self, mode: Mode) -> ProcessingResult<Signal> {
        let psi4 = self.signal(mode, Quantity::Psi4)?;
        let hdot = self.signal(mode, Quantity::Hdot)?;
        let total_mass = self.metadata.total_mass()?;
        extrapolate(&psi4, &hdot, self.radius.to_f64()?, mode, total_mass)
    }
}
