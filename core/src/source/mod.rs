//! Access to stored simulation data.
//!
//! ```text
//!  catalog dir / in-memory arrays
//!        │
//!        ▼
//!   ┌────────────────┐
//!   │ WaveformSource │  modes, radii, (time, value) arrays, metadata
//!   └────────────────┘
//!        │
//!        ▼
//!   SimulationAssembler
//! ```

pub mod catalog;
pub mod memory;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prelude::{ProcessingError, ProcessingResult};
use crate::waveform::{Mode, Quantity, Radius, Signal};

pub use catalog::{CatalogBuilder, CatalogSource};
pub use memory::MemorySource;

/// Capabilities the assembler needs from wherever simulation data is stored.
pub trait WaveformSource {
    /// Identifier of the simulation, shared by its waveform and metadata data.
    fn id(&self) -> &str;
    fn available_modes(&self) -> ProcessingResult<Vec<Mode>>;
    fn available_radii(&self) -> ProcessingResult<Vec<Radius>>;
    /// Reads a stored quantity. Only `Psi4` and `H` are ever stored.
    fn read_waveform(
        &self,
        quantity: Quantity,
        mode: Mode,
        radius: &Radius,
    ) -> ProcessingResult<Signal>;
    fn load_metadata(&self) -> ProcessingResult<Metadata>;
}

/// Free-form simulation metadata (masses, ADM data, cutoff frequency).
///
/// Documented keys: `f0` for the FFI cutoff frequency, and either
/// `total_mass` or `m1` + `m2` for the total mass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Value>);

impl Metadata {
    pub const CUTOFF_KEY: &'static str = "f0";
    pub const TOTAL_MASS_KEY: &'static str = "total_mass";
    pub const MASS1_KEY: &'static str = "m1";
    pub const MASS2_KEY: &'static str = "m2";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The `f0` entry, if present. A non-numeric entry is a configuration error.
    pub fn cutoff_frequency(&self) -> ProcessingResult<Option<f64>> {
        self.number(Self::CUTOFF_KEY)
    }

    /// Total mass from `total_mass`, else `m1 + m2`, else 1.
    pub fn total_mass(&self) -> ProcessingResult<f64> {
        if let Some(total) = self.number(Self::TOTAL_MASS_KEY)? {
            return Ok(total);
        }
        match (self.number(Self::MASS1_KEY)?, self.number(Self::MASS2_KEY)?) {
            (Some(m1), Some(m2)) => Ok(m1 + m2),
            _ => Ok(1.0),
        }
    }

    fn number(&self, key: &str) -> ProcessingResult<Option<f64>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value.as_f64().map(Some).ok_or_else(|| {
                ProcessingError::Configuration(format!(
                    "metadata entry `{}` is not a number: {}",
                    key, value
                ))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cutoff_frequency_reads_f0() {
        let mut metadata = Metadata::new();
        assert_eq!(metadata.cutoff_frequency().unwrap(), None);
        metadata.insert("f0", 0.0125);
        assert_eq!(metadata.cutoff_frequency().unwrap(), Some(0.0125));
    }

    #[test]
    fn non_numeric_cutoff_is_a_configuration_error() {
        let mut metadata = Metadata::new();
        metadata.insert("f0", "low");
        assert!(matches!(
            metadata.cutoff_frequency(),
            Err(ProcessingError::Configuration(_))
        ));
    }

    #[test]
    fn total_mass_prefers_explicit_then_components() {
        let mut metadata = Metadata::new();
        assert_eq!(metadata.total_mass().unwrap(), 1.0);
        metadata.insert("m1", 0.75);
        metadata.insert("m2", 0.25);
        assert_eq!(metadata.total_mass().unwrap(), 1.0);
        metadata.insert("m2", 0.75);
        assert_eq!(metadata.total_mass().unwrap(), 1.5);
        metadata.insert("total_mass", json!(2.0));
        assert_eq!(metadata.total_mass().unwrap(), 2.0);
    }
}
