use std::collections::HashMap;

use crate::prelude::{ProcessingError, ProcessingResult};
use crate::source::{Metadata, WaveformSource};
use crate::waveform::{Mode, Quantity, Radius, Signal};

/// Waveform source backed by signals already held in memory.
///
/// Modes and radii are reported in the order they were first inserted.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    id: String,
    modes: Vec<Mode>,
    radii: Vec<Radius>,
    datasets: HashMap<(Quantity, Mode, Radius), Signal>,
    metadata: Metadata,
}

impl MemorySource {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn insert(
        &mut self,
        quantity: Quantity,
        mode: Mode,
        radius: Radius,
        signal: Signal,
    ) -> ProcessingResult<()> {
        if quantity == Quantity::Hdot {
            return Err(ProcessingError::Usage(
                "hdot is derived from psi4 and cannot be stored".into(),
            ));
        }
        if !self.modes.contains(&mode) {
            self.modes.push(mode);
        }
        if !self.radii.contains(&radius) {
            self.radii.push(radius.clone());
        }
        self.datasets.insert((quantity, mode, radius), signal);
        Ok(())
    }
}

impl WaveformSource for MemorySource {
    fn id(&self) -> &str {
        &self.id
    }

    fn available_modes(&self) -> ProcessingResult<Vec<Mode>> {
        Ok(self.modes.clone())
    }

    fn available_radii(&self) -> ProcessingResult<Vec<Radius>> {
        Ok(self.radii.clone())
    }

    fn read_waveform(
        &self,
        quantity: Quantity,
        mode: Mode,
        radius: &Radius,
    ) -> ProcessingResult<Signal> {
        if quantity == Quantity::Hdot {
            return Err(ProcessingError::Usage("hdot is never stored".into()));
        }
        self.datasets
            .get(&(quantity, mode, radius.clone()))
            .cloned()
            .ok_or_else(|| {
                ProcessingError::Source(format!(
                    "{} has no {} data for mode {} at radius {}",
                    self.id, quantity, mode, radius
                ))
            })
    }

    fn load_metadata(&self) -> ProcessingResult<Metadata> {
        Ok(self.metadata.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_tracks_insertion_order() {
        let mut source = MemorySource::new("sim");
        let signal = Signal::from_real(vec![0.0, 1.0], vec![1.0, 2.0]).unwrap();
        for mode in [Mode::new(3, 3), Mode::new(2, 2), Mode::new(3, 3)] {
            source
                .insert(Quantity::Psi4, mode, Radius::from("50.00"), signal.clone())
                .unwrap();
        }
        assert_eq!(
            source.available_modes().unwrap(),
            vec![Mode::new(3, 3), Mode::new(2, 2)]
        );
        assert_eq!(source.available_radii().unwrap(), vec![Radius::from("50.00")]);
    }

    #[test]
    fn memory_source_reports_missing_and_hdot_reads() {
        let mut source = MemorySource::new("sim");
        let signal = Signal::from_real(vec![0.0, 1.0], vec![1.0, 2.0]).unwrap();
        assert!(source
            .insert(Quantity::Hdot, Mode::new(2, 2), Radius::from("50.00"), signal)
            .is_err());
        assert!(matches!(
            source.read_waveform(Quantity::H, Mode::new(2, 2), &Radius::from("50.00")),
            Err(ProcessingError::Source(_))
        ));
        assert!(matches!(
            source.read_waveform(Quantity::Hdot, Mode::new(2, 2), &Radius::from("50.00")),
            Err(ProcessingError::Usage(_))
        ));
    }
}
