//! Core waveform post-processing for numerical-relativity catalog simulations.
//!
//! The modules take psi4 modes read at a finite extraction radius, derive the
//! strain rate and strain through fixed-frequency integration, and assemble
//! per-mode results sharing one time axis into a `SimulationRecord`.

pub mod math;
pub mod prelude;
pub mod processing;
pub mod source;
pub mod telemetry;
pub mod waveform;

pub use num_complex::Complex64;
pub use prelude::{AssemblyConfig, ProcessingError, ProcessingResult, StrainPolicy};
pub use processing::{SimulationAssembler, SimulationRecord, SpectralIntegrator};
pub use waveform::{Mode, Quantity, Radius, Signal};
