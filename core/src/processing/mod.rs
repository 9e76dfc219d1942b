pub mod assembler;
pub mod extrapolate;
pub mod integrator;
pub mod record;

pub use assembler::{assemble_catalog, SimulationAssembler};
pub use extrapolate::{extrapolate, extrapolate_psi4};
pub use integrator::{ffi, SpectralIntegrator};
pub use record::{CutoffProvenance, ResolvedCutoff, SimulationRecord};
