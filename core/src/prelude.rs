use serde::{Deserialize, Serialize};

use crate::waveform::{Mode, Radius};

/// How the strain `h` of each mode is obtained during assembly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrainPolicy {
    /// Read `h` directly from the waveform source.
    #[default]
    FromFile,
    /// Integrate psi4 twice with the resolved cutoff frequency.
    FromPsi4,
}

/// Shared configuration for assembling one simulation at one radius.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    #[serde(default = "default_modes")]
    pub modes: Vec<Mode>,
    #[serde(default = "default_radius")]
    pub radius: Radius,
    /// Overrides the `f0` value stored in the simulation metadata.
    #[serde(default)]
    pub cutoff_frequency: Option<f64>,
    #[serde(default)]
    pub strain: StrainPolicy,
}

fn default_modes() -> Vec<Mode> {
    vec![Mode::new(2, 2)]
}

fn default_radius() -> Radius {
    Radius::from("100.00")
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            modes: default_modes(),
            radius: default_radius(),
            cutoff_frequency: None,
            strain: StrainPolicy::default(),
        }
    }
}

/// Common error type for waveform processing and assembly.
#[derive(thiserror::Error, Debug)]
pub enum ProcessingError {
    #[error("modes {} not available; possible modes: {}", join_modes(.missing), join_modes(.available))]
    ModesUnavailable {
        missing: Vec<Mode>,
        available: Vec<Mode>,
    },
    #[error("radius {} not available; possible radii: {}", .requested, join_radii(.available))]
    RadiusUnavailable {
        requested: Radius,
        available: Vec<Radius>,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("numerical precondition violated: {0}")]
    Precondition(String),
    #[error("usage error: {0}")]
    Usage(String),
    #[error("time axis of mode {mode} differs from the axis of mode {reference}")]
    TimeAxisMismatch { mode: Mode, reference: Mode },
    #[error("source error: {0}")]
    Source(String),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ProcessingResult<T> = Result<T, ProcessingError>;

fn join_modes(modes: &[Mode]) -> String {
    let joined = modes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{}]", joined)
}

fn join_radii(radii: &[Radius]) -> String {
    let joined = radii
        .iter()
        .map(|radius| radius.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{}]", joined)
}
