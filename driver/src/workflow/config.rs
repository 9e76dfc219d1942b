use anyhow::Context;
use nrcore::prelude::AssemblyConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_jobs() -> usize {
    4
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub simulations: Vec<PathBuf>,
    #[serde(flatten)]
    pub assembly: AssemblyConfig,
    /// Also compute psi4 extrapolated to infinite radius for every mode.
    #[serde(default)]
    pub extrapolate: bool,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(simulations: Vec<PathBuf>, assembly: AssemblyConfig) -> Self {
        Self {
            simulations,
            assembly,
            extrapolate: false,
            output_dir: None,
            jobs: default_jobs(),
        }
    }

    pub fn to_assembly_config(&self) -> AssemblyConfig {
        self.assembly.clone()
    }
}
