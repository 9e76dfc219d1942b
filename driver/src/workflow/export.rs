use anyhow::Context;
use nrcore::prelude::StrainPolicy;
use nrcore::processing::{ResolvedCutoff, SimulationRecord};
use nrcore::waveform::{Mode, Quantity, Signal};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct ComplexSeries {
    pub re: Vec<f64>,
    pub im: Vec<f64>,
}

impl From<&Signal> for ComplexSeries {
    fn from(signal: &Signal) -> Self {
        Self {
            re: signal.value().iter().map(|v| v.re).collect(),
            im: signal.value().iter().map(|v| v.im).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModeExport {
    pub mode: Mode,
    pub psi4: ComplexSeries,
    pub hdot: ComplexSeries,
    pub h: ComplexSeries,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psi4_extrapolated: Option<ComplexSeries>,
}

/// JSON document written for each processed simulation.
#[derive(Debug, Serialize)]
pub struct RecordExport {
    pub id: String,
    pub radius: String,
    pub cutoff: ResolvedCutoff,
    pub strain: StrainPolicy,
    pub time: Vec<f64>,
    pub modes: Vec<ModeExport>,
}

impl RecordExport {
    pub fn build(
        record: &SimulationRecord,
        extrapolated: &BTreeMap<Mode, Signal>,
    ) -> anyhow::Result<Self> {
        let mut modes = Vec::with_capacity(record.modes().len());
        for &mode in record.modes() {
            let series = |quantity: Quantity| -> anyhow::Result<ComplexSeries> {
                Ok(ComplexSeries::from(&record.signal(mode, quantity)?))
            };
            modes.push(ModeExport {
                mode,
                psi4: series(Quantity::Psi4)?,
                hdot: series(Quantity::Hdot)?,
                h: series(Quantity::H)?,
                psi4_extrapolated: extrapolated.get(&mode).map(ComplexSeries::from),
            });
        }

        Ok(Self {
            id: record.id().to_string(),
            radius: record.radius().to_string(),
            cutoff: record.cutoff(),
            strain: record.strain_policy(),
            time: record.time().to_vec(),
            modes,
        })
    }

    /// Writes `<dir>/<id>_r<radius>.json` and returns its path.
    pub fn write(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
        let path = dir.join(format!("{}_r{}.json", self.id, self.radius));
        let contents = serde_json::to_string(self).context("serializing record export")?;
        fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}
