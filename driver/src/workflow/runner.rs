use crate::workflow::config::WorkflowConfig;
use crate::workflow::export::RecordExport;
use anyhow::{anyhow, Context};
use log::{error, info};
use nrcore::math::StatsHelper;
use nrcore::processing::{ResolvedCutoff, SimulationAssembler};
use nrcore::source::{CatalogSource, WaveformSource};
use nrcore::telemetry::{Metrics, MetricsRecorder};
use nrcore::waveform::{Mode, Quantity};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub id: String,
    pub samples: usize,
    pub cutoff: ResolvedCutoff,
    pub peak_strain: Vec<(Mode, f64)>,
    pub peak_extrapolated_psi4: Vec<(Mode, f64)>,
    pub export: Option<PathBuf>,
}

pub struct BatchOutcome {
    pub path: PathBuf,
    pub result: anyhow::Result<SimulationSummary>,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.snapshot()
    }

    pub fn execute(&self, path: &Path) -> anyhow::Result<SimulationSummary> {
        match self.process(path) {
            Ok(summary) => {
                self.metrics.record_simulation(summary.peak_strain.len());
                Ok(summary)
            }
            Err(err) => {
                self.metrics.record_failure();
                Err(err)
            }
        }
    }

    fn process(&self, path: &Path) -> anyhow::Result<SimulationSummary> {
        let assembly = self.config.to_assembly_config();
        let source = CatalogSource::open(path)
            .with_context(|| format!("opening simulation {}", path.display()))?;
        let record = SimulationAssembler::new()
            .assemble(&source, &assembly)
            .with_context(|| format!("assembling simulation {}", source.id()))?;

        let mut extrapolated = BTreeMap::new();
        if self.config.extrapolate {
            for &mode in record.modes() {
                let signal = record
                    .extrapolated_psi4(mode)
                    .with_context(|| format!("extrapolating mode {} of {}", mode, record.id()))?;
                extrapolated.insert(mode, signal);
            }
        }

        let mut peak_strain = Vec::with_capacity(record.modes().len());
        for &mode in record.modes() {
            let h = record.signal(mode, Quantity::H)?;
            peak_strain.push((mode, StatsHelper::peak(&h.value().to_vec())));
        }
        let peak_extrapolated_psi4 = extrapolated
            .iter()
            .map(|(&mode, signal)| (mode, StatsHelper::peak(&signal.value().to_vec())))
            .collect();

        let export = match &self.config.output_dir {
            Some(dir) => Some(RecordExport::build(&record, &extrapolated)?.write(dir)?),
            None => None,
        };

        info!(
            "{}: {} modes, {} samples at r = {}",
            record.id(),
            record.modes().len(),
            record.time().len(),
            record.radius()
        );

        Ok(SimulationSummary {
            id: record.id().to_string(),
            samples: record.time().len(),
            cutoff: record.cutoff(),
            peak_strain,
            peak_extrapolated_psi4,
            export,
        })
    }

    /// Processes every simulation, at most `jobs` at a time. A failing
    /// simulation is logged and reported in its outcome; the rest still run.
    pub async fn execute_batch(&self, paths: Vec<PathBuf>) -> Vec<BatchOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.config.jobs.max(1)));
        let mut pending = Vec::with_capacity(paths.len());

        for path in paths {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(err) => {
                    pending.push((path, Err(anyhow!("batch semaphore closed: {}", err))));
                    continue;
                }
            };
            let runner = self.clone();
            let task_path = path.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                runner.execute(&task_path)
            });
            pending.push((path, Ok(handle)));
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        for (path, handle) in pending {
            let result = match handle {
                Ok(handle) => match handle.await {
                    Ok(result) => result,
                    Err(err) => Err(anyhow!("worker for {} panicked: {}", path.display(), err)),
                },
                Err(err) => Err(err),
            };
            if let Err(err) = &result {
                error!("{}: {:#}", path.display(), err);
            }
            outcomes.push(BatchOutcome { path, result });
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{write_simulation, GeneratorConfig};
    use nrcore::prelude::{AssemblyConfig, StrainPolicy};
    use nrcore::processing::CutoffProvenance;
    use tempfile::tempdir;

    fn assembly(modes: Vec<Mode>) -> AssemblyConfig {
        AssemblyConfig {
            modes,
            ..Default::default()
        }
    }

    #[test]
    fn runner_executes_workflow() {
        let dir = tempdir().unwrap();
        let sim = write_simulation(dir.path(), &GeneratorConfig::default()).unwrap();
        let cfg = WorkflowConfig::from_args(
            vec![sim.clone()],
            assembly(vec![Mode::new(2, 2), Mode::new(3, 3)]),
        );
        let runner = Runner::new(cfg);

        let summary = runner.execute(&sim).unwrap();
        assert_eq!(summary.id, "0000");
        assert_eq!(summary.samples, GeneratorConfig::default().samples);
        assert_eq!(summary.cutoff.provenance, CutoffProvenance::Metadata);
        assert_eq!(summary.peak_strain.len(), 2);
        assert!(summary.peak_extrapolated_psi4.is_empty());
        assert!(summary.export.is_none());
        assert_eq!(runner.metrics().simulations, 1);
        assert_eq!(runner.metrics().modes, 2);
    }

    #[test]
    fn runner_extrapolates_and_exports() {
        let dir = tempdir().unwrap();
        let sim = write_simulation(dir.path(), &GeneratorConfig::default()).unwrap();
        let mut cfg = WorkflowConfig::from_args(vec![sim.clone()], assembly(vec![Mode::new(2, 2)]));
        cfg.assembly.strain = StrainPolicy::FromPsi4;
        cfg.extrapolate = true;
        cfg.output_dir = Some(dir.path().join("out"));

        let summary = Runner::new(cfg).execute(&sim).unwrap();
        assert_eq!(summary.peak_extrapolated_psi4.len(), 1);
        let export = summary.export.unwrap();
        assert!(export.ends_with("0000_r100.00.json"));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(export).unwrap()).unwrap();
        assert_eq!(written["id"], "0000");
        assert_eq!(written["strain"], "from_psi4");
        assert_eq!(written["modes"][0]["mode"]["l"], 2);
        assert!(written["modes"][0]["psi4_extrapolated"]["re"].is_array());
    }

    #[test]
    fn runner_reports_unavailable_modes() {
        let dir = tempdir().unwrap();
        let sim = write_simulation(dir.path(), &GeneratorConfig::default()).unwrap();
        let cfg = WorkflowConfig::from_args(vec![sim.clone()], assembly(vec![Mode::new(4, 4)]));
        let runner = Runner::new(cfg);

        let err = runner.execute(&sim).unwrap_err();
        assert!(format!("{:#}", err).contains("modes [(4,4)] not available"));
        assert_eq!(runner.metrics().failures, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn batch_continues_after_failure() {
        let dir = tempdir().unwrap();
        let good = write_simulation(dir.path(), &GeneratorConfig::default()).unwrap();
        let missing = dir.path().join("ICCUB-9999");
        let mut cfg =
            WorkflowConfig::from_args(vec![], assembly(vec![Mode::new(2, 2)]));
        cfg.jobs = 1;
        let runner = Runner::new(cfg);

        let outcomes = runner
            .execute_batch(vec![missing.clone(), good.clone()])
            .await;
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].path, missing);
        assert!(outcomes[0].result.is_err());
        assert_eq!(outcomes[1].path, good);
        assert!(outcomes[1].result.is_ok());

        let metrics = runner.metrics();
        assert_eq!(metrics.simulations, 1);
        assert_eq!(metrics.failures, 1);
    }
}
