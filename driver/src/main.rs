use anyhow::{bail, Context};
use clap::Parser;
use generator::profile::{write_simulation, GeneratorConfig};
use log::info;
use nrcore::prelude::{AssemblyConfig, StrainPolicy};
use nrcore::waveform::{Mode, Radius};
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Derive psi4, hdot and h for NR catalog simulations")]
struct Args {
    /// Load a workflow config from YAML; assembly and output flags must then
    /// come from the file
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Simulation directory to process (repeatable)
    #[arg(long = "simulation")]
    simulations: Vec<PathBuf>,
    /// Mode to extract as `l,m` (repeatable, defaults to 2,2)
    #[arg(long = "mode", conflicts_with = "workflow")]
    modes: Vec<Mode>,
    #[arg(long, default_value = "100.00", conflicts_with = "workflow")]
    radius: String,
    /// FFI cutoff frequency; read from metadata when omitted
    #[arg(long, conflicts_with = "workflow")]
    cutoff: Option<f64>,
    /// Integrate psi4 twice instead of reading h from file
    #[arg(long, default_value_t = false, conflicts_with = "workflow")]
    recompute_strain: bool,
    /// Also extrapolate psi4 to infinite radius
    #[arg(long, default_value_t = false, conflicts_with = "workflow")]
    extrapolate: bool,
    /// Directory for per-simulation JSON exports
    #[arg(long, conflicts_with = "workflow")]
    output: Option<PathBuf>,
    #[arg(long, default_value_t = 4, conflicts_with = "workflow")]
    jobs: usize,
    /// Write a synthetic simulation into this directory and process it
    #[arg(long)]
    generate: Option<PathBuf>,
}

impl Args {
    fn assembly_config(&self) -> AssemblyConfig {
        let mut assembly = AssemblyConfig {
            radius: Radius::from(self.radius.as_str()),
            cutoff_frequency: self.cutoff,
            ..Default::default()
        };
        if !self.modes.is_empty() {
            assembly.modes = self.modes.clone();
        }
        if self.recompute_strain {
            assembly.strain = StrainPolicy::FromPsi4;
        }
        assembly
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = &args.workflow {
        let mut config = WorkflowConfig::load(path)?;
        config.simulations.extend(args.simulations.iter().cloned());
        config
    } else {
        let mut config = WorkflowConfig::from_args(args.simulations.clone(), args.assembly_config());
        config.extrapolate = args.extrapolate;
        config.output_dir = args.output.clone();
        config.jobs = args.jobs;
        config
    };

    if let Some(dir) = &args.generate {
        let path = write_simulation(dir, &GeneratorConfig::default())?;
        info!("generated synthetic simulation at {}", path.display());
        workflow_config.simulations.push(path);
    }
    if workflow_config.simulations.is_empty() {
        bail!("no simulations given; use --simulation, --workflow or --generate");
    }

    let runner = Runner::new(workflow_config.clone());
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime for batch processing")?;
    let outcomes = runtime.block_on(runner.execute_batch(workflow_config.simulations.clone()));

    for outcome in &outcomes {
        match &outcome.result {
            Ok(summary) => {
                println!(
                    "{} -> {} samples, f0 {:.4} ({:?}), peak |h| {:?}",
                    summary.id,
                    summary.samples,
                    summary.cutoff.value,
                    summary.cutoff.provenance,
                    summary.peak_strain
                );
                if !summary.peak_extrapolated_psi4.is_empty() {
                    println!("   peak |psi4| at infinity {:?}", summary.peak_extrapolated_psi4);
                }
                if let Some(path) = &summary.export {
                    println!("   written to {}", path.display());
                }
            }
            Err(err) => println!("{} -> failed: {:#}", outcome.path.display(), err),
        }
    }

    let metrics = runner.metrics();
    println!(
        "Processed {} simulations ({} modes), {} failed",
        metrics.simulations, metrics.modes, metrics.failures
    );
    if metrics.failures > 0 {
        bail!("{} of {} simulations failed", metrics.failures, outcomes.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_accepts_extra_simulations() {
        let args = Args::try_parse_from([
            "nrpost",
            "--workflow",
            "batch.yaml",
            "--simulation",
            "runs/ICCUB-0001",
        ])
        .unwrap();
        assert_eq!(args.simulations, vec![PathBuf::from("runs/ICCUB-0001")]);
        assert_eq!(args.radius, "100.00");
    }

    #[test]
    fn workflow_rejects_assembly_flags() {
        for flag in [
            vec!["--mode", "3,3"],
            vec!["--radius", "50.00"],
            vec!["--cutoff", "0.02"],
            vec!["--recompute-strain"],
            vec!["--extrapolate"],
            vec!["--output", "out"],
            vec!["--jobs", "2"],
        ] {
            let mut argv = vec!["nrpost", "--workflow", "batch.yaml"];
            argv.extend(flag.iter().copied());
            assert!(Args::try_parse_from(argv).is_err(), "{:?} accepted", flag);
        }
    }

    #[test]
    fn flags_build_assembly_config() {
        let args = Args::try_parse_from([
            "nrpost",
            "--mode",
            "2,2",
            "--mode",
            "3,-3",
            "--radius",
            "167.00",
            "--cutoff",
            "0.02",
            "--recompute-strain",
        ])
        .unwrap();
        let assembly = args.assembly_config();
        assert_eq!(assembly.modes, vec![Mode::new(2, 2), Mode::new(3, -3)]);
        assert_eq!(assembly.radius.as_str(), "167.00");
        assert_eq!(assembly.cutoff_frequency, Some(0.02));
        assert_eq!(assembly.strain, StrainPolicy::FromPsi4);
    }
}
