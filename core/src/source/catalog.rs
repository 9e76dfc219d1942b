//! File-backed catalog simulations.
//!
//! A simulation directory `.../ICCUB-<id>/` holds two files:
//!
//! * `<id>_wf.json` – object of named datasets. `t_r<radius>` is the time axis
//!   shared by every waveform at that radius; `<kind>_l<l>_m<m>_r<radius>`
//!   (`kind` is `psi4` or `h`) holds samples, either as reals or `[re, im]`.
//! * `<id>_metadata.json` – free-form metadata object, see [`Metadata`].
//!
//! Available modes and radii are those with stored strain (`h_...` keys).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::prelude::{ProcessingError, ProcessingResult};
use crate::source::{Metadata, WaveformSource};
use crate::waveform::{Mode, Quantity, Radius, Signal};

const ID_PREFIX: &str = "ICCUB-";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum Dataset {
    Real(Vec<f64>),
    Complex(Vec<[f64; 2]>),
}

impl Dataset {
    fn to_complex(&self) -> Vec<Complex64> {
        match self {
            Dataset::Real(values) => values.iter().map(|&v| Complex64::new(v, 0.0)).collect(),
            Dataset::Complex(pairs) => pairs.iter().map(|&[re, im]| Complex64::new(re, im)).collect(),
        }
    }
}

fn time_key(radius: &Radius) -> String {
    format!("t_r{}", radius)
}

fn waveform_key(quantity: Quantity, mode: Mode, radius: &Radius) -> String {
    format!("{}_l{}_m{}_r{}", quantity.tag(), mode.l, mode.m, radius)
}

fn parse_waveform_key(key: &str) -> Option<(Quantity, Mode, Radius)> {
    let (tag, rest) = key.split_once('_')?;
    let quantity = match tag {
        "psi4" => Quantity::Psi4,
        "h" => Quantity::H,
        _ => return None,
    };
    let rest = rest.strip_prefix('l')?;
    let (l, rest) = rest.split_once("_m")?;
    let (m, radius) = rest.split_once("_r")?;
    let mode = Mode::new(l.parse().ok()?, m.parse().ok()?);
    Some((quantity, mode, Radius::from(radius)))
}

/// Derives the catalog identifier from a simulation directory path.
pub fn simulation_id(path: &Path) -> ProcessingResult<String> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            ProcessingError::Source(format!("cannot derive an id from {}", path.display()))
        })?;
    let id = name.rsplit(ID_PREFIX).next().unwrap_or(name);
    if id.is_empty() {
        return Err(ProcessingError::Source(format!(
            "empty simulation id in {}",
            path.display()
        )));
    }
    Ok(id.to_string())
}

/// Waveform source reading one catalog simulation directory.
#[derive(Debug, Clone)]
pub struct CatalogSource {
    root: PathBuf,
    id: String,
    datasets: BTreeMap<String, Dataset>,
}

impl CatalogSource {
    pub fn open<P: AsRef<Path>>(path: P) -> ProcessingResult<Self> {
        let root = path.as_ref().to_path_buf();
        let id = simulation_id(&root)?;
        let waveform_path = root.join(format!("{}_wf.json", id));
        let contents = fs::read_to_string(&waveform_path).map_err(|err| {
            ProcessingError::Source(format!("reading {}: {}", waveform_path.display(), err))
        })?;
        let datasets = serde_json::from_str(&contents)?;
        Ok(Self { root, id, datasets })
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(format!("{}_metadata.json", self.id))
    }

    fn strain_keys(&self) -> impl Iterator<Item = (Mode, Radius)> + '_ {
        self.datasets
            .keys()
            .filter_map(|key| parse_waveform_key(key))
            .filter(|(quantity, _, _)| *quantity == Quantity::H)
            .map(|(_, mode, radius)| (mode, radius))
    }

    fn dataset(&self, key: &str) -> ProcessingResult<&Dataset> {
        self.datasets.get(key).ok_or_else(|| {
            ProcessingError::Source(format!("{} has no dataset `{}`", self.id, key))
        })
    }
}

impl WaveformSource for CatalogSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn available_modes(&self) -> ProcessingResult<Vec<Mode>> {
        let mut modes = Vec::new();
        for (mode, _) in self.strain_keys() {
            if !modes.contains(&mode) {
                modes.push(mode);
            }
        }
        Ok(modes)
    }

    fn available_radii(&self) -> ProcessingResult<Vec<Radius>> {
        let mut radii = Vec::new();
        for (_, radius) in self.strain_keys() {
            if !radii.contains(&radius) {
                radii.push(radius);
            }
        }
        Ok(radii)
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
        let time = match self.dataset(&time_key(radius))? {
            Dataset::Real(values) => values.clone(),
            Dataset::Complex(_) => {
                return Err(ProcessingError::Source(format!(
                    "time axis for radius {} is not real",
                    radius
                )))
            }
        };
        let value = self
            .dataset(&waveform_key(quantity, mode, radius))?
            .to_complex();
        Signal::from_complex(time, value)
    }

    fn load_metadata(&self) -> ProcessingResult<Metadata> {
        let contents = fs::read_to_string(self.metadata_path())?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Writes simulations in the catalog layout read by [`CatalogSource`].
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    id: String,
    datasets: BTreeMap<String, Dataset>,
    metadata: Metadata,
}

impl CatalogBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn time_axis(&mut self, radius: &Radius, time: &[f64]) -> &mut Self {
        self.datasets
            .insert(time_key(radius), Dataset::Real(time.to_vec()));
        self
    }

    pub fn waveform(
        &mut self,
        quantity: Quantity,
        mode: Mode,
        radius: &Radius,
        values: &[Complex64],
    ) -> ProcessingResult<&mut Self> {
        if quantity == Quantity::Hdot {
            return Err(ProcessingError::Usage(
                "hdot is derived from psi4 and cannot be stored".into(),
            ));
        }
        let pairs = values.iter().map(|v| [v.re, v.im]).collect();
        self.datasets
            .insert(waveform_key(quantity, mode, radius), Dataset::Complex(pairs));
        Ok(self)
    }

    pub fn metadata(&mut self, metadata: Metadata) -> &mut Self {
        self.metadata = metadata;
        self
    }

    /// Creates `<parent>/ICCUB-<id>/` with both files and returns its path.
    pub fn write(&self, parent: &Path) -> ProcessingResult<PathBuf> {
        let root = parent.join(format!("{}{}", ID_PREFIX, self.id));
        fs::create_dir_all(&root)?;
        let waveform = serde_json::to_string(&self.datasets)?;
        fs::write(root.join(format!("{}_wf.json", self.id)), waveform)?;
        let metadata = serde_json::to_string_pretty(&self.metadata)?;
        fs::write(root.join(format!("{}_metadata.json", self.id)), metadata)?;
        Ok(root)
    }
}
