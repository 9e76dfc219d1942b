use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::prelude::{ProcessingError, ProcessingResult};

/// Spherical-harmonic mode index `(l, m)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Mode {
    pub l: i32,
    pub m: i32,
}

impl Mode {
    pub const fn new(l: i32, m: i32) -> Self {
        Self { l, m }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.l, self.m)
    }
}

impl From<(i32, i32)> for Mode {
    fn from((l, m): (i32, i32)) -> Self {
        Self::new(l, m)
    }
}

/// Parses `l,m`, optionally wrapped in parentheses.
impl FromStr for Mode {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('(').trim_end_matches(')');
        let (l, m) = trimmed
            .split_once(',')
            .ok_or_else(|| ProcessingError::Usage(format!("mode `{}` is not of the form l,m", s)))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<i32>()
                .map_err(|_| ProcessingError::Usage(format!("mode `{}` has a non-integer index", s)))
        };
        Ok(Self::new(parse(l)?, parse(m)?))
    }
}

/// Extraction radius, kept in the exact textual form used by the source.
///
/// Two radii are equal only when their strings are identical, so `"100.0"`
/// and `"100.00"` name different datasets.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Radius(String);

impl Radius {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the radius; must be finite and positive.
    pub fn to_f64(&self) -> ProcessingResult<f64> {
        let value = self.0.trim().parse::<f64>().map_err(|_| {
            ProcessingError::Precondition(format!("radius `{}` is not numeric", self.0))
        })?;
        if !value.is_finite() || value <= 0.0 {
            return Err(ProcessingError::Precondition(format!(
                "radius `{}` must be positive",
                self.0
            )));
        }
        Ok(value)
    }
}

impl fmt::Display for Radius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Radius {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Radius {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The three waveform families held per mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantity {
    Psi4,
    Hdot,
    H,
}

impl Quantity {
    pub const ALL: [Quantity; 3] = [Quantity::Psi4, Quantity::Hdot, Quantity::H];

    pub fn tag(&self) -> &'static str {
        match self {
            Quantity::Psi4 => "psi4",
            Quantity::Hdot => "hdot",
            Quantity::H => "h",
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Quantity {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quantity::ALL
            .into_iter()
            .find(|quantity| quantity.tag() == s)
            .ok_or_else(|| {
                ProcessingError::Usage(format!("{} not available; expected psi4, hdot or h", s))
            })
    }
}
