//! Observed series points and the estimates derived from them.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::demographics::{AgeBand, Category, Sex};
use super::geography::GeographyCode;

/// One observed population count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub year: i32,
    pub geography: GeographyCode,
    pub age: AgeBand,
    pub sex: Sex,
    /// Non-negative, real-valued count
    pub count: f64,
}

impl SeriesPoint {
    /// Uniqueness key within a dataset or assembled series
    #[must_use]
    pub fn key(&self) -> (i32, &str, AgeBand, Sex) {
        (self.year, self.geography.code.as_str(), self.age, self.sex)
    }
}

/// How an estimate was obtained.
///
/// Ordered from strongest to weakest so that the provenance of a sum is the
/// maximum over its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Observed,
    Interpolated,
    Extrapolated,
}

impl Provenance {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Observed => "observed",
            Self::Interpolated => "interpolated",
            Self::Extrapolated => "extrapolated",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine output for one geography, year and category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub geography: GeographyCode,
    pub year: i32,
    pub category: Category,
    /// Unrounded count
    pub count: f64,
    pub provenance: Provenance,
}
