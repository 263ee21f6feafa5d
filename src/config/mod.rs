//! Configuration for population estimation.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::estimate::RoundingMode;
use crate::models::{CodeSystem, Variant};

/// Placeholder in dataset names that is replaced by the variant code
pub const VARIANT_PLACEHOLDER: &str = "{variant}";

/// Configuration for series assembly, estimation and querying
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    /// Dataset names, most authoritative first. Where two datasets cover the
    /// same year the earlier one wins. Names may contain `{variant}`.
    pub precedence_order: Vec<String>,
    /// How far beyond either end of a series a year may be extrapolated
    pub max_extrapolation_years: u32,
    /// Rounding applied once to final output counts
    pub rounding_mode: RoundingMode,
    /// Projection variant used when the request does not name one
    pub variant: Variant,
    /// Code system of every output geography
    pub target_system: CodeSystem,
    /// Single-year ages at or above this are folded into one open band
    pub max_age: u16,
    /// Evaluate geographies in parallel
    pub parallel: bool,
    /// Maximum number of datasets held by the dataset cache
    pub cache_capacity: usize,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            precedence_order: vec!["mye".to_string(), format!("npp_{VARIANT_PLACEHOLDER}")],
            max_extrapolation_years: 10,
            rounding_mode: RoundingMode::HalfUp,
            variant: Variant::Principal,
            target_system: CodeSystem::country(),
            max_age: 90,
            parallel: false,
            cache_capacity: 20,
        }
    }
}

impl EstimationConfig {
    /// Read a JSON configuration file; absent fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.precedence_order.is_empty() {
            return Err(Error::Config("precedence_order must name at least one dataset".into()));
        }
        let names = self.dataset_names(self.variant);
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(Error::Config(format!("precedence_order entry {i} is empty")));
            }
            if names[..i].contains(name) {
                return Err(Error::Config(format!(
                    "dataset '{name}' appears more than once in precedence_order"
                )));
            }
        }
        if self.cache_capacity == 0 {
            return Err(Error::Config("cache_capacity must be positive".into()));
        }
        Ok(())
    }

    /// Concrete dataset names for a variant, in precedence order
    #[must_use]
    pub fn dataset_names(&self, variant: Variant) -> Vec<String> {
        self.precedence_order
            .iter()
            .map(|name| name.replace(VARIANT_PLACEHOLDER, variant.code()))
            .collect()
    }

    /// Name of the projection dataset a variant selects, i.e. the first
    /// precedence entry that depends on the variant
    #[must_use]
    pub fn projection_dataset(&self, variant: Variant) -> Option<String> {
        self.precedence_order
            .iter()
            .find(|name| name.contains(VARIANT_PLACEHOLDER))
            .map(|name| name.replace(VARIANT_PLACEHOLDER, variant.code()))
    }
}

impl fmt::Display for EstimationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Estimation Configuration:")?;
        writeln!(f, "  Precedence: {}", self.precedence_order.join(" > "))?;
        writeln!(f, "  Variant: {} ({})", self.variant, self.variant.description())?;
        writeln!(f, "  Target Code System: {}", self.target_system)?;
        writeln!(
            f,
            "  Max Extrapolation: {} years",
            self.max_extrapolation_years
        )?;
        writeln!(f, "  Rounding: {}", self.rounding_mode)?;
        writeln!(f, "  Open Age Band: {}+", self.max_age)?;
        writeln!(f, "  Parallel: {}", self.parallel)?;
        writeln!(f, "  Cache Capacity: {}", self.cache_capacity)?;
        Ok(())
    }
}
