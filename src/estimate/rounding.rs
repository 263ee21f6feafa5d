//! Rounding of final output counts

use std::fmt;

use serde::{Deserialize, Serialize};

/// How real-valued estimates become whole counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingMode {
    /// Nearest integer, halves rounded up
    #[default]
    HalfUp,
}

impl RoundingMode {
    #[must_use]
    pub fn round(self, value: f64) -> f64 {
        match self {
            // Halves away from zero, i.e. up for non-negative values
            Self::HalfUp if value >= 0.0 => value.round(),
            Self::HalfUp => (value + 0.5).floor(),
        }
    }

    /// Round a non-negative count to an integer
    #[must_use]
    pub fn round_count(self, value: f64) -> u64 {
        let rounded = self.round(value.max(0.0));
        if rounded >= u64::MAX as f64 {
            u64::MAX
        } else {
            rounded as u64
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HalfUp => f.write_str("round-half-up"),
        }
    }
}
