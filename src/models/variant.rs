//! National population projection variants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A projection variant, identified by its three-letter ONS code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variant {
    #[serde(rename = "hhh")]
    HighPopulation,
    #[serde(rename = "hpp")]
    HighFertility,
    #[serde(rename = "lll")]
    LowPopulation,
    #[serde(rename = "lpp")]
    LowFertility,
    #[serde(rename = "php")]
    HighLifeExpectancy,
    #[serde(rename = "pjp")]
    ModeratelyHighLifeExpectancy,
    #[serde(rename = "pkp")]
    ModeratelyLowLifeExpectancy,
    #[serde(rename = "plp")]
    LowLifeExpectancy,
    #[serde(rename = "pph")]
    HighMigration,
    #[serde(rename = "ppl")]
    LowMigration,
    #[default]
    #[serde(rename = "ppp")]
    Principal,
    #[serde(rename = "ppq")]
    ZeroEuMigration,
    #[serde(rename = "ppr")]
    HalfEuMigration,
    #[serde(rename = "pps")]
    OneAndHalfEuMigration,
    #[serde(rename = "ppz")]
    ZeroNetMigration,
}

impl Variant {
    pub const ALL: [Self; 15] = [
        Self::HighPopulation,
        Self::HighFertility,
        Self::LowPopulation,
        Self::LowFertility,
        Self::HighLifeExpectancy,
        Self::ModeratelyHighLifeExpectancy,
        Self::ModeratelyLowLifeExpectancy,
        Self::LowLifeExpectancy,
        Self::HighMigration,
        Self::LowMigration,
        Self::Principal,
        Self::ZeroEuMigration,
        Self::HalfEuMigration,
        Self::OneAndHalfEuMigration,
        Self::ZeroNetMigration,
    ];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::HighPopulation => "hhh",
            Self::HighFertility => "hpp",
            Self::LowPopulation => "lll",
            Self::LowFertility => "lpp",
            Self::HighLifeExpectancy => "php",
            Self::ModeratelyHighLifeExpectancy => "pjp",
            Self::ModeratelyLowLifeExpectancy => "pkp",
            Self::LowLifeExpectancy => "plp",
            Self::HighMigration => "pph",
            Self::LowMigration => "ppl",
            Self::Principal => "ppp",
            Self::ZeroEuMigration => "ppq",
            Self::HalfEuMigration => "ppr",
            Self::OneAndHalfEuMigration => "pps",
            Self::ZeroNetMigration => "ppz",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::HighPopulation => "High population",
            Self::HighFertility => "High fertility",
            Self::LowPopulation => "Low population",
            Self::LowFertility => "Low fertility",
            Self::HighLifeExpectancy => "High life expectancy",
            Self::ModeratelyHighLifeExpectancy => "Moderately high life expectancy",
            Self::ModeratelyLowLifeExpectancy => "Moderately low life expectancy",
            Self::LowLifeExpectancy => "Low life expectancy",
            Self::HighMigration => "High migration",
            Self::LowMigration => "Low migration",
            Self::Principal => "Principal",
            Self::ZeroEuMigration => "0% future EU migration (non-ONS)",
            Self::HalfEuMigration => "50% future EU migration (non-ONS)",
            Self::OneAndHalfEuMigration => "150% future EU migration (non-ONS)",
            Self::ZeroNetMigration => "Zero net migration",
        }
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.code() == code)
            .ok_or_else(|| Error::UnknownVariant(code.to_string()))
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
