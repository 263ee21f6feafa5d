//! Geography codes and the code systems (vintages) they belong to.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A geography code vintage, e.g. `LAD2011` or `LAD2021`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeSystem(String);

impl CodeSystem {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Code system of the country-level codes used by national projections
    #[must_use]
    pub fn country() -> Self {
        Self::new("CTRY")
    }
}

impl fmt::Display for CodeSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CodeSystem {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An area identifier tagged with its code system
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GeographyCode {
    pub code: String,
    pub system: CodeSystem,
}

impl GeographyCode {
    #[must_use]
    pub fn new(code: impl Into<String>, system: impl Into<CodeSystem>) -> Self {
        Self {
            code: code.into(),
            system: system.into(),
        }
    }

    /// Same system, different code
    #[must_use]
    pub fn with_code(&self, code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            system: self.system.clone(),
        }
    }
}

impl fmt::Display for GeographyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.code, self.system)
    }
}

/// UK constituent countries as coded in the national projections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Country {
    England,
    Wales,
    Scotland,
    NorthernIreland,
}

impl Country {
    /// England and Wales
    pub const EW: [Self; 2] = [Self::England, Self::Wales];
    /// Great Britain
    pub const GB: [Self; 3] = [Self::England, Self::Wales, Self::Scotland];
    /// United Kingdom
    pub const UK: [Self; 4] = [
        Self::England,
        Self::Wales,
        Self::Scotland,
        Self::NorthernIreland,
    ];

    /// ONS country code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::England => "E92000001",
            Self::Wales => "W92000004",
            Self::Scotland => "S92000003",
            Self::NorthernIreland => "N92000002",
        }
    }

    /// Look up a country by its short abbreviation (`en`, `wa`, `sc`, `ni`)
    #[must_use]
    pub fn from_abbreviation(abbreviation: &str) -> Option<Self> {
        match abbreviation.to_ascii_lowercase().as_str() {
            "en" => Some(Self::England),
            "wa" => Some(Self::Wales),
            "sc" => Some(Self::Scotland),
            "ni" => Some(Self::NorthernIreland),
            _ => None,
        }
    }

    /// Countries named by an abbreviation or grouping (`EW`, `GB`, `UK`)
    #[must_use]
    pub fn parse_list(name: &str) -> Option<Vec<Self>> {
        match name.to_ascii_uppercase().as_str() {
            "EW" => Some(Self::EW.to_vec()),
            "GB" => Some(Self::GB.to_vec()),
            "UK" => Some(Self::UK.to_vec()),
            _ => Self::from_abbreviation(name).map(|c| vec![c]),
        }
    }

    #[must_use]
    pub fn geography(self) -> GeographyCode {
        GeographyCode::new(self.code(), CodeSystem::country())
    }
}
