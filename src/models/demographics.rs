//! Age and sex breakdowns, and the category selectors built from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// An age as stored by a source: a single year, a closed band, or an
/// open-ended band such as `90+`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgeBand {
    pub lower: u16,
    /// Inclusive upper bound; `None` for an open-ended band
    pub upper: Option<u16>,
}

impl AgeBand {
    #[must_use]
    pub const fn single(age: u16) -> Self {
        Self {
            lower: age,
            upper: Some(age),
        }
    }

    #[must_use]
    pub const fn band(lower: u16, upper: u16) -> Self {
        Self {
            lower,
            upper: Some(upper),
        }
    }

    #[must_use]
    pub const fn open(lower: u16) -> Self {
        Self { lower, upper: None }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.upper.is_none()
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            Some(upper) if upper == self.lower => write!(f, "{}", self.lower),
            Some(upper) => write!(f, "{}-{}", self.lower, upper),
            None => write!(f, "{}+", self.lower),
        }
    }
}

/// Sex as recorded by the population sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    /// Persons, i.e. both sexes combined
    Total,
}

impl Sex {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Total => "total",
        }
    }
}

impl FromStr for Sex {
    type Err = Error;

    /// Accepts the Nomis numeric codes (1 male, 2 female, 0 persons) as well
    /// as the usual letters and words.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "m" | "male" | "males" => Ok(Self::Male),
            "2" | "f" | "female" | "females" => Ok(Self::Female),
            "0" | "t" | "total" | "persons" | "all" => Ok(Self::Total),
            other => Err(Error::InvalidData {
                dataset: String::new(),
                message: format!("unrecognised sex code '{other}'"),
            }),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive age range used to select stored age bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: Option<u16>,
    /// `None` admits open-ended bands
    pub max: Option<u16>,
}

impl AgeRange {
    #[must_use]
    pub const fn all() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    #[must_use]
    pub const fn between(min: u16, max: u16) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    #[must_use]
    pub const fn single(age: u16) -> Self {
        Self::between(age, age)
    }

    /// A band matches only when it lies entirely inside the range
    #[must_use]
    pub fn contains(&self, band: &AgeBand) -> bool {
        if band.lower < self.min.unwrap_or(0) {
            return false;
        }
        match (band.upper, self.max) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(upper), Some(max)) => upper <= max,
        }
    }
}

impl fmt::Display for AgeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (None, None) => f.write_str("all ages"),
            (Some(min), None) => write!(f, "ages {min}+"),
            (None, Some(max)) => write!(f, "ages 0-{max}"),
            (Some(min), Some(max)) if min == max => write!(f, "age {min}"),
            (Some(min), Some(max)) => write!(f, "ages {min}-{max}"),
        }
    }
}

/// The age/sex selector of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub ages: AgeRange,
    pub sex: Sex,
}

impl Category {
    /// Whole population
    #[must_use]
    pub const fn total() -> Self {
        Self {
            ages: AgeRange::all(),
            sex: Sex::Total,
        }
    }

    #[must_use]
    pub const fn new(ages: AgeRange, sex: Sex) -> Self {
        Self { ages, sex }
    }

    /// Whether a stored (age, sex) cell falls under this category.
    ///
    /// A `Total` request admits every stored sex; the assembler decides
    /// whether split or persons rows are used.
    #[must_use]
    pub fn matches(&self, age: &AgeBand, sex: Sex) -> bool {
        self.ages.contains(age) && (self.sex == Sex::Total || self.sex == sex)
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::total()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.ages, self.sex)
    }
}
