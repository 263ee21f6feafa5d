//! Query results: estimates, per-geography failures and output tables

use std::fmt;

use arrow::datatypes::FieldRef;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use serde_arrow::schema::{SchemaLike, TracingOptions};

use crate::error::{Error, Result};
use crate::estimate::RoundingMode;
use crate::models::{Estimate, GeographyCode};

/// A geography (or geography-year) that could not be estimated
#[derive(Debug)]
pub struct GeographyFailure {
    /// The geography as the caller requested it
    pub geography: GeographyCode,
    /// Set when only this year failed
    pub year: Option<i32>,
    pub error: Error,
}

impl GeographyFailure {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.error.kind()
    }
}

impl fmt::Display for GeographyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(year) => write!(f, "{} {year} [{}]: {}", self.geography, self.kind(), self.error),
            None => write!(f, "{} [{}]: {}", self.geography, self.kind(), self.error),
        }
    }
}

/// Outcome of a query: successful estimates alongside failures
#[derive(Debug, Default)]
pub struct QueryResult {
    pub estimates: Vec<Estimate>,
    pub failures: Vec<GeographyFailure>,
}

impl QueryResult {
    /// True when every requested geography and year was estimated
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Estimate for a geography code and year, if one was produced
    #[must_use]
    pub fn get(&self, code: &str, year: i32) -> Option<&Estimate> {
        self.estimates
            .iter()
            .find(|e| e.geography.code == code && e.year == year)
    }

    /// Failures recorded against one requested geography code
    pub fn failures_for<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a GeographyFailure> {
        self.failures.iter().filter(move |f| f.geography.code == code)
    }

    /// Round every estimate once and lay the result out as a table
    #[must_use]
    pub fn to_table(&self, rounding: RoundingMode) -> EstimateTable {
        EstimateTable {
            rows: self
                .estimates
                .iter()
                .map(|e| EstimateRow::from_estimate(e, rounding))
                .collect(),
        }
    }

    pub(crate) fn extend(&mut self, other: Self) {
        self.estimates.extend(other.estimates);
        self.failures.extend(other.failures);
    }
}

/// Final output row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateRow {
    pub geography_code: String,
    pub code_system: String,
    pub year: i32,
    pub ages: String,
    pub sex: String,
    pub count: u64,
    pub provenance: String,
}

impl EstimateRow {
    #[must_use]
    pub fn from_estimate(estimate: &Estimate, rounding: RoundingMode) -> Self {
        Self {
            geography_code: estimate.geography.code.clone(),
            code_system: estimate.geography.system.to_string(),
            year: estimate.year,
            ages: estimate.category.ages.to_string(),
            sex: estimate.category.sex.to_string(),
            count: rounding.round_count(estimate.count),
            provenance: estimate.provenance.to_string(),
        }
    }
}

/// Rounded estimates ready for output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EstimateTable {
    pub rows: Vec<EstimateRow>,
}

impl EstimateTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Arrow layout of the table
    pub fn fields() -> Result<Vec<FieldRef>> {
        Ok(Vec::<FieldRef>::from_type::<EstimateRow>(
            TracingOptions::default(),
        )?)
    }

    /// Convert to an Arrow record batch
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let fields = Self::fields()?;
        Ok(serde_arrow::to_record_batch(&fields, &self.rows)?)
    }

    /// Read back a batch produced by [`Self::to_record_batch`]
    pub fn from_record_batch(batch: &RecordBatch) -> Result<Self> {
        Ok(Self {
            rows: serde_arrow::from_record_batch(batch)?,
        })
    }
}

/// A ratio between two estimates of the same geography
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ratio {
    pub geography: GeographyCode,
    pub year: i32,
    pub numerator: f64,
    pub denominator: f64,
    pub ratio: f64,
}

/// Ratios alongside the geographies that could not be compared
#[derive(Debug, Default)]
pub struct RatioResult {
    pub ratios: Vec<Ratio>,
    pub failures: Vec<GeographyFailure>,
}

impl RatioResult {
    #[must_use]
    pub fn get(&self, code: &str, year: i32) -> Option<&Ratio> {
        self.ratios
            .iter()
            .find(|r| r.geography.code == code && r.year == year)
    }
}
