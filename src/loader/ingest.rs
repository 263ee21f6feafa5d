//! Mapping loosely-typed tabular input into `SeriesPoint`s
//!
//! Source tables arrive with whatever column types the upstream export
//! produced (ages as integers or labels such as `90+` or `105 - 109`, sex
//! as Nomis numeric codes or letters). Every column is cast to one canonical
//! type here, deserialized with `serde_arrow`, and validated once.

use std::sync::Arc;

use arrow::array::{ArrayRef, new_null_array};
use arrow::compute::kernels::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{AgeBand, CodeSystem, GeographyCode, SeriesPoint, Sex};

pub const GEOGRAPHY_CODE: &str = "GEOGRAPHY_CODE";
pub const CODE_SYSTEM: &str = "CODE_SYSTEM";
pub const YEAR: &str = "PROJECTED_YEAR_NAME";
pub const AGE: &str = "C_AGE";
pub const SEX: &str = "GENDER";
pub const COUNT: &str = "OBS_VALUE";

/// Canonical column layout: (name, type, required)
const COLUMNS: [(&str, DataType, bool); 6] = [
    (GEOGRAPHY_CODE, DataType::Utf8, true),
    (CODE_SYSTEM, DataType::Utf8, false),
    (YEAR, DataType::Int32, true),
    (AGE, DataType::Utf8, true),
    (SEX, DataType::Utf8, true),
    (COUNT, DataType::Float64, true),
];

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "GEOGRAPHY_CODE")]
    geography_code: Option<String>,
    #[serde(rename = "CODE_SYSTEM")]
    code_system: Option<String>,
    #[serde(rename = "PROJECTED_YEAR_NAME")]
    year: Option<i32>,
    #[serde(rename = "C_AGE")]
    age: Option<String>,
    #[serde(rename = "GENDER")]
    sex: Option<String>,
    #[serde(rename = "OBS_VALUE")]
    count: Option<f64>,
}

/// Cast a batch to the canonical column layout.
///
/// Extra columns are dropped, a missing `CODE_SYSTEM` column is filled with
/// nulls, any other missing column is an error.
pub fn canonical_batch(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(COLUMNS.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(COLUMNS.len());

    for (name, data_type, required) in COLUMNS {
        let array = match schema.index_of(name) {
            Ok(idx) => {
                let column = batch.column(idx);
                if column.data_type() == &data_type {
                    column.clone()
                } else {
                    log::debug!(
                        "Converting column '{name}' from {:?} to {data_type:?}",
                        column.data_type()
                    );
                    cast::cast(column, &data_type)?
                }
            }
            Err(_) if required => {
                return Err(Error::ColumnNotFound {
                    column: name.to_string(),
                });
            }
            Err(_) => new_null_array(&data_type, batch.num_rows()),
        };
        fields.push(Field::new(name, data_type, true));
        arrays.push(array);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Parse an age label: `42`, `42.0`, `90+`, `90 and over`, `105 - 109`
#[must_use]
pub fn parse_age(label: &str) -> Option<AgeBand> {
    let label = label.trim();
    if let Some(lower) = label.strip_suffix('+') {
        return lower.trim().parse().ok().map(AgeBand::open);
    }
    if let Some(lower) = label.strip_suffix("and over") {
        return lower.trim().parse().ok().map(AgeBand::open);
    }
    if let Some((lower, upper)) = label.split_once('-') {
        let lower: u16 = lower.trim().parse().ok()?;
        let upper: u16 = upper.trim().parse().ok()?;
        return (lower <= upper).then_some(AgeBand::band(lower, upper));
    }
    if let Ok(age) = label.parse::<u16>() {
        return Some(AgeBand::single(age));
    }
    // Some exports carry integral ages as floats
    let value: f64 = label.parse().ok()?;
    (value.fract() == 0.0 && (0.0..=f64::from(u16::MAX)).contains(&value))
        .then_some(AgeBand::single(value as u16))
}

/// Fold any band starting at or above `max_age` into the open band `max_age+`.
///
/// Returns `None` for a closed band that spans `max_age` (e.g. `85-94` with
/// 90), which cannot be divided between the two sides. An open band starting
/// below `max_age` is kept as is.
#[must_use]
pub const fn fold_age(age: AgeBand, max_age: u16) -> Option<(AgeBand, bool)> {
    match age.upper {
        _ if age.lower >= max_age => {
            let unchanged = age.lower == max_age && age.upper.is_none();
            Some((AgeBand::open(max_age), !unchanged))
        }
        Some(upper) if upper >= max_age => None,
        _ => Some((age, false)),
    }
}

/// Accumulates validated points, enforcing key uniqueness
pub(crate) struct PointCollector<'a> {
    dataset: &'a str,
    system: &'a CodeSystem,
    max_age: u16,
    points: Vec<SeriesPoint>,
    /// Key -> (index, whether the entry is a sum of folded ages)
    index: FxHashMap<(i32, String, AgeBand, Sex), (usize, bool)>,
}

impl<'a> PointCollector<'a> {
    pub(crate) fn new(dataset: &'a str, system: &'a CodeSystem, max_age: u16) -> Self {
        Self {
            dataset,
            system,
            max_age,
            points: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    pub(crate) fn push(&mut self, point: SeriesPoint) -> Result<()> {
        if point.geography.system != *self.system {
            return Err(Error::invalid_data(
                self.dataset,
                format!(
                    "row for {} uses code system {}, dataset uses {}",
                    point.geography.code, point.geography.system, self.system
                ),
            ));
        }
        if !point.count.is_finite() || point.count < 0.0 {
            return Err(Error::invalid_data(
                self.dataset,
                format!(
                    "count {} for {} in {} is not a non-negative number",
                    point.count, point.geography.code, point.year
                ),
            ));
        }

        let Some((age, folded)) = fold_age(point.age, self.max_age) else {
            return Err(Error::invalid_data(
                self.dataset,
                format!(
                    "age band {} for {} in {} straddles the open band {}+",
                    point.age, point.geography.code, point.year, self.max_age
                ),
            ));
        };
        let key = (point.year, point.geography.code.clone(), age, point.sex);
        match self.index.get(&key) {
            Some(&(idx, true)) if folded => {
                self.points[idx].count += point.count;
                Ok(())
            }
            Some(_) => Err(Error::DuplicatePoint {
                dataset: self.dataset.to_string(),
                key: format!(
                    "{} {} age {} {}",
                    point.year, point.geography.code, age, point.sex
                ),
            }),
            None => {
                self.index.insert(key, (self.points.len(), folded));
                self.points.push(SeriesPoint { age, ..point });
                Ok(())
            }
        }
    }

    pub(crate) fn finish(self) -> Vec<SeriesPoint> {
        self.points
    }
}

/// Convert one record batch into points, appending to the collector
pub(crate) fn ingest_batch(batch: &RecordBatch, collector: &mut PointCollector<'_>) -> Result<()> {
    let canonical = canonical_batch(batch)?;
    let rows: Vec<RawRow> = serde_arrow::from_record_batch(&canonical)?;
    let dataset = collector.dataset;

    for (i, row) in rows.into_iter().enumerate() {
        let missing =
            |column: &str| Error::invalid_data(dataset, format!("row {i}: {column} is null"));

        let code = row.geography_code.ok_or_else(|| missing(GEOGRAPHY_CODE))?;
        let system = row
            .code_system
            .map_or_else(|| collector.system.clone(), CodeSystem::new);
        let year = row.year.ok_or_else(|| missing(YEAR))?;
        let age_label = row.age.ok_or_else(|| missing(AGE))?;
        let age = parse_age(&age_label).ok_or_else(|| {
            Error::invalid_data(dataset, format!("row {i}: unrecognised age '{age_label}'"))
        })?;
        let sex_code = row.sex.ok_or_else(|| missing(SEX))?;
        let sex = sex_code.parse::<Sex>().map_err(|_| {
            Error::invalid_data(dataset, format!("row {i}: unrecognised sex code '{sex_code}'"))
        })?;
        let count = row.count.ok_or_else(|| missing(COUNT))?;

        collector.push(SeriesPoint {
            year,
            geography: GeographyCode::new(code, system),
            age,
            sex,
            count,
        })?;
    }
    Ok(())
}
