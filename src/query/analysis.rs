//! Detail, aggregation and ratio queries over the projection datasets

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::Serialize;
use smallvec::SmallVec;

use super::facade::QueryFacade;
use super::result::{GeographyFailure, Ratio, RatioResult};
use crate::error::{Error, Result};
use crate::models::{AgeBand, Category, GeographyCode, SeriesPoint, Sex, Variant};

/// Dimensions an aggregate can be broken down by. Year is always kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Geography,
    Age,
    Sex,
}

/// One group of an aggregate; dimensions not grouped by are `None`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub geography: Option<String>,
    pub year: i32,
    pub age: Option<AgeBand>,
    pub sex: Option<Sex>,
    pub count: f64,
}

type GroupKey = (Option<String>, i32, Option<AgeBand>, Option<Sex>);

impl QueryFacade<'_> {
    fn projection_name(&self, variant: Variant) -> Result<String> {
        self.config().projection_dataset(variant).ok_or_else(|| {
            Error::Config("precedence_order has no variant-dependent projection dataset".into())
        })
    }

    /// First and last year of a variant's projection dataset
    pub fn year_range(&self, variant: Variant) -> Result<(i32, i32)> {
        let name = self.projection_name(variant)?;
        self.cache()
            .get(&name)?
            .year_range()
            .ok_or_else(|| Error::invalid_data(&name, "dataset is empty"))
    }

    /// Observed projection rows for the geographies, years and category.
    ///
    /// Geographies are matched as stored, without translation. `None` for
    /// years means every year in the dataset.
    pub fn detail(
        &self,
        variant: Variant,
        geographies: &[GeographyCode],
        years: Option<&[i32]>,
        category: Category,
    ) -> Result<Vec<SeriesPoint>> {
        let name = self.projection_name(variant)?;
        let dataset = self.cache().get(&name)?;

        let mut rows: Vec<SeriesPoint> = geographies
            .iter()
            .filter(|g| g.system == *dataset.code_system())
            .flat_map(|g| dataset.points_for(&g.code))
            .filter(|p| years.is_none_or(|ys| ys.contains(&p.year)))
            .filter(|p| category.matches(&p.age, p.sex))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.geography
                .code
                .cmp(&b.geography.code)
                .then_with(|| (a.year, a.age, a.sex).cmp(&(b.year, b.age, b.sex)))
        });
        rows.dedup_by(|a, b| a.key() == b.key());
        if category.sex == Sex::Total {
            rows = select_sex_breakdown(rows);
        }
        Ok(rows)
    }

    /// Sum detail rows grouped by the chosen dimensions and year
    pub fn aggregate(
        &self,
        dimensions: &[Dimension],
        variant: Variant,
        geographies: &[GeographyCode],
        years: Option<&[i32]>,
        category: Category,
    ) -> Result<Vec<AggregateRow>> {
        let rows = self.detail(variant, geographies, years, category)?;
        let by = |dimension: Dimension| dimensions.contains(&dimension);

        let mut groups: BTreeMap<GroupKey, f64> = BTreeMap::new();
        for row in rows {
            let key = (
                by(Dimension::Geography).then(|| row.geography.code.clone()),
                row.year,
                by(Dimension::Age).then_some(row.age),
                by(Dimension::Sex).then_some(row.sex),
            );
            *groups.entry(key).or_default() += row.count;
        }

        Ok(groups
            .into_iter()
            .map(|((geography, year, age, sex), count)| AggregateRow {
                geography,
                year,
                age,
                sex,
                count,
            })
            .collect())
    }

    /// Ratio of each geography's estimate in `year` to its estimate in `ref_year`
    pub fn year_ratio(
        &self,
        variant: Variant,
        geographies: &[GeographyCode],
        ref_year: i32,
        year: i32,
        category: Category,
    ) -> Result<RatioResult> {
        let result = self.query(variant, geographies, &[ref_year, year], category)?;
        let mut ratios = RatioResult {
            ratios: Vec::new(),
            failures: result.failures,
        };
        for numerator in result.estimates.iter().filter(|e| e.year == year) {
            let Some(denominator) = result
                .estimates
                .iter()
                .find(|e| e.year == ref_year && e.geography == numerator.geography)
            else {
                continue;
            };
            push_ratio(&mut ratios, &numerator.geography, year, numerator.count, denominator.count);
        }
        Ok(ratios)
    }

    /// Ratio of a variant's estimates to the principal projection's
    pub fn variant_ratio(
        &self,
        variant: Variant,
        geographies: &[GeographyCode],
        years: &[i32],
        category: Category,
    ) -> Result<RatioResult> {
        let principal = self.query(Variant::Principal, geographies, years, category)?;
        let alternative = self.query(variant, geographies, years, category)?;

        let mut ratios = RatioResult {
            ratios: Vec::new(),
            failures: alternative.failures,
        };
        ratios.failures.extend(principal.failures);
        for numerator in &alternative.estimates {
            let Some(denominator) = principal
                .estimates
                .iter()
                .find(|e| e.year == numerator.year && e.geography == numerator.geography)
            else {
                continue;
            };
            push_ratio(
                &mut ratios,
                &numerator.geography,
                numerator.year,
                numerator.count,
                denominator.count,
            );
        }
        Ok(ratios)
    }
}

/// Keep one sex breakdown per (geography, year, age) so sums count everyone
/// once: male and female rows when both exist, otherwise the persons row,
/// otherwise whatever split rows there are.
///
/// `rows` must be sorted by geography, year and age.
fn select_sex_breakdown(rows: Vec<SeriesPoint>) -> Vec<SeriesPoint> {
    let mut selected = Vec::with_capacity(rows.len());
    let cells = rows
        .into_iter()
        .chunk_by(|p| (p.geography.code.clone(), p.year, p.age));
    for (_, cell) in &cells {
        let cell: SmallVec<[SeriesPoint; 3]> = cell.collect();
        let has = |sex: Sex| cell.iter().any(|p| p.sex == sex);
        let use_total = !(has(Sex::Male) && has(Sex::Female)) && has(Sex::Total);
        selected.extend(cell.into_iter().filter(|p| (p.sex == Sex::Total) == use_total));
    }
    selected
}

fn push_ratio(
    ratios: &mut RatioResult,
    geography: &GeographyCode,
    year: i32,
    numerator: f64,
    denominator: f64,
) {
    if denominator > 0.0 {
        ratios.ratios.push(Ratio {
            geography: geography.clone(),
            year,
            numerator,
            denominator,
            ratio: numerator / denominator,
        });
    } else {
        ratios.failures.push(GeographyFailure {
            geography: geography.clone(),
            year: Some(year),
            error: Error::invalid_data(
                &geography.to_string(),
                format!("reference count for {year} is zero"),
            ),
        });
    }
}
