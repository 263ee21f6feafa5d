//! Interpolation and extrapolation of assembled series
//!
//! Population is treated as piecewise linear between observed years. Each
//! (age, sex) cell is estimated on its own and the cell estimates are then
//! summed; interpolating an already-summed series would give different
//! answers whenever cells cover different years.

use crate::config::EstimationConfig;
use crate::error::{Error, Result};
use crate::models::{Estimate, GeographyCode, Provenance};
use crate::series::{Observation, TimeSeries};

/// Estimates counts for target years from a [`TimeSeries`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Engine {
    max_extrapolation_years: u32,
}

impl Engine {
    #[must_use]
    pub const fn new(max_extrapolation_years: u32) -> Self {
        Self {
            max_extrapolation_years,
        }
    }

    #[must_use]
    pub const fn from_config(config: &EstimationConfig) -> Self {
        Self::new(config.max_extrapolation_years)
    }

    #[must_use]
    pub const fn max_extrapolation_years(&self) -> u32 {
        self.max_extrapolation_years
    }

    /// Estimate the series' category total for `target_year`.
    ///
    /// The provenance is the weakest over all cells: one extrapolated cell
    /// makes the whole estimate extrapolated.
    pub fn estimate(&self, series: &TimeSeries, target_year: i32) -> Result<Estimate> {
        if series.is_empty() {
            return Err(Error::EmptySeries {
                geography: series.geography().clone(),
                category: *series.category(),
            });
        }

        let mut count = 0.0;
        let mut provenance = Provenance::Observed;
        for (_, observations) in series.cells() {
            if observations.is_empty() {
                continue;
            }
            let (value, cell_provenance) =
                self.estimate_cell(observations, series.geography(), target_year)?;
            count += value;
            provenance = provenance.max(cell_provenance);
        }

        Ok(Estimate {
            geography: series.geography().clone(),
            year: target_year,
            category: *series.category(),
            count,
            provenance,
        })
    }

    /// Estimate one cell. `observations` must be non-empty and sorted by year.
    pub fn estimate_cell(
        &self,
        observations: &[Observation],
        geography: &GeographyCode,
        target_year: i32,
    ) -> Result<(f64, Provenance)> {
        let (Some(first), Some(last)) = (observations.first(), observations.last()) else {
            return Err(Error::invalid_data(
                &geography.to_string(),
                "cannot estimate from an empty cell",
            ));
        };

        let idx = match observations.binary_search_by_key(&target_year, |o| o.year) {
            Ok(idx) => return Ok((observations[idx].count, Provenance::Observed)),
            Err(idx) => idx,
        };

        if idx > 0 && idx < observations.len() {
            let value = interpolate(&observations[idx - 1], &observations[idx], target_year);
            return Ok((value, Provenance::Interpolated));
        }

        let distance = if idx == 0 {
            i64::from(first.year) - i64::from(target_year)
        } else {
            i64::from(target_year) - i64::from(last.year)
        };
        if distance > i64::from(self.max_extrapolation_years) {
            return Err(Error::OutOfRange {
                geography: geography.clone(),
                year: target_year,
                first: first.year,
                last: last.year,
                max_extrapolation_years: self.max_extrapolation_years,
            });
        }

        let value = match observations {
            [] | [_] => first.count,
            [a, b, ..] if idx == 0 => interpolate(a, b, target_year),
            [.., a, b] => interpolate(a, b, target_year),
        };
        if value < 0.0 {
            log::debug!(
                "Extrapolated count {value} for {geography} in {target_year} floored at zero"
            );
        }
        Ok((value.max(0.0), Provenance::Extrapolated))
    }
}

/// Linear through two points, evaluated at `year` (inside or outside them)
fn interpolate(p0: &Observation, p1: &Observation, year: i32) -> f64 {
    let span = f64::from(p1.year) - f64::from(p0.year);
    let offset = f64::from(year) - f64::from(p0.year);
    p0.count + (p1.count - p0.count) * offset / span
}
