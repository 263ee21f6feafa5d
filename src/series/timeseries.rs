//! Assembled, immutable per-geography time series

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{AgeBand, Category, GeographyCode, SeriesPoint, Sex};

/// The demographic cell a sub-series belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellKey {
    pub age: AgeBand,
    pub sex: Sex,
}

impl CellKey {
    #[must_use]
    pub const fn new(age: AgeBand, sex: Sex) -> Self {
        Self { age, sex }
    }
}

/// One value of a cell's sub-series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub year: i32,
    pub count: f64,
    /// Position of the supplying dataset in the precedence order
    pub source: usize,
}

/// Ordered-by-year population counts for one geography and category,
/// kept per (age, sex) cell so estimates can be made cell by cell.
///
/// Within each cell years are strictly ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    geography: GeographyCode,
    category: Category,
    cells: BTreeMap<CellKey, Vec<Observation>>,
}

impl TimeSeries {
    /// Build a series, rejecting a second observation for the same cell and year
    pub fn from_observations(
        geography: GeographyCode,
        category: Category,
        observations: impl IntoIterator<Item = (CellKey, Observation)>,
    ) -> Result<Self> {
        let mut by_cell: BTreeMap<CellKey, BTreeMap<i32, Observation>> = BTreeMap::new();
        for (key, observation) in observations {
            match by_cell.entry(key).or_default().entry(observation.year) {
                Entry::Vacant(slot) => {
                    slot.insert(observation);
                }
                Entry::Occupied(_) => {
                    return Err(Error::DuplicatePoint {
                        dataset: geography.to_string(),
                        key: format!("{} age {} {}", observation.year, key.age, key.sex),
                    });
                }
            }
        }
        let cells = by_cell
            .into_iter()
            .map(|(key, years)| (key, years.into_values().collect()))
            .collect();
        Ok(Self {
            geography,
            category,
            cells,
        })
    }

    /// Single-cell series from `(year, count)` pairs
    pub fn from_counts(
        geography: GeographyCode,
        category: Category,
        cell: CellKey,
        counts: &[(i32, f64)],
    ) -> Result<Self> {
        Self::from_observations(
            geography,
            category,
            counts.iter().map(|&(year, count)| {
                (
                    cell,
                    Observation {
                        year,
                        count,
                        source: 0,
                    },
                )
            }),
        )
    }

    #[must_use]
    pub const fn geography(&self) -> &GeographyCode {
        &self.geography
    }

    #[must_use]
    pub const fn category(&self) -> &Category {
        &self.category
    }

    pub fn cells(&self) -> impl Iterator<Item = (&CellKey, &[Observation])> {
        self.cells.iter().map(|(key, obs)| (key, obs.as_slice()))
    }

    #[must_use]
    pub fn cell(&self, key: &CellKey) -> Option<&[Observation]> {
        self.cells.get(key).map(Vec::as_slice)
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Total number of observations across cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.values().all(Vec::is_empty)
    }

    /// Every year observed in any cell, ascending
    #[must_use]
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self
            .cells
            .values()
            .flat_map(|obs| obs.iter().map(|o| o.year))
            .collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Flatten back into points in the series' geography
    #[must_use]
    pub fn to_points(&self) -> Vec<SeriesPoint> {
        self.cells
            .iter()
            .flat_map(|(key, obs)| {
                obs.iter().map(|o| SeriesPoint {
                    year: o.year,
                    geography: self.geography.clone(),
                    age: key.age,
                    sex: key.sex,
                    count: o.count,
                })
            })
            .collect()
    }
}
