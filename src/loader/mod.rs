//! Dataset loading boundary
//!
//! The estimation core never touches files or the network. It asks a
//! [`DatasetLoader`] for a named dataset and receives already-validated
//! [`SeriesPoint`]s. Loaded datasets are held by an explicit
//! [`DatasetCache`] owned by the caller.

pub mod cache;
pub mod ingest;
pub mod memory;
pub mod parquet;

use std::time::Instant;

use arrow::record_batch::RecordBatch;
use itertools::{Itertools, MinMaxResult};
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::models::{CodeSystem, SeriesPoint};
use crate::utils::{log_operation_complete, log_operation_start};
use ingest::{PointCollector, ingest_batch};

pub use cache::DatasetCache;
pub use memory::MemoryLoader;
pub use parquet::ParquetLoader;

/// Source of named population datasets
pub trait DatasetLoader: Send + Sync {
    /// Load and validate the dataset with the given name
    fn load(&self, name: &str) -> Result<Dataset>;

    /// Names of the datasets this loader can provide
    fn available(&self) -> Vec<String>;
}

/// A validated, immutable population dataset in a single code system
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    code_system: CodeSystem,
    points: Vec<SeriesPoint>,
    /// Geography code -> indices into `points`
    by_geography: FxHashMap<String, Vec<usize>>,
}

impl Dataset {
    /// Build a dataset from points that are already typed.
    ///
    /// Points go through the same validation as tabular input: one code
    /// system, non-negative counts, unique keys, ages folded at `max_age`.
    pub fn from_points(
        name: &str,
        code_system: CodeSystem,
        points: impl IntoIterator<Item = SeriesPoint>,
        max_age: u16,
    ) -> Result<Self> {
        let mut collector = PointCollector::new(name, &code_system, max_age);
        for point in points {
            collector.push(point)?;
        }
        let points = collector.finish();
        Ok(Self::index(name, code_system, points))
    }

    /// Ingest Arrow record batches
    pub fn from_batches(
        name: &str,
        code_system: CodeSystem,
        batches: &[RecordBatch],
        max_age: u16,
    ) -> Result<Self> {
        let start = Instant::now();
        log_operation_start("Ingesting dataset", name);

        let mut collector = PointCollector::new(name, &code_system, max_age);
        for batch in batches {
            ingest_batch(batch, &mut collector)?;
        }
        let points = collector.finish();

        log_operation_complete("ingested", name, points.len(), Some(start.elapsed()));
        Ok(Self::index(name, code_system, points))
    }

    fn index(name: &str, code_system: CodeSystem, points: Vec<SeriesPoint>) -> Self {
        let mut by_geography: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (i, point) in points.iter().enumerate() {
            by_geography
                .entry(point.geography.code.clone())
                .or_default()
                .push(i);
        }
        Self {
            name: name.to_string(),
            code_system,
            points,
            by_geography,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn code_system(&self) -> &CodeSystem {
        &self.code_system
    }

    #[must_use]
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points recorded against one geography code
    pub fn points_for<'a>(&'a self, code: &str) -> impl Iterator<Item = &'a SeriesPoint> + 'a {
        self.by_geography
            .get(code)
            .into_iter()
            .flatten()
            .map(|&i| &self.points[i])
    }

    #[must_use]
    pub fn contains_geography(&self, code: &str) -> bool {
        self.by_geography.contains_key(code)
    }

    /// Geography codes present, sorted
    #[must_use]
    pub fn geographies(&self) -> Vec<&str> {
        self.by_geography.keys().map(String::as_str).sorted().collect()
    }

    /// First and last year present
    #[must_use]
    pub fn year_range(&self) -> Option<(i32, i32)> {
        match self.points.iter().map(|p| p.year).minmax() {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(year) => Some((year, year)),
            MinMaxResult::MinMax(first, last) => Some((first, last)),
        }
    }
}
