//! In-memory dataset loader

use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;

use super::{Dataset, DatasetLoader};
use crate::error::{Error, Result};
use crate::models::{CodeSystem, SeriesPoint};

#[derive(Debug, Clone)]
enum Source {
    Batches(CodeSystem, Vec<RecordBatch>),
    Points(CodeSystem, Vec<SeriesPoint>),
}

/// Loader over record batches or points registered up front.
///
/// Useful when the tables were produced elsewhere in the process, and in
/// tests.
#[derive(Debug, Clone)]
pub struct MemoryLoader {
    sources: FxHashMap<String, Source>,
    max_age: u16,
}

impl MemoryLoader {
    #[must_use]
    pub fn new(max_age: u16) -> Self {
        Self {
            sources: FxHashMap::default(),
            max_age,
        }
    }

    /// Register tabular data under a dataset name
    #[must_use]
    pub fn with_batches(
        mut self,
        name: &str,
        code_system: CodeSystem,
        batches: Vec<RecordBatch>,
    ) -> Self {
        self.sources
            .insert(name.to_string(), Source::Batches(code_system, batches));
        self
    }

    /// Register typed points under a dataset name
    #[must_use]
    pub fn with_points(
        mut self,
        name: &str,
        code_system: CodeSystem,
        points: Vec<SeriesPoint>,
    ) -> Self {
        self.sources
            .insert(name.to_string(), Source::Points(code_system, points));
        self
    }
}

impl DatasetLoader for MemoryLoader {
    fn load(&self, name: &str) -> Result<Dataset> {
        match self.sources.get(name) {
            Some(Source::Batches(system, batches)) => {
                Dataset::from_batches(name, system.clone(), batches, self.max_age)
            }
            Some(Source::Points(system, points)) => {
                Dataset::from_points(name, system.clone(), points.iter().cloned(), self.max_age)
            }
            None => Err(Error::DatasetNotFound(name.to_string())),
        }
    }

    fn available(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sources.keys().cloned().collect();
        names.sort();
        names
    }
}
