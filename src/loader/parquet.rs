//! Parquet-backed dataset loader
//!
//! Reads `<dir>/<name>.parquet` files that already hold the tabular layout
//! described in [`super::ingest`].

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rustc_hash::FxHashMap;

use super::{Dataset, DatasetLoader};
use crate::error::{Error, Result};
use crate::models::CodeSystem;
use crate::utils::{log_operation_complete, log_operation_start, log_warning};

/// Loader reading one Parquet file per dataset from a directory
#[derive(Debug, Clone)]
pub struct ParquetLoader {
    dir: PathBuf,
    default_system: CodeSystem,
    systems: FxHashMap<String, CodeSystem>,
    max_age: u16,
}

impl ParquetLoader {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, default_system: CodeSystem, max_age: u16) -> Self {
        Self {
            dir: dir.into(),
            default_system,
            systems: FxHashMap::default(),
            max_age,
        }
    }

    /// Declare the code system of one dataset when it differs from the default
    #[must_use]
    pub fn with_code_system(mut self, name: &str, system: CodeSystem) -> Self {
        self.systems.insert(name.to_string(), system);
        self
    }

    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.parquet"))
    }
}

impl DatasetLoader for ParquetLoader {
    fn load(&self, name: &str) -> Result<Dataset> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(Error::DatasetNotFound(format!("{name} ({})", path.display())));
        }
        let batches = read_parquet(&path)?;
        let system = self
            .systems
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.default_system.clone());
        Dataset::from_batches(name, system, &batches, self.max_age)
    }

    fn available(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            log_warning("Dataset directory not readable", self.dir.to_str());
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "parquet"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        names
    }
}

/// Read a Parquet file into Arrow record batches
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>> {
    let start = Instant::now();
    let subject = path.display().to_string();
    log_operation_start("Reading parquet file", &subject);

    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;

    log_operation_complete("read", &subject, batches.len(), Some(start.elapsed()));
    Ok(batches)
}
