//! Population estimates for arbitrary years and UK geographies.
//!
//! Mid-year estimates and national/sub-national projections (including
//! variant projections) are merged into one time series per geography,
//! translated across geography code vintages, and interpolated or
//! extrapolated to the requested years.

pub mod config;
pub mod error;
pub mod estimate;
pub mod geography;
pub mod loader;
pub mod models;
pub mod query;
pub mod series;
pub mod utils;

// Re-export the most common types for easier use
pub use config::EstimationConfig;
pub use error::{Error, Result};
pub use estimate::{Engine, RoundingMode};
pub use geography::{GeographyResolver, MappingEntry, MappingTable};
pub use loader::{Dataset, DatasetCache, DatasetLoader, MemoryLoader, ParquetLoader};
pub use models::{
    AgeBand, AgeRange, Category, CodeSystem, Country, Estimate, GeographyCode, Provenance,
    SeriesPoint, Sex, Variant,
};
pub use query::{EstimateTable, QueryFacade, QueryResult};
pub use series::{SeriesAssembler, TimeSeries};

// Arrow types
pub use arrow::record_batch::RecordBatch;
