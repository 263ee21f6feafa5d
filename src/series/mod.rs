//! Time series assembly

pub mod assembler;
pub mod timeseries;

pub use assembler::SeriesAssembler;
pub use timeseries::{CellKey, Observation, TimeSeries};
