//! Query facade and result types

pub mod analysis;
pub mod facade;
pub mod result;

pub use analysis::{AggregateRow, Dimension};
pub use facade::QueryFacade;
pub use result::{EstimateRow, EstimateTable, GeographyFailure, QueryResult, Ratio, RatioResult};
