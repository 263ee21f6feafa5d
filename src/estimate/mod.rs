//! Estimation of counts for arbitrary years

pub mod engine;
pub mod rounding;

pub use engine::Engine;
pub use rounding::RoundingMode;
