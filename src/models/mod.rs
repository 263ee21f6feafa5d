//! Domain types shared by the loader, resolver, assembler and engine.

pub mod demographics;
pub mod geography;
pub mod point;
pub mod variant;

pub use demographics::{AgeBand, AgeRange, Category, Sex};
pub use geography::{CodeSystem, Country, GeographyCode};
pub use point::{Estimate, Provenance, SeriesPoint};
pub use variant::Variant;
