//! Geography code translation between code systems (vintages)
//!
//! Boundary reviews retire, merge and split areas, so a code in one vintage
//! may correspond to several codes in another. Each mapping table row
//! `(old_code, new_code, weight)` says what share of the old area's
//! population lies in the new area; weights sum to one per old code.

use arrow::record_batch::RecordBatch;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::error::{Error, Result};
use crate::models::{CodeSystem, GeographyCode};

/// Tolerance on the per-code weight sum
const WEIGHT_TOLERANCE: f64 = 1e-6;

/// One row of a mapping table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub old_code: String,
    pub new_code: String,
    pub weight: f64,
}

impl MappingEntry {
    #[must_use]
    pub fn new(old_code: &str, new_code: &str, weight: f64) -> Self {
        Self {
            old_code: old_code.to_string(),
            new_code: new_code.to_string(),
            weight,
        }
    }
}

/// Validated translation from one code system to another
#[derive(Debug, Clone)]
pub struct MappingTable {
    from: CodeSystem,
    to: CodeSystem,
    entries: Vec<MappingEntry>,
}

impl MappingTable {
    pub fn new(from: CodeSystem, to: CodeSystem, entries: Vec<MappingEntry>) -> Result<Self> {
        let mut totals: FxHashMap<&str, f64> = FxHashMap::default();
        let mut seen: FxHashSet<(&str, &str)> = FxHashSet::default();

        for entry in &entries {
            if !entry.weight.is_finite()
                || entry.weight <= 0.0
                || entry.weight > 1.0 + WEIGHT_TOLERANCE
            {
                return Err(Error::InvalidMapping {
                    old_code: entry.old_code.clone(),
                    message: format!(
                        "weight {} for {} is outside (0, 1]",
                        entry.weight, entry.new_code
                    ),
                });
            }
            if !seen.insert((entry.old_code.as_str(), entry.new_code.as_str())) {
                return Err(Error::InvalidMapping {
                    old_code: entry.old_code.clone(),
                    message: format!("{} listed more than once", entry.new_code),
                });
            }
            *totals.entry(entry.old_code.as_str()).or_default() += entry.weight;
        }

        if let Some((old_code, total)) = totals
            .iter()
            .find(|(_, total)| (**total - 1.0).abs() > WEIGHT_TOLERANCE)
        {
            return Err(Error::InvalidMapping {
                old_code: (*old_code).to_string(),
                message: format!("weights sum to {total}, expected 1"),
            });
        }

        Ok(Self { from, to, entries })
    }

    /// Read a table from Arrow columns `old_code`, `new_code`, `weight`
    pub fn from_record_batches(
        from: CodeSystem,
        to: CodeSystem,
        batches: &[RecordBatch],
    ) -> Result<Self> {
        let mut entries = Vec::new();
        for batch in batches {
            let rows: Vec<MappingEntry> = serde_arrow::from_record_batch(batch)?;
            entries.extend(rows);
        }
        Self::new(from, to, entries)
    }

    #[must_use]
    pub const fn from_system(&self) -> &CodeSystem {
        &self.from
    }

    #[must_use]
    pub const fn to_system(&self) -> &CodeSystem {
        &self.to
    }

    #[must_use]
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }
}

/// A code in the target system with the share of population it receives
#[derive(Debug, Clone, PartialEq)]
pub struct Apportionment {
    pub geography: GeographyCode,
    pub weight: f64,
}

/// Candidates for one translated code; most translations are one-to-one
pub type Candidates = SmallVec<[Apportionment; 2]>;

/// Source codes feeding one target code
pub type Contributors = SmallVec<[(String, f64); 2]>;

/// Translates codes from any registered system into one target system.
///
/// Lookups are served from indices built once when tables are added, so a
/// resolver built for a query answers every translation in that query
/// without rescanning the tables.
#[derive(Debug, Clone)]
pub struct GeographyResolver {
    target: CodeSystem,
    /// Source system -> old code -> target candidates
    forward: FxHashMap<CodeSystem, FxHashMap<String, Candidates>>,
    /// Source system -> target code -> contributing old codes
    reverse: FxHashMap<CodeSystem, FxHashMap<String, Contributors>>,
}

impl GeographyResolver {
    #[must_use]
    pub fn new(target: CodeSystem) -> Self {
        Self {
            target,
            forward: FxHashMap::default(),
            reverse: FxHashMap::default(),
        }
    }

    /// Register a table translating into the target system
    pub fn with_table(mut self, table: MappingTable) -> Result<Self> {
        if table.to != self.target {
            return Err(Error::Config(format!(
                "mapping table {} -> {} does not translate into target system {}",
                table.from, table.to, self.target
            )));
        }
        if table.from == self.target {
            return Err(Error::Config(format!(
                "mapping table maps {} onto itself",
                table.from
            )));
        }

        let forward = self.forward.entry(table.from.clone()).or_default();
        let reverse = self.reverse.entry(table.from.clone()).or_default();
        for entry in table.entries {
            forward
                .entry(entry.old_code.clone())
                .or_default()
                .push(Apportionment {
                    geography: GeographyCode::new(entry.new_code.clone(), table.to.clone()),
                    weight: entry.weight,
                });
            reverse
                .entry(entry.new_code)
                .or_default()
                .push((entry.old_code, entry.weight));
        }
        log::debug!(
            "Registered geography mapping {} -> {} ({} source codes)",
            table.from,
            table.to,
            forward.len()
        );
        Ok(self)
    }

    #[must_use]
    pub const fn target_system(&self) -> &CodeSystem {
        &self.target
    }

    /// Whether codes in `system` can be translated into the target system
    #[must_use]
    pub fn supports(&self, system: &CodeSystem) -> bool {
        *system == self.target || self.forward.contains_key(system)
    }

    /// Translate a code into the target system.
    ///
    /// Returns every target code the source area contributes to, with its
    /// apportionment weight. Codes already in the target system map to
    /// themselves with weight one.
    pub fn resolve(&self, code: &str, source_system: &CodeSystem) -> Result<Candidates> {
        if *source_system == self.target {
            return Ok(smallvec![Apportionment {
                geography: GeographyCode::new(code, self.target.clone()),
                weight: 1.0,
            }]);
        }
        self.forward
            .get(source_system)
            .and_then(|codes| codes.get(code))
            .cloned()
            .ok_or_else(|| Error::UnmappableGeography {
                code: code.to_string(),
                source_system: source_system.to_string(),
                target_system: self.target.to_string(),
            })
    }

    /// Source codes in `source_system` that contribute to a target code.
    ///
    /// An empty result means the source system has no area feeding the
    /// target code; a missing table for the system is an error.
    pub fn contributors(
        &self,
        target_code: &str,
        source_system: &CodeSystem,
    ) -> Result<Contributors> {
        if *source_system == self.target {
            return Ok(smallvec![(target_code.to_string(), 1.0)]);
        }
        let codes = self
            .reverse
            .get(source_system)
            .ok_or_else(|| Error::UnmappableGeography {
                code: target_code.to_string(),
                source_system: self.target.to_string(),
                target_system: source_system.to_string(),
            })?;
        Ok(codes.get(target_code).cloned().unwrap_or_default())
    }
}
