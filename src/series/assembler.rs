//! Merging datasets into one time series per geography
//!
//! Sources are given most authoritative first. For every (age, sex) cell and
//! year, the value comes from the first source that has that cell-year;
//! later sources only fill years the earlier ones lack. Sources in another
//! code system are translated through the resolver, with counts scaled by
//! apportionment weights and summed over every old area feeding the
//! requested one.
//!
//! Sources rarely agree on demographic breakdowns. Before merging, sexes are
//! collapsed to persons counts when a persons total is requested and some
//! source lacks the split, and age bands that overlap without being equal
//! (single years against five-year bands, `85+` against `90+`) are merged
//! into one common partition so no population is counted twice.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::timeseries::{CellKey, Observation, TimeSeries};
use crate::error::{Error, Result};
use crate::geography::GeographyResolver;
use crate::loader::Dataset;
use crate::models::{AgeBand, Category, GeographyCode, Sex};

/// Apportioned counts from one source, keyed by (year, age, sex)
type SourceCounts = FxHashMap<(i32, AgeBand, Sex), f64>;

/// Builds [`TimeSeries`] from datasets ordered by precedence
#[derive(Debug, Clone, Copy)]
pub struct SeriesAssembler<'a> {
    resolver: &'a GeographyResolver,
}

impl<'a> SeriesAssembler<'a> {
    #[must_use]
    pub const fn new(resolver: &'a GeographyResolver) -> Self {
        Self { resolver }
    }

    /// Assemble the series for one geography (in the resolver's target
    /// system) and category.
    pub fn assemble(
        &self,
        sources: &[&Dataset],
        geography: &GeographyCode,
        category: &Category,
    ) -> Result<TimeSeries> {
        if geography.system != *self.resolver.target_system() {
            return Err(Error::UnmappableGeography {
                code: geography.code.clone(),
                source_system: geography.system.to_string(),
                target_system: self.resolver.target_system().to_string(),
            });
        }

        let mut per_source = Vec::with_capacity(sources.len());
        for source in sources {
            let counts = self.collect_source(source, geography, category)?;
            log::debug!(
                "{} contributes {} cell-years to {geography} ({category})",
                source.name(),
                counts.len()
            );
            per_source.push(counts);
        }

        if category.sex == Sex::Total && needs_collapse(&per_source) {
            for counts in &mut per_source {
                *counts = collapse_sexes(counts);
            }
        }
        reconcile_ages(&mut per_source);

        if per_source.iter().all(|counts| counts.is_empty()) {
            return Err(Error::EmptySeries {
                geography: geography.clone(),
                category: *category,
            });
        }

        let mut merged: BTreeMap<(CellKey, i32), Observation> = BTreeMap::new();
        for (rank, counts) in per_source.iter().enumerate() {
            for (&(year, age, sex), &count) in counts {
                if let Entry::Vacant(slot) = merged.entry((CellKey::new(age, sex), year)) {
                    slot.insert(Observation {
                        year,
                        count,
                        source: rank,
                    });
                }
            }
        }

        TimeSeries::from_observations(
            geography.clone(),
            *category,
            merged.into_iter().map(|((key, _), obs)| (key, obs)),
        )
    }

    /// Matching counts from one source, translated into the target geography
    fn collect_source(
        &self,
        source: &Dataset,
        geography: &GeographyCode,
        category: &Category,
    ) -> Result<SourceCounts> {
        let contributors = self
            .resolver
            .contributors(&geography.code, source.code_system())?;

        let mut counts = SourceCounts::default();
        for (code, weight) in &contributors {
            for point in source.points_for(code) {
                if category.matches(&point.age, point.sex) {
                    *counts.entry((point.year, point.age, point.sex)).or_default() +=
                        point.count * weight;
                }
            }
        }
        Ok(counts)
    }
}

/// Persons totals are needed when any source lacks a male/female split for
/// some cell-year, otherwise mixing split and persons cells double counts
fn needs_collapse(per_source: &[SourceCounts]) -> bool {
    per_source
        .iter()
        .flat_map(|counts| counts.keys())
        .any(|&(_, _, sex)| sex == Sex::Total)
}

/// Reduce a source to persons counts per (year, age).
///
/// A persons row wins over the male/female rows of the same cell-year. Split
/// rows only form a total when both sexes are present; a lone sex is left
/// out so that cell-year is estimated from neighbouring years instead.
fn collapse_sexes(counts: &SourceCounts) -> SourceCounts {
    let mut totals = SourceCounts::default();
    let mut split: FxHashMap<(i32, AgeBand), [Option<f64>; 2]> = FxHashMap::default();
    for (&(year, age, sex), &count) in counts {
        match sex {
            Sex::Total => {
                *totals.entry((year, age, Sex::Total)).or_default() += count;
            }
            Sex::Male => split.entry((year, age)).or_default()[0] = Some(count),
            Sex::Female => split.entry((year, age)).or_default()[1] = Some(count),
        }
    }
    for ((year, age), sexes) in split {
        if let [Some(male), Some(female)] = sexes {
            totals.entry((year, age, Sex::Total)).or_insert(male + female);
        } else {
            log::debug!("Only one sex recorded for age {age} in {year}, leaving it to the engine");
        }
    }
    totals
}

/// A band of the common age partition and how many distinct source bands it
/// merges
#[derive(Debug, Clone, Copy)]
struct AgeGroup {
    band: AgeBand,
    members: usize,
}

/// Smallest bands such that no source band crosses a boundary between them
fn age_partition(per_source: &[SourceCounts]) -> Vec<AgeGroup> {
    let bands: BTreeSet<AgeBand> = per_source
        .iter()
        .flat_map(|counts| counts.keys())
        .map(|&(_, age, _)| age)
        .collect();

    let mut groups: Vec<AgeGroup> = Vec::new();
    for band in bands {
        match groups.last_mut() {
            Some(group) if group.band.upper.is_none_or(|upper| band.lower <= upper) => {
                group.band.upper = match (group.band.upper, band.upper) {
                    (Some(a), Some(b)) => Some(a.max(b)),
                    _ => None,
                };
                group.members += 1;
            }
            _ => groups.push(AgeGroup { band, members: 1 }),
        }
    }
    groups
}

/// Whether `bands`, sorted by lower bound, cover `group` exactly once
fn tiles(group: &AgeBand, bands: &[AgeBand]) -> bool {
    let mut next = Some(group.lower);
    for band in bands {
        if next != Some(band.lower) {
            return false;
        }
        next = band.upper.and_then(|upper| upper.checked_add(1));
    }
    bands.last().is_some_and(|last| last.upper == group.upper)
}

/// Re-express every source on the common age partition.
///
/// Counts are summed into the partition band containing them. A source only
/// supplies a partition band for a (year, sex) when its own bands tile it;
/// partial coverage is dropped so other sources or the engine fill it.
fn reconcile_ages(per_source: &mut [SourceCounts]) {
    let partition = age_partition(per_source);
    if partition.iter().all(|group| group.members == 1) {
        return;
    }
    let group_of = |age: AgeBand| {
        let idx = partition.partition_point(|group| group.band.lower <= age.lower);
        partition[idx.saturating_sub(1)].band
    };

    for counts in per_source.iter_mut() {
        let mut pieces: FxHashMap<(i32, AgeBand, Sex), (f64, SmallVec<[AgeBand; 8]>)> =
            FxHashMap::default();
        for (&(year, age, sex), &count) in counts.iter() {
            let piece = pieces.entry((year, group_of(age), sex)).or_default();
            piece.0 += count;
            piece.1.push(age);
        }
        *counts = pieces
            .into_iter()
            .filter_map(|((year, group, sex), (count, mut bands))| {
                bands.sort_unstable();
                if tiles(&group, &bands) {
                    Some(((year, group, sex), count))
                } else {
                    log::debug!("Ages {group} ({sex}) only partly covered in {year}, dropped");
                    None
                }
            })
            .collect();
    }
}
