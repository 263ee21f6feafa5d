//! Public entry point for population queries
//!
//! A query names a variant, a set of geographies, a set of years and an
//! age/sex category. The datasets named by the precedence order are fetched
//! through the [`DatasetCache`], each geography's series is assembled once
//! and reused for every year, and failures are collected per geography
//! while the rest of the batch carries on.

use std::sync::Arc;
use std::time::Instant;

use itertools::Itertools;
use rayon::prelude::*;

use super::result::{GeographyFailure, QueryResult};
use crate::config::EstimationConfig;
use crate::error::{Error, Result};
use crate::estimate::Engine;
use crate::geography::GeographyResolver;
use crate::loader::{Dataset, DatasetCache};
use crate::models::{Category, Estimate, GeographyCode, Variant};
use crate::series::SeriesAssembler;
use crate::utils::{log_operation_complete, log_operation_start, log_warning};

/// Translates requests into resolver, assembler and engine calls
pub struct QueryFacade<'a> {
    config: EstimationConfig,
    cache: &'a DatasetCache,
    resolver: &'a GeographyResolver,
    engine: Engine,
}

impl<'a> QueryFacade<'a> {
    pub fn new(
        config: EstimationConfig,
        cache: &'a DatasetCache,
        resolver: &'a GeographyResolver,
    ) -> Result<Self> {
        config.validate()?;
        if *resolver.target_system() != config.target_system {
            return Err(Error::Config(format!(
                "resolver targets {} but configuration requests {}",
                resolver.target_system(),
                config.target_system
            )));
        }
        let engine = Engine::from_config(&config);
        Ok(Self {
            config,
            cache,
            resolver,
            engine,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &EstimationConfig {
        &self.config
    }

    #[must_use]
    pub const fn cache(&self) -> &DatasetCache {
        self.cache
    }

    /// Datasets for a variant, most authoritative first
    pub fn sources(&self, variant: Variant) -> Result<Vec<Arc<Dataset>>> {
        self.config
            .dataset_names(variant)
            .iter()
            .map(|name| self.cache.get(name))
            .collect()
    }

    /// Estimate every requested geography for every requested year.
    ///
    /// Missing datasets fail the whole query. Anything specific to one
    /// geography (unmappable code, no data, year out of range) is recorded
    /// in [`QueryResult::failures`] and the other geographies are still
    /// estimated.
    pub fn query(
        &self,
        variant: Variant,
        geographies: &[GeographyCode],
        years: &[i32],
        category: Category,
    ) -> Result<QueryResult> {
        let start = Instant::now();
        let subject = format!(
            "{variant} for {} geographies, {} years ({category})",
            geographies.len(),
            years.len()
        );
        log_operation_start("Running query", &subject);

        let sources = self.sources(variant)?;
        let sources: Vec<&Dataset> = sources.iter().map(Arc::as_ref).collect();
        let geographies: Vec<&GeographyCode> = geographies.iter().unique().collect();
        let years: Vec<i32> = years.iter().copied().sorted_unstable().dedup().collect();

        let outcomes: Vec<QueryResult> = if self.config.parallel {
            geographies
                .par_iter()
                .map(|geography| self.evaluate(&sources, geography, &years, &category))
                .collect()
        } else {
            geographies
                .iter()
                .map(|geography| self.evaluate(&sources, geography, &years, &category))
                .collect()
        };

        let mut result = QueryResult::default();
        for outcome in outcomes {
            result.extend(outcome);
        }
        for failure in &result.failures {
            log_warning("Estimation failed", Some(&failure.to_string()));
        }
        log_operation_complete(
            "estimated",
            &subject,
            result.estimates.len(),
            Some(start.elapsed()),
        );
        Ok(result)
    }

    /// Estimate for a single geography and year
    pub fn estimate_one(
        &self,
        variant: Variant,
        geography: &GeographyCode,
        year: i32,
        category: Category,
    ) -> Result<Vec<Estimate>> {
        let mut result = self.query(variant, std::slice::from_ref(geography), &[year], category)?;
        match result.failures.pop() {
            Some(failure) => Err(failure.error),
            None => Ok(result.estimates),
        }
    }

    /// Evaluate one requested geography across all years
    fn evaluate(
        &self,
        sources: &[&Dataset],
        requested: &GeographyCode,
        years: &[i32],
        category: &Category,
    ) -> QueryResult {
        let mut outcome = QueryResult::default();
        let fail = |error: Error, year: Option<i32>| GeographyFailure {
            geography: requested.clone(),
            year,
            error,
        };

        let targets = match self.resolver.resolve(&requested.code, &requested.system) {
            Ok(candidates) => candidates,
            Err(error) => {
                outcome.failures.push(fail(error, None));
                return outcome;
            }
        };

        let assembler = SeriesAssembler::new(self.resolver);
        for target in &targets {
            let series = match assembler.assemble(sources, &target.geography, category) {
                Ok(series) => series,
                Err(error) => {
                    outcome.failures.push(fail(error, None));
                    continue;
                }
            };
            log::debug!(
                "Assembled {} observations in {} cells for {}",
                series.len(),
                series.cell_count(),
                target.geography
            );
            for &year in years {
                match self.engine.estimate(&series, year) {
                    Ok(estimate) => outcome.estimates.push(estimate),
                    Err(error) => outcome.failures.push(fail(error, Some(year))),
                }
            }
        }
        outcome
    }
}
