use std::path::PathBuf;

use anyhow::{Context, bail};
use log::{info, warn};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use ukpopulation::loader::parquet::read_parquet;
use ukpopulation::{
    Category, CodeSystem, Country, DatasetCache, EstimationConfig, GeographyCode,
    GeographyResolver, MappingTable, ParquetLoader, QueryFacade, Variant,
};

/// A mapping table stored as Parquet (`old_code`, `new_code`, `weight`)
#[derive(Debug, Deserialize)]
struct MappingFile {
    from: CodeSystem,
    path: PathBuf,
}

/// Query description read from the JSON file given on the command line
#[derive(Debug, Deserialize)]
struct QueryFile {
    data_dir: PathBuf,
    #[serde(default)]
    config: EstimationConfig,
    /// Code system of each dataset that is not in the target system
    #[serde(default)]
    dataset_systems: FxHashMap<String, CodeSystem>,
    #[serde(default)]
    mappings: Vec<MappingFile>,
    variant: Option<Variant>,
    #[serde(default)]
    geographies: Vec<GeographyCode>,
    /// Country abbreviations or groupings: `en`, `wa`, `sc`, `ni`, `EW`, `GB`, `UK`
    #[serde(default)]
    countries: Vec<String>,
    years: Vec<i32>,
    #[serde(default)]
    category: Category,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(query_path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        bail!("usage: ukpopulation <query.json>");
    };
    let content = std::fs::read_to_string(&query_path)
        .with_context(|| format!("Failed to read query file {}", query_path.display()))?;
    let query: QueryFile = serde_json::from_str(&content)
        .with_context(|| format!("Invalid query file {}", query_path.display()))?;
    query.config.validate().context("Invalid configuration")?;
    info!("{}", query.config);

    let mut resolver = GeographyResolver::new(query.config.target_system.clone());
    for mapping in query.mappings {
        let batches = read_parquet(&mapping.path)
            .with_context(|| format!("Failed to read mapping {}", mapping.path.display()))?;
        let table = MappingTable::from_record_batches(
            mapping.from,
            query.config.target_system.clone(),
            &batches,
        )?;
        resolver = resolver.with_table(table)?;
    }

    let mut loader = ParquetLoader::new(
        &query.data_dir,
        query.config.target_system.clone(),
        query.config.max_age,
    );
    for (name, system) in query.dataset_systems {
        loader = loader.with_code_system(&name, system);
    }
    let cache = DatasetCache::new(Box::new(loader), query.config.cache_capacity);

    let mut geographies = query.geographies;
    for name in &query.countries {
        let countries = Country::parse_list(name)
            .with_context(|| format!("Unknown country or grouping '{name}'"))?;
        geographies.extend(countries.into_iter().map(Country::geography));
    }
    if geographies.is_empty() {
        bail!("query names no geographies");
    }

    let rounding = query.config.rounding_mode;
    let variant = query.variant.unwrap_or(query.config.variant);
    let facade = QueryFacade::new(query.config, &cache, &resolver)?;
    let result = facade
        .query(variant, &geographies, &query.years, query.category)
        .context("Query failed")?;

    for row in result.to_table(rounding).rows {
        println!("{}", serde_json::to_string(&row)?);
    }
    for failure in &result.failures {
        warn!("{failure}");
    }
    info!(
        "{} estimates, {} failures",
        result.estimates.len(),
        result.failures.len()
    );
    Ok(())
}
