//! Cell-wise estimation versus estimating a pre-summed series

use ukpopulation::series::{CellKey, Observation};
use ukpopulation::{
    AgeBand, Category, CodeSystem, Engine, GeographyCode, Provenance, Sex, TimeSeries,
};

fn geography() -> GeographyCode {
    GeographyCode::new("E06000001", CodeSystem::new("LAD2021"))
}

fn observation(year: i32, count: f64) -> Observation {
    Observation {
        year,
        count,
        source: 0,
    }
}

/// Young cell observed every ten years, old cell every five years
fn uneven_series() -> TimeSeries {
    let young = CellKey::new(AgeBand::single(0), Sex::Total);
    let old = CellKey::new(AgeBand::open(90), Sex::Total);
    TimeSeries::from_observations(
        geography(),
        Category::total(),
        vec![
            (young, observation(2011, 10.0)),
            (young, observation(2021, 20.0)),
            (old, observation(2011, 0.0)),
            (old, observation(2016, 50.0)),
            (old, observation(2021, 50.0)),
        ],
    )
    .unwrap()
}

#[test]
fn test_cells_interpolated_before_summing() {
    let estimate = Engine::new(10).estimate(&uneven_series(), 2013).unwrap();
    // young: 10 + 10 * 2/10 = 12, old: 0 + 50 * 2/5 = 20
    assert!((estimate.count - 32.0).abs() < 1e-9);
    assert_eq!(estimate.provenance, Provenance::Interpolated);
}

#[test]
fn test_presummed_series_gives_a_different_answer() {
    let engine = Engine::new(10);
    let cellwise = engine.estimate(&uneven_series(), 2013).unwrap();

    // The naive total series has 2016 = 50 because the young cell is unobserved there
    let summed = TimeSeries::from_counts(
        geography(),
        Category::total(),
        CellKey::new(AgeBand::single(0), Sex::Total),
        &[(2011, 10.0), (2016, 50.0), (2021, 70.0)],
    )
    .unwrap();
    let naive = engine.estimate(&summed, 2013).unwrap();

    assert!((naive.count - 26.0).abs() < 1e-9);
    assert!((cellwise.count - naive.count).abs() > 1.0);
}

#[test]
fn test_observed_year_of_one_cell_still_interpolates_another() {
    let estimate = Engine::new(10).estimate(&uneven_series(), 2016).unwrap();
    // young interpolated to 15, old observed at 50
    assert!((estimate.count - 65.0).abs() < 1e-9);
    assert_eq!(estimate.provenance, Provenance::Interpolated);
}
