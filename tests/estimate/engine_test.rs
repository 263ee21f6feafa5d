//! Tests for interpolation and extrapolation of assembled series

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ukpopulation::series::CellKey;
use ukpopulation::{
    AgeBand, Category, CodeSystem, Engine, Error, GeographyCode, Provenance, Sex, TimeSeries,
};

fn series(counts: &[(i32, f64)]) -> TimeSeries {
    TimeSeries::from_counts(
        GeographyCode::new("E06000001", CodeSystem::new("LAD2021")),
        Category::total(),
        CellKey::new(AgeBand::single(0), Sex::Total),
        counts,
    )
    .unwrap()
}

/// Random series with strictly increasing years and non-negative counts
fn random_series(rng: &mut StdRng) -> Vec<(i32, f64)> {
    let len = rng.random_range(2..12);
    let mut year = rng.random_range(1990..2010);
    let mut counts = Vec::with_capacity(len);
    for _ in 0..len {
        counts.push((year, rng.random_range(0.0..1_000_000.0)));
        year += rng.random_range(1..6);
    }
    counts
}

#[test]
fn test_documented_example() {
    let engine = Engine::new(10);
    let s = series(&[(2011, 100.0), (2021, 200.0)]);

    let mid = engine.estimate(&s, 2016).unwrap();
    assert!((mid.count - 150.0).abs() < 1e-9);
    assert_eq!(mid.provenance, Provenance::Interpolated);

    let beyond = engine.estimate(&s, 2025).unwrap();
    assert!((beyond.count - 240.0).abs() < 1e-9);
    assert_eq!(beyond.provenance, Provenance::Extrapolated);
}

#[test]
fn test_fifty_years_past_end_is_out_of_range() {
    let s = series(&[(2011, 100.0), (2021, 200.0)]);
    let err = Engine::new(10).estimate(&s, 2071).unwrap_err();
    assert!(matches!(err, Error::OutOfRange { year: 2071, last: 2021, .. }));
}

#[test]
fn test_observed_years_return_stored_counts() {
    let mut rng = StdRng::seed_from_u64(7);
    let engine = Engine::new(10);
    for _ in 0..200 {
        let counts = random_series(&mut rng);
        let s = series(&counts);
        for &(year, count) in &counts {
            let estimate = engine.estimate(&s, year).unwrap();
            assert_eq!(estimate.count, count);
            assert_eq!(estimate.provenance, Provenance::Observed);
        }
    }
}

#[test]
fn test_interpolation_stays_within_brackets() {
    let mut rng = StdRng::seed_from_u64(11);
    let engine = Engine::new(10);
    for _ in 0..200 {
        let counts = random_series(&mut rng);
        let s = series(&counts);
        for pair in counts.windows(2) {
            let ((y0, c0), (y1, c1)) = (pair[0], pair[1]);
            for year in (y0 + 1)..y1 {
                let estimate = engine.estimate(&s, year).unwrap();
                let (lo, hi) = if c0 <= c1 { (c0, c1) } else { (c1, c0) };
                assert!(estimate.count >= lo - 1e-6 && estimate.count <= hi + 1e-6);
                assert_eq!(estimate.provenance, Provenance::Interpolated);
            }
        }
    }
}

#[test]
fn test_estimates_are_idempotent() {
    let mut rng = StdRng::seed_from_u64(23);
    let engine = Engine::new(10);
    let counts = random_series(&mut rng);
    let s = series(&counts);
    let first_year = counts[0].0 - 5;
    let last_year = counts[counts.len() - 1].0 + 5;
    for year in first_year..=last_year {
        let a = engine.estimate(&s, year).unwrap();
        let b = engine.estimate(&s, year).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn test_provenance_is_weakest_cell() {
    let geography = GeographyCode::new("E06000001", CodeSystem::new("LAD2021"));
    let young = CellKey::new(AgeBand::single(0), Sex::Total);
    let old = CellKey::new(AgeBand::open(90), Sex::Total);
    let observations = [
        (young, 2011, 10.0),
        (young, 2021, 20.0),
        (old, 2011, 1.0),
        (old, 2016, 2.0),
    ];
    let s = TimeSeries::from_observations(
        geography,
        Category::total(),
        observations.iter().map(|&(key, year, count)| {
            (
                key,
                ukpopulation::series::Observation {
                    year,
                    count,
                    source: 0,
                },
            )
        }),
    )
    .unwrap();

    let estimate = Engine::new(10).estimate(&s, 2018).unwrap();
    // young interpolated to 17, old extrapolated to 2.4
    assert!((estimate.count - 19.4).abs() < 1e-9);
    assert_eq!(estimate.provenance, Provenance::Extrapolated);
}

#[test]
fn test_cell_out_of_range_fails_whole_estimate() {
    let geography = GeographyCode::new("E06000001", CodeSystem::new("LAD2021"));
    let young = CellKey::new(AgeBand::single(0), Sex::Total);
    let old = CellKey::new(AgeBand::open(90), Sex::Total);
    let observations = [
        (young, 2011, 10.0),
        (young, 2041, 20.0),
        (old, 2011, 1.0),
        (old, 2016, 2.0),
    ];
    let s = TimeSeries::from_observations(
        geography,
        Category::total(),
        observations.iter().map(|&(key, year, count)| {
            (
                key,
                ukpopulation::series::Observation {
                    year,
                    count,
                    source: 0,
                },
            )
        }),
    )
    .unwrap();

    let err = Engine::new(10).estimate(&s, 2030).unwrap_err();
    assert!(matches!(err, Error::OutOfRange { first: 2011, last: 2016, .. }));
}

#[test]
fn test_extreme_years_within_a_wide_window() {
    let engine = Engine::new(u32::MAX);
    let s = series(&[(2011, 100.0), (2021, 200.0)]);

    let late = engine.estimate(&s, i32::MAX).unwrap();
    assert_eq!(late.provenance, Provenance::Extrapolated);
    assert!(late.count > 200.0);

    let early = engine.estimate(&s, i32::MIN).unwrap();
    assert_eq!(early.provenance, Provenance::Extrapolated);
    assert_eq!(early.count, 0.0);
}
