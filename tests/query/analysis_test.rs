//! Tests for detail, aggregate and ratio queries

use ukpopulation::query::Dimension;
use ukpopulation::{
    AgeBand, AgeRange, Category, CodeSystem, DatasetCache, EstimationConfig, GeographyCode,
    MemoryLoader, QueryFacade, Sex, Variant,
};

use crate::utils::{ENGLAND, WALES, country, country_cache, country_resolver, lad21, point};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn test_year_range_of_projection() {
    let cache = country_cache();
    let resolver = country_resolver();
    let facade = QueryFacade::new(EstimationConfig::default(), &cache, &resolver).unwrap();
    assert_eq!(facade.year_range(Variant::Principal).unwrap(), (2016, 2026));
    assert_eq!(facade.year_range(Variant::HighPopulation).unwrap(), (2016, 2026));
    assert!(facade.year_range(Variant::LowPopulation).is_err());
}

#[test]
fn test_detail_returns_stored_rows() {
    let cache = country_cache();
    let resolver = country_resolver();
    let facade = QueryFacade::new(EstimationConfig::default(), &cache, &resolver).unwrap();

    let rows = facade
        .detail(Variant::Principal, &[country(ENGLAND)], Some(&[2021][..]), Category::total())
        .unwrap();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.year == 2021 && close(r.count, 1100.0)));

    let females = Category::new(AgeRange::single(1), Sex::Female);
    let rows = facade
        .detail(Variant::Principal, &[country(WALES)], None, females)
        .unwrap();
    let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
    assert_eq!(years, vec![2016, 2021, 2026]);
    assert!(rows.iter().all(|r| r.sex == Sex::Female && r.age == AgeBand::single(1)));
}

#[test]
fn test_detail_ignores_codes_in_other_systems() {
    let cache = country_cache();
    let resolver = country_resolver();
    let facade = QueryFacade::new(EstimationConfig::default(), &cache, &resolver).unwrap();
    let rows = facade
        .detail(
            Variant::Principal,
            &[GeographyCode::new(ENGLAND, lad21())],
            None,
            Category::total(),
        )
        .unwrap();
    assert!(rows.is_empty());
}

#[test]
fn test_aggregate_by_sex() {
    let cache = country_cache();
    let resolver = country_resolver();
    let facade = QueryFacade::new(EstimationConfig::default(), &cache, &resolver).unwrap();

    let rows = facade
        .aggregate(
            &[Dimension::Sex],
            Variant::Principal,
            &[country(ENGLAND), country(WALES)],
            Some(&[2016][..]),
            Category::total(),
        )
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].sex, Some(Sex::Male));
    assert_eq!(rows[1].sex, Some(Sex::Female));
    assert!(rows.iter().all(|r| r.geography.is_none() && r.age.is_none()));
    assert!(close(rows[0].count, 2200.0));
    assert!(close(rows[1].count, 2200.0));
}

#[test]
fn test_aggregate_without_dimensions_totals_each_year() {
    let cache = country_cache();
    let resolver = country_resolver();
    let facade = QueryFacade::new(EstimationConfig::default(), &cache, &resolver).unwrap();

    let rows = facade
        .aggregate(
            &[],
            Variant::Principal,
            &[country(ENGLAND), country(WALES)],
            None,
            Category::total(),
        )
        .unwrap();
    let totals: Vec<(i32, f64)> = rows.iter().map(|r| (r.year, r.count)).collect();
    assert_eq!(totals.len(), 3);
    assert_eq!(totals[0].0, 2016);
    assert!(close(totals[0].1, 4400.0));
    assert!(close(totals[1].1, 4840.0));
    assert!(close(totals[2].1, 5324.0));
}

#[test]
fn test_aggregate_by_geography_and_age() {
    let cache = country_cache();
    let resolver = country_resolver();
    let facade = QueryFacade::new(EstimationConfig::default(), &cache, &resolver).unwrap();

    let rows = facade
        .aggregate(
            &[Dimension::Geography, Dimension::Age],
            Variant::Principal,
            &[country(ENGLAND), country(WALES)],
            Some(&[2016][..]),
            Category::total(),
        )
        .unwrap();
    assert_eq!(rows.len(), 4);
    let england_age_zero = rows
        .iter()
        .find(|r| r.geography.as_deref() == Some(ENGLAND) && r.age == Some(AgeBand::single(0)))
        .unwrap();
    assert!(close(england_age_zero.count, 2000.0));
    assert!(rows.iter().all(|r| r.sex.is_none()));
}

#[test]
fn test_year_ratio() {
    let cache = country_cache();
    let resolver = country_resolver();
    let facade = QueryFacade::new(EstimationConfig::default(), &cache, &resolver).unwrap();

    let ratios = facade
        .year_ratio(
            Variant::Principal,
            &[country(ENGLAND), country(WALES)],
            2016,
            2021,
            Category::total(),
        )
        .unwrap();
    assert!(ratios.failures.is_empty());
    let england = ratios.get(ENGLAND, 2021).unwrap();
    assert!(close(england.denominator, 400.0));
    assert!(close(england.numerator, 4400.0));
    assert!(close(england.ratio, 11.0));
    assert!(close(ratios.get(WALES, 2021).unwrap().ratio, 11.0));
}

#[test]
fn test_variant_ratio_against_principal() {
    let cache = country_cache();
    let resolver = country_resolver();
    let facade = QueryFacade::new(EstimationConfig::default(), &cache, &resolver).unwrap();

    let ratios = facade
        .variant_ratio(
            Variant::HighPopulation,
            &[country(ENGLAND)],
            &[2016, 2026],
            Category::total(),
        )
        .unwrap();
    // Both variants share the mid-year estimate in 2016
    assert!(close(ratios.get(ENGLAND, 2016).unwrap().ratio, 1.0));
    assert!(close(ratios.get(ENGLAND, 2026).unwrap().ratio, 1440.0 / 1210.0));
}

#[test]
fn test_zero_reference_is_a_failure() {
    let system = CodeSystem::country();
    let loader = MemoryLoader::new(90)
        .with_points(
            "mye",
            system.clone(),
            vec![
                point("Z", system.clone(), 2011, 0, Sex::Male, 0.0),
                point("Z", system.clone(), 2016, 0, Sex::Male, 10.0),
            ],
        )
        .with_points(
            "npp_ppp",
            system.clone(),
            vec![point("Z", system.clone(), 2021, 0, Sex::Male, 20.0)],
        );
    let cache = DatasetCache::new(Box::new(loader), 4);
    let resolver = country_resolver();
    let facade = QueryFacade::new(EstimationConfig::default(), &cache, &resolver).unwrap();

    let ratios = facade
        .year_ratio(Variant::Principal, &[country("Z")], 2011, 2016, Category::total())
        .unwrap();
    assert!(ratios.ratios.is_empty());
    assert_eq!(ratios.failures.len(), 1);
    assert_eq!(ratios.failures[0].kind(), "invalid_data");
    assert_eq!(ratios.failures[0].year, Some(2016));
}

#[test]
fn test_persons_and_split_rows_counted_once() {
    let system = CodeSystem::country();
    let row = |age: u16, sex: Sex, count: f64| point("Z", system.clone(), 2016, age, sex, count);
    let loader = MemoryLoader::new(90).with_points(
        "npp_ppp",
        system.clone(),
        vec![
            // both breakdowns present
            row(0, Sex::Male, 40.0),
            row(0, Sex::Female, 60.0),
            row(0, Sex::Total, 100.0),
            // persons only
            row(1, Sex::Total, 50.0),
            // one sex only
            row(2, Sex::Male, 10.0),
        ],
    );
    let cache = DatasetCache::new(Box::new(loader), 4);
    let resolver = country_resolver();
    let facade = QueryFacade::new(EstimationConfig::default(), &cache, &resolver).unwrap();

    let rows = facade
        .detail(Variant::Principal, &[country("Z")], None, Category::total())
        .unwrap();
    let cells: Vec<(u16, Sex)> = rows.iter().map(|r| (r.age.lower, r.sex)).collect();
    assert_eq!(
        cells,
        vec![(0, Sex::Male), (0, Sex::Female), (1, Sex::Total), (2, Sex::Male)]
    );

    let totals = facade
        .aggregate(&[], Variant::Principal, &[country("Z")], None, Category::total())
        .unwrap();
    assert_eq!(totals.len(), 1);
    assert!(close(totals[0].count, 160.0));

    let females = facade
        .aggregate(
            &[],
            Variant::Principal,
            &[country("Z")],
            None,
            Category::new(AgeRange::single(0), Sex::Female),
        )
        .unwrap();
    assert!(close(females[0].count, 60.0));
}
