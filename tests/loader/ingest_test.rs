//! Tests for turning tabular input into validated datasets

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use ukpopulation::{AgeBand, CodeSystem, Dataset, DatasetLoader, Error, MemoryLoader, Sex};

use crate::utils::{ENGLAND, WALES, lad21, ons_batch, typed_batch};

#[test]
fn test_nomis_layout_is_ingested() {
    let batch = ons_batch(&[
        (ENGLAND, 2018, "0", 1, 100.0),
        (ENGLAND, 2018, "0", 2, 95.0),
        (WALES, 2018, "0", 1, 10.0),
    ]);
    let dataset = Dataset::from_batches("npp_ppp", CodeSystem::country(), &[batch], 90).unwrap();

    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.geographies(), vec![ENGLAND, WALES]);
    let england: Vec<_> = dataset.points_for(ENGLAND).collect();
    assert_eq!(england[0].sex, Sex::Male);
    assert_eq!(england[1].sex, Sex::Female);
    assert_eq!(england[0].age, AgeBand::single(0));
    assert_eq!(england[0].geography.system, CodeSystem::country());
}

#[test]
fn test_ages_above_limit_fold_into_open_band() {
    let batch = ons_batch(&[
        (ENGLAND, 2018, "89", 1, 5.0),
        (ENGLAND, 2018, "90", 1, 4.0),
        (ENGLAND, 2018, "95", 1, 2.0),
        (ENGLAND, 2018, "105 - 109", 1, 1.0),
        (ENGLAND, 2018, "110 and over", 1, 0.5),
    ]);
    let dataset = Dataset::from_batches("npp_ppp", CodeSystem::country(), &[batch], 90).unwrap();

    assert_eq!(dataset.len(), 2);
    let open = dataset
        .points()
        .iter()
        .find(|p| p.age == AgeBand::open(90))
        .unwrap();
    assert!((open.count - 7.5).abs() < 1e-9);
}

#[test]
fn test_integer_ages_and_letter_sex_codes() {
    let batch = typed_batch(&[
        ("C", 2021, 30, "M", 12.0),
        ("C", 2021, 30, "f", 13.0),
        ("C", 2021, 30, "persons", 25.0),
    ]);
    let dataset = Dataset::from_batches("census", lad21(), &[batch], 90).unwrap();
    let sexes: Vec<Sex> = dataset.points().iter().map(|p| p.sex).collect();
    assert_eq!(sexes, vec![Sex::Male, Sex::Female, Sex::Total]);
}

#[test]
fn test_duplicate_key_rejected() {
    let batch = ons_batch(&[(ENGLAND, 2018, "3", 1, 1.0), (ENGLAND, 2018, "3", 1, 2.0)]);
    let err = Dataset::from_batches("mye", CodeSystem::country(), &[batch], 90).unwrap_err();
    assert!(matches!(err, Error::DuplicatePoint { ref dataset, .. } if dataset == "mye"));
}

#[test]
fn test_duplicate_across_batches_rejected() {
    let first = ons_batch(&[(ENGLAND, 2018, "3", 1, 1.0)]);
    let second = ons_batch(&[(ENGLAND, 2018, "3", 1, 1.0)]);
    let result = Dataset::from_batches("mye", CodeSystem::country(), &[first, second], 90);
    assert!(matches!(result, Err(Error::DuplicatePoint { .. })));
}

#[test]
fn test_band_straddling_open_band_rejected() {
    let batch = ons_batch(&[
        (ENGLAND, 2018, "80 - 84", 1, 5.0),
        (ENGLAND, 2018, "85 - 94", 1, 4.0),
        (ENGLAND, 2018, "95+", 1, 1.0),
    ]);
    let err = Dataset::from_batches("mye", CodeSystem::country(), &[batch], 90).unwrap_err();
    assert!(matches!(err, Error::InvalidData { ref message, .. } if message.contains("85-94")));
}

#[test]
fn test_negative_count_rejected() {
    let batch = ons_batch(&[(ENGLAND, 2018, "3", 1, -1.0)]);
    let err = Dataset::from_batches("mye", CodeSystem::country(), &[batch], 90).unwrap_err();
    assert_eq!(err.kind(), "invalid_data");
}

#[test]
fn test_unknown_sex_code_rejected() {
    let batch = ons_batch(&[(ENGLAND, 2018, "3", 7, 1.0)]);
    let err = Dataset::from_batches("mye", CodeSystem::country(), &[batch], 90).unwrap_err();
    assert!(matches!(err, Error::InvalidData { ref message, .. } if message.contains("sex")));
}

#[test]
fn test_missing_column_reported() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("GEOGRAPHY_CODE", DataType::Utf8, false),
        Field::new("PROJECTED_YEAR_NAME", DataType::Int32, false),
        Field::new("C_AGE", DataType::Utf8, false),
        Field::new("GENDER", DataType::Utf8, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec![ENGLAND])),
        Arc::new(Int32Array::from(vec![2018])),
        Arc::new(StringArray::from(vec!["3"])),
        Arc::new(StringArray::from(vec!["1"])),
    ];
    let batch = RecordBatch::try_new(schema, columns).unwrap();

    let err = Dataset::from_batches("mye", CodeSystem::country(), &[batch], 90).unwrap_err();
    assert!(matches!(err, Error::ColumnNotFound { ref column } if column == "OBS_VALUE"));
}

#[test]
fn test_row_code_system_must_match_dataset() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("GEOGRAPHY_CODE", DataType::Utf8, false),
        Field::new("CODE_SYSTEM", DataType::Utf8, false),
        Field::new("PROJECTED_YEAR_NAME", DataType::Int32, false),
        Field::new("C_AGE", DataType::Utf8, false),
        Field::new("GENDER", DataType::Utf8, false),
        Field::new("OBS_VALUE", DataType::Float64, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec!["C", "A"])),
        Arc::new(StringArray::from(vec!["LAD2021", "LAD2011"])),
        Arc::new(Int32Array::from(vec![2018, 2018])),
        Arc::new(StringArray::from(vec!["3", "3"])),
        Arc::new(StringArray::from(vec!["1", "1"])),
        Arc::new(Float64Array::from(vec![1.0, 1.0])),
    ];
    let batch = RecordBatch::try_new(schema, columns).unwrap();

    let err = Dataset::from_batches("mixed", lad21(), &[batch], 90).unwrap_err();
    assert!(matches!(err, Error::InvalidData { .. }));
}

#[test]
fn test_year_range() {
    let batch = ons_batch(&[
        (ENGLAND, 2030, "0", 1, 1.0),
        (ENGLAND, 2018, "0", 1, 1.0),
        (ENGLAND, 2024, "0", 1, 1.0),
    ]);
    let dataset = Dataset::from_batches("npp_ppp", CodeSystem::country(), &[batch], 90).unwrap();
    assert_eq!(dataset.year_range(), Some((2018, 2030)));
}

#[test]
fn test_memory_loader_reports_missing_dataset() {
    let loader = MemoryLoader::new(90).with_batches(
        "npp_ppp",
        CodeSystem::country(),
        vec![ons_batch(&[(ENGLAND, 2018, "0", 1, 1.0)])],
    );
    assert_eq!(loader.available(), vec!["npp_ppp".to_string()]);
    assert!(loader.load("npp_ppp").is_ok());
    assert!(matches!(loader.load("npp_zzz"), Err(Error::DatasetNotFound(_))));
}
