//! End-to-end roundtrip tests against the public `Reader`/`Writer` API.

use std::io::Cursor;

use chrono::NaiveDate;
use xport5::{
    DatasetDescription, DatasetSpec, Error, Format, Justification, LibraryDescription,
    MissingValue, Strictness, VarType, Variable, VariableSpec, Value, Writer, default_year_pivot,
};

fn now() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 15)
        .unwrap()
        .and_hms_opt(14, 30, 45)
        .unwrap()
}

fn char_variable(name: &str, length: u16) -> Variable {
    Variable::new(
        VariableSpec {
            name: name.to_string(),
            number: 1,
            var_type: VarType::Character,
            length,
            label: String::new(),
            output_format: Format::unspecified(),
            justification: Justification::Left,
            input_format: Format::unspecified(),
        },
        Strictness::Basic,
    )
    .unwrap()
}

fn numeric_variable(name: &str) -> Variable {
    Variable::new(
        VariableSpec {
            name: name.to_string(),
            number: 1,
            var_type: VarType::Numeric,
            length: 8,
            label: String::new(),
            output_format: Format::unspecified(),
            justification: Justification::Left,
            input_format: Format::unspecified(),
        },
        Strictness::Basic,
    )
    .unwrap()
}

fn library(name: &str, variables: Vec<Variable>) -> LibraryDescription {
    let dataset = DatasetDescription::new(
        DatasetSpec {
            name: name.to_string(),
            label: String::new(),
            dataset_type: String::new(),
            source_os: "linux".to_string(),
            source_sas_version: "9.4".to_string(),
            variables,
            create_time: now(),
            modified_time: now(),
        },
        Strictness::FdaSubmission,
    )
    .unwrap();
    LibraryDescription::new(dataset, "linux", "9.4", now(), now()).unwrap()
}

/// Scenario 1: dataset `"TEMP"`, one CHARACTER(20) variable `"CITY"`, one
/// observation `"Atlanta"`. The written stream is a multiple of 80 bytes
/// and reads back with the same string, blank-padded to the declared
/// length.
#[test]
fn basic_roundtrip_city() {
    let description = library("TEMP", vec![char_variable("CITY", 20)]);
    let mut out = Vec::new();
    {
        let mut writer = Writer::new(&mut out, &description).unwrap();
        writer
            .append_observation(&[Some(Value::character("Atlanta"))])
            .unwrap();
        writer.close().unwrap();
    }

    assert_eq!(out.len() % 80, 0, "output must be a whole number of records");

    let mut reader = xport5::Reader::new(Cursor::new(out), default_year_pivot).unwrap();
    assert_eq!(reader.description().dataset().name(), "TEMP");
    let obs = reader.next_observation().unwrap().unwrap();
    assert_eq!(
        obs,
        vec![Value::character(format!("{:<20}", "Atlanta"))]
    );
    assert!(reader.next_observation().unwrap().is_none());
}

/// Scenario 2: a NUMERIC(8) variable written with a null value round-trips
/// as the standard missing value.
#[test]
fn null_numeric_roundtrips_as_standard_missing() {
    let description = library("NUMS", vec![numeric_variable("VALUE")]);
    let mut out = Vec::new();
    {
        let mut writer = Writer::new(&mut out, &description).unwrap();
        writer.append_observation(&[None]).unwrap();
        writer.close().unwrap();
    }

    let mut reader = xport5::Reader::new(Cursor::new(out), default_year_pivot).unwrap();
    let obs = reader.next_observation().unwrap().unwrap();
    assert_eq!(obs, vec![Value::Missing(MissingValue::Standard)]);
}

/// Several observations of mixed CHARACTER and NUMERIC variables,
/// including a special missing value, round-trip in order.
#[test]
fn multi_row_multi_type_roundtrip() {
    let description = library(
        "MIXED",
        vec![char_variable("SUBJID", 10), numeric_variable("AGE")],
    );
    let mut out = Vec::new();
    {
        let mut writer = Writer::new(&mut out, &description).unwrap();
        writer
            .append_observation(&[Some(Value::character("SUBJ001")), Some(Value::Number(25.0))])
            .unwrap();
        writer
            .append_observation(&[
                Some(Value::character("SUBJ002")),
                Some(Value::Missing(MissingValue::letter('A').unwrap())),
            ])
            .unwrap();
        writer.close().unwrap();
    }

    let mut reader = xport5::Reader::new(Cursor::new(out), default_year_pivot).unwrap();
    let first = reader.next_observation().unwrap().unwrap();
    assert_eq!(
        first,
        vec![
            Value::character(format!("{:<10}", "SUBJ001")),
            Value::Number(25.0)
        ]
    );
    let second = reader.next_observation().unwrap().unwrap();
    assert_eq!(
        second,
        vec![
            Value::character(format!("{:<10}", "SUBJ002")),
            Value::Missing(MissingValue::letter('A').unwrap())
        ]
    );
    assert!(reader.next_observation().unwrap().is_none());
}

/// Scenario 6: duplicate variable names, case-insensitively, are rejected
/// with the documented message at dataset construction.
#[test]
fn duplicate_variable_names_rejected() {
    let err = DatasetDescription::new(
        DatasetSpec {
            name: "TEMP".to_string(),
            label: String::new(),
            dataset_type: String::new(),
            source_os: String::new(),
            source_sas_version: String::new(),
            variables: vec![char_variable("REPEAT", 8), char_variable("repeat", 8)],
            create_time: now(),
            modified_time: now(),
        },
        Strictness::Basic,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid argument: multiple variables have the same name: REPEAT"
    );
    assert!(matches!(err, Error::InvalidArgument { .. }));
}

/// A dataset with no observations still produces a valid, record-aligned
/// file and a reader that immediately reports end-of-stream.
#[test]
fn empty_dataset_roundtrip() {
    let description = library("EMPTY", vec![char_variable("COL1", 10), numeric_variable("COL2")]);
    let mut out = Vec::new();
    {
        let mut writer = Writer::new(&mut out, &description).unwrap();
        writer.close().unwrap();
    }
    assert_eq!(out.len() % 80, 0);

    let mut reader = xport5::Reader::new(Cursor::new(out), default_year_pivot).unwrap();
    assert_eq!(reader.description().dataset().variables().len(), 2);
    assert!(reader.next_observation().unwrap().is_none());
}
