//! Tests for error types

use std::path::PathBuf;
use std::time::Duration;
use timevar::Error;

#[test]
fn test_not_found_error_names_path() {
    let error = Error::NotFound {
        path: PathBuf::from("/data/run1/img/error_data.var"),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("not found"));
    assert!(error_str.contains("/data/run1/img/error_data.var"));
}

#[test]
fn test_schema_mismatch_error_names_both_types() {
    let error = Error::SchemaMismatch {
        path: PathBuf::from("/data/run1/img/v.var"),
        stored: "Map1D<Scalar>=100".to_string(),
        requested: "Map1D<Scalar>=200".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("/data/run1/img/v.var"));
    assert!(error_str.contains("Map1D<Scalar>=100"));
    assert!(error_str.contains("Map1D<Scalar>=200"));
}

#[test]
fn test_out_of_range_error() {
    let error = Error::OutOfRange { index: 7, count: 3 };
    let error_str = format!("{error}");
    assert!(error_str.contains('7'));
    assert!(error_str.contains('3'));
    assert!(error_str.contains("out of range"));
}

#[test]
fn test_invalid_write_error_points_at_tail() {
    let error = Error::InvalidWrite { index: 2, next: 5 };
    let error_str = format!("{error}");
    assert!(error_str.contains("appends only"));
    assert!(error_str.contains('5'));
}

#[test]
fn test_capacity_exceeded_error() {
    let error = Error::CapacityExceeded {
        requested_bytes: 2048,
        max_bytes: 1024,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("2048"));
    assert!(error_str.contains("1024"));
}

#[test]
fn test_unsupported_query_error() {
    let error = Error::UnsupportedQuery {
        datatype: "Scalar".to_string(),
        query: "side",
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("side"));
    assert!(error_str.contains("Scalar"));
}

#[test]
fn test_timeout_error() {
    let error = Error::Timeout {
        waited: Duration::from_secs(30),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("timed out"));
    assert!(error_str.contains("30"));
}

#[test]
fn test_length_mismatch_error() {
    let error = Error::LengthMismatch {
        expected: 100,
        got: 99,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("100"));
    assert!(error_str.contains("99"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let error: Error = io_error.into();
    assert!(matches!(error, Error::Io(_)));
    assert!(format!("{error}").contains("denied"));
}

#[test]
fn test_corrupt_error_carries_reason() {
    let error = Error::Corrupt {
        path: PathBuf::from("/data/run1/img/v.var"),
        reason: "bad magic, not a variable file".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("corrupt"));
    assert!(error_str.contains("bad magic"));
}
