//! Test utilities for snapshot importer testing
//!
//! Provides helpers to build in-memory CSV and parquet snapshot sources so
//! the importer can be exercised without touching the filesystem.

use crate::app::services::snapshot_importer::SnapshotSource;
use chrono::{DateTime, TimeZone, Utc};
use polars::prelude::*;
use std::io::Cursor;


/// Build a CSV snapshot source from literal file content
pub fn csv_source(name: &str, content: &str) -> SnapshotSource {
    SnapshotSource::csv(name, Cursor::new(content.as_bytes().to_vec()))
}

/// Build a parquet snapshot source by serializing a DataFrame in memory
pub fn parquet_source(name: &str, df: &mut DataFrame) -> SnapshotSource {
    let mut buffer = Vec::new();
    ParquetWriter::new(&mut buffer)
        .finish(df)
        .expect("writing test parquet should succeed");
    SnapshotSource::parquet(name, Cursor::new(buffer))
}

/// Shorthand UTC timestamp constructor
pub fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

/// A millisecond datetime series for building parquet fixtures
pub fn datetime_series(name: &str, stamps: &[DateTime<Utc>]) -> Series {
    let millis: Vec<i64> = stamps.iter().map(|t| t.timestamp_millis()).collect();
    Series::new(name.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .unwrap()
}

/// A well-formed contract snapshot in CSV form: two disjoint contracts for
/// facility F1, the second open-ended
pub fn contract_csv() -> &'static str {
    "contract_id,facility_id,product_id,valid_from,valid_to\n\
     C-A,F1,P1,2024-01-01 00:00:00,2024-06-01 00:00:00\n\
     C-B,F1,P1,2024-06-01 00:00:00,\n"
}

/// A well-formed meter reading snapshot in CSV form
pub fn reading_csv() -> &'static str {
    "facility_id,ts,value,unit\n\
     F1,2024-03-15 00:00:00,125.5,kWh\n\
     F1,2024-06-01 00:00:00,98.0,kWh\n"
}
