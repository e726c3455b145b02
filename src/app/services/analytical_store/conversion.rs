//! Entity to columnar conversion for the analytical store
//!
//! Maps typed entity vectors to polars DataFrames and back. Timestamps are
//! persisted as millisecond datetime columns; `valid_to` stays nullable so
//! open-ended contracts survive the round trip.

use crate::app::models::{Facility, FacilityContract, MeterReading, Product};
use crate::app::services::snapshot_importer::field_parsers::string_at;
use crate::app::services::snapshot_importer::record_parser::{
    ContractColumns, FacilityColumns, ProductColumns, ReadingColumns, parse_contract_row,
    parse_facility_row, parse_product_row, parse_reading_row,
};
use crate::config::ValidationConfig;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use std::collections::HashSet;

// =============================================================================
// Entities to DataFrames
// =============================================================================

/// Convert products to their table representation
pub(crate) fn products_to_dataframe(products: &[Product]) -> Result<DataFrame> {
    let df = df!(
        "product_id" => products.iter().map(|p| p.product_id.as_str()).collect::<Vec<_>>(),
        "name" => products.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        "unit" => products.iter().map(|p| p.unit.symbol()).collect::<Vec<_>>(),
        "description" => products.iter().map(|p| p.description.clone()).collect::<Vec<_>>(),
    )?;
    Ok(df)
}

/// Convert facilities to their table representation
pub(crate) fn facilities_to_dataframe(facilities: &[Facility]) -> Result<DataFrame> {
    let df = df!(
        "facility_id" => facilities.iter().map(|f| f.facility_id.as_str()).collect::<Vec<_>>(),
        "name" => facilities.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
        "facility_type" => facilities.iter().map(|f| f.facility_type.code()).collect::<Vec<_>>(),
        "address" => facilities.iter().map(|f| f.address.clone()).collect::<Vec<_>>(),
        "description" => facilities.iter().map(|f| f.description.clone()).collect::<Vec<_>>(),
    )?;
    Ok(df)
}

/// Convert facility contracts to their table representation
pub(crate) fn contracts_to_dataframe(contracts: &[FacilityContract]) -> Result<DataFrame> {
    let mut df = df!(
        "contract_id" => contracts.iter().map(|c| c.contract_id.as_str()).collect::<Vec<_>>(),
        "facility_id" => contracts.iter().map(|c| c.facility_id.as_str()).collect::<Vec<_>>(),
        "product_id" => contracts.iter().map(|c| c.product_id.as_str()).collect::<Vec<_>>(),
    )?;

    let valid_from: Vec<DateTime<Utc>> = contracts.iter().map(|c| c.valid_from).collect();
    let valid_to: Vec<Option<DateTime<Utc>>> = contracts.iter().map(|c| c.valid_to).collect();
    df.with_column(datetime_series("valid_from", &valid_from)?)?;
    df.with_column(optional_datetime_series("valid_to", &valid_to)?)?;

    Ok(df)
}

/// Convert meter readings to their table representation
pub(crate) fn readings_to_dataframe(readings: &[MeterReading]) -> Result<DataFrame> {
    let mut df = df!(
        "facility_id" => readings.iter().map(|r| r.facility_id.as_str()).collect::<Vec<_>>(),
        "value" => readings.iter().map(|r| r.value).collect::<Vec<_>>(),
        "unit" => readings.iter().map(|r| r.unit.symbol()).collect::<Vec<_>>(),
    )?;

    let stamps: Vec<DateTime<Utc>> = readings.iter().map(|r| r.ts).collect();
    df.with_column(datetime_series("ts", &stamps)?)?;

    Ok(df)
}

fn datetime_series(name: &str, stamps: &[DateTime<Utc>]) -> Result<Series> {
    let millis: Vec<i64> = stamps.iter().map(|t| t.timestamp_millis()).collect();
    Series::new(name.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .map_err(|e| Error::columnar(format!("Failed to build datetime column '{}'", name), e))
}

fn optional_datetime_series(name: &str, stamps: &[Option<DateTime<Utc>>]) -> Result<Series> {
    let millis: Vec<Option<i64>> = stamps
        .iter()
        .map(|t| t.map(|t| t.timestamp_millis()))
        .collect();
    Series::new(name.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .map_err(|e| Error::columnar(format!("Failed to build datetime column '{}'", name), e))
}

// =============================================================================
// DataFrames to entities
// =============================================================================

/// Load products from their table representation
pub(crate) fn products_from_dataframe(df: &DataFrame) -> Result<Vec<Product>> {
    let cols = ProductColumns::bind(df)?;
    (0..df.height()).map(|idx| parse_product_row(&cols, idx)).collect()
}

/// Load facilities from their table representation
pub(crate) fn facilities_from_dataframe(df: &DataFrame) -> Result<Vec<Facility>> {
    let cols = FacilityColumns::bind(df)?;
    (0..df.height()).map(|idx| parse_facility_row(&cols, idx)).collect()
}

/// Load facility contracts from their table representation
pub(crate) fn contracts_from_dataframe(df: &DataFrame) -> Result<Vec<FacilityContract>> {
    let cols = ContractColumns::bind(df)?;
    (0..df.height()).map(|idx| parse_contract_row(&cols, idx)).collect()
}

/// Load meter readings from their table representation.
///
/// Committed readings already passed import validation; plausible-range
/// enforcement is not re-applied here, so a later tightening of the
/// configured ranges cannot make previously committed data unreadable.
pub(crate) fn readings_from_dataframe(df: &DataFrame) -> Result<Vec<MeterReading>> {
    let relaxed = ValidationConfig {
        enforce_plausible_ranges: false,
        ..Default::default()
    };
    let cols = ReadingColumns::bind(df)?;
    (0..df.height())
        .map(|idx| parse_reading_row(&cols, idx, &relaxed))
        .collect()
}

/// Collect the identifier column of a table into a set
pub(crate) fn ids_from_dataframe(df: &DataFrame, column: &str) -> Result<HashSet<String>> {
    let series = df
        .column(column)
        .map_err(|_| Error::data_validation(format!("Required column '{}' not found", column)))?
        .as_materialized_series()
        .clone();

    let mut ids = HashSet::with_capacity(df.height());
    for idx in 0..df.height() {
        if let Some(id) = string_at(&series, idx)? {
            ids.insert(id);
        }
    }
    Ok(ids)
}
