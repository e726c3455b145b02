//! Per-row record builders for snapshot tables
//!
//! Each builder extracts the fields of one row, constructs the entity and
//! runs its domain validation. Builders are pure checks: a failing row
//! produces an error for the fault report and never stops its siblings.

use super::field_parsers::{
    column, datetime_at, optional_column, optional_temporal_column, required_datetime_at,
    required_f64_at, required_string_at, string_at, temporal_column,
};
use crate::app::models::{Facility, FacilityContract, FacilityType, MeterReading, Product, Unit};
use crate::config::ValidationConfig;
use crate::{Error, Result};
use polars::prelude::*;

/// Bound columns of a product snapshot table
pub(crate) struct ProductColumns {
    product_id: Series,
    name: Series,
    unit: Series,
    description: Option<Series>,
}

impl ProductColumns {
    pub(crate) fn bind(df: &DataFrame) -> Result<Self> {
        Ok(Self {
            product_id: column(df, "product_id")?,
            name: column(df, "name")?,
            unit: column(df, "unit")?,
            description: optional_column(df, "description"),
        })
    }
}

/// Parse one product row
pub(crate) fn parse_product_row(cols: &ProductColumns, idx: usize) -> Result<Product> {
    let product_id = required_string_at(&cols.product_id, idx, "product_id")?;
    let name = required_string_at(&cols.name, idx, "name")?;
    let unit: Unit = required_string_at(&cols.unit, idx, "unit")?.parse()?;
    let description = match &cols.description {
        Some(series) => string_at(series, idx)?,
        None => None,
    };

    Product::new(product_id, name, unit, description)
}

/// Bound columns of a facility snapshot table
pub(crate) struct FacilityColumns {
    facility_id: Series,
    name: Series,
    facility_type: Series,
    address: Option<Series>,
    description: Option<Series>,
}

impl FacilityColumns {
    pub(crate) fn bind(df: &DataFrame) -> Result<Self> {
        Ok(Self {
            facility_id: column(df, "facility_id")?,
            name: column(df, "name")?,
            facility_type: column(df, "facility_type")?,
            address: optional_column(df, "address"),
            description: optional_column(df, "description"),
        })
    }
}

/// Parse one facility row
pub(crate) fn parse_facility_row(cols: &FacilityColumns, idx: usize) -> Result<Facility> {
    let facility_id = required_string_at(&cols.facility_id, idx, "facility_id")?;
    let name = required_string_at(&cols.name, idx, "name")?;
    let facility_type: FacilityType =
        required_string_at(&cols.facility_type, idx, "facility_type")?.parse()?;
    let address = match &cols.address {
        Some(series) => string_at(series, idx)?,
        None => None,
    };
    let description = match &cols.description {
        Some(series) => string_at(series, idx)?,
        None => None,
    };

    Facility::new(facility_id, name, facility_type, address, description)
}

/// Bound columns of a facility contract snapshot table
pub(crate) struct ContractColumns {
    contract_id: Series,
    facility_id: Series,
    product_id: Series,
    valid_from: Series,
    valid_to: Option<Series>,
}

impl ContractColumns {
    pub(crate) fn bind(df: &DataFrame) -> Result<Self> {
        Ok(Self {
            contract_id: column(df, "contract_id")?,
            facility_id: column(df, "facility_id")?,
            product_id: column(df, "product_id")?,
            valid_from: temporal_column(df, "valid_from")?,
            valid_to: optional_temporal_column(df, "valid_to")?,
        })
    }
}

/// Parse one facility contract row.
///
/// An absent or empty `valid_to` produces an open-ended contract.
pub(crate) fn parse_contract_row(cols: &ContractColumns, idx: usize) -> Result<FacilityContract> {
    let contract_id = required_string_at(&cols.contract_id, idx, "contract_id")?;
    let facility_id = required_string_at(&cols.facility_id, idx, "facility_id")?;
    let product_id = required_string_at(&cols.product_id, idx, "product_id")?;
    let valid_from = required_datetime_at(&cols.valid_from, idx, "valid_from")?;
    let valid_to = match &cols.valid_to {
        Some(series) => datetime_at(series, idx, "valid_to")?,
        None => None,
    };

    FacilityContract::new(contract_id, facility_id, product_id, valid_from, valid_to)
}

/// Bound columns of a meter reading snapshot table
pub(crate) struct ReadingColumns {
    facility_id: Series,
    ts: Series,
    value: Series,
    unit: Series,
}

impl ReadingColumns {
    pub(crate) fn bind(df: &DataFrame) -> Result<Self> {
        Ok(Self {
            facility_id: column(df, "facility_id")?,
            ts: temporal_column(df, "ts")?,
            value: column(df, "value")?,
            unit: column(df, "unit")?,
        })
    }
}

/// Parse one meter reading row, applying the configured plausible value
/// range of the reading's unit
pub(crate) fn parse_reading_row(
    cols: &ReadingColumns,
    idx: usize,
    validation: &ValidationConfig,
) -> Result<MeterReading> {
    let facility_id = required_string_at(&cols.facility_id, idx, "facility_id")?;
    let ts = required_datetime_at(&cols.ts, idx, "ts")?;
    let value = required_f64_at(&cols.value, idx, "value")?;
    let unit: Unit = required_string_at(&cols.unit, idx, "unit")?.parse()?;

    let reading = MeterReading::new(facility_id, ts, value, unit)?;

    if !validation.value_is_acceptable(unit.symbol(), value) {
        let (min, max) = validation.range_for(unit.symbol());
        return Err(Error::data_validation(format!(
            "Value {} outside the plausible range [{}, {}] for unit {}",
            value, min, max, unit
        )));
    }

    Ok(reading)
}
