//! Test utilities for tariff resolution

use crate::app::models::{MeterReading, Unit};
use crate::app::services::contract_index::ContractIndex;
use crate::app::services::contract_index::tests::{contract, ts};
use chrono::{DateTime, Utc};

// Test modules
mod resolver_tests;

/// Facility F1 with contract A `[2024-01-01, 2024-06-01)` and
/// open-ended contract B `[2024-06-01, None)`
pub fn reference_index() -> ContractIndex {
    let mut index = ContractIndex::new();
    index
        .insert(contract("C-A", ts(2024, 1, 1), Some(ts(2024, 6, 1))))
        .unwrap();
    index
        .insert(contract("C-B", ts(2024, 6, 1), None))
        .unwrap();
    index
}

/// A kWh reading for the given facility and instant
pub fn reading(facility_id: &str, at: DateTime<Utc>) -> MeterReading {
    MeterReading {
        facility_id: facility_id.to_string(),
        ts: at,
        value: 42.0,
        unit: Unit::KilowattHour,
    }
}
