//! Application constants for the tariff analyzer
//!
//! This module contains the unit symbols, plausible value ranges, timestamp
//! formats and default values used throughout the import and resolution
//! pipeline.

use chrono::{DateTime, Utc};

// =============================================================================
// Snapshot Column Names
// =============================================================================

/// Required columns of a product snapshot file
pub const PRODUCT_REQUIRED_COLUMNS: &[&str] = &["product_id", "name", "unit"];

/// Required columns of a facility snapshot file
pub const FACILITY_REQUIRED_COLUMNS: &[&str] = &["facility_id", "name", "facility_type"];

/// Required columns of a facility contract snapshot file
pub const CONTRACT_REQUIRED_COLUMNS: &[&str] =
    &["contract_id", "facility_id", "product_id", "valid_from"];

/// Required columns of a meter reading snapshot file
pub const READING_REQUIRED_COLUMNS: &[&str] = &["facility_id", "ts", "value", "unit"];

// =============================================================================
// Measurement Units
// =============================================================================

/// Unit symbols as they appear in snapshot files
pub mod units {
    /// Active energy [kWh]
    pub const KILOWATT_HOUR: &str = "kWh";

    /// Active power [kW]
    pub const KILOWATT: &str = "kW";

    /// Reactive energy [kVArh]
    pub const KILOVOLT_AMPERE_REACTIVE_HOUR: &str = "kVArh";

    /// Reactive power [kVAr]
    pub const KILOVOLT_AMPERE_REACTIVE: &str = "kVAr";

    /// All supported unit symbols
    pub const ALL: &[&str] = &[
        KILOWATT_HOUR,
        KILOWATT,
        KILOVOLT_AMPERE_REACTIVE_HOUR,
        KILOVOLT_AMPERE_REACTIVE,
    ];
}

/// Plausible value ranges per unit symbol, `(min, max)` inclusive.
///
/// A single reading outside these bounds is far beyond anything a grid-scale
/// facility produces or consumes in one measurement interval and is rejected
/// as implausible rather than stored.
pub fn plausible_range(unit_symbol: &str) -> (f64, f64) {
    match unit_symbol {
        units::KILOWATT_HOUR => (0.0, 10_000_000.0),
        units::KILOWATT => (0.0, 1_000_000.0),
        units::KILOVOLT_AMPERE_REACTIVE_HOUR => (0.0, 10_000_000.0),
        units::KILOVOLT_AMPERE_REACTIVE => (0.0, 1_000_000.0),
        _ => (0.0, f64::MAX),
    }
}

/// Check whether a measured value is plausible for the given unit symbol
pub fn is_plausible(unit_symbol: &str, value: f64) -> bool {
    if !value.is_finite() {
        return false;
    }
    let (min, max) = plausible_range(unit_symbol);
    value >= min && value <= max
}

// =============================================================================
// Timestamps
// =============================================================================

/// Timestamp format used in CSV snapshot files
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date-only format accepted for contract validity columns
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Upper bound used when comparing open-ended contract intervals.
///
/// A contract without a `valid_to` extends to this sentinel; the sentinel
/// never appears in persisted data.
pub fn open_ended_until() -> DateTime<Utc> {
    DateTime::<Utc>::MAX_UTC
}

// =============================================================================
// Defaults
// =============================================================================

/// Number of meter readings resolved per spawned task
pub const DEFAULT_RESOLUTION_CHUNK_SIZE: usize = 4096;

/// Rows per parquet row group written by the analytical store
pub const DEFAULT_ROW_GROUP_SIZE: usize = 250_000;

/// Maximum rows sampled when inferring a CSV snapshot schema
pub const CSV_SCHEMA_INFERENCE_ROWS: usize = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plausible_ranges() {
        assert!(is_plausible(units::KILOWATT_HOUR, 0.0));
        assert!(is_plausible(units::KILOWATT_HOUR, 125_000.0));
        assert!(!is_plausible(units::KILOWATT_HOUR, -1.0));
        assert!(!is_plausible(units::KILOWATT, 5_000_000.0));
    }

    #[test]
    fn test_non_finite_values_are_implausible() {
        assert!(!is_plausible(units::KILOWATT_HOUR, f64::NAN));
        assert!(!is_plausible(units::KILOWATT_HOUR, f64::INFINITY));
        assert!(!is_plausible(units::KILOWATT, f64::NEG_INFINITY));
    }

    #[test]
    fn test_open_ended_sentinel_is_after_any_reading() {
        let ts = DateTime::parse_from_rfc3339("2099-12-31T23:59:59Z")
            .unwrap()
            .with_timezone(&Utc);
        assert!(open_ended_until() > ts);
    }

    #[test]
    fn test_all_units_listed() {
        assert_eq!(units::ALL.len(), 4);
        assert!(units::ALL.contains(&units::KILOWATT_HOUR));
    }
}
