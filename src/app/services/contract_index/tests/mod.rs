//! Test utilities for the contract index

use crate::app::models::FacilityContract;
use chrono::{DateTime, TimeZone, Utc};

// Test modules
mod insert_tests;

/// Shorthand UTC timestamp constructor
pub fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

/// A contract for facility F1 with the given id and validity window
pub fn contract(
    id: &str,
    from: DateTime<Utc>,
    to: Option<DateTime<Utc>>,
) -> FacilityContract {
    contract_for("F1", id, from, to)
}

/// A contract for an arbitrary facility
pub fn contract_for(
    facility_id: &str,
    id: &str,
    from: DateTime<Utc>,
    to: Option<DateTime<Utc>>,
) -> FacilityContract {
    FacilityContract {
        contract_id: id.to_string(),
        facility_id: facility_id.to_string(),
        product_id: "P1".to_string(),
        valid_from: from,
        valid_to: to,
    }
}
