//! Test utilities for the analytical store

use crate::app::models::{
    Facility, FacilityContract, FacilityType, MeterReading, Product, Unit,
};
use chrono::{DateTime, TimeZone, Utc};

// Test modules
mod conversion_tests;

/// Shorthand UTC timestamp constructor
pub fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub fn product(id: &str) -> Product {
    Product {
        product_id: id.to_string(),
        name: format!("Product {id}"),
        unit: Unit::KilowattHour,
        description: None,
    }
}

pub fn facility(id: &str) -> Facility {
    Facility {
        facility_id: id.to_string(),
        name: format!("Facility {id}"),
        facility_type: FacilityType::Consumption,
        address: Some("1 Mill Street".to_string()),
        description: None,
    }
}

pub fn contract(
    id: &str,
    facility_id: &str,
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

pub fn reading(facility_id: &str, at: DateTime<Utc>, value: f64) -> MeterReading {
    MeterReading {
        facility_id: facility_id.to_string(),
        ts: at,
        value,
        unit: Unit::KilowattHour,
    }
}
