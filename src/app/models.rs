//! Data models for tariff analysis
//!
//! This module contains the core data structures describing electricity
//! products, facilities, facility contracts and meter readings, together
//! with the structural and domain validation rules applied on import.

use crate::constants::{self, units};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// =============================================================================
// Entity Kinds
// =============================================================================

/// The entity kinds carried by a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Product,
    Facility,
    FacilityContract,
    MeterReading,
}

impl EntityKind {
    /// Table and snapshot file stem of this entity kind
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Product => "product",
            EntityKind::Facility => "facility",
            EntityKind::FacilityContract => "facility_contract",
            EntityKind::MeterReading => "meter_reading",
        }
    }

    /// All entity kinds in import order
    pub fn all() -> [EntityKind; 4] {
        [
            EntityKind::Product,
            EntityKind::Facility,
            EntityKind::FacilityContract,
            EntityKind::MeterReading,
        ]
    }

    /// Snapshot columns that must be present for this entity kind
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            EntityKind::Product => constants::PRODUCT_REQUIRED_COLUMNS,
            EntityKind::Facility => constants::FACILITY_REQUIRED_COLUMNS,
            EntityKind::FacilityContract => constants::CONTRACT_REQUIRED_COLUMNS,
            EntityKind::MeterReading => constants::READING_REQUIRED_COLUMNS,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Measurement Units
// =============================================================================

/// Measurement unit of a product or meter reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// Active energy [kWh]
    KilowattHour,
    /// Active power [kW]
    Kilowatt,
    /// Reactive energy [kVArh]
    KilovoltAmpereReactiveHour,
    /// Reactive power [kVAr]
    KilovoltAmpereReactive,
}

impl Unit {
    /// The symbol of this unit as it appears in snapshot files
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::KilowattHour => units::KILOWATT_HOUR,
            Unit::Kilowatt => units::KILOWATT,
            Unit::KilovoltAmpereReactiveHour => units::KILOVOLT_AMPERE_REACTIVE_HOUR,
            Unit::KilovoltAmpereReactive => units::KILOVOLT_AMPERE_REACTIVE,
        }
    }

    /// The plausible value range of this unit, `(min, max)` inclusive
    pub fn plausible_range(self) -> (f64, f64) {
        constants::plausible_range(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            sym if sym.eq_ignore_ascii_case(units::KILOWATT_HOUR) => Ok(Unit::KilowattHour),
            sym if sym.eq_ignore_ascii_case(units::KILOWATT) => Ok(Unit::Kilowatt),
            sym if sym.eq_ignore_ascii_case(units::KILOVOLT_AMPERE_REACTIVE_HOUR) => {
                Ok(Unit::KilovoltAmpereReactiveHour)
            }
            sym if sym.eq_ignore_ascii_case(units::KILOVOLT_AMPERE_REACTIVE) => {
                Ok(Unit::KilovoltAmpereReactive)
            }
            other => Err(Error::data_validation(format!(
                "Unknown unit '{}': expected one of {:?}",
                other,
                units::ALL
            ))),
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// =============================================================================
// Facility Types
// =============================================================================

/// The type of an electricity facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacilityType {
    /// A facility consuming energy from the grid
    Consumption,
    /// A facility producing energy into the grid
    Production,
}

impl FacilityType {
    /// The code of this facility type as it appears in snapshot files
    pub fn code(self) -> &'static str {
        match self {
            FacilityType::Consumption => "consumption",
            FacilityType::Production => "production",
        }
    }
}

impl FromStr for FacilityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "consumption" => Ok(FacilityType::Consumption),
            "production" => Ok(FacilityType::Production),
            other => Err(Error::data_validation(format!(
                "Unknown facility type '{}': expected 'consumption' or 'production'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for FacilityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

// =============================================================================
// Product
// =============================================================================

/// A tariff product definition.
///
/// Products are immutable once imported; re-importing a product with the
/// same identifier supersedes the stored row, nothing is mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Natural identifier of the product, unique across snapshots
    pub product_id: String,

    /// Human-readable product name
    pub name: String,

    /// Unit of measure the product is priced against
    pub unit: Unit,

    /// Optional free-text description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Product {
    /// Create a new product with validation
    pub fn new(
        product_id: String,
        name: String,
        unit: Unit,
        description: Option<String>,
    ) -> Result<Self> {
        let product = Self {
            product_id,
            name,
            unit,
            description,
        };
        product.validate()?;
        Ok(product)
    }

    /// Validate product data
    pub fn validate(&self) -> Result<()> {
        if self.product_id.trim().is_empty() {
            return Err(Error::data_validation(
                "Product identifier cannot be empty".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(Error::data_validation(format!(
                "Product '{}' has an empty name",
                self.product_id
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Facility
// =============================================================================

/// A physical site where electricity is consumed or produced.
///
/// Facilities are created by import and never deleted within a snapshot,
/// only superseded by re-import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    /// Natural identifier of the facility, unique across snapshots
    pub facility_id: String,

    /// Human-readable facility name
    pub name: String,

    /// Whether the facility consumes or produces energy
    pub facility_type: FacilityType,

    /// Street address of the site (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Optional free-text description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Facility {
    /// Create a new facility with validation
    pub fn new(
        facility_id: String,
        name: String,
        facility_type: FacilityType,
        address: Option<String>,
        description: Option<String>,
    ) -> Result<Self> {
        let facility = Self {
            facility_id,
            name,
            facility_type,
            address,
            description,
        };
        facility.validate()?;
        Ok(facility)
    }

    /// Validate facility data
    pub fn validate(&self) -> Result<()> {
        if self.facility_id.trim().is_empty() {
            return Err(Error::data_validation(
                "Facility identifier cannot be empty".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(Error::data_validation(format!(
                "Facility '{}' has an empty name",
                self.facility_id
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Facility Contract
// =============================================================================

/// A contract binding a facility to a product for a half-open validity
/// interval `[valid_from, valid_to)`.
///
/// A missing `valid_to` means the contract is open-ended ("current") and is
/// treated as extending to a far-future sentinel for interval comparison.
/// For a given facility no two contract intervals may overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityContract {
    /// Natural identifier of the contract, unique across snapshots
    pub contract_id: String,

    /// Identifier of the facility the contract belongs to
    pub facility_id: String,

    /// Identifier of the product the contract is priced against.
    /// Resolved by lookup, never by object reference; the product lifecycle
    /// is independent of the contract's.
    pub product_id: String,

    /// Start of the validity interval (inclusive)
    pub valid_from: DateTime<Utc>,

    /// End of the validity interval (exclusive); None = open-ended
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<DateTime<Utc>>,
}

impl FacilityContract {
    /// Create a new facility contract with validation
    pub fn new(
        contract_id: String,
        facility_id: String,
        product_id: String,
        valid_from: DateTime<Utc>,
        valid_to: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let contract = Self {
            contract_id,
            facility_id,
            product_id,
            valid_from,
            valid_to,
        };
        contract.validate()?;
        Ok(contract)
    }

    /// Validate contract data
    pub fn validate(&self) -> Result<()> {
        if self.contract_id.trim().is_empty() {
            return Err(Error::data_validation(
                "Contract identifier cannot be empty".to_string(),
            ));
        }
        if self.facility_id.trim().is_empty() {
            return Err(Error::data_validation(format!(
                "Contract '{}' has an empty facility identifier",
                self.contract_id
            )));
        }
        if self.product_id.trim().is_empty() {
            return Err(Error::data_validation(format!(
                "Contract '{}' has an empty product identifier",
                self.contract_id
            )));
        }
        if let Some(valid_to) = self.valid_to {
            if self.valid_from >= valid_to {
                return Err(Error::data_validation(format!(
                    "Contract '{}' has valid_from {} >= valid_to {}",
                    self.contract_id, self.valid_from, valid_to
                )));
            }
        }
        Ok(())
    }

    /// Whether the contract has no end date
    pub fn is_open_ended(&self) -> bool {
        self.valid_to.is_none()
    }

    /// The exclusive end of the validity interval, substituting the
    /// far-future sentinel for open-ended contracts
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.valid_to.unwrap_or_else(constants::open_ended_until)
    }

    /// Whether the validity interval contains the given instant
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.valid_from <= ts && ts < self.effective_end()
    }

    /// Whether the validity intervals of two contracts intersect
    pub fn overlaps(&self, other: &FacilityContract) -> bool {
        self.valid_from < other.effective_end() && other.valid_from < self.effective_end()
    }
}

// =============================================================================
// Meter Reading
// =============================================================================

/// A timestamped measurement for a facility.
///
/// Readings are immutable facts; they carry no contract information until
/// resolved against the contract index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    /// Identifier of the facility the reading was taken at
    pub facility_id: String,

    /// Instant the reading was taken (UTC)
    pub ts: DateTime<Utc>,

    /// Measured value
    pub value: f64,

    /// Unit of the measured value
    pub unit: Unit,
}

impl MeterReading {
    /// Create a new meter reading with validation
    pub fn new(facility_id: String, ts: DateTime<Utc>, value: f64, unit: Unit) -> Result<Self> {
        let reading = Self {
            facility_id,
            ts,
            value,
            unit,
        };
        reading.validate()?;
        Ok(reading)
    }

    /// Validate reading data.
    ///
    /// Checks structure and finiteness; unit-specific plausible ranges are
    /// applied by the snapshot importer, where they can be overridden per
    /// configuration.
    pub fn validate(&self) -> Result<()> {
        if self.facility_id.trim().is_empty() {
            return Err(Error::data_validation(
                "Meter reading has an empty facility identifier".to_string(),
            ));
        }
        if !self.value.is_finite() {
            return Err(Error::data_validation(format!(
                "Meter reading for facility '{}' at {} has a non-finite value",
                self.facility_id, self.ts
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Resolved Reading
// =============================================================================

/// A meter reading paired with the contract whose validity interval contains
/// its timestamp, or marked as a gap when no contract covers it.
///
/// Derived output of the tariff resolver; never persisted as raw input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedReading {
    /// The reading that was resolved
    pub reading: MeterReading,

    /// The covering contract, or None for a coverage gap
    pub contract: Option<FacilityContract>,
}

impl ResolvedReading {
    /// A reading resolved to a single covering contract
    pub fn resolved(reading: MeterReading, contract: FacilityContract) -> Self {
        Self {
            reading,
            contract: Some(contract),
        }
    }

    /// A reading whose timestamp falls in a coverage gap
    pub fn gap(reading: MeterReading) -> Self {
        Self {
            reading,
            contract: None,
        }
    }

    /// Whether the reading fell in a coverage gap
    pub fn is_gap(&self) -> bool {
        self.contract.is_none()
    }
}
