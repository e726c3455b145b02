//! Cross-entity reference checking for staged batches
//!
//! Before anything is committed, every staged contract and meter reading
//! must resolve the identifiers it references. The known-identifier sets are
//! the union of the analytical store and the staged batch itself, so a
//! snapshot may introduce a facility and its contracts together. Any
//! unresolved reference is fatal to the whole batch; the report lists every
//! violation so operators can fix all of them in one pass.

use crate::app::models::EntityKind;
use crate::app::services::analytical_store::StoreSnapshot;
use crate::app::services::snapshot_importer::StagedBatch;
use std::collections::HashSet;
use tracing::{debug, warn};

/// A staged record referencing an identifier that resolves nowhere
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceViolation {
    /// Entity kind of the offending record
    pub entity: EntityKind,
    /// Index of the record within the staged batch (equals the source data
    /// row index when no rows of the file were rejected by validation)
    pub row: usize,
    /// The referencing field
    pub field: &'static str,
    /// The identifier that did not resolve
    pub identifier: String,
}

impl std::fmt::Display for ReferenceViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} row {}: {} '{}' does not reference an existing entity",
            self.entity, self.row, self.field, self.identifier
        )
    }
}

/// The outcome of a referential integrity check
#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    /// Every violation found, in staged record order
    pub violations: Vec<ReferenceViolation>,
}

impl IntegrityReport {
    /// Whether the batch may proceed to commit
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of violations found
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// Multi-line listing of every violation
    pub fn summary(&self) -> String {
        if self.is_ok() {
            "all references resolve".to_string()
        } else {
            self.violations
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

/// Check every cross-entity reference of a staged batch against the union
/// of store-known and staged identifiers
pub fn check_references(staged: &StagedBatch, known: &StoreSnapshot) -> IntegrityReport {
    let mut product_ids: HashSet<&str> =
        known.product_ids.iter().map(String::as_str).collect();
    product_ids.extend(
        staged
            .products
            .iter()
            .flatten()
            .map(|p| p.product_id.as_str()),
    );

    let mut facility_ids: HashSet<&str> =
        known.facility_ids.iter().map(String::as_str).collect();
    facility_ids.extend(
        staged
            .facilities
            .iter()
            .flatten()
            .map(|f| f.facility_id.as_str()),
    );

    let mut report = IntegrityReport::default();

    for (row, contract) in staged.contracts.iter().flatten().enumerate() {
        if !facility_ids.contains(contract.facility_id.as_str()) {
            report.violations.push(ReferenceViolation {
                entity: EntityKind::FacilityContract,
                row,
                field: "facility_id",
                identifier: contract.facility_id.clone(),
            });
        }
        if !product_ids.contains(contract.product_id.as_str()) {
            report.violations.push(ReferenceViolation {
                entity: EntityKind::FacilityContract,
                row,
                field: "product_id",
                identifier: contract.product_id.clone(),
            });
        }
    }

    for (row, reading) in staged.readings.iter().flatten().enumerate() {
        if !facility_ids.contains(reading.facility_id.as_str()) {
            report.violations.push(ReferenceViolation {
                entity: EntityKind::MeterReading,
                row,
                field: "facility_id",
                identifier: reading.facility_id.clone(),
            });
        }
    }

    if report.is_ok() {
        debug!(
            "Integrity check passed for {} staged records",
            staged.record_count()
        );
    } else {
        warn!(
            "Integrity check found {} unresolved references",
            report.violation_count()
        );
    }

    report
}
