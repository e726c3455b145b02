//! Import statistics and fault reporting for snapshot files
//!
//! Row-level validation faults are collected, never propagated as errors:
//! a rejected row must not abort its sibling rows, and the caller receives
//! one report covering every offending row.

use crate::app::models::EntityKind;

/// A single row that failed structural or domain validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFault {
    /// Zero-based index of the row within the file's data section
    pub row: usize,
    /// Why the row was rejected
    pub reason: String,
}

impl std::fmt::Display for ValidationFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}: {}", self.row, self.reason)
    }
}

/// Per-entity-kind import statistics
#[derive(Debug, Clone)]
pub struct EntityImportStats {
    /// The entity kind this report covers
    pub kind: EntityKind,
    /// Total rows found in the snapshot file
    pub total_rows: usize,
    /// Rows that passed validation and were staged
    pub accepted: usize,
    /// One fault per rejected row, in source row order
    pub faults: Vec<ValidationFault>,
}

impl EntityImportStats {
    /// Create empty statistics for an entity kind
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            total_rows: 0,
            accepted: 0,
            faults: Vec::new(),
        }
    }

    /// Record a rejected row
    pub fn add_fault(&mut self, row: usize, reason: impl Into<String>) {
        self.faults.push(ValidationFault {
            row,
            reason: reason.into(),
        });
    }

    /// Number of rejected rows
    pub fn rejected(&self) -> usize {
        self.faults.len()
    }

    /// Acceptance rate as a percentage
    pub fn acceptance_rate(&self) -> f64 {
        if self.total_rows == 0 {
            100.0
        } else {
            (self.accepted as f64 / self.total_rows as f64) * 100.0
        }
    }

    /// One-line summary of this entity's import
    pub fn summary(&self) -> String {
        format!(
            "{}: {} of {} rows accepted ({:.1}%), {} rejected",
            self.kind,
            self.accepted,
            self.total_rows,
            self.acceptance_rate(),
            self.rejected()
        )
    }
}

/// Import report covering every entity kind present in a snapshot
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// Per-entity statistics, in import order
    pub entities: Vec<EntityImportStats>,
}

impl ImportReport {
    /// Statistics for one entity kind, if that kind was part of the snapshot
    pub fn for_kind(&self, kind: EntityKind) -> Option<&EntityImportStats> {
        self.entities.iter().find(|e| e.kind == kind)
    }

    /// Total accepted rows across entity kinds
    pub fn total_accepted(&self) -> usize {
        self.entities.iter().map(|e| e.accepted).sum()
    }

    /// Total rejected rows across entity kinds
    pub fn total_rejected(&self) -> usize {
        self.entities.iter().map(|e| e.rejected()).sum()
    }

    /// Whether any row was rejected
    pub fn has_faults(&self) -> bool {
        self.entities.iter().any(|e| !e.faults.is_empty())
    }

    /// Multi-line summary of the whole import
    pub fn summary(&self) -> String {
        let mut lines: Vec<String> = self.entities.iter().map(|e| e.summary()).collect();
        lines.push(format!(
            "total: {} accepted, {} rejected",
            self.total_accepted(),
            self.total_rejected()
        ));
        lines.join("\n")
    }
}
