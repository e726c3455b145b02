//! Temporal contract index
//!
//! Organizes facility contracts per facility as a time-ordered sequence of
//! pairwise-disjoint half-open intervals `[valid_from, valid_to)`, enabling
//! point lookup by timestamp in logarithmic time. Contract counts per
//! facility are small, so a sorted array with binary search beats a
//! pointer-linked interval structure.
//!
//! The index is derived state: it is rebuilt from persisted contract rows on
//! startup and is not itself a source of truth.

use crate::app::models::FacilityContract;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, error};

#[cfg(test)]
pub mod tests;

/// A rejected contract insertion, naming every conflicting contract
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapViolation {
    /// Facility whose timeline the contracts collide on
    pub facility_id: String,
    /// The contract whose insertion was rejected
    pub inserted: String,
    /// The already-indexed contracts it collides with, in timeline order
    pub existing: Vec<String>,
}

impl std::fmt::Display for OverlapViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "contract '{}' overlaps contracts {:?} for facility '{}'",
            self.inserted, self.existing, self.facility_id
        )
    }
}

/// Per-facility index of disjoint, time-ordered contract intervals
#[derive(Debug, Clone, Default)]
pub struct ContractIndex {
    /// Contracts per facility, sorted by `valid_from` and pairwise disjoint
    pub(crate) by_facility: HashMap<String, Vec<FacilityContract>>,
}

impl ContractIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the index from persisted contract rows.
    ///
    /// Re-validates disjointness; a store whose invariant was bypassed is
    /// rejected with the first conflict found.
    pub fn from_store_rows(contracts: Vec<FacilityContract>) -> Result<Self> {
        let mut index = Self::new();
        let total = contracts.len();
        for contract in contracts {
            index.insert(contract)?;
        }
        debug!(
            "Rebuilt contract index: {} contracts across {} facilities",
            total,
            index.facility_count()
        );
        Ok(index)
    }

    /// Insert a contract, rejecting any overlap with an already-indexed
    /// interval of the same facility.
    ///
    /// A contract whose `contract_id` is already indexed supersedes its
    /// previous version, so an open-ended contract can be closed by
    /// re-importing it with a `valid_to`. On rejection the index is
    /// unchanged and the error names every conflicting contract. Open-ended
    /// contracts extend to the far-future sentinel, so a second open-ended
    /// contract for a facility, or any contract starting after an
    /// open-ended one, is an overlap: the open-ended contract must be
    /// explicitly closed before a successor can begin.
    pub fn insert(&mut self, contract: FacilityContract) -> Result<()> {
        contract.validate()?;

        let entries = self
            .by_facility
            .entry(contract.facility_id.clone())
            .or_default();

        // Disjoint sorted intervals have monotonic ends, so the conflicting
        // contracts form a contiguous range. The contract's own previous
        // version is not a conflict; it is superseded below.
        let first = entries.partition_point(|c| c.effective_end() <= contract.valid_from);
        let last = entries.partition_point(|c| c.valid_from < contract.effective_end());

        let existing: Vec<String> = entries[first..last]
            .iter()
            .filter(|c| c.contract_id != contract.contract_id)
            .map(|c| c.contract_id.clone())
            .collect();
        if !existing.is_empty() {
            return Err(Error::contract_overlap(
                &contract.facility_id,
                &contract.contract_id,
                existing,
            ));
        }

        if let Some(superseded) = entries
            .iter()
            .position(|c| c.contract_id == contract.contract_id)
        {
            entries.remove(superseded);
        }

        let pos = entries.partition_point(|c| c.valid_from < contract.valid_from);
        entries.insert(pos, contract);
        Ok(())
    }

    /// Attempt to insert a whole batch of contracts on top of this index,
    /// without mutating it.
    ///
    /// Returns the staged index with every non-conflicting contract applied
    /// and the complete list of overlap violations, so a caller enforcing
    /// batch atomicity can reject the batch while reporting every conflict
    /// at once. Errors other than overlaps propagate.
    pub fn stage_batch(
        &self,
        contracts: &[FacilityContract],
    ) -> Result<(ContractIndex, Vec<OverlapViolation>)> {
        let mut staged = self.clone();
        let mut violations = Vec::new();

        for contract in contracts {
            match staged.insert(contract.clone()) {
                Ok(()) => {}
                Err(Error::ContractOverlap {
                    facility_id,
                    inserted,
                    existing,
                }) => violations.push(OverlapViolation {
                    facility_id,
                    inserted,
                    existing,
                }),
                Err(other) => return Err(other),
            }
        }

        Ok((staged, violations))
    }

    /// Find the contract whose validity interval contains the timestamp.
    ///
    /// Returns `Ok(None)` when the timestamp falls in a coverage gap. If a
    /// second contract also covers the timestamp the disjointness invariant
    /// was violated undetected; this is surfaced as an error and logged as
    /// a bug signal, distinct from user-data faults.
    pub fn resolve(
        &self,
        facility_id: &str,
        ts: DateTime<Utc>,
    ) -> Result<Option<&FacilityContract>> {
        let Some(entries) = self.by_facility.get(facility_id) else {
            return Ok(None);
        };

        let pos = entries.partition_point(|c| c.valid_from <= ts);
        if pos == 0 {
            return Ok(None);
        }

        let candidate = &entries[pos - 1];
        if !candidate.contains(ts) {
            return Ok(None);
        }

        // With disjoint sorted intervals no earlier contract can also cover
        // the timestamp; if one does, the index is corrupt.
        if pos >= 2 && entries[pos - 2].contains(ts) {
            error!(
                "Contract index invariant violated: contracts '{}' and '{}' both cover {} for facility '{}'",
                entries[pos - 2].contract_id,
                candidate.contract_id,
                ts,
                facility_id
            );
            return Err(Error::multiple_contract_matches(facility_id, ts));
        }

        Ok(Some(candidate))
    }

    /// Number of facilities with at least one indexed contract
    pub fn facility_count(&self) -> usize {
        self.by_facility.len()
    }

    /// Total number of indexed contracts
    pub fn contract_count(&self) -> usize {
        self.by_facility.values().map(Vec::len).sum()
    }

    /// The time-ordered contracts of one facility
    pub fn contracts_for(&self, facility_id: &str) -> &[FacilityContract] {
        self.by_facility
            .get(facility_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether the index holds no contracts
    pub fn is_empty(&self) -> bool {
        self.by_facility.is_empty()
    }
}
