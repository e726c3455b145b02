//! Tests for contract insertion and overlap rejection

use super::*;
use crate::Error;
use crate::app::services::contract_index::ContractIndex;

#[test]
fn test_disjoint_inserts_stay_sorted() {
    let mut index = ContractIndex::new();

    // Inserted out of order
    index
        .insert(contract("C-B", ts(2024, 6, 1), Some(ts(2024, 9, 1))))
        .unwrap();
    index
        .insert(contract("C-A", ts(2024, 1, 1), Some(ts(2024, 6, 1))))
        .unwrap();
    index
        .insert(contract("C-C", ts(2024, 9, 1), None))
        .unwrap();

    let contracts = index.contracts_for("F1");
    let ids: Vec<&str> = contracts.iter().map(|c| c.contract_id.as_str()).collect();
    assert_eq!(ids, vec!["C-A", "C-B", "C-C"]);
    assert_eq!(index.contract_count(), 3);
}

#[test]
fn test_adjacent_half_open_intervals_accepted() {
    let mut index = ContractIndex::new();
    index
        .insert(contract("C-A", ts(2024, 1, 1), Some(ts(2024, 6, 1))))
        .unwrap();

    // Starts exactly where the previous one ends
    assert!(
        index
            .insert(contract("C-B", ts(2024, 6, 1), Some(ts(2025, 1, 1))))
            .is_ok()
    );
}

#[test]
fn test_overlap_rejected_naming_both_contracts() {
    let mut index = ContractIndex::new();
    index
        .insert(contract("C-A", ts(2024, 1, 1), Some(ts(2024, 6, 1))))
        .unwrap();
    index
        .insert(contract("C-B", ts(2024, 6, 1), None))
        .unwrap();

    // Spans the A/B boundary
    let err = index
        .insert(contract("C-C", ts(2024, 5, 1), Some(ts(2024, 7, 1))))
        .unwrap_err();

    match err {
        Error::ContractOverlap {
            facility_id,
            inserted,
            existing,
        } => {
            assert_eq!(facility_id, "F1");
            assert_eq!(inserted, "C-C");
            // Both conflicting contracts are named, in timeline order
            assert_eq!(existing, vec!["C-A".to_string(), "C-B".to_string()]);
        }
        other => panic!("expected ContractOverlap, got {other:?}"),
    }

    // Rejected insertion leaves the index unchanged
    assert_eq!(index.contract_count(), 2);
}

#[test]
fn test_contained_interval_rejected() {
    let mut index = ContractIndex::new();
    index
        .insert(contract("C-A", ts(2024, 1, 1), Some(ts(2024, 12, 1))))
        .unwrap();

    let err = index
        .insert(contract("C-X", ts(2024, 3, 1), Some(ts(2024, 4, 1))))
        .unwrap_err();
    assert!(matches!(err, Error::ContractOverlap { .. }));
}

#[test]
fn test_insert_after_open_ended_contract_is_an_overlap() {
    let mut index = ContractIndex::new();
    index
        .insert(contract("C-OPEN", ts(2024, 1, 1), None))
        .unwrap();

    // The open-ended contract is not auto-closed by a successor
    let err = index
        .insert(contract("C-NEXT", ts(2025, 1, 1), Some(ts(2026, 1, 1))))
        .unwrap_err();

    match err {
        Error::ContractOverlap {
            inserted, existing, ..
        } => {
            assert_eq!(inserted, "C-NEXT");
            assert_eq!(existing, vec!["C-OPEN".to_string()]);
        }
        other => panic!("expected ContractOverlap, got {other:?}"),
    }
}

#[test]
fn test_at_most_one_open_ended_contract_per_facility() {
    let mut index = ContractIndex::new();
    index
        .insert(contract("C-OPEN", ts(2024, 1, 1), None))
        .unwrap();

    let err = index
        .insert(contract("C-OPEN-2", ts(2023, 1, 1), None))
        .unwrap_err();
    assert!(matches!(err, Error::ContractOverlap { .. }));
}

#[test]
fn test_explicitly_closed_contract_allows_successor() {
    let mut index = ContractIndex::new();

    // The re-imported, closed version of a previously open-ended contract
    index
        .insert(contract("C-OPEN", ts(2024, 1, 1), Some(ts(2025, 1, 1))))
        .unwrap();
    assert!(index.insert(contract("C-NEXT", ts(2025, 1, 1), None)).is_ok());
}

#[test]
fn test_facilities_do_not_interfere() {
    let mut index = ContractIndex::new();
    index
        .insert(contract_for("F1", "C-1", ts(2024, 1, 1), None))
        .unwrap();

    // Same window on another facility is fine
    assert!(
        index
            .insert(contract_for("F2", "C-2", ts(2024, 1, 1), None))
            .is_ok()
    );
    assert_eq!(index.facility_count(), 2);
}

#[test]
fn test_invalid_interval_rejected_before_indexing() {
    let mut index = ContractIndex::new();
    let err = index
        .insert(contract("C-BAD", ts(2024, 6, 1), Some(ts(2024, 1, 1))))
        .unwrap_err();
    assert!(matches!(err, Error::DataValidation { .. }));
    assert!(index.is_empty());
}

#[test]
fn test_stage_batch_collects_every_violation() {
    let mut index = ContractIndex::new();
    index
        .insert(contract("C-A", ts(2024, 1, 1), Some(ts(2024, 6, 1))))
        .unwrap();

    let batch = vec![
        contract("C-OK", ts(2024, 6, 1), Some(ts(2024, 9, 1))),
        contract("C-BAD-1", ts(2024, 2, 1), Some(ts(2024, 3, 1))),
        contract("C-BAD-2", ts(2024, 5, 1), Some(ts(2024, 7, 1))),
    ];

    let (staged, violations) = index.stage_batch(&batch).unwrap();

    assert_eq!(violations.len(), 2);
    assert_eq!(violations[0].inserted, "C-BAD-1");
    assert_eq!(violations[1].inserted, "C-BAD-2");

    // The staged index carries the non-conflicting contract...
    assert_eq!(staged.contract_count(), 2);
    // ...while the live index is untouched
    assert_eq!(index.contract_count(), 1);
}

#[test]
fn test_reimported_contract_supersedes_its_previous_version() {
    let mut index = ContractIndex::new();
    index
        .insert(contract("C-B", ts(2024, 6, 1), None))
        .unwrap();

    // Closing the open-ended contract by re-import
    index
        .insert(contract("C-B", ts(2024, 6, 1), Some(ts(2025, 1, 1))))
        .unwrap();

    assert_eq!(index.contract_count(), 1);
    assert_eq!(index.contracts_for("F1")[0].valid_to, Some(ts(2025, 1, 1)));

    // The freed timeline accepts a successor now
    assert!(index.insert(contract("C-NEXT", ts(2025, 1, 1), None)).is_ok());
}

#[test]
fn test_superseding_version_must_still_fit_the_timeline() {
    let mut index = ContractIndex::new();
    index
        .insert(contract("C-A", ts(2024, 1, 1), Some(ts(2024, 6, 1))))
        .unwrap();
    index
        .insert(contract("C-B", ts(2024, 6, 1), Some(ts(2024, 9, 1))))
        .unwrap();

    // Widening C-B backwards into C-A is rejected, old version retained
    let err = index
        .insert(contract("C-B", ts(2024, 3, 1), Some(ts(2024, 9, 1))))
        .unwrap_err();
    assert!(matches!(err, Error::ContractOverlap { .. }));
    assert_eq!(index.contracts_for("F1")[1].valid_from, ts(2024, 6, 1));
}
