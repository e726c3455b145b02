//! Tests for single and batch meter reading resolution

use super::*;
use crate::Error;
use crate::app::services::contract_index::ContractIndex;
use crate::app::services::contract_index::tests::{contract, ts};
use crate::app::services::tariff_resolver::TariffResolver;
use crate::config::ResolutionConfig;
use std::sync::Arc;

fn resolver() -> TariffResolver {
    TariffResolver::new(Arc::new(reference_index()), ResolutionConfig::default())
}

#[test]
fn test_resolve_single_reading() {
    let resolver = resolver();

    let hit = resolver.resolve(&reading("F1", ts(2024, 3, 15))).unwrap();
    assert_eq!(
        hit.contract.as_ref().map(|c| c.contract_id.as_str()),
        Some("C-A")
    );

    let boundary = resolver.resolve(&reading("F1", ts(2024, 6, 1))).unwrap();
    assert_eq!(
        boundary.contract.as_ref().map(|c| c.contract_id.as_str()),
        Some("C-B")
    );
}

#[test]
fn test_resolve_gap_is_not_an_error() {
    let resolver = resolver();
    let gap = resolver.resolve(&reading("F1", ts(2023, 12, 31))).unwrap();
    assert!(gap.is_gap());
}

#[tokio::test]
async fn test_resolve_all_preserves_input_order() {
    let resolver = resolver();
    let readings = vec![
        reading("F1", ts(2024, 7, 1)),
        reading("F1", ts(2024, 2, 1)),
        reading("F1", ts(2023, 1, 1)),
        reading("F1", ts(2024, 3, 1)),
    ];

    let result = resolver.resolve_all(readings.clone(), false).await.unwrap();

    assert_eq!(result.readings.len(), 4);
    for (input, output) in readings.iter().zip(&result.readings) {
        assert_eq!(input.ts, output.reading.ts);
    }

    let ids: Vec<Option<&str>> = result
        .readings
        .iter()
        .map(|r| r.contract.as_ref().map(|c| c.contract_id.as_str()))
        .collect();
    assert_eq!(ids, vec![Some("C-B"), Some("C-A"), None, Some("C-A")]);
}

#[tokio::test]
async fn test_resolve_all_counts_gaps() {
    let resolver = resolver();
    let readings = vec![
        reading("F1", ts(2024, 2, 1)),
        reading("F1", ts(2023, 1, 1)),
        reading("F-unknown", ts(2024, 2, 1)),
    ];

    let result = resolver.resolve_all(readings, false).await.unwrap();

    assert_eq!(result.stats.total, 3);
    assert_eq!(result.stats.resolved, 1);
    assert_eq!(result.stats.gaps, 2);
    assert_eq!(result.gaps().count(), 2);
    assert!(result.stats.summary().contains("2 coverage gaps"));
}

#[tokio::test]
async fn test_resolve_all_empty_batch() {
    let resolver = resolver();
    let result = resolver.resolve_all(Vec::new(), false).await.unwrap();
    assert_eq!(result.stats, Default::default());
}

#[tokio::test]
async fn test_resolve_all_spans_many_chunks() {
    let config = ResolutionConfig {
        max_concurrent_tasks: 4,
        chunk_size: 7,
    };
    let resolver = TariffResolver::new(Arc::new(reference_index()), config);

    let readings: Vec<_> = (0..100)
        .map(|i| reading("F1", ts(2024, 1, 1) + chrono::Duration::days(i)))
        .collect();

    let result = resolver.resolve_all(readings, false).await.unwrap();
    assert_eq!(result.stats.total, 100);
    assert_eq!(result.stats.gaps, 0);

    // Chunk boundaries must not reorder the output
    for (i, resolved) in result.readings.iter().enumerate() {
        assert_eq!(
            resolved.reading.ts,
            ts(2024, 1, 1) + chrono::Duration::days(i as i64)
        );
    }
}

#[tokio::test]
async fn test_corrupt_index_aborts_the_batch() {
    let mut index = ContractIndex::new();
    index.by_facility.insert(
        "F1".to_string(),
        vec![
            contract("C-A", ts(2024, 1, 1), Some(ts(2024, 12, 1))),
            contract("C-B", ts(2024, 3, 1), Some(ts(2024, 6, 1))),
        ],
    );

    let resolver = TariffResolver::new(Arc::new(index), ResolutionConfig::default());
    let result = resolver
        .resolve_all(vec![reading("F1", ts(2024, 4, 1))], false)
        .await;

    assert!(matches!(result, Err(Error::MultipleContractMatches { .. })));
}
