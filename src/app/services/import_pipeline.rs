//! Snapshot import pipeline
//!
//! Orchestrates the staging-then-commit protocol: validate rows, cross-check
//! references, stage contract insertions against the live index, commit to
//! the analytical store, and only then swap the staged index in. A batch
//! with even one unresolved reference or overlapping contract commits zero
//! rows, and the consolidated outcome lists every violation found so
//! operators can fix all issues in one edit-and-reimport cycle.

use crate::app::services::analytical_store::{AnalyticalStore, CommitStats};
use crate::app::services::contract_index::{ContractIndex, OverlapViolation};
use crate::app::services::integrity_checker::{self, IntegrityReport};
use crate::app::services::snapshot_importer::{
    ImportReport, SnapshotFiles, SnapshotImporter, SnapshotImportResult,
};
use crate::config::Config;
use crate::{Error, Result};
use tracing::{info, warn};

/// The consolidated outcome of one snapshot import
#[derive(Debug)]
pub struct ImportOutcome {
    /// Per-row validation results of the importer
    pub report: ImportReport,
    /// Referential integrity findings; any violation rejects the batch
    pub integrity: IntegrityReport,
    /// Contract overlap findings; any violation rejects the batch
    pub overlaps: Vec<OverlapViolation>,
    /// Commit row counts, present only if the batch was committed
    pub commit: Option<CommitStats>,
}

impl ImportOutcome {
    /// Whether the batch was committed to the store
    pub fn committed(&self) -> bool {
        self.commit.is_some()
    }

    /// Multi-line summary covering validation, integrity and overlap results
    pub fn summary(&self) -> String {
        let mut lines = vec![self.report.summary()];

        if !self.integrity.is_ok() {
            lines.push(format!(
                "batch rejected: {} unresolved references",
                self.integrity.violation_count()
            ));
            lines.push(self.integrity.summary());
        }

        if !self.overlaps.is_empty() {
            lines.push(format!(
                "batch rejected: {} contract overlaps",
                self.overlaps.len()
            ));
            lines.extend(self.overlaps.iter().map(|v| v.to_string()));
        }

        match &self.commit {
            Some(commit) => lines.push(format!("committed {} table rows", commit.total())),
            None => lines.push("nothing committed".to_string()),
        }

        lines.join("\n")
    }
}

/// Pipeline tying the importer, integrity checker, contract index and
/// analytical store together
#[derive(Debug)]
pub struct SnapshotPipeline<S: AnalyticalStore> {
    importer: SnapshotImporter,
    store: S,
    index: ContractIndex,
}

impl<S: AnalyticalStore> SnapshotPipeline<S> {
    /// Create a pipeline over a store, rebuilding the contract index from
    /// the committed contract rows
    pub fn new(store: S, config: &Config) -> Result<Self> {
        config.validate().map_err(Error::configuration)?;

        let index = ContractIndex::from_store_rows(store.load_contracts()?)?;
        Ok(Self {
            importer: SnapshotImporter::new(config.validation.clone()),
            store,
            index,
        })
    }

    /// Run one snapshot through the full import pipeline.
    ///
    /// Row validation faults are collected and do not reject the batch;
    /// integrity and overlap violations do, and a rejected outcome lists
    /// both kinds in full. The contract index is updated only after the
    /// store commit succeeded, so a failed commit leaves the index
    /// consistent with the store.
    pub async fn run(&mut self, files: SnapshotFiles, show_progress: bool) -> Result<ImportOutcome> {
        let SnapshotImportResult { batch, report } =
            self.importer.import_snapshot(files, show_progress).await?;

        let known = self.store.snapshot()?;
        let integrity = integrity_checker::check_references(&batch, &known);

        // Overlaps are collected even when references are already broken, so
        // one rejected import reports every violation of both kinds at once
        let (staged_index, overlaps) = match &batch.contracts {
            Some(contracts) => self.index.stage_batch(contracts)?,
            None => (self.index.clone(), Vec::new()),
        };

        if !integrity.is_ok() || !overlaps.is_empty() {
            warn!(
                "Batch rejected: {} unresolved references, {} overlapping contracts, nothing committed",
                integrity.violation_count(),
                overlaps.len()
            );
            return Ok(ImportOutcome {
                report,
                integrity,
                overlaps,
                commit: None,
            });
        }

        let commit = self.store.commit(&batch)?;
        self.index = staged_index;

        info!(
            "Snapshot committed: {} table rows, contract index covers {} facilities",
            commit.total(),
            self.index.facility_count()
        );

        Ok(ImportOutcome {
            report,
            integrity,
            overlaps,
            commit: Some(commit),
        })
    }

    /// The live contract index, consistent with the committed store
    pub fn index(&self) -> &ContractIndex {
        &self.index
    }

    /// The analytical store behind the pipeline
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::services::analytical_store::ParquetStore;
    use crate::app::services::snapshot_importer::SnapshotSource;
    use crate::config::StoreConfig;
    use std::io::Cursor;

    fn csv(content: &str) -> SnapshotSource {
        SnapshotSource::csv("test.csv", Cursor::new(content.as_bytes().to_vec()))
    }

    fn pipeline_in(dir: &std::path::Path) -> SnapshotPipeline<ParquetStore> {
        let store = ParquetStore::new(dir.join("store"), StoreConfig::default()).unwrap();
        SnapshotPipeline::new(store, &Config::default()).unwrap()
    }

    const BASE_ENTITIES: (&str, &str) = (
        "product_id,name,unit\nP1,Grid tariff,kWh\n",
        "facility_id,name,facility_type\nF1,Mill Street,consumption\n",
    );

    #[tokio::test]
    async fn test_batch_with_dangling_reference_commits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = pipeline_in(dir.path());

        let files = SnapshotFiles::default().with_readings(csv(
            "facility_id,ts,value,unit\nF99,2024-03-15 00:00:00,1.0,kWh\n",
        ));
        let outcome = pipeline.run(files, false).await.unwrap();

        assert!(!outcome.committed());
        assert_eq!(outcome.integrity.violation_count(), 1);
        assert_eq!(outcome.integrity.violations[0].identifier, "F99");
        assert!(pipeline.store().load_meter_readings().unwrap().is_empty());
        assert!(outcome.summary().contains("nothing committed"));
    }

    #[tokio::test]
    async fn test_successful_batch_updates_store_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = pipeline_in(dir.path());

        let files = SnapshotFiles::default()
            .with_products(csv(BASE_ENTITIES.0))
            .with_facilities(csv(BASE_ENTITIES.1))
            .with_contracts(csv(
                "contract_id,facility_id,product_id,valid_from,valid_to\n\
                 C-A,F1,P1,2024-01-01 00:00:00,\n",
            ));
        let outcome = pipeline.run(files, false).await.unwrap();

        assert!(outcome.committed());
        assert_eq!(pipeline.index().contract_count(), 1);
        assert_eq!(pipeline.store().load_contracts().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_batch_reports_reference_and_overlap_violations_together() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = pipeline_in(dir.path());

        // C-B overlaps C-A, and C-DANGLING references an unknown facility
        let files = SnapshotFiles::default()
            .with_products(csv(BASE_ENTITIES.0))
            .with_facilities(csv(BASE_ENTITIES.1))
            .with_contracts(csv(
                "contract_id,facility_id,product_id,valid_from,valid_to\n\
                 C-A,F1,P1,2024-01-01 00:00:00,2024-06-01 00:00:00\n\
                 C-B,F1,P1,2024-05-01 00:00:00,2024-07-01 00:00:00\n\
                 C-DANGLING,F9,P1,2024-01-01 00:00:00,\n",
            ));
        let outcome = pipeline.run(files, false).await.unwrap();

        assert!(!outcome.committed());
        assert_eq!(outcome.integrity.violation_count(), 1);
        assert_eq!(outcome.overlaps.len(), 1);
        assert!(outcome.summary().contains("unresolved references"));
        assert!(outcome.summary().contains("contract overlaps"));
        assert!(pipeline.store().load_contracts().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_batch_leaves_index_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = pipeline_in(dir.path());

        let files = SnapshotFiles::default()
            .with_products(csv(BASE_ENTITIES.0))
            .with_facilities(csv(BASE_ENTITIES.1))
            .with_contracts(csv(
                "contract_id,facility_id,product_id,valid_from,valid_to\n\
                 C-A,F1,P1,2024-01-01 00:00:00,2024-06-01 00:00:00\n\
                 C-X,F1,P1,2024-05-01 00:00:00,2024-07-01 00:00:00\n",
            ));
        let outcome = pipeline.run(files, false).await.unwrap();

        assert!(!outcome.committed());
        assert_eq!(outcome.overlaps.len(), 1);
        assert_eq!(outcome.overlaps[0].inserted, "C-X");
        assert!(pipeline.index().is_empty());
        assert!(pipeline.store().load_contracts().unwrap().is_empty());
    }
}
