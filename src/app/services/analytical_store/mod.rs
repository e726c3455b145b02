//! Analytical store adapter
//!
//! Thin contract over the columnar query engine: committed entities live as
//! one parquet table per entity kind under a root directory, and read access
//! for aggregation jobs is exposed as lazy scans. The adapter only maps
//! domain entities to and from their row representation.
//!
//! Commits follow a staging-then-publish protocol: every affected table is
//! fully written to a temporary file first and the temporary files are
//! renamed into place only after all writes succeeded, so a failed write
//! publishes nothing. Re-imported rows replace stored rows with the same
//! natural key, which makes re-committing an unchanged snapshot idempotent.

use crate::app::models::{EntityKind, FacilityContract, MeterReading};
use crate::app::services::snapshot_importer::StagedBatch;
use crate::config::StoreConfig;
use crate::{Error, Result};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub(crate) mod conversion;

#[cfg(test)]
pub mod tests;

// =============================================================================
// Store Contract
// =============================================================================

/// The identifier view of the store, used for referential integrity checks
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    /// Identifiers of every committed product
    pub product_ids: HashSet<String>,
    /// Identifiers of every committed facility
    pub facility_ids: HashSet<String>,
}

/// Table row counts after a successful commit
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CommitStats {
    pub products: usize,
    pub facilities: usize,
    pub contracts: usize,
    pub readings: usize,
}

impl CommitStats {
    /// Total committed rows across entity kinds
    pub fn total(&self) -> usize {
        self.products + self.facilities + self.contracts + self.readings
    }
}

/// Persistence capability consumed by the import pipeline and analysis jobs
pub trait AnalyticalStore {
    /// Commit a staged batch: every entity kind present in the batch is
    /// persisted, or none is
    fn commit(&self, batch: &StagedBatch) -> Result<CommitStats>;

    /// The identifier view of the committed entities
    fn snapshot(&self) -> Result<StoreSnapshot>;

    /// Lazy scan of one entity table for aggregation jobs
    fn scan(&self, kind: EntityKind) -> Result<LazyFrame>;

    /// Load every committed facility contract, e.g. to rebuild the
    /// contract index on startup
    fn load_contracts(&self) -> Result<Vec<FacilityContract>>;

    /// Load every committed meter reading for resolution jobs
    fn load_meter_readings(&self) -> Result<Vec<MeterReading>>;
}

// =============================================================================
// Parquet-backed Store
// =============================================================================

/// Analytical store keeping one parquet table per entity kind
#[derive(Debug)]
pub struct ParquetStore {
    root: PathBuf,
    config: StoreConfig,
}

impl ParquetStore {
    /// Open (or initialize) a store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>, config: StoreConfig) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            Error::io(
                format!("Failed to create store directory '{}'", root.display()),
                e,
            )
        })?;
        Ok(Self { root, config })
    }

    /// The directory the tables live in
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn table_path(&self, kind: EntityKind) -> PathBuf {
        self.root.join(format!("{}.parquet", kind.as_str()))
    }

    fn read_table(&self, kind: EntityKind) -> Result<Option<DataFrame>> {
        let path = self.table_path(kind);
        if !path.exists() {
            return Ok(None);
        }

        let file = std::fs::File::open(&path).map_err(|e| {
            Error::io(format!("Failed to open table '{}'", path.display()), e)
        })?;
        let df = ParquetReader::new(file).finish().map_err(|e| {
            Error::columnar(format!("Failed to read {} table", kind), e)
        })?;
        Ok(Some(df))
    }

    /// Write a table to a staging file next to its final location
    fn write_staged_table(
        &self,
        kind: EntityKind,
        df: &mut DataFrame,
    ) -> Result<(NamedTempFile, PathBuf)> {
        let mut staged = tempfile::Builder::new()
            .prefix(kind.as_str())
            .suffix(".parquet.staging")
            .tempfile_in(&self.root)
            .map_err(|e| Error::io(format!("Failed to create staging file for {}", kind), e))?;

        ParquetWriter::new(staged.as_file_mut())
            .with_compression(self.config.compression.to_polars_compression())
            .with_row_group_size(Some(self.config.effective_row_group_size()))
            .finish(df)
            .map_err(|e| Error::columnar(format!("Failed to write {} table", kind), e))?;

        debug!("Staged {} table: {} rows", kind, df.height());
        Ok((staged, self.table_path(kind)))
    }
}

impl AnalyticalStore for ParquetStore {
    fn commit(&self, batch: &StagedBatch) -> Result<CommitStats> {
        let mut stats = CommitStats::default();
        let mut staged_tables: Vec<(NamedTempFile, PathBuf)> = Vec::new();

        if let Some(products) = &batch.products {
            let existing = match self.read_table(EntityKind::Product)? {
                Some(df) => conversion::products_from_dataframe(&df)?,
                None => Vec::new(),
            };
            let merged = merge_by_key(existing, products, |p| p.product_id.clone());
            stats.products = merged.len();
            let mut df = conversion::products_to_dataframe(&merged)?;
            staged_tables.push(self.write_staged_table(EntityKind::Product, &mut df)?);
        }

        if let Some(facilities) = &batch.facilities {
            let existing = match self.read_table(EntityKind::Facility)? {
                Some(df) => conversion::facilities_from_dataframe(&df)?,
                None => Vec::new(),
            };
            let merged = merge_by_key(existing, facilities, |f| f.facility_id.clone());
            stats.facilities = merged.len();
            let mut df = conversion::facilities_to_dataframe(&merged)?;
            staged_tables.push(self.write_staged_table(EntityKind::Facility, &mut df)?);
        }

        if let Some(contracts) = &batch.contracts {
            let existing = match self.read_table(EntityKind::FacilityContract)? {
                Some(df) => conversion::contracts_from_dataframe(&df)?,
                None => Vec::new(),
            };
            let merged = merge_by_key(existing, contracts, |c| c.contract_id.clone());
            stats.contracts = merged.len();
            let mut df = conversion::contracts_to_dataframe(&merged)?;
            staged_tables.push(self.write_staged_table(EntityKind::FacilityContract, &mut df)?);
        }

        if let Some(readings) = &batch.readings {
            let existing = match self.read_table(EntityKind::MeterReading)? {
                Some(df) => conversion::readings_from_dataframe(&df)?,
                None => Vec::new(),
            };
            let merged = merge_by_key(existing, readings, |r| {
                (r.facility_id.clone(), r.ts, r.unit)
            });
            stats.readings = merged.len();
            let mut df = conversion::readings_to_dataframe(&merged)?;
            staged_tables.push(self.write_staged_table(EntityKind::MeterReading, &mut df)?);
        }

        // Every table was written; publish them
        for (staged, path) in staged_tables {
            staged.persist(&path).map_err(|e| {
                Error::store_commit(format!(
                    "failed to publish table '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }

        info!(
            "Committed batch: {} table rows across entity kinds",
            stats.total()
        );
        Ok(stats)
    }

    fn snapshot(&self) -> Result<StoreSnapshot> {
        let product_ids = match self.read_table(EntityKind::Product)? {
            Some(df) => conversion::ids_from_dataframe(&df, "product_id")?,
            None => HashSet::new(),
        };
        let facility_ids = match self.read_table(EntityKind::Facility)? {
            Some(df) => conversion::ids_from_dataframe(&df, "facility_id")?,
            None => HashSet::new(),
        };

        Ok(StoreSnapshot {
            product_ids,
            facility_ids,
        })
    }

    fn scan(&self, kind: EntityKind) -> Result<LazyFrame> {
        Ok(self.read_table(kind)?.unwrap_or_default().lazy())
    }

    fn load_contracts(&self) -> Result<Vec<FacilityContract>> {
        match self.read_table(EntityKind::FacilityContract)? {
            Some(df) => conversion::contracts_from_dataframe(&df),
            None => Ok(Vec::new()),
        }
    }

    fn load_meter_readings(&self) -> Result<Vec<MeterReading>> {
        match self.read_table(EntityKind::MeterReading)? {
            Some(df) => conversion::readings_from_dataframe(&df),
            None => Ok(Vec::new()),
        }
    }
}

/// Merge incoming records over existing rows by natural key.
///
/// Existing rows keep their position (replaced in place on key match); new
/// rows are appended in incoming order.
fn merge_by_key<T: Clone, K: Hash + Eq>(
    existing: Vec<T>,
    incoming: &[T],
    key: impl Fn(&T) -> K,
) -> Vec<T> {
    let mut merged = existing;
    let mut positions: HashMap<K, usize> = merged
        .iter()
        .enumerate()
        .map(|(pos, item)| (key(item), pos))
        .collect();

    for item in incoming {
        match positions.get(&key(item)) {
            Some(&pos) => merged[pos] = item.clone(),
            None => {
                positions.insert(key(item), merged.len());
                merged.push(item.clone());
            }
        }
    }

    merged
}
