//! Snapshot import service
//!
//! Reads columnar snapshot files (CSV or parquet) into typed, staged record
//! batches, applying structural and domain validation per row. The importer
//! only stages: nothing is committed here, and all file access is read-only.
//! Entity kinds absent from a snapshot are simply not staged, so partial
//! imports (e.g. meter data only) leave the other kinds untouched downstream.

use crate::app::models::{EntityKind, Facility, FacilityContract, MeterReading, Product};
use crate::config::ValidationConfig;
use crate::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{Read, Seek};
use tracing::{debug, info};

pub(crate) mod field_parsers;
pub(crate) mod record_parser;
pub mod stats;
mod table_reader;

#[cfg(test)]
pub mod tests;

pub use stats::{EntityImportStats, ImportReport, ValidationFault};

use record_parser::{
    ContractColumns, FacilityColumns, ProductColumns, ReadingColumns, parse_contract_row,
    parse_facility_row, parse_product_row, parse_reading_row,
};

// =============================================================================
// Snapshot Sources
// =============================================================================

/// File formats accepted for snapshot files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Csv,
    Parquet,
}

/// An already-opened, seekable snapshot stream
pub trait SnapshotRead: Read + Seek + Send {}

impl<T: Read + Seek + Send> SnapshotRead for T {}

/// One snapshot file handed to the importer.
///
/// The engine never resolves paths itself; the embedding application opens
/// the files and passes the handles in.
pub struct SnapshotSource {
    /// Label used in error messages and reports
    pub name: String,
    /// Format of the stream
    pub format: SnapshotFormat,
    /// The open stream, rewound before reading
    pub reader: Box<dyn SnapshotRead>,
}

impl SnapshotSource {
    /// A CSV snapshot stream
    pub fn csv(name: impl Into<String>, reader: impl SnapshotRead + 'static) -> Self {
        Self {
            name: name.into(),
            format: SnapshotFormat::Csv,
            reader: Box::new(reader),
        }
    }

    /// A parquet snapshot stream
    pub fn parquet(name: impl Into<String>, reader: impl SnapshotRead + 'static) -> Self {
        Self {
            name: name.into(),
            format: SnapshotFormat::Parquet,
            reader: Box::new(reader),
        }
    }
}

impl std::fmt::Debug for SnapshotSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotSource")
            .field("name", &self.name)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

/// The file set of one snapshot, one optional file per entity kind
#[derive(Debug, Default)]
pub struct SnapshotFiles {
    pub products: Option<SnapshotSource>,
    pub facilities: Option<SnapshotSource>,
    pub contracts: Option<SnapshotSource>,
    pub readings: Option<SnapshotSource>,
}

impl SnapshotFiles {
    pub fn with_products(mut self, source: SnapshotSource) -> Self {
        self.products = Some(source);
        self
    }

    pub fn with_facilities(mut self, source: SnapshotSource) -> Self {
        self.facilities = Some(source);
        self
    }

    pub fn with_contracts(mut self, source: SnapshotSource) -> Self {
        self.contracts = Some(source);
        self
    }

    pub fn with_readings(mut self, source: SnapshotSource) -> Self {
        self.readings = Some(source);
        self
    }

    /// Whether the file set contains no files at all
    pub fn is_empty(&self) -> bool {
        self.products.is_none()
            && self.facilities.is_none()
            && self.contracts.is_none()
            && self.readings.is_none()
    }
}

// =============================================================================
// Staged Batch
// =============================================================================

/// Validated records staged in memory prior to integrity checking and
/// commit. `None` means the entity kind was not part of the snapshot, as
/// opposed to present-but-empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedBatch {
    pub products: Option<Vec<Product>>,
    pub facilities: Option<Vec<Facility>>,
    pub contracts: Option<Vec<FacilityContract>>,
    pub readings: Option<Vec<MeterReading>>,
}

impl StagedBatch {
    /// Whether nothing was staged
    pub fn is_empty(&self) -> bool {
        self.products.as_ref().is_none_or(|v| v.is_empty())
            && self.facilities.as_ref().is_none_or(|v| v.is_empty())
            && self.contracts.as_ref().is_none_or(|v| v.is_empty())
            && self.readings.as_ref().is_none_or(|v| v.is_empty())
    }

    /// Total staged records across entity kinds
    pub fn record_count(&self) -> usize {
        self.products.as_ref().map_or(0, Vec::len)
            + self.facilities.as_ref().map_or(0, Vec::len)
            + self.contracts.as_ref().map_or(0, Vec::len)
            + self.readings.as_ref().map_or(0, Vec::len)
    }
}

/// Staged records and the validation report of one snapshot import
#[derive(Debug)]
pub struct SnapshotImportResult {
    pub batch: StagedBatch,
    pub report: ImportReport,
}

// =============================================================================
// Importer
// =============================================================================

/// Snapshot importer applying per-row validation
#[derive(Debug, Clone)]
pub struct SnapshotImporter {
    validation: ValidationConfig,
}

impl SnapshotImporter {
    /// Create a new importer with the given validation settings
    pub fn new(validation: ValidationConfig) -> Self {
        Self { validation }
    }

    /// Import a snapshot file set into a staged, validated batch.
    ///
    /// Every offending row is collected into the report; a validation fault
    /// never aborts its sibling rows. Structural file problems (unreadable
    /// stream, missing required columns) abort the affected import as a
    /// whole, since no row of such a file can be trusted.
    pub async fn import_snapshot(
        &self,
        files: SnapshotFiles,
        show_progress: bool,
    ) -> Result<SnapshotImportResult> {
        let mut batch = StagedBatch::default();
        let mut report = ImportReport::default();

        if let Some(source) = files.products {
            let (records, stats) = self.import_products(source, show_progress)?;
            batch.products = Some(records);
            report.entities.push(stats);
        }

        if let Some(source) = files.facilities {
            let (records, stats) = self.import_facilities(source, show_progress)?;
            batch.facilities = Some(records);
            report.entities.push(stats);
        }

        if let Some(source) = files.contracts {
            let (records, stats) = self.import_contracts(source, show_progress)?;
            batch.contracts = Some(records);
            report.entities.push(stats);
        }

        if let Some(source) = files.readings {
            let (records, stats) = self.import_readings(source, show_progress)?;
            batch.readings = Some(records);
            report.entities.push(stats);
        }

        info!(
            "Snapshot import staged {} records ({} rows rejected)",
            batch.record_count(),
            report.total_rejected()
        );

        Ok(SnapshotImportResult { batch, report })
    }

    fn import_products(
        &self,
        source: SnapshotSource,
        show_progress: bool,
    ) -> Result<(Vec<Product>, EntityImportStats)> {
        let name = source.name.clone();
        let df = table_reader::read_table(source)?;
        table_reader::check_required_columns(&df, EntityKind::Product, &name)?;
        let cols = ProductColumns::bind(&df)?;

        Self::parse_rows(EntityKind::Product, df.height(), show_progress, |idx| {
            parse_product_row(&cols, idx)
        })
    }

    fn import_facilities(
        &self,
        source: SnapshotSource,
        show_progress: bool,
    ) -> Result<(Vec<Facility>, EntityImportStats)> {
        let name = source.name.clone();
        let df = table_reader::read_table(source)?;
        table_reader::check_required_columns(&df, EntityKind::Facility, &name)?;
        let cols = FacilityColumns::bind(&df)?;

        Self::parse_rows(EntityKind::Facility, df.height(), show_progress, |idx| {
            parse_facility_row(&cols, idx)
        })
    }

    fn import_contracts(
        &self,
        source: SnapshotSource,
        show_progress: bool,
    ) -> Result<(Vec<FacilityContract>, EntityImportStats)> {
        let name = source.name.clone();
        let df = table_reader::read_table(source)?;
        table_reader::check_required_columns(&df, EntityKind::FacilityContract, &name)?;
        let cols = ContractColumns::bind(&df)?;

        Self::parse_rows(
            EntityKind::FacilityContract,
            df.height(),
            show_progress,
            |idx| parse_contract_row(&cols, idx),
        )
    }

    fn import_readings(
        &self,
        source: SnapshotSource,
        show_progress: bool,
    ) -> Result<(Vec<MeterReading>, EntityImportStats)> {
        let name = source.name.clone();
        let df = table_reader::read_table(source)?;
        table_reader::check_required_columns(&df, EntityKind::MeterReading, &name)?;
        let cols = ReadingColumns::bind(&df)?;

        Self::parse_rows(
            EntityKind::MeterReading,
            df.height(),
            show_progress,
            |idx| parse_reading_row(&cols, idx, &self.validation),
        )
    }

    /// Run a row parser over every row, collecting accepted records and
    /// one fault per rejected row
    fn parse_rows<T>(
        kind: EntityKind,
        rows: usize,
        show_progress: bool,
        parse: impl Fn(usize) -> Result<T>,
    ) -> Result<(Vec<T>, EntityImportStats)> {
        let mut stats = EntityImportStats::new(kind);
        stats.total_rows = rows;

        let pb = show_progress.then(|| Self::create_import_progress_bar(rows as u64, kind));

        let mut records = Vec::with_capacity(rows);
        for idx in 0..rows {
            match parse(idx) {
                Ok(record) => {
                    records.push(record);
                    stats.accepted += 1;
                }
                Err(error) => stats.add_fault(idx, fault_reason(&error)),
            }
            if let Some(pb) = &pb {
                pb.inc(1);
            }
        }

        if let Some(pb) = pb {
            pb.finish_with_message(stats.summary());
        }

        debug!("{}", stats.summary());

        Ok((records, stats))
    }

    /// Create a progress bar for an entity import
    fn create_import_progress_bar(total: u64, kind: EntityKind) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message(format!("Importing {} rows", kind));
        pb
    }
}

/// Strip the error-variant prefix off row-level faults; the report already
/// carries the context
fn fault_reason(error: &Error) -> String {
    match error {
        Error::DataValidation { message } => message.clone(),
        other => other.to_string(),
    }
}
