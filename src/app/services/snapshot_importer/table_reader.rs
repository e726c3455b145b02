//! Snapshot table loading
//!
//! Loads an already-opened snapshot stream into a polars DataFrame and
//! checks that the columns required for the entity kind are present. The
//! stream is rewound and buffered first so that CSV and parquet files go
//! through the same code path.

use super::{SnapshotFormat, SnapshotSource};
use crate::app::models::EntityKind;
use crate::constants;
use crate::{Error, Result};
use polars::prelude::*;
use std::io::{Cursor, Read, Seek, SeekFrom};
use tracing::debug;

/// Load a snapshot source into a DataFrame
pub(crate) fn read_table(source: SnapshotSource) -> Result<DataFrame> {
    let SnapshotSource {
        name,
        format,
        mut reader,
    } = source;

    reader
        .seek(SeekFrom::Start(0))
        .map_err(|e| Error::io(format!("Failed to rewind snapshot '{}'", name), e))?;

    let mut buffer = Vec::new();
    reader
        .read_to_end(&mut buffer)
        .map_err(|e| Error::io(format!("Failed to read snapshot '{}'", name), e))?;

    if buffer.is_empty() {
        return Err(Error::snapshot_format(name, "snapshot stream is empty"));
    }

    let cursor = Cursor::new(buffer);
    let df = match format {
        SnapshotFormat::Csv => CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(constants::CSV_SCHEMA_INFERENCE_ROWS))
            .into_reader_with_file_handle(cursor)
            .finish()
            .map_err(|e| Error::columnar(format!("Failed to parse CSV snapshot '{}'", name), e))?,
        SnapshotFormat::Parquet => ParquetReader::new(cursor).finish().map_err(|e| {
            Error::columnar(format!("Failed to parse parquet snapshot '{}'", name), e)
        })?,
    };

    debug!(
        "Loaded snapshot '{}': {} rows, {} columns",
        name,
        df.height(),
        df.width()
    );

    Ok(df)
}

/// Check that every column required for the entity kind is present
pub(crate) fn check_required_columns(
    df: &DataFrame,
    kind: EntityKind,
    source_name: &str,
) -> Result<()> {
    let present: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let missing: Vec<&str> = kind
        .required_columns()
        .iter()
        .copied()
        .filter(|required| !present.iter().any(|p| p == required))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::snapshot_format(
            source_name,
            format!(
                "missing required {} columns: {}",
                kind,
                missing.join(", ")
            ),
        ))
    }
}
