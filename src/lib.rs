//! Tariff Analyzer Engine
//!
//! A Rust library for importing columnar snapshot files describing electricity
//! products, facilities, facility contracts and meter readings, and for
//! resolving which contract terms apply to each meter reading at each point
//! in time.
//!
//! This library provides tools for:
//! - Reading CSV and Parquet snapshot files into typed, staged record batches
//! - Validating rows against structural and domain rules with full fault reports
//! - Cross-checking staged entities for dangling identifier references
//! - Indexing facility contracts as disjoint half-open validity intervals
//! - Resolving the applicable contract for every meter reading
//! - Committing validated batches atomically to a parquet-backed analytical store

pub mod config;
pub mod constants;
pub mod observability;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod analytical_store;
        pub mod contract_index;
        pub mod import_pipeline;
        pub mod integrity_checker;
        pub mod snapshot_importer;
        pub mod tariff_resolver;
    }
}

// Re-export commonly used types
pub use app::models::{
    EntityKind, Facility, FacilityContract, MeterReading, Product, ResolvedReading, Unit,
};
pub use config::Config;

/// Result type alias for the tariff analyzer
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for snapshot import and tariff resolution operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Columnar engine operation failed
    #[error("columnar engine error: {message}")]
    Columnar {
        message: String,
        #[source]
        source: polars::error::PolarsError,
    },

    /// Snapshot file is structurally unusable (e.g. required columns missing)
    #[error("snapshot format error in '{source_name}': {message}")]
    SnapshotFormat { source_name: String, message: String },

    /// Data validation error
    #[error("data validation error: {message}")]
    DataValidation { message: String },

    /// Configuration error
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A contract's validity window overlaps one or more already-accepted
    /// contracts of the same facility
    #[error("contract '{inserted}' overlaps contracts {existing:?} for facility '{facility_id}'")]
    ContractOverlap {
        facility_id: String,
        inserted: String,
        existing: Vec<String>,
    },

    /// More than one contract covers a timestamp for the same facility.
    /// Indicates the disjointness invariant was violated undetected; a bug
    /// signal, not a user data error.
    #[error("multiple contracts cover {timestamp} for facility '{facility_id}'")]
    MultipleContractMatches {
        facility_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Store commit failed; no rows were published
    #[error("store commit error: {message}")]
    StoreCommit { message: String },

    /// Date/time parsing error
    #[error("date/time parsing error: {message}")]
    DateTimeParsing {
        message: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Processing interrupted
    #[error("processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a columnar engine error with context
    pub fn columnar(message: impl Into<String>, source: polars::error::PolarsError) -> Self {
        Self::Columnar {
            message: message.into(),
            source,
        }
    }

    /// Create a snapshot format error
    pub fn snapshot_format(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SnapshotFormat {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create a data validation error
    pub fn data_validation(message: impl Into<String>) -> Self {
        Self::DataValidation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a contract overlap error naming every conflicting contract
    pub fn contract_overlap(
        facility_id: impl Into<String>,
        inserted: impl Into<String>,
        existing: Vec<String>,
    ) -> Self {
        Self::ContractOverlap {
            facility_id: facility_id.into(),
            inserted: inserted.into(),
            existing,
        }
    }

    /// Create a multiple-contract-match error
    pub fn multiple_contract_matches(
        facility_id: impl Into<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self::MultipleContractMatches {
            facility_id: facility_id.into(),
            timestamp,
        }
    }

    /// Create a store commit error
    pub fn store_commit(message: impl Into<String>) -> Self {
        Self::StoreCommit {
            message: message.into(),
        }
    }

    /// Create a date/time parsing error
    pub fn datetime_parsing(message: impl Into<String>, source: chrono::ParseError) -> Self {
        Self::DateTimeParsing {
            message: message.into(),
            source,
        }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<polars::error::PolarsError> for Error {
    fn from(error: polars::error::PolarsError) -> Self {
        Self::Columnar {
            message: "columnar operation failed".to_string(),
            source: error,
        }
    }
}

impl From<chrono::ParseError> for Error {
    fn from(error: chrono::ParseError) -> Self {
        Self::DateTimeParsing {
            message: "date/time parsing failed".to_string(),
            source: error,
        }
    }
}
