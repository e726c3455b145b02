//! Configuration management and validation.
//!
//! Provides configuration structures for row validation, resolution
//! parallelism and the parquet tables written by the analytical store.

use crate::constants;
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Top-level configuration of the tariff analyzer engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Row validation settings
    pub validation: ValidationConfig,

    /// Meter reading resolution settings
    pub resolution: ResolutionConfig,

    /// Analytical store settings
    pub store: StoreConfig,
}

impl Config {
    /// Validate the complete configuration
    pub fn validate(&self) -> Result<(), String> {
        self.validation.validate()?;
        self.resolution.validate()?;
        self.store.validate()
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Settings applied when validating snapshot rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Reject meter readings whose value falls outside the plausible range
    /// of their unit
    pub enforce_plausible_ranges: bool,

    /// Per-unit-symbol overrides of the built-in plausible ranges,
    /// `(min, max)` inclusive
    pub custom_ranges: HashMap<String, (f64, f64)>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enforce_plausible_ranges: true,
            custom_ranges: HashMap::new(),
        }
    }
}

impl ValidationConfig {
    /// The plausible value range for a unit symbol, honoring overrides
    pub fn range_for(&self, unit_symbol: &str) -> (f64, f64) {
        self.custom_ranges
            .get(unit_symbol)
            .copied()
            .unwrap_or_else(|| constants::plausible_range(unit_symbol))
    }

    /// Check whether a value is acceptable for a unit under this configuration.
    ///
    /// Non-finite values are never acceptable, independent of range
    /// enforcement.
    pub fn value_is_acceptable(&self, unit_symbol: &str, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        if !self.enforce_plausible_ranges {
            return true;
        }
        let (min, max) = self.range_for(unit_symbol);
        value >= min && value <= max
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        for (unit, (min, max)) in &self.custom_ranges {
            if !min.is_finite() || !max.is_finite() {
                return Err(format!("custom range for '{unit}' must be finite"));
            }
            if min >= max {
                return Err(format!(
                    "custom range for '{unit}' has min {min} >= max {max}"
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Settings for batch meter reading resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Maximum concurrent resolution tasks (0 = derive from system profile)
    pub max_concurrent_tasks: usize,

    /// Readings resolved per task (0 = built-in default)
    pub chunk_size: usize,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 0,
            chunk_size: 0,
        }
    }
}

impl ResolutionConfig {
    /// Effective task concurrency for this machine
    pub fn effective_concurrency(&self, profile: &SystemProfile) -> usize {
        if self.max_concurrent_tasks > 0 {
            self.max_concurrent_tasks
        } else {
            profile.performance_cores.max(1)
        }
    }

    /// Effective chunk size
    pub fn effective_chunk_size(&self) -> usize {
        if self.chunk_size > 0 {
            self.chunk_size
        } else {
            constants::DEFAULT_RESOLUTION_CHUNK_SIZE
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

// =============================================================================
// Analytical Store
// =============================================================================

/// Supported compression algorithms for the parquet tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(&self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

/// Settings for the parquet tables written by the analytical store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Compression algorithm for committed tables
    pub compression: CompressionAlgorithm,

    /// Target rows per parquet row group (0 = built-in default)
    pub row_group_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            compression: CompressionAlgorithm::Snappy,
            row_group_size: 0,
        }
    }
}

impl StoreConfig {
    /// Effective row group size
    pub fn effective_row_group_size(&self) -> usize {
        if self.row_group_size > 0 {
            self.row_group_size
        } else {
            constants::DEFAULT_ROW_GROUP_SIZE
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

// =============================================================================
// System Profile
// =============================================================================

/// System profiling information used to size concurrency
#[derive(Debug, Clone)]
pub struct SystemProfile {
    /// Number of CPU cores available
    pub cpu_cores: usize,
    /// Available memory in MB
    pub memory_mb: usize,
    /// Performance cores (for systems with efficiency cores)
    pub performance_cores: usize,
}

impl SystemProfile {
    /// Auto-detect system capabilities
    pub fn detect() -> Self {
        use sysinfo::System;

        let cpu_cores = num_cpus::get();
        let performance_cores = num_cpus::get_physical();

        let mut system = System::new();
        system.refresh_memory();
        let memory_mb = (system.total_memory() / 1024 / 1024) as usize;

        debug!(
            "Detected system profile: {} cores ({} physical), {}MB memory",
            cpu_cores, performance_cores, memory_mb
        );

        Self {
            cpu_cores,
            memory_mb,
            performance_cores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_custom_range_overrides_builtin() {
        let mut config = ValidationConfig::default();
        config
            .custom_ranges
            .insert("kWh".to_string(), (0.0, 100.0));

        assert_eq!(config.range_for("kWh"), (0.0, 100.0));
        assert!(config.value_is_acceptable("kWh", 50.0));
        assert!(!config.value_is_acceptable("kWh", 500.0));
    }

    #[test]
    fn test_invalid_custom_range_rejected() {
        let mut config = ValidationConfig::default();
        config
            .custom_ranges
            .insert("kW".to_string(), (100.0, 10.0));
        assert!(config.validate().is_err());

        config
            .custom_ranges
            .insert("kW".to_string(), (0.0, f64::INFINITY));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_range_enforcement_can_be_disabled() {
        let config = ValidationConfig {
            enforce_plausible_ranges: false,
            custom_ranges: HashMap::new(),
        };
        assert!(config.value_is_acceptable("kWh", 1e12));
        // Non-finite values stay unacceptable
        assert!(!config.value_is_acceptable("kWh", f64::NAN));
    }

    #[test]
    fn test_resolution_effective_values() {
        let profile = SystemProfile {
            cpu_cores: 8,
            memory_mb: 16_384,
            performance_cores: 4,
        };

        let auto = ResolutionConfig::default();
        assert_eq!(auto.effective_concurrency(&profile), 4);
        assert_eq!(
            auto.effective_chunk_size(),
            constants::DEFAULT_RESOLUTION_CHUNK_SIZE
        );

        let fixed = ResolutionConfig {
            max_concurrent_tasks: 2,
            chunk_size: 16,
        };
        assert_eq!(fixed.effective_concurrency(&profile), 2);
        assert_eq!(fixed.effective_chunk_size(), 16);
    }
}
