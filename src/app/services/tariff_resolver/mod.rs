//! Tariff resolution service
//!
//! Resolves meter readings against a finalized contract index: each reading
//! either maps to the single contract whose validity interval contains its
//! timestamp, or is reported as a coverage gap. Gaps are legitimate for
//! facilities with incomplete contract timelines and are counted, never
//! fatal.
//!
//! Readings are independent of each other, so batch resolution fans out
//! over chunks of the input. The index is shared read-only; commits and
//! resolution never interleave, so no locking is needed.

use crate::app::models::{MeterReading, ResolvedReading};
use crate::app::services::contract_index::ContractIndex;
use crate::config::{ResolutionConfig, SystemProfile};
use crate::{Error, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, info};

#[cfg(test)]
pub mod tests;

// =============================================================================
// Statistics
// =============================================================================

/// Statistics for batch resolution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionStats {
    /// Readings processed
    pub total: usize,
    /// Readings matched to a contract
    pub resolved: usize,
    /// Readings whose timestamp fell in a coverage gap
    pub gaps: usize,
}

impl ResolutionStats {
    /// Share of readings that fell in a gap, as a percentage
    pub fn gap_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.gaps as f64 / self.total as f64) * 100.0
        }
    }

    /// One-line summary of a resolution run
    pub fn summary(&self) -> String {
        format!(
            "{} readings resolved, {} coverage gaps ({:.1}%)",
            self.resolved,
            self.gaps,
            self.gap_rate()
        )
    }
}

/// Result of resolving a batch of meter readings, in input order
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    /// One entry per input reading
    pub readings: Vec<ResolvedReading>,
    /// Aggregate statistics
    pub stats: ResolutionStats,
}

impl ResolutionResult {
    fn new(readings: Vec<ResolvedReading>) -> Self {
        let stats = ResolutionStats {
            total: readings.len(),
            resolved: readings.iter().filter(|r| !r.is_gap()).count(),
            gaps: readings.iter().filter(|r| r.is_gap()).count(),
        };
        Self { readings, stats }
    }

    /// The readings that fell in a coverage gap
    pub fn gaps(&self) -> impl Iterator<Item = &ResolvedReading> {
        self.readings.iter().filter(|r| r.is_gap())
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolver mapping meter readings to their covering facility contract
#[derive(Debug)]
pub struct TariffResolver {
    /// Finalized contract index, shared read-only
    index: Arc<ContractIndex>,
    /// Parallelism settings for batch resolution
    config: ResolutionConfig,
}

impl TariffResolver {
    /// Create a resolver over a finalized contract index
    pub fn new(index: Arc<ContractIndex>, config: ResolutionConfig) -> Self {
        Self { index, config }
    }

    /// Resolve a single meter reading
    pub fn resolve(&self, reading: &MeterReading) -> Result<ResolvedReading> {
        resolve_one(&self.index, reading)
    }

    /// Resolve a batch of meter readings.
    ///
    /// Chunks are resolved concurrently; the output preserves input order.
    /// A multiple-match condition aborts the batch, since it means the
    /// index invariant does not hold and every result is suspect.
    pub async fn resolve_all(
        &self,
        readings: Vec<MeterReading>,
        show_progress: bool,
    ) -> Result<ResolutionResult> {
        if readings.is_empty() {
            return Ok(ResolutionResult::new(Vec::new()));
        }

        let total = readings.len();
        let chunk_size = self.config.effective_chunk_size();
        let concurrency = self.config.effective_concurrency(&SystemProfile::detect());
        debug!(
            "Resolving {} readings in chunks of {} ({} concurrent tasks)",
            total, chunk_size, concurrency
        );

        let pb = show_progress.then(|| Self::create_resolution_progress_bar(total as u64));

        let chunks: Vec<(usize, Vec<MeterReading>)> = readings
            .chunks(chunk_size)
            .map(<[MeterReading]>::to_vec)
            .enumerate()
            .collect();

        let outcomes: Vec<Result<(usize, Vec<ResolvedReading>)>> = stream::iter(chunks)
            .map(|(chunk_idx, chunk)| {
                let index = Arc::clone(&self.index);
                let pb = pb.clone();
                async move {
                    let chunk_len = chunk.len();
                    let resolved = task::spawn_blocking(move || {
                        chunk
                            .iter()
                            .map(|reading| resolve_one(&index, reading))
                            .collect::<Result<Vec<_>>>()
                    })
                    .await
                    .map_err(|e| {
                        Error::processing_interrupted(format!("resolution task failed: {e}"))
                    })??;

                    if let Some(pb) = &pb {
                        pb.inc(chunk_len as u64);
                    }

                    Ok((chunk_idx, resolved))
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut ordered: Vec<(usize, Vec<ResolvedReading>)> = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            ordered.push(outcome?);
        }
        ordered.sort_by_key(|(chunk_idx, _)| *chunk_idx);

        let readings: Vec<ResolvedReading> = ordered
            .into_iter()
            .flat_map(|(_, resolved)| resolved)
            .collect();

        let result = ResolutionResult::new(readings);

        if let Some(pb) = pb {
            pb.finish_with_message(result.stats.summary());
        }
        info!("Resolution complete: {}", result.stats.summary());

        Ok(result)
    }

    /// The contract index backing this resolver
    pub fn index(&self) -> &ContractIndex {
        &self.index
    }

    /// Create a progress bar for batch resolution
    fn create_resolution_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message("Resolving meter readings");
        pb
    }
}

fn resolve_one(index: &ContractIndex, reading: &MeterReading) -> Result<ResolvedReading> {
    match index.resolve(&reading.facility_id, reading.ts)? {
        Some(contract) => Ok(ResolvedReading::resolved(reading.clone(), contract.clone())),
        None => Ok(ResolvedReading::gap(reading.clone())),
    }
}
