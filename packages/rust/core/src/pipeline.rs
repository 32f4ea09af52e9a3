//! End-to-end enrichment pass: records → enricher (one at a time) → records.

use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use itemenrich_fetch::JsonFetcher;
use itemenrich_shared::{EnrichConfig, Record};

use crate::enricher::Enricher;
use crate::observer::{EnrichmentObserver, SilentObserver};
use crate::stats::EnrichStats;

/// Result of a pipeline run.
#[derive(Debug)]
pub struct PipelineResult {
    /// Enriched records, index-for-index with the input.
    pub records: Vec<Record>,
    /// Lookup counters.
    pub stats: EnrichStats,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Run every record through the enricher, in input order.
///
/// Records are processed strictly one after another, and so are the lookups
/// within a record. Lookup failures are reported to `observer` and never
/// stop the run, so the output always has the same length as the input.
#[instrument(skip_all, fields(records = records.len()))]
pub async fn run(
    records: Vec<Record>,
    config: &EnrichConfig,
    fetcher: &JsonFetcher,
    observer: &dyn EnrichmentObserver,
) -> PipelineResult {
    let start = Instant::now();
    let total = records.len();
    let flags = config.flags();

    if !flags.any() {
        debug!("no enrichment enabled, records pass through unchanged");
    }

    let enricher = Enricher::new(config, fetcher, observer);
    let mut stats = EnrichStats::default();
    let mut enriched = Vec::with_capacity(total);

    for (index, record) in records.into_iter().enumerate() {
        observer.record_started(index, total);
        enriched.push(enricher.enrich(record, index, &mut stats).await);
        stats.records += 1;
        observer.record_finished(index, total);
    }

    let elapsed = start.elapsed();
    info!(
        records = stats.records,
        lookups = stats.attempts(),
        failed = stats.failures(),
        elapsed_ms = elapsed.as_millis() as u64,
        "enrichment pass complete"
    );

    PipelineResult {
        records: enriched,
        stats,
        elapsed,
    }
}

/// Run the pipeline without observing it and keep only the records.
pub async fn enrich_all(
    records: Vec<Record>,
    config: &EnrichConfig,
    fetcher: &JsonFetcher,
) -> Vec<Record> {
    run(records, config, fetcher, &SilentObserver).await.records
}
