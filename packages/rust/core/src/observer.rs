//! Hooks for watching a pipeline run.
//!
//! Lookup failures never stop enrichment. Observers are the only place they
//! become visible.

use itemenrich_shared::{EnrichStep, ItemEnrichError};

/// A lookup that failed and was absorbed.
#[derive(Debug)]
pub struct FetchFailure<'a> {
    /// Position of the record in the input collection.
    pub record_index: usize,
    pub step: EnrichStep,
    pub error: &'a ItemEnrichError,
}

/// Callbacks invoked while the pipeline runs. Every method defaults to a no-op.
pub trait EnrichmentObserver: Send + Sync {
    /// Called before the first lookup for a record.
    fn record_started(&self, _index: usize, _total: usize) {}
    /// Called when a lookup fails; the record keeps going.
    fn fetch_failed(&self, _failure: &FetchFailure<'_>) {}
    /// Called once a record has been through every enabled step.
    fn record_finished(&self, _index: usize, _total: usize) {}
}

/// No-op observer for headless/test usage.
pub struct SilentObserver;

impl EnrichmentObserver for SilentObserver {}
