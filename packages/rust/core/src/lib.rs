//! Record enrichment and pipeline orchestration for itemenrich.
//!
//! This crate ties the JSON fetcher to the record model: the [`enricher`]
//! decides which lookups a record goes through and merges the results, and
//! the [`pipeline`] drives it over the whole collection.

pub mod enricher;
pub mod observer;
pub mod pipeline;
pub mod stats;

pub use enricher::Enricher;
pub use observer::{EnrichmentObserver, FetchFailure, SilentObserver};
pub use pipeline::{PipelineResult, enrich_all, run};
pub use stats::{EnrichStats, StepTally};
