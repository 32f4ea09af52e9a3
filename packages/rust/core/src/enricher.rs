//! Per-record enrichment.
//!
//! A record goes through up to three independent steps, always in this order:
//! namespace (with its optional nested settings lookup), metadata, settings.
//! Each successful lookup is merged into the record; a failed lookup leaves
//! the record as it was and is reported to the observer.

use tracing::trace;

use itemenrich_fetch::JsonFetcher;
use itemenrich_shared::types::{ID_FIELD, NAMESPACE_FIELD};
use itemenrich_shared::{
    EnrichConfig, EnrichStep, ItemEnrichError, JsonObject, Namespace, NamespaceFailurePolicy,
    Record, Result,
};

use crate::observer::{EnrichmentObserver, FetchFailure};
use crate::stats::EnrichStats;

/// Applies the configured lookups to one record at a time.
pub struct Enricher<'a> {
    config: &'a EnrichConfig,
    fetcher: &'a JsonFetcher,
    observer: &'a dyn EnrichmentObserver,
}

impl<'a> Enricher<'a> {
    pub fn new(
        config: &'a EnrichConfig,
        fetcher: &'a JsonFetcher,
        observer: &'a dyn EnrichmentObserver,
    ) -> Self {
        Self {
            config,
            fetcher,
            observer,
        }
    }

    /// Enrich `record` and hand it back. Never fails.
    ///
    /// `index` identifies the record in observer callbacks; lookup outcomes
    /// are added to `stats`.
    pub async fn enrich(&self, mut record: Record, index: usize, stats: &mut EnrichStats) -> Record {
        let flags = self.config.flags();

        if flags.namespace {
            self.enrich_namespace(&mut record, index, stats).await;
        }

        if flags.metadata {
            let url = lookup_url(record.id_key(), ID_FIELD, |id| self.config.metadata_url(id));
            let result = self.fetch_list_at(url).await;
            if let Some(metadata) = self.settle(EnrichStep::Metadata, index, result, stats) {
                record.set_metadata(metadata);
            }
        }

        if flags.settings {
            let url = lookup_url(record.id_key(), ID_FIELD, |id| {
                self.config.item_settings_url(id)
            });
            let result = self.fetch_list_at(url).await;
            if let Some(settings) = self.settle(EnrichStep::Settings, index, result, stats) {
                record.set_settings(settings);
            }
        }

        record
    }

    async fn enrich_namespace(&self, record: &mut Record, index: usize, stats: &mut EnrichStats) {
        let key = record.namespace_key();

        let url = lookup_url(key.clone(), NAMESPACE_FIELD, |ns| {
            self.config.namespace_url(ns)
        });
        let result = match url {
            Ok(url) => self.fetcher.fetch_object(&url).await,
            Err(e) => Err(e),
        };

        let Some(object) = self.settle(EnrichStep::Namespace, index, result, stats) else {
            if self.config.on_namespace_failure() == NamespaceFailurePolicy::Legacy {
                record.clear_namespace();
            }
            return;
        };

        let mut namespace = Namespace::new(object);

        // The namespace lookup succeeded, so the key is known to be usable.
        if self.config.flags().namespace_settings {
            if let Some(key) = key.as_deref() {
                let result = self
                    .fetcher
                    .fetch_list(&self.config.namespace_settings_url(key))
                    .await;
                let step = EnrichStep::NamespaceSettings;
                if let Some(settings) = self.settle(step, index, result, stats) {
                    namespace = namespace.with_settings(settings);
                }
            }
        }

        record.set_namespace(namespace);
    }

    async fn fetch_list_at(&self, url: Result<String>) -> Result<Vec<JsonObject>> {
        self.fetcher.fetch_list(&url?).await
    }

    /// Count the outcome and turn a failure into `None`.
    fn settle<T>(
        &self,
        step: EnrichStep,
        index: usize,
        result: Result<T>,
        stats: &mut EnrichStats,
    ) -> Option<T> {
        stats.record_outcome(step, result.is_ok());
        match result {
            Ok(value) => {
                trace!(record = index, %step, "lookup merged");
                Some(value)
            }
            Err(error) => {
                self.observer.fetch_failed(&FetchFailure {
                    record_index: index,
                    step,
                    error: &error,
                });
                None
            }
        }
    }
}

/// Build a lookup URL from a record key, or explain why it cannot be built.
fn lookup_url(
    key: Option<String>,
    field: &str,
    build: impl FnOnce(&str) -> String,
) -> Result<String> {
    key.map(|k| build(&k)).ok_or_else(|| {
        ItemEnrichError::validation(format!("record has no usable `{field}` field"))
    })
}
