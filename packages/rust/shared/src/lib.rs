//! Shared types, error model, and configuration for itemenrich.
//!
//! This crate is the foundation depended on by all other itemenrich crates.
//! It provides:
//! - [`ItemEnrichError`] — the unified error type
//! - Domain types ([`Record`], [`Namespace`], [`EnrichStep`])
//! - Configuration ([`AppConfig`], [`EnrichConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ConfigOverrides, EnrichConfig, EnrichFlags, EnrichSection, NamespaceFailurePolicy,
    OutputSection, ServicesSection, config_dir, config_file_path, load_config, load_config_from,
};
pub use error::{ItemEnrichError, Result};
pub use types::{EnrichStep, JsonObject, Namespace, Record, parse_records, render_records};
