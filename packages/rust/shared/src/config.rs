//! Application configuration for itemenrich.
//!
//! Optional config lives at `~/.itemenrich/itemenrich.toml`.
//! CLI flags and environment variables override config file values, which
//! override defaults. The merged result is an immutable [`EnrichConfig`].

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ItemEnrichError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "itemenrich.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".itemenrich";

// ---------------------------------------------------------------------------
// Config structs (matching itemenrich.toml schema)
// ---------------------------------------------------------------------------

/// Top-level file config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote service locations.
    #[serde(default)]
    pub services: ServicesSection,

    /// Which lookups to run.
    #[serde(default)]
    pub enrich: EnrichSection,

    /// Output rendering.
    #[serde(default)]
    pub output: OutputSection,
}

/// `[services]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicesSection {
    /// Base URL of the namespace service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces_url: Option<String>,

    /// Base URL of the items service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_url: Option<String>,
}

/// `[enrich]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichSection {
    #[serde(default)]
    pub namespace: bool,
    #[serde(default)]
    pub namespace_settings: bool,
    #[serde(default)]
    pub metadata: bool,
    #[serde(default)]
    pub settings: bool,

    /// What happens to `namespace` when its lookup fails.
    #[serde(default)]
    pub on_namespace_failure: NamespaceFailurePolicy,
}

/// `[output]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    /// Pretty-print the output array.
    #[serde(default)]
    pub pretty: bool,
}

// ---------------------------------------------------------------------------
// Runtime config (merged from config file + CLI flags)
// ---------------------------------------------------------------------------

/// Effect of a failed namespace lookup on the record's `namespace` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamespaceFailurePolicy {
    /// Keep the original value.
    #[default]
    Preserve,
    /// Overwrite it with `null`, matching legacy output.
    Legacy,
}

impl FromStr for NamespaceFailurePolicy {
    type Err = ItemEnrichError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "preserve" => Ok(Self::Preserve),
            "legacy" => Ok(Self::Legacy),
            other => Err(ItemEnrichError::config(format!(
                "unknown namespace failure policy '{other}' (expected preserve or legacy)"
            ))),
        }
    }
}

/// The four independent enrichment toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichFlags {
    pub namespace: bool,
    /// Only consulted when `namespace` is set and its lookup succeeded.
    pub namespace_settings: bool,
    pub metadata: bool,
    pub settings: bool,
}

impl EnrichFlags {
    /// True when at least one lookup will run.
    pub fn any(&self) -> bool {
        self.namespace || self.metadata || self.settings
    }

    /// Field-wise OR: a set flag on either side stays set.
    pub fn union(self, other: EnrichFlags) -> Self {
        Self {
            namespace: self.namespace || other.namespace,
            namespace_settings: self.namespace_settings || other.namespace_settings,
            metadata: self.metadata || other.metadata,
            settings: self.settings || other.settings,
        }
    }
}

impl From<&EnrichSection> for EnrichFlags {
    fn from(section: &EnrichSection) -> Self {
        Self {
            namespace: section.namespace,
            namespace_settings: section.namespace_settings,
            metadata: section.metadata,
            settings: section.settings,
        }
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub namespaces_url: Option<String>,
    pub items_url: Option<String>,
    pub flags: EnrichFlags,
    pub on_namespace_failure: Option<NamespaceFailurePolicy>,
}

/// Immutable enrichment configuration handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichConfig {
    namespaces_url: String,
    items_url: String,
    flags: EnrichFlags,
    on_namespace_failure: NamespaceFailurePolicy,
}

impl EnrichConfig {
    /// Build a config from two base URLs and the toggles.
    ///
    /// Both URLs must be absolute http(s) URLs. A trailing `/` is dropped.
    pub fn new(namespaces_url: &str, items_url: &str, flags: EnrichFlags) -> Result<Self> {
        Ok(Self {
            namespaces_url: validate_base_url("namespaces", namespaces_url)?,
            items_url: validate_base_url("items", items_url)?,
            flags,
            on_namespace_failure: NamespaceFailurePolicy::default(),
        })
    }

    pub fn with_namespace_failure(mut self, policy: NamespaceFailurePolicy) -> Self {
        self.on_namespace_failure = policy;
        self
    }

    pub fn flags(&self) -> EnrichFlags {
        self.flags
    }

    pub fn on_namespace_failure(&self) -> NamespaceFailurePolicy {
        self.on_namespace_failure
    }

    pub fn namespaces_url(&self) -> &str {
        &self.namespaces_url
    }

    pub fn items_url(&self) -> &str {
        &self.items_url
    }

    /// `GET {namespaces}/{namespace}`
    pub fn namespace_url(&self, namespace: &str) -> String {
        format!("{}/{namespace}", self.namespaces_url)
    }

    /// `GET {namespaces}/{namespace}/settings`
    pub fn namespace_settings_url(&self, namespace: &str) -> String {
        format!("{}/{namespace}/settings", self.namespaces_url)
    }

    /// `GET {items}/{id}/metadata`
    pub fn metadata_url(&self, id: &str) -> String {
        format!("{}/{id}/metadata", self.items_url)
    }

    /// `GET {items}/{id}/settings`
    pub fn item_settings_url(&self, id: &str) -> String {
        format!("{}/{id}/settings", self.items_url)
    }
}

impl AppConfig {
    /// Merge CLI/env overrides over this file config.
    pub fn resolve(&self, overrides: &ConfigOverrides) -> Result<EnrichConfig> {
        let namespaces_url = overrides
            .namespaces_url
            .as_deref()
            .or(self.services.namespaces_url.as_deref())
            .ok_or_else(|| {
                ItemEnrichError::config(
                    "namespaces URL is required (--namespaces-url or NAMESPACES_URL)",
                )
            })?;
        let items_url = overrides
            .items_url
            .as_deref()
            .or(self.services.items_url.as_deref())
            .ok_or_else(|| {
                ItemEnrichError::config("items URL is required (--items-url or ITEMS_URL)")
            })?;

        let flags = EnrichFlags::from(&self.enrich).union(overrides.flags);
        let policy = overrides
            .on_namespace_failure
            .unwrap_or(self.enrich.on_namespace_failure);

        Ok(EnrichConfig::new(namespaces_url, items_url, flags)?.with_namespace_failure(policy))
    }
}

fn validate_base_url(name: &str, raw: &str) -> Result<String> {
    let raw = raw.trim();
    let parsed = Url::parse(raw)
        .map_err(|e| ItemEnrichError::config(format!("invalid {name} URL '{raw}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(raw.trim_end_matches('/').to_string()),
        scheme => Err(ItemEnrichError::config(format!(
            "invalid {name} URL '{raw}': unsupported scheme '{scheme}'"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.itemenrich/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ItemEnrichError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.itemenrich/itemenrich.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the file config from its default location. Returns defaults if the
/// file does not exist or no home directory is known.
pub fn load_config() -> Result<AppConfig> {
    let Ok(path) = config_file_path() else {
        tracing::debug!("no home directory, using default config");
        return Ok(AppConfig::default());
    };

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the file config from a specific path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ItemEnrichError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ItemEnrichError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(ns: &str, items: &str) -> ConfigOverrides {
        ConfigOverrides {
            namespaces_url: Some(ns.into()),
            items_url: Some(items.into()),
            ..Default::default()
        }
    }

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("on_namespace_failure = \"preserve\""));
        assert!(toml_str.contains("pretty = false"));
    }

    #[test]
    fn config_from_toml() {
        let toml_str = r#"
[services]
namespaces_url = "http://ns.local/api/namespaces"
items_url = "http://items.local/api/items/"

[enrich]
metadata = true
on_namespace_failure = "legacy"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let resolved = config.resolve(&ConfigOverrides::default()).expect("resolve");

        assert_eq!(resolved.namespaces_url(), "http://ns.local/api/namespaces");
        assert_eq!(resolved.items_url(), "http://items.local/api/items");
        assert!(resolved.flags().metadata);
        assert!(!resolved.flags().namespace);
        assert_eq!(resolved.on_namespace_failure(), NamespaceFailurePolicy::Legacy);
    }

    #[test]
    fn overrides_win_over_file() {
        let mut config = AppConfig::default();
        config.services.namespaces_url = Some("http://file-ns.local".into());
        config.services.items_url = Some("http://file-items.local".into());
        config.enrich.on_namespace_failure = NamespaceFailurePolicy::Legacy;

        let mut cli = overrides("http://cli-ns.local", "http://cli-items.local");
        cli.flags.settings = true;
        cli.on_namespace_failure = Some(NamespaceFailurePolicy::Preserve);

        let resolved = config.resolve(&cli).expect("resolve");
        assert_eq!(resolved.namespaces_url(), "http://cli-ns.local");
        assert_eq!(resolved.items_url(), "http://cli-items.local");
        assert!(resolved.flags().settings);
        assert_eq!(
            resolved.on_namespace_failure(),
            NamespaceFailurePolicy::Preserve
        );
    }

    #[test]
    fn flags_are_ored_with_file() {
        let mut config = AppConfig::default();
        config.enrich.namespace = true;
        let mut cli = overrides("http://ns.local", "http://items.local");
        cli.flags.namespace_settings = true;

        let flags = config.resolve(&cli).expect("resolve").flags();
        assert!(flags.namespace);
        assert!(flags.namespace_settings);
        assert!(!flags.metadata);
        assert!(flags.any());
    }

    #[test]
    fn missing_urls_are_config_errors() {
        let err = AppConfig::default()
            .resolve(&ConfigOverrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("namespaces URL is required"));

        let cli = ConfigOverrides {
            namespaces_url: Some("http://ns.local".into()),
            ..Default::default()
        };
        let err = AppConfig::default().resolve(&cli).unwrap_err();
        assert!(err.to_string().contains("items URL is required"));
    }

    #[test]
    fn invalid_urls_are_rejected() {
        let err = EnrichConfig::new("not a url", "http://items.local", EnrichFlags::default())
            .unwrap_err();
        assert!(matches!(err, ItemEnrichError::Config { .. }));

        let err = EnrichConfig::new("ftp://ns.local", "http://items.local", EnrichFlags::default())
            .unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn lookup_urls() {
        let config = EnrichConfig::new(
            "http://ns.local/namespaces/",
            "http://items.local/items",
            EnrichFlags::default(),
        )
        .expect("config");

        assert_eq!(config.namespace_url("ns-a"), "http://ns.local/namespaces/ns-a");
        assert_eq!(
            config.namespace_settings_url("ns-a"),
            "http://ns.local/namespaces/ns-a/settings"
        );
        assert_eq!(config.metadata_url("1"), "http://items.local/items/1/metadata");
        assert_eq!(config.item_settings_url("1"), "http://items.local/items/1/settings");
    }

    #[test]
    fn policy_from_str() {
        assert_eq!(
            "preserve".parse::<NamespaceFailurePolicy>().unwrap(),
            NamespaceFailurePolicy::Preserve
        );
        assert_eq!(
            "legacy".parse::<NamespaceFailurePolicy>().unwrap(),
            NamespaceFailurePolicy::Legacy
        );
        assert!("clobber".parse::<NamespaceFailurePolicy>().is_err());
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let path = std::env::temp_dir().join("itemenrich-does-not-exist.toml");
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ItemEnrichError::Io { .. }));
    }
}
