//! Record data model: the JSON objects flowing through the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ItemEnrichError, Result};

/// A JSON object with string keys, in document order.
pub type JsonObject = Map<String, Value>;

/// Field holding the namespace key, replaced by the fetched namespace.
pub const NAMESPACE_FIELD: &str = "namespace";
/// Field holding the item identifier.
pub const ID_FIELD: &str = "id";
/// Field set from the items service metadata lookup.
pub const METADATA_FIELD: &str = "metadata";
/// Field set from a settings lookup (record or namespace).
pub const SETTINGS_FIELD: &str = "settings";

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One element of the input array.
///
/// Records are open-ended: only `namespace` and `id` are read, and only to
/// build lookup URLs. Everything else passes through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(JsonObject);

impl Record {
    pub fn new(fields: JsonObject) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn fields(&self) -> &JsonObject {
        &self.0
    }

    pub fn into_fields(self) -> JsonObject {
        self.0
    }

    /// URL path segment for the namespace lookup, if the field is usable.
    pub fn namespace_key(&self) -> Option<String> {
        lookup_segment(self.0.get(NAMESPACE_FIELD))
    }

    /// URL path segment for the metadata/settings lookups, if the field is usable.
    pub fn id_key(&self) -> Option<String> {
        lookup_segment(self.0.get(ID_FIELD))
    }

    /// Replace the `namespace` field with the fetched namespace object.
    pub fn set_namespace(&mut self, namespace: Namespace) {
        self.0
            .insert(NAMESPACE_FIELD.to_string(), Value::Object(namespace.0));
    }

    /// Overwrite the `namespace` field with JSON `null`.
    pub fn clear_namespace(&mut self) {
        self.0.insert(NAMESPACE_FIELD.to_string(), Value::Null);
    }

    pub fn set_metadata(&mut self, metadata: Vec<JsonObject>) {
        self.0.insert(METADATA_FIELD.to_string(), list_value(metadata));
    }

    pub fn set_settings(&mut self, settings: Vec<JsonObject>) {
        self.0.insert(SETTINGS_FIELD.to_string(), list_value(settings));
    }
}

// ---------------------------------------------------------------------------
// Namespace
// ---------------------------------------------------------------------------

/// Object returned by the namespace service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(JsonObject);

impl Namespace {
    pub fn new(fields: JsonObject) -> Self {
        Self(fields)
    }

    /// Attach the namespace settings list under `settings`.
    pub fn with_settings(mut self, settings: Vec<JsonObject>) -> Self {
        self.0.insert(SETTINGS_FIELD.to_string(), list_value(settings));
        self
    }
}

// ---------------------------------------------------------------------------
// EnrichStep
// ---------------------------------------------------------------------------

/// The four remote lookups a record can go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnrichStep {
    Namespace,
    NamespaceSettings,
    Metadata,
    Settings,
}

impl EnrichStep {
    pub const ALL: [EnrichStep; 4] = [
        Self::Namespace,
        Self::NamespaceSettings,
        Self::Metadata,
        Self::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Namespace => "namespace",
            Self::NamespaceSettings => "namespace_settings",
            Self::Metadata => "metadata",
            Self::Settings => "settings",
        }
    }
}

impl std::fmt::Display for EnrichStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Input / output
// ---------------------------------------------------------------------------

/// Parse the input document: a JSON array of objects.
pub fn parse_records(input: &str) -> Result<Vec<Record>> {
    serde_json::from_str(input)
        .map_err(|e| ItemEnrichError::parse(format!("input is not a JSON array of objects: {e}")))
}

/// Serialize the record collection as one JSON array.
pub fn render_records(records: &[Record], pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(records)
    } else {
        serde_json::to_string(records)
    };
    rendered.map_err(|e| ItemEnrichError::parse(format!("failed to serialize records: {e}")))
}

fn list_value(items: Vec<JsonObject>) -> Value {
    Value::Array(items.into_iter().map(Value::Object).collect())
}

/// Strings and numbers become path segments; any other shape is unusable.
fn lookup_segment(value: Option<&Value>) -> Option<String> {
    match value? {
        // An empty key would address the collection root (`{base}/`), not a record.
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
