//! Provider backend contract.
//!
//! A provider backend represents one external data source. It declares its
//! configuration schema, fetches raw records, maps them into the canonical
//! [`NormalizedRecord`] shape and hashes normalized payloads for version
//! detection. Implementations are stateless; the integration and its
//! credentials travel in the [`FetchContext`].
//!
//! # Failure semantics
//! Expected external failures (HTTP errors, timeouts) must be reported
//! through the audit hook on the context and answered with an empty batch.
//! Unexpected errors propagate and are contained per integration by the
//! orchestrator.

use crate::audit::AuditLogger;
use crate::error::PipelineError;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use contexta::model::{CredentialsEntity, Integration};
use contexta::schema::Schema;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Canonical shape the reconciler consumes.
///
/// `city` and `timestamp` are the required canonical fields; records
/// missing either are dropped by the orchestrator. Everything the
/// provider contributes beyond those lands in `extra`.
#[derive(Clone, Debug, Default)]
pub struct NormalizedRecord {
    pub city: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub extra: Map<String, Value>,
}

impl NormalizedRecord {
    /// True when both required canonical fields are present.
    pub fn is_complete(&self) -> bool {
        self.city.is_some() && self.timestamp.is_some()
    }

    /// JSON-safe payload: extra attributes plus `city` and `timestamp`
    /// (RFC 3339 string), suitable for persistence and audit logs.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut payload = self.extra.clone();
        if let Some(city) = &self.city {
            payload.insert("city".to_string(), Value::String(city.clone()));
        }
        if let Some(timestamp) = &self.timestamp {
            payload.insert(
                "timestamp".to_string(),
                Value::String(timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)),
            );
        }
        payload
    }
}

/// Everything a provider needs for one fetch pass.
pub struct FetchContext<'a> {
    pub integration: &'a Integration,
    pub credentials: Option<&'a CredentialsEntity>,
    pub audit: &'a AuditLogger,
}

#[async_trait]
pub trait ProviderBackend: Send + Sync {
    /// Stable identifier, persisted as `provider_backend_id` on stored
    /// integrations. Renaming it is a breaking migration.
    fn provider_id(&self) -> &'static str;

    /// Human-readable name for operator tooling.
    fn display_name(&self) -> &'static str;

    /// Classification used to build the event-type key.
    fn category(&self) -> &'static str {
        "unknown"
    }

    /// Credential type ids this provider accepts.
    fn allowed_credential_types(&self) -> &'static [&'static str] {
        &[]
    }

    /// Shape of provider-specific settings; rendered by configuration UIs
    /// and enforced on save.
    fn config_schema(&self) -> Schema;

    /// Fields that must be present in the raw configuration before the
    /// schema even runs.
    fn required_fields(&self) -> &'static [&'static str] {
        &[]
    }

    /// Template method: checks the required-field list, then the declared
    /// schema. Implementations may extend it with provider-specific rules.
    fn validate_config(&self, raw: &Value) -> Result<(), PipelineError> {
        let obj = raw.as_object().ok_or_else(|| {
            PipelineError::Configuration("provider configuration must be an object".to_string())
        })?;
        for field in self.required_fields() {
            if !obj.contains_key(*field) {
                return Err(PipelineError::Configuration(format!(
                    "required field '{}' not found",
                    field
                )));
            }
        }
        self.config_schema().validate(raw)?;
        Ok(())
    }

    /// Performs the external call(s) and returns raw records.
    async fn fetch(&self, ctx: &FetchContext<'_>) -> anyhow::Result<Vec<Value>>;

    /// Maps one raw record into the canonical shape.
    ///
    /// The default is a passthrough that copies the raw object into
    /// `extra` without claiming city or timestamp.
    fn normalize(&self, raw: &Value) -> Result<NormalizedRecord, PipelineError> {
        match raw.as_object() {
            Some(map) => Ok(NormalizedRecord {
                city: None,
                timestamp: None,
                extra: map.clone(),
            }),
            None => Err(PipelineError::Normalization(
                "raw record is not an object".to_string(),
            )),
        }
    }

    /// Deterministic content hash of a normalized record.
    ///
    /// Structurally equal payloads hash identically regardless of key
    /// insertion order.
    fn version_hash(&self, record: &NormalizedRecord) -> String {
        content_hash(&Value::Object(record.to_json()))
    }
}

/// SHA-256 over a canonical JSON encoding (object keys recursively
/// sorted).
pub fn content_hash(value: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(value, &mut canonical);
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(digest)
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_content_hash_is_key_order_invariant() {
        let a = json!({"b": 1, "a": {"y": true, "x": [1, 2]}});
        let b = json!({"a": {"x": [1, 2], "y": true}, "b": 1});
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn test_content_hash_differs_on_value_change() {
        let a = json!({"temperature": 22.5, "city": "São Paulo"});
        let b = json!({"temperature": 25.1, "city": "São Paulo"});
        assert_ne!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn test_content_hash_array_order_matters() {
        assert_ne!(
            content_hash(&json!([1, 2, 3])),
            content_hash(&json!([3, 2, 1]))
        );
    }

    #[test]
    fn test_record_completeness() {
        let mut record = NormalizedRecord::default();
        assert!(!record.is_complete());
        record.city = Some("Recife".to_string());
        assert!(!record.is_complete());
        record.timestamp = Some(Utc.with_ymd_and_hms(2026, 6, 10, 12, 0, 0).unwrap());
        assert!(record.is_complete());
    }

    #[test]
    fn test_to_json_serializes_timestamp_as_rfc3339() {
        let record = NormalizedRecord {
            city: Some("Recife".to_string()),
            timestamp: Some(Utc.with_ymd_and_hms(2026, 6, 10, 12, 0, 0).unwrap()),
            extra: Map::new(),
        };
        let payload = record.to_json();
        assert_eq!(payload["city"], json!("Recife"));
        assert_eq!(payload["timestamp"], json!("2026-06-10T12:00:00Z"));
    }
}
