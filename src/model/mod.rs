//! Canonical entities of the ingestion pipeline.
//!
//! These mirror the relational tables the store manages: credential
//! bundles, configured integrations, deduplicated events, versioned data
//! snapshots, and append-only audit log entries. Free-form attribute maps
//! are JSON objects; timestamps are UTC and serialize as RFC 3339.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A named, typed bundle of authentication material.
///
/// `credentials_type_id` keys into the plugin registry. `public_data` holds
/// non-secret settings (e.g. a base URL); `private_data` holds secrets and
/// is encrypted at rest by the store. Health fields are mutated only by the
/// pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CredentialsEntity {
    pub uid: Uuid,
    pub name: String,
    /// Unique short handle, used in operator tooling.
    pub handle: String,
    pub credentials_type_id: String,
    pub public_data: Map<String, Value>,
    pub private_data: Map<String, Value>,
    pub is_active: bool,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl CredentialsEntity {
    pub fn new(
        name: &str,
        handle: &str,
        credentials_type_id: &str,
        public_data: Map<String, Value>,
        private_data: Map<String, Value>,
    ) -> Self {
        Self {
            uid: Uuid::new_v4(),
            name: name.to_string(),
            handle: handle.to_string(),
            credentials_type_id: credentials_type_id.to_string(),
            public_data,
            private_data,
            is_active: false,
            last_checked_at: None,
            last_success_at: None,
            last_error_at: None,
            last_error: None,
        }
    }
}

/// A configured instance of a provider backend.
///
/// `provider_backend_id` keys into the plugin registry; `provider_config`
/// is validated against that backend's declared schema on save.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Integration {
    pub uid: Uuid,
    pub name: String,
    /// Globally unique handle, used in URLs and references.
    pub handle: String,
    pub provider_backend_id: String,
    pub provider_config: Map<String, Value>,
    pub credentials_uid: Option<Uuid>,
    pub is_active: bool,
    /// When false, the pipeline writes no audit log entries for this
    /// integration.
    pub enable_logging: bool,
}

impl Integration {
    pub fn new(
        name: &str,
        handle: &str,
        provider_backend_id: &str,
        provider_config: Map<String, Value>,
    ) -> Self {
        Self {
            uid: Uuid::new_v4(),
            name: name.to_string(),
            handle: handle.to_string(),
            provider_backend_id: provider_backend_id.to_string(),
            provider_config,
            credentials_uid: None,
            is_active: false,
            enable_logging: true,
        }
    }
}

/// A deduplicated, canonical occurrence.
///
/// The tuple (event_type, event_date, location, city) identifies a unique
/// logical event; the reconciler updates `category` and `extra_fields` in
/// place on re-match instead of creating a duplicate row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub uid: Uuid,
    /// Integration that first created the event, if any.
    pub integration_uid: Option<Uuid>,
    pub event_type: String,
    pub event_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub extra_fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

/// One immutable, versioned data snapshot for an (event, integration) pair.
///
/// Versions start at 1 and increase without gaps per pair. `extra_fields`
/// carries the normalized payload plus its `data_hash`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataRecord {
    pub uid: Uuid,
    pub event_uid: Uuid,
    pub integration_uid: Uuid,
    pub version: u32,
    pub fetched_at: DateTime<Utc>,
    pub extra_fields: Map<String, Value>,
}

impl DataRecord {
    /// Content hash of the normalized payload this snapshot was built from.
    pub fn data_hash(&self) -> Option<&str> {
        self.extra_fields.get("data_hash").and_then(Value::as_str)
    }
}

/// Pipeline phase an audit log entry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogMethod {
    Fetch,
    Consume,
    Import,
}

impl LogMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogMethod::Fetch => "fetch",
            LogMethod::Consume => "consume",
            LogMethod::Import => "import",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fetch" => Some(LogMethod::Fetch),
            "consume" => Some(LogMethod::Consume),
            "import" => Some(LogMethod::Import),
            _ => None,
        }
    }
}

/// Append-only audit record of one orchestration attempt.
///
/// Request/response payloads are JSON-safe (datetimes already serialized
/// as RFC 3339 strings by the producer).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntegrationLog {
    pub uid: Uuid,
    pub integration_uid: Uuid,
    pub success: bool,
    pub error: bool,
    pub message: String,
    pub method: LogMethod,
    pub records_imported: u32,
    pub request_data: Value,
    pub response_data: Value,
    pub timestamp: DateTime<Utc>,
}

impl IntegrationLog {
    pub fn new(
        integration_uid: Uuid,
        success: bool,
        message: &str,
        method: LogMethod,
        records_imported: u32,
        request_data: Value,
        response_data: Value,
    ) -> Self {
        Self {
            uid: Uuid::new_v4(),
            integration_uid,
            success,
            error: !success,
            message: message.to_string(),
            method,
            records_imported,
            request_data,
            response_data,
            timestamp: Utc::now(),
        }
    }
}
