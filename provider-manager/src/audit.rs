//! Fail-safe audit logging.
//!
//! Every orchestration attempt that matters operationally produces exactly
//! one [`IntegrationLog`] row, unless the integration has logging disabled.
//! A failed log write is reported to the tracing channel and swallowed; it
//! must never abort the pipeline.

use contexta::model::{Integration, IntegrationLog, LogMethod};
use contexta::store::ContextStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

/// One audit entry to be written for an integration.
#[derive(Clone, Debug)]
pub struct LogEntry {
    pub success: bool,
    pub message: String,
    pub method: LogMethod,
    pub records_imported: u32,
    pub request_data: Value,
    pub response_data: Value,
}

impl LogEntry {
    pub fn success(message: &str, method: LogMethod) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            method,
            records_imported: 0,
            request_data: json!({}),
            response_data: json!({}),
        }
    }

    pub fn failure(message: &str, method: LogMethod) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            method,
            records_imported: 0,
            request_data: json!({}),
            response_data: json!({}),
        }
    }

    pub fn records(mut self, count: u32) -> Self {
        self.records_imported = count;
        self
    }

    pub fn request(mut self, data: Value) -> Self {
        self.request_data = data;
        self
    }

    pub fn response(mut self, data: Value) -> Self {
        self.response_data = data;
        self
    }
}

/// Writes audit entries through the store.
pub struct AuditLogger {
    store: Arc<ContextStore>,
}

impl AuditLogger {
    pub fn new(store: Arc<ContextStore>) -> Self {
        Self { store }
    }

    /// Persists one audit entry for `integration`.
    ///
    /// No-op when the integration has `enable_logging = false`. Write
    /// failures are reported via `tracing::error!` only.
    pub fn save(&self, integration: &Integration, entry: LogEntry) {
        if !integration.enable_logging {
            return;
        }

        let log = IntegrationLog::new(
            integration.uid,
            entry.success,
            &entry.message,
            entry.method,
            entry.records_imported,
            entry.request_data,
            entry.response_data,
        );

        if let Err(e) = self.store.insert_log(&log) {
            error!(
                integration = %integration.handle,
                error = %e,
                "Failed to write audit log entry"
            );
        }
    }
}
