//! Error taxonomy for the ingestion pipeline.
//!
//! Each variant maps to a containment boundary: configuration and registry
//! errors surface to the operator at save time, fetch errors are contained
//! per integration, normalization and reconciliation errors per record.

use contexta::schema::SchemaError;
use std::fmt;

#[derive(Debug)]
pub enum PipelineError {
    /// Credentials or provider configuration is missing or failed its
    /// schema; surfaced to the operator, never silently defaulted.
    Configuration(String),
    /// A registry identifier did not resolve, or was registered twice.
    Registry(String),
    /// An external provider call failed.
    Fetch(String),
    /// A raw record could not be mapped into the canonical shape.
    Normalization(String),
    /// Creating or versioning an Event/Data row failed.
    Reconciliation(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            PipelineError::Registry(msg) => write!(f, "registry error: {}", msg),
            PipelineError::Fetch(msg) => write!(f, "fetch error: {}", msg),
            PipelineError::Normalization(msg) => write!(f, "normalization error: {}", msg),
            PipelineError::Reconciliation(msg) => write!(f, "reconciliation error: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<SchemaError> for PipelineError {
    fn from(err: SchemaError) -> Self {
        PipelineError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contexta::schema::{FieldSpec, Schema};
    use serde_json::json;

    #[test]
    fn test_schema_error_converts_to_configuration() {
        let schema = Schema::object().field(FieldSpec::string("city"));
        let err: PipelineError = schema.validate(&json!({})).unwrap_err().into();
        match &err {
            PipelineError::Configuration(msg) => assert!(msg.contains("city")),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_display_prefixes() {
        assert!(PipelineError::Fetch("timeout".into())
            .to_string()
            .starts_with("fetch error"));
        assert!(PipelineError::Registry("unknown provider".into())
            .to_string()
            .starts_with("registry error"));
    }
}
