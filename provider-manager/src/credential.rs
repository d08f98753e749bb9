//! Credential type contract.
//!
//! A credential type describes how a provider authenticates: which fields
//! its public and private configuration carry, how to validate them, and
//! which derived artifacts (e.g. auth headers) it can produce. Instances
//! are stateless; the [`CredentialsEntity`] under validation is always
//! passed in, so one registered instance serves every stored credential of
//! its type.

use crate::error::PipelineError;
use contexta::model::CredentialsEntity;
use contexta::schema::Schema;
use serde_json::{Map, Value};
use std::collections::HashMap;

pub trait CredentialType: Send + Sync {
    /// Stable identifier, persisted as `credentials_type_id` on stored
    /// entities. Renaming it is a breaking migration.
    fn type_id(&self) -> &'static str;

    /// Human-readable name for operator tooling.
    fn display_name(&self) -> &'static str;

    /// Schema of the non-secret configuration (e.g. base URL).
    fn public_schema(&self) -> Schema;

    /// Schema of the secret configuration (e.g. API key).
    fn private_schema(&self) -> Schema;

    /// Validates a stored entity against both schemas.
    ///
    /// Concrete types may extend this with checks the schemas cannot
    /// express (key length heuristics, live probes).
    fn validate(&self, entity: &CredentialsEntity) -> Result<(), PipelineError> {
        self.public_schema()
            .validate(&Value::Object(entity.public_data.clone()))?;
        self.private_schema()
            .validate(&Value::Object(entity.private_data.clone()))?;
        Ok(())
    }

    /// Authentication headers for outbound calls. Most types that
    /// authenticate via query parameters keep the default empty mapping.
    fn auth_headers(
        &self,
        _entity: &CredentialsEntity,
    ) -> Result<HashMap<String, String>, PipelineError> {
        Ok(HashMap::new())
    }
}

/// Reads a declared string field from a config object.
///
/// Absence is a ConfigurationError naming the field, never a silent
/// default or a missing-attribute failure at call time.
pub fn require_str(
    config: &Map<String, Value>,
    field: &str,
    owner: &str,
) -> Result<String, PipelineError> {
    config
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            PipelineError::Configuration(format!(
                "{} is missing required field '{}'",
                owner, field
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_require_str_present() {
        let mut config = Map::new();
        config.insert("api_key".to_string(), json!("0123456789"));
        assert_eq!(
            require_str(&config, "api_key", "test credentials").unwrap(),
            "0123456789"
        );
    }

    #[test]
    fn test_require_str_missing_names_field_and_owner() {
        let err = require_str(&Map::new(), "api_key", "OpenWeather credentials").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("api_key"));
        assert!(msg.contains("OpenWeather credentials"));
    }

    #[test]
    fn test_require_str_wrong_type_is_missing() {
        let mut config = Map::new();
        config.insert("api_key".to_string(), json!(42));
        assert!(require_str(&config, "api_key", "test").is_err());
    }
}
