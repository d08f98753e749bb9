//! Save-time validation of operator-edited records.
//!
//! These checks run before a credentials entity or integration is
//! persisted, so the fetch pipeline only ever sees rows that resolve to a
//! registered plugin and satisfy its declared schemas.

use crate::error::PipelineError;
use crate::registry::Registry;
use contexta::model::{CredentialsEntity, Integration};
use serde_json::Value;

/// Validates a credentials entity against its registered type.
///
/// An unknown `credentials_type_id` is a registry error; schema and
/// type-specific violations surface as configuration errors.
pub fn validate_credentials_entity(
    registry: &Registry,
    entity: &CredentialsEntity,
) -> Result<(), PipelineError> {
    let credential_type = registry.require_credential_type(&entity.credentials_type_id)?;
    credential_type.validate(entity)
}

/// Validates an integration against its registered provider backend.
///
/// Checks, in order: the backend exists, the provider configuration
/// passes the backend's contract, and any attached credentials are of a
/// type the backend accepts (and themselves valid). `credentials` is the
/// resolved entity for `integration.credentials_uid`, if one is set.
pub fn validate_integration(
    registry: &Registry,
    integration: &Integration,
    credentials: Option<&CredentialsEntity>,
) -> Result<(), PipelineError> {
    let provider = registry.require_provider(&integration.provider_backend_id)?;
    provider.validate_config(&Value::Object(integration.provider_config.clone()))?;

    match (integration.credentials_uid, credentials) {
        (Some(uid), None) => Err(PipelineError::Configuration(format!(
            "integration '{}' references credentials {} which do not exist",
            integration.handle, uid
        ))),
        (_, Some(entity)) => {
            let allowed = provider.allowed_credential_types();
            if !allowed.is_empty() && !allowed.contains(&entity.credentials_type_id.as_str()) {
                return Err(PipelineError::Configuration(format!(
                    "provider '{}' does not accept credentials of type '{}'",
                    integration.provider_backend_id, entity.credentials_type_id
                )));
            }
            validate_credentials_entity(registry, entity)
        }
        (None, None) => Ok(()),
    }
}
