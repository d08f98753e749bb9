//! Plugin registry.
//!
//! Implementations are registered explicitly during a bounded startup
//! phase — [`Registry::builtin`] enumerates every first-party plugin in
//! one place — and the registry is read-only afterwards, so it can be
//! shared across worker tasks in an `Arc` without locking. Tests build
//! isolated instances with [`Registry::new`].

use crate::credential::CredentialType;
use crate::error::PipelineError;
use crate::provider::ProviderBackend;
use std::collections::HashMap;
use std::sync::Arc;

use crate::credential_types::open_weather::OpenWeatherCredentialType;
use crate::providers::open_weather::OpenWeatherProvider;

#[derive(Default)]
pub struct Registry {
    credential_types: HashMap<&'static str, Arc<dyn CredentialType>>,
    providers: HashMap<&'static str, Arc<dyn ProviderBackend>>,
}

impl Registry {
    /// Empty registry, mainly for tests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with all first-party plugins registered.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register_credential_type(Arc::new(OpenWeatherCredentialType))
            .expect("builtin credential type ids are unique");
        registry
            .register_provider(Arc::new(OpenWeatherProvider))
            .expect("builtin provider ids are unique");
        registry
    }

    /// Registers a credential type; re-registering an id is an error.
    pub fn register_credential_type(
        &mut self,
        credential_type: Arc<dyn CredentialType>,
    ) -> Result<(), PipelineError> {
        let id = credential_type.type_id();
        if self.credential_types.contains_key(id) {
            return Err(PipelineError::Registry(format!(
                "credential type '{}' is already registered",
                id
            )));
        }
        self.credential_types.insert(id, credential_type);
        Ok(())
    }

    /// Registers a provider backend; re-registering an id is an error.
    pub fn register_provider(
        &mut self,
        provider: Arc<dyn ProviderBackend>,
    ) -> Result<(), PipelineError> {
        let id = provider.provider_id();
        if self.providers.contains_key(id) {
            return Err(PipelineError::Registry(format!(
                "provider backend '{}' is already registered",
                id
            )));
        }
        self.providers.insert(id, provider);
        Ok(())
    }

    pub fn credential_type(&self, id: &str) -> Option<Arc<dyn CredentialType>> {
        self.credential_types.get(id).cloned()
    }

    pub fn provider(&self, id: &str) -> Option<Arc<dyn ProviderBackend>> {
        self.providers.get(id).cloned()
    }

    /// Lookup that turns an unknown id into a RegistryError, for callers
    /// resolving persisted identifiers.
    pub fn require_credential_type(
        &self,
        id: &str,
    ) -> Result<Arc<dyn CredentialType>, PipelineError> {
        self.credential_type(id).ok_or_else(|| {
            PipelineError::Registry(format!("unknown credential type '{}'", id))
        })
    }

    pub fn require_provider(&self, id: &str) -> Result<Arc<dyn ProviderBackend>, PipelineError> {
        self.provider(id).ok_or_else(|| {
            PipelineError::Registry(format!("unknown provider backend '{}'", id))
        })
    }

    /// (id, display name) pairs for configuration UIs, sorted by display
    /// name, with a leading "none selected" sentinel.
    pub fn credential_type_choices(&self) -> Vec<(String, String)> {
        let mut choices: Vec<(String, String)> = self
            .credential_types
            .values()
            .map(|ct| (ct.type_id().to_string(), ct.display_name().to_string()))
            .collect();
        choices.sort_by(|a, b| a.1.cmp(&b.1));
        choices.insert(
            0,
            (String::new(), "Select a credential type".to_string()),
        );
        choices
    }

    pub fn provider_choices(&self) -> Vec<(String, String)> {
        let mut choices: Vec<(String, String)> = self
            .providers
            .values()
            .map(|p| (p.provider_id().to_string(), p.display_name().to_string()))
            .collect();
        choices.sort_by(|a, b| a.1.cmp(&b.1));
        choices.insert(0, (String::new(), "Select a provider backend".to_string()));
        choices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registers_open_weather() {
        let registry = Registry::builtin();
        let provider = registry.provider("open_weather").unwrap();
        assert_eq!(provider.display_name(), "OpenWeather API");
        assert_eq!(provider.category(), "weather");

        let credential_type = registry.credential_type("open_weather").unwrap();
        assert_eq!(credential_type.display_name(), "OpenWeather API Key");
    }

    #[test]
    fn test_unknown_id_is_none_not_a_panic() {
        let registry = Registry::builtin();
        assert!(registry.provider("no_such_provider").is_none());
        assert!(registry.credential_type("no_such_type").is_none());

        let err = registry.require_provider("no_such_provider").err().unwrap();
        assert!(err.to_string().contains("no_such_provider"));
    }

    #[test]
    fn test_duplicate_registration_is_an_error() {
        let mut registry = Registry::builtin();
        let result = registry.register_provider(Arc::new(OpenWeatherProvider));
        assert!(result.is_err());
        let result = registry.register_credential_type(Arc::new(OpenWeatherCredentialType));
        assert!(result.is_err());
    }

    #[test]
    fn test_choices_are_sorted_with_sentinel() {
        let registry = Registry::builtin();

        let choices = registry.provider_choices();
        assert_eq!(choices[0].0, "");
        assert!(choices[0].1.starts_with("Select"));
        assert_eq!(choices[1].0, "open_weather");

        let names: Vec<&String> = choices.iter().skip(1).map(|(_, name)| name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_isolated_registry_starts_empty() {
        let registry = Registry::new();
        assert!(registry.provider("open_weather").is_none());
        assert_eq!(registry.provider_choices().len(), 1);
    }
}
