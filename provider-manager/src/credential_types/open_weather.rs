//! API-key credentials for the OpenWeather API.
//!
//! Public configuration carries the API base URL; the private side holds
//! the key itself. OpenWeather authenticates via the `appid` query
//! parameter, so no auth headers are derived.

use crate::credential::{require_str, CredentialType};
use crate::error::PipelineError;
use contexta::model::CredentialsEntity;
use contexta::schema::{FieldSpec, Schema};

pub struct OpenWeatherCredentialType;

impl OpenWeatherCredentialType {
    /// The API key, from the validated private config.
    pub fn api_key(entity: &CredentialsEntity) -> Result<String, PipelineError> {
        require_str(&entity.private_data, "api_key", "OpenWeather credentials")
    }

    /// Base URL for API requests, from the public config.
    pub fn base_url(entity: &CredentialsEntity) -> Result<String, PipelineError> {
        require_str(&entity.public_data, "base_url", "OpenWeather credentials")
    }
}

impl CredentialType for OpenWeatherCredentialType {
    fn type_id(&self) -> &'static str {
        "open_weather"
    }

    fn display_name(&self) -> &'static str {
        "OpenWeather API Key"
    }

    fn public_schema(&self) -> Schema {
        Schema::object().field(
            FieldSpec::url("base_url")
                .title("Base URL")
                .placeholder("https://api.openweathermap.org/data/2.5"),
        )
    }

    fn private_schema(&self) -> Schema {
        Schema::object().field(
            FieldSpec::string("api_key")
                .min_len(1)
                .max_len(64)
                .title("API Key"),
        )
    }

    fn validate(&self, entity: &CredentialsEntity) -> Result<(), PipelineError> {
        self.public_schema()
            .validate(&serde_json::Value::Object(entity.public_data.clone()))?;
        self.private_schema()
            .validate(&serde_json::Value::Object(entity.private_data.clone()))?;

        // Real OpenWeather keys are 32 hex chars; anything shorter than 10
        // is certainly a paste error.
        let api_key = Self::api_key(entity)?;
        if api_key.len() < 10 {
            return Err(PipelineError::Configuration(
                "OpenWeather API key is too short".to_string(),
            ));
        }
        Ok(())
    }
}
