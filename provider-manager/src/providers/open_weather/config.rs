use crate::error::PipelineError;
use serde::Deserialize;
use serde_json::{Map, Value};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Supported response languages, as (id, display name) pairs.
pub const LANGUAGES: &[(&str, &str)] = &[("pt_br", "Português (Brasil)"), ("en_us", "English")];

/// Per-integration settings for the OpenWeather backend.
#[derive(Debug, Deserialize)]
pub struct OpenWeatherConfig {
    pub language: String,
    pub city: String,
}

impl OpenWeatherConfig {
    /// Deserialize from a stored `provider_config` object.
    ///
    /// The object has already passed schema validation on save; a decode
    /// failure here means the stored row predates the current schema.
    pub fn from_map(config: &Map<String, Value>) -> Result<Self, PipelineError> {
        serde_json::from_value(Value::Object(config.clone())).map_err(|e| {
            PipelineError::Configuration(format!("invalid OpenWeather configuration: {}", e))
        })
    }

    /// Language code in the form the OpenWeather API expects.
    pub fn api_language(&self) -> &str {
        match self.language.as_str() {
            "en_us" => "en",
            other => other,
        }
    }
}

pub fn language_ids() -> Vec<String> {
    LANGUAGES.iter().map(|(id, _)| id.to_string()).collect()
}
