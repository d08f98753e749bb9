//! OpenWeather provider — polls the current-weather endpoint for one
//! configured city and emits versioned weather snapshots.

pub mod api;
pub mod config;

use crate::audit::LogEntry;
use crate::credential_types::open_weather::OpenWeatherCredentialType;
use crate::error::PipelineError;
use crate::provider::{FetchContext, NormalizedRecord, ProviderBackend};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contexta::model::LogMethod;
use contexta::schema::{FieldSpec, Schema};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::warn;

use self::api::OpenWeatherClient;
use self::config::{language_ids, OpenWeatherConfig};

/// Main measurement block of a current-weather response.
#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: Option<f64>,
    humidity: Option<f64>,
}

/// One weather condition entry.
#[derive(Debug, Deserialize)]
struct WeatherBlock {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SysBlock {
    country: Option<String>,
}

/// Typed view of the fields we keep from a current-weather response.
#[derive(Debug, Deserialize)]
struct CurrentWeather {
    name: Option<String>,
    dt: Option<i64>,
    main: Option<MainBlock>,
    #[serde(default)]
    weather: Vec<WeatherBlock>,
    sys: Option<SysBlock>,
}

pub struct OpenWeatherProvider;

#[async_trait]
impl ProviderBackend for OpenWeatherProvider {
    fn provider_id(&self) -> &'static str {
        "open_weather"
    }

    fn display_name(&self) -> &'static str {
        "OpenWeather API"
    }

    fn category(&self) -> &'static str {
        "weather"
    }

    fn allowed_credential_types(&self) -> &'static [&'static str] {
        &["open_weather"]
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["language", "city"]
    }

    fn config_schema(&self) -> Schema {
        let languages: Vec<String> = language_ids();
        let language_refs: Vec<&str> = languages.iter().map(String::as_str).collect();
        Schema::object()
            .field(
                FieldSpec::enumeration("language", &language_refs)
                    .title("Language")
                    .help_text("Language of weather descriptions in API responses"),
            )
            .field(
                FieldSpec::string("city")
                    .min_len(1)
                    .max_len(100)
                    .title("City")
                    .placeholder("São Paulo"),
            )
    }

    async fn fetch(&self, ctx: &FetchContext<'_>) -> anyhow::Result<Vec<Value>> {
        let config = OpenWeatherConfig::from_map(&ctx.integration.provider_config)?;
        let credentials = ctx.credentials.ok_or_else(|| {
            anyhow!(
                "integration '{}' has no credentials attached",
                ctx.integration.handle
            )
        })?;
        let api_key = OpenWeatherCredentialType::api_key(credentials)?;
        let base_url = OpenWeatherCredentialType::base_url(credentials)?;

        let client = OpenWeatherClient::new(api_key, base_url);
        let request_data = json!({"city": config.city, "language": config.api_language()});

        match client
            .fetch_current(&config.city, config.api_language())
            .await
        {
            Ok(raw) => {
                ctx.audit.save(
                    ctx.integration,
                    LogEntry::success("Weather data fetched.", LogMethod::Fetch)
                        .records(1)
                        .request(request_data)
                        .response(raw.clone()),
                );
                Ok(vec![raw])
            }
            Err(e) => {
                // External failures are expected: record them and let the
                // run continue with an empty batch.
                warn!(
                    integration = %ctx.integration.handle,
                    error = %e,
                    "OpenWeather fetch failed"
                );
                ctx.audit.save(
                    ctx.integration,
                    LogEntry::failure(&format!("Weather fetch failed: {}", e), LogMethod::Fetch)
                        .request(request_data),
                );
                Ok(Vec::new())
            }
        }
    }

    fn normalize(&self, raw: &Value) -> Result<NormalizedRecord, PipelineError> {
        let weather: CurrentWeather = serde_json::from_value(raw.clone()).map_err(|e| {
            PipelineError::Normalization(format!("unexpected OpenWeather response shape: {}", e))
        })?;

        let mut extra = Map::new();
        if let Some(main) = &weather.main {
            if let Some(temp) = main.temp {
                extra.insert("temperature".to_string(), json!(temp));
            }
            if let Some(humidity) = main.humidity {
                extra.insert("humidity".to_string(), json!(humidity));
            }
        }
        if let Some(description) = weather
            .weather
            .first()
            .and_then(|w| w.description.as_deref())
        {
            extra.insert("weather".to_string(), json!(description));
        }
        if let Some(country) = weather.sys.as_ref().and_then(|s| s.country.as_deref()) {
            extra.insert("country".to_string(), json!(country));
        }

        let timestamp = weather
            .dt
            .and_then(|epoch| DateTime::<Utc>::from_timestamp(epoch, 0));

        Ok(NormalizedRecord {
            city: weather.name,
            timestamp,
            extra,
        })
    }
}
