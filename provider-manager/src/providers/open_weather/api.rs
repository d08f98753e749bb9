use anyhow::{anyhow, Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// HTTP client for the OpenWeather current-weather API.
///
/// Authenticates via the `appid` query parameter. The key is never
/// written to logs or error messages.
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http_client: Client,
}

impl OpenWeatherClient {
    /// Create a client for the given base URL (the stored credentials
    /// carry the URL, so tests can point it at a mock server).
    pub fn new(api_key: String, base_url: String) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            api_key,
            base_url,
            http_client,
        }
    }

    /// Fetch current weather for a city, as the raw response object.
    pub async fn fetch_current(&self, city: &str, language: &str) -> Result<Value> {
        let url = format!("{}/weather", self.base_url.trim_end_matches('/'));
        let response = self
            .http_client
            .get(&url)
            .query(&[("appid", self.api_key.as_str()), ("q", city), ("lang", language)])
            .send()
            .await
            .context("Failed to send current-weather request")?;

        check_response_status(&response, city)?;
        response
            .json::<Value>()
            .await
            .context("Failed to parse current-weather response")
    }
}

/// Map known OpenWeather error codes to descriptive errors.
///
/// - 401 → invalid or inactive API key
/// - 404 → unknown city
/// - 429 → rate limit
/// - Other non-2xx → generic API error
fn check_response_status(response: &reqwest::Response, city: &str) -> Result<()> {
    match response.status() {
        StatusCode::UNAUTHORIZED => Err(anyhow!(
            "OpenWeather auth error: API key invalid or not yet activated"
        )),
        StatusCode::NOT_FOUND => Err(anyhow!("OpenWeather: city '{}' not found", city)),
        StatusCode::TOO_MANY_REQUESTS => Err(anyhow!("OpenWeather rate limit exceeded")),
        s if !s.is_success() => Err(anyhow!("OpenWeather API error: {}", s)),
        _ => Ok(()),
    }
}
