//! OpenWeatherMap current-weather adapter.
//!
//! One GET per call, an explicit request timeout, and no retries: failures
//! are logged and handed back to the caller unchanged.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use weather_core::{Config, Units};

use crate::error::WeatherSdkError;
use crate::types::{ApiErrorBody, ApiWeatherResponse, WeatherRecord};

const CURRENT_WEATHER_PATH: &str = "/data/2.5/weather";

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
    units: Option<Units>,
    lang: Option<String>,
}

impl WeatherProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WeatherSdkError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherSdkError::Client(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            units: None,
            lang: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, WeatherSdkError> {
        let mut provider = Self::new(&config.base_url, config.request_timeout())?;
        provider.units = config.units;
        provider.lang = config.lang.clone();
        Ok(provider)
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = Some(units);
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch current weather for `city`, authorized by `api_key`.
    ///
    /// The returned record carries the provider's canonical city name.
    #[instrument(skip(self, api_key), level = "info")]
    pub async fn fetch(&self, city: &str, api_key: &str) -> Result<WeatherRecord, WeatherSdkError> {
        match self.request(city, api_key).await {
            Ok(record) => {
                tracing::info!("Fetched weather for {} (reported as {})", city, record.name);
                Ok(record)
            }
            Err(e) => {
                tracing::error!("Weather request for {} failed: {}", city, e);
                Err(e)
            }
        }
    }

    async fn request(&self, city: &str, api_key: &str) -> Result<WeatherRecord, WeatherSdkError> {
        let url = format!("{}{}", self.base_url, CURRENT_WEATHER_PATH);

        let mut query: Vec<(&str, &str)> = vec![("q", city), ("appid", api_key)];
        if let Some(units) = self.units {
            query.push(("units", units.as_str()));
        }
        if let Some(lang) = self.lang.as_deref() {
            query.push(("lang", lang));
        }

        let response = self.client.get(&url).query(&query).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|body| body.message)
                .unwrap_or(text);
            return Err(WeatherSdkError::UpstreamHttp {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let api: ApiWeatherResponse = serde_json::from_str(&body)
            .map_err(|e| WeatherSdkError::InvalidResponse(format!("JSON parse error: {}", e)))?;

        WeatherRecord::try_from(api)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn weather_json(name: &str, dt: i64) -> serde_json::Value {
        serde_json::json!({
            "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
            "main": {"temp": 271.15, "feels_like": 268.4},
            "visibility": 10000,
            "wind": {"speed": 3.1},
            "dt": dt,
            "sys": {"sunrise": 1675751262, "sunset": 1675787560},
            "timezone": 10800,
            "name": name
        })
    }

    fn provider(server: &MockServer) -> WeatherProvider {
        WeatherProvider::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "minsk"))
            .and(query_param("appid", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weather_json("Minsk", 1700000000)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let record = provider(&mock_server).fetch("minsk", "test_key").await.unwrap();

        assert_eq!(record.name, "Minsk");
        assert_eq!(record.timezone, 10800);
        assert_eq!(record.datetime, 1700000000);
        assert_eq!(record.weather.main, "Clear");
    }

    #[tokio::test]
    async fn test_fetch_sends_units_and_lang() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("units", "metric"))
            .and(query_param("lang", "de"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weather_json("Berlin", 1700000000)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let record = provider(&mock_server)
            .with_units(Units::Metric)
            .with_lang("de")
            .fetch("Berlin", "test_key")
            .await
            .unwrap();

        assert_eq!(record.name, "Berlin");
    }

    #[tokio::test]
    async fn test_fetch_unauthorized_is_upstream_http() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "cod": 401,
                "message": "Invalid API key. Please see https://openweathermap.org/faq#error401 for more info."
            })))
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server).fetch("Minsk", "bad").await.unwrap_err();

        match err {
            WeatherSdkError::UpstreamHttp { status, message } => {
                assert_eq!(status, 401);
                assert!(message.starts_with("Invalid API key"));
            }
            other => panic!("expected UpstreamHttp, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_not_found_keeps_plain_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(404).set_body_string("city not found"))
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server).fetch("Atlantis", "k").await.unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("city not found"));
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server).fetch("Minsk", "k").await.unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_fetch_malformed_body_is_invalid_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": "Minsk"})))
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server).fetch("Minsk", "k").await.unwrap_err();
        assert!(matches!(err, WeatherSdkError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_unavailable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(weather_json("Minsk", 1700000000))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let provider = WeatherProvider::new(&mock_server.uri(), Duration::from_millis(50)).unwrap();
        let err = provider.fetch("Minsk", "k").await.unwrap_err();

        assert!(matches!(err, WeatherSdkError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_unavailable() {
        // Nothing listens on port 9 (discard) in the test environment
        let provider = WeatherProvider::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = provider.fetch("Minsk", "k").await.unwrap_err();

        assert!(matches!(err, WeatherSdkError::UpstreamUnavailable(_)));
        assert!(err.is_upstream());
    }

    #[test]
    fn test_from_config_trims_base_url() {
        let config = Config {
            base_url: "https://api.openweathermap.org/".to_string(),
            units: Some(Units::Imperial),
            ..Config::default()
        };
        let provider = WeatherProvider::from_config(&config).unwrap();

        assert_eq!(provider.base_url(), "https://api.openweathermap.org");
        assert_eq!(provider.units, Some(Units::Imperial));
    }
}
