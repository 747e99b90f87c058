//! SDK instance handle and the weather query.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use weather_core::Mode;

use crate::cache::{CacheInsert, WeatherCache};
use crate::error::WeatherSdkError;
use crate::provider::WeatherProvider;
use crate::registry::RegistryInner;
use crate::types::{WeatherRecord, WeatherResponse};

/// A registered SDK instance.
///
/// Handles are cheap to clone. A handle keeps working after its key is
/// deleted from the registry; deletion only frees the key.
#[derive(Clone)]
pub struct WeatherSdk {
    id: u64,
    key: String,
    api_key: String,
    mode: Mode,
    cache: Arc<WeatherCache>,
    provider: WeatherProvider,
    registry: Weak<RegistryInner>,
}

impl std::fmt::Debug for WeatherSdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherSdk")
            .field("key", &self.key)
            .field("api_key", &"<redacted>")
            .field("mode", &self.mode)
            .finish()
    }
}

impl WeatherSdk {
    pub(crate) fn new(
        id: u64,
        key: String,
        api_key: String,
        mode: Mode,
        cache: Arc<WeatherCache>,
        provider: WeatherProvider,
        registry: Weak<RegistryInner>,
    ) -> Self {
        Self {
            id,
            key,
            api_key,
            mode,
            cache,
            provider,
            registry,
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Remove this instance from the registry that created it.
    ///
    /// Fails with `InstanceNotFound` if the key was already deleted, even when
    /// another instance has since been registered under it.
    pub fn delete(self) -> Result<(), WeatherSdkError> {
        match self.registry.upgrade() {
            Some(registry) => registry.remove_instance(&self.key, self.id),
            None => Err(WeatherSdkError::InstanceNotFound(self.key)),
        }
    }

    /// Query weather according to the instance mode.
    ///
    /// * `on_demand`: `city` is required; returns one record, served from
    ///   cache while fresh.
    /// * `polling`: `city` is validated but otherwise unused; refreshes every
    ///   stale cached city and returns the whole cache.
    pub async fn get_weather(&self, city: Option<&str>) -> Result<WeatherResponse, WeatherSdkError> {
        let city = city.map(validate_city).transpose()?;

        match self.mode {
            Mode::OnDemand => {
                let city = city.ok_or_else(|| {
                    WeatherSdkError::InvalidArgument(
                        "a city name is required in on_demand mode".to_string(),
                    )
                })?;
                self.on_demand(city).await.map(WeatherResponse::Single)
            }
            Mode::Polling => self.refresh_stale().await.map(WeatherResponse::All),
        }
    }

    /// On-demand lookup of a single city.
    pub async fn weather_for(&self, city: &str) -> Result<WeatherRecord, WeatherSdkError> {
        if self.mode != Mode::OnDemand {
            return Err(WeatherSdkError::InvalidArgument(format!(
                "weather_for requires on_demand mode, instance '{}' is {}",
                self.key, self.mode
            )));
        }
        self.on_demand(validate_city(city)?).await
    }

    /// Polling refresh returning every cached city.
    pub async fn poll(&self) -> Result<BTreeMap<String, WeatherRecord>, WeatherSdkError> {
        if self.mode != Mode::Polling {
            return Err(WeatherSdkError::InvalidArgument(format!(
                "poll requires polling mode, instance '{}' is {}",
                self.key, self.mode
            )));
        }
        self.refresh_stale().await
    }

    async fn on_demand(&self, city: &str) -> Result<WeatherRecord, WeatherSdkError> {
        if let Some(record) = self.cache.get_fresh(city, now()) {
            tracing::debug!("Serving cached weather for {}", city);
            return Ok(record);
        }

        let record = self.provider.fetch(city, &self.api_key).await?;

        match self.cache.insert_on_demand(record.clone()) {
            CacheInsert::Inserted => tracing::debug!("Cached weather for {}", record.name),
            CacheInsert::Updated => tracing::debug!("Updated cached weather for {}", record.name),
            CacheInsert::Skipped => {}
        }

        Ok(record)
    }

    async fn refresh_stale(&self) -> Result<BTreeMap<String, WeatherRecord>, WeatherSdkError> {
        let stale = self.cache.stale_keys(now());
        if !stale.is_empty() {
            tracing::info!("Refreshing {} stale cities", stale.len());
        }

        for key in stale {
            let record = self.provider.fetch(&key, &self.api_key).await?;
            self.cache.overwrite(&key, record);
        }

        Ok(self.cache.snapshot())
    }
}

fn validate_city(city: &str) -> Result<&str, WeatherSdkError> {
    let trimmed = city.trim();
    if trimmed.is_empty() {
        return Err(WeatherSdkError::InvalidArgument(
            "city name must be a non-empty string".to_string(),
        ));
    }
    Ok(trimmed)
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
