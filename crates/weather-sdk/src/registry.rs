//! Registry of SDK instances keyed by caller-chosen names.
//!
//! Every instance created through one registry shares its weather cache and
//! provider. Independent registries share nothing.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use weather_core::{Config, Mode};

use crate::cache::WeatherCache;
use crate::client::WeatherSdk;
use crate::error::WeatherSdkError;
use crate::provider::WeatherProvider;

#[derive(Debug, Clone)]
pub struct WeatherRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Debug)]
pub(crate) struct RegistryInner {
    instances: Mutex<HashMap<String, WeatherSdk>>,
    next_id: AtomicU64,
    cache: Arc<WeatherCache>,
    provider: WeatherProvider,
}

impl RegistryInner {
    pub(crate) fn remove(&self, key: &str) -> Result<(), WeatherSdkError> {
        match self.instances.lock().remove(key) {
            Some(_) => {
                tracing::info!("Deleted SDK instance '{}'", key);
                Ok(())
            }
            None => Err(WeatherSdkError::InstanceNotFound(key.to_string())),
        }
    }

    /// Remove `key` only while it still maps to the instance with `id`.
    pub(crate) fn remove_instance(&self, key: &str, id: u64) -> Result<(), WeatherSdkError> {
        let mut instances = self.instances.lock();
        match instances.get(key) {
            Some(sdk) if sdk.id() == id => {
                instances.remove(key);
                tracing::info!("Deleted SDK instance '{}'", key);
                Ok(())
            }
            _ => Err(WeatherSdkError::InstanceNotFound(key.to_string())),
        }
    }
}

impl WeatherRegistry {
    pub fn new(provider: WeatherProvider, cache: Arc<WeatherCache>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                instances: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
                cache,
                provider,
            }),
        }
    }

    /// Registry with a default cache (600 s TTL, 10 cities)
    pub fn with_provider(provider: WeatherProvider) -> Self {
        Self::new(provider, Arc::new(WeatherCache::default()))
    }

    pub fn from_config(config: &Config) -> Result<Self, WeatherSdkError> {
        let provider = WeatherProvider::from_config(config)?;
        let cache = WeatherCache::new(config.cache_ttl_secs, config.cache_capacity);
        Ok(Self::new(provider, Arc::new(cache)))
    }

    /// Register a new instance under `key`.
    ///
    /// Fails with `DuplicateKey` if the key is already taken.
    pub fn create(&self, key: &str, api_key: &str, mode: Mode) -> Result<WeatherSdk, WeatherSdkError> {
        if key.is_empty() {
            return Err(WeatherSdkError::InvalidArgument(
                "instance key must not be empty".to_string(),
            ));
        }
        if api_key.trim().is_empty() {
            return Err(WeatherSdkError::InvalidArgument(
                "API key must not be empty".to_string(),
            ));
        }

        let mut instances = self.inner.instances.lock();
        if instances.contains_key(key) {
            return Err(WeatherSdkError::DuplicateKey(key.to_string()));
        }

        let sdk = WeatherSdk::new(
            self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            key.to_string(),
            api_key.to_string(),
            mode,
            Arc::clone(&self.inner.cache),
            self.inner.provider.clone(),
            Arc::downgrade(&self.inner),
        );
        instances.insert(key.to_string(), sdk.clone());

        tracing::info!("Created SDK instance '{}' in {} mode", key, mode);
        Ok(sdk)
    }

    /// Remove the instance registered under `key`.
    ///
    /// Deleting an unknown key fails with `InstanceNotFound`. Cached weather
    /// is left untouched.
    pub fn delete(&self, key: &str) -> Result<(), WeatherSdkError> {
        self.inner.remove(key)
    }

    pub fn lookup(&self, key: &str) -> Option<WeatherSdk> {
        self.inner.instances.lock().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.instances.lock().contains_key(key)
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.instances.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.inner.instances.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.instances.lock().is_empty()
    }

    /// The weather cache shared by this registry's instances
    pub fn cache(&self) -> &Arc<WeatherCache> {
        &self.inner.cache
    }
}
