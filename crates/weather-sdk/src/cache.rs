//! In-memory weather store shared by every instance of a registry.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use weather_core::config::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECS};

use crate::types::WeatherRecord;

/// A record is fresh while less than `ttl_secs` have passed since its report time.
pub fn is_fresh(record: &WeatherRecord, now: i64, ttl_secs: u64) -> bool {
    let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
    record.age_secs(now) < ttl
}

/// Outcome of storing an on-demand result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheInsert {
    /// New city added
    Inserted,
    /// Existing city overwritten in place
    Updated,
    /// New city dropped because the cache is full
    Skipped,
}

/// City name to last fetched record, keyed by the provider's canonical name.
#[derive(Debug)]
pub struct WeatherCache {
    entries: Mutex<BTreeMap<String, WeatherRecord>>,
    ttl_secs: u64,
    capacity: usize,
}

impl Default for WeatherCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL_SECS, DEFAULT_CACHE_CAPACITY)
    }
}

impl WeatherCache {
    pub fn new(ttl_secs: u64, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            ttl_secs,
            capacity,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn contains(&self, city: &str) -> bool {
        let entries = self.entries.lock();
        find_key(&entries, city).is_some()
    }

    /// Cached record for `city`, fresh or not
    pub fn get(&self, city: &str) -> Option<WeatherRecord> {
        let entries = self.entries.lock();
        find_key(&entries, city).and_then(|key| entries.get(&key).cloned())
    }

    /// Cached record for `city` if it is still fresh at `now`
    pub fn get_fresh(&self, city: &str, now: i64) -> Option<WeatherRecord> {
        self.get(city).filter(|record| is_fresh(record, now, self.ttl_secs))
    }

    /// Store an on-demand result under its canonical name.
    ///
    /// Existing cities are always overwritten; a new city is only admitted
    /// while the cache holds fewer than `capacity` cities.
    pub fn insert_on_demand(&self, record: WeatherRecord) -> CacheInsert {
        let mut entries = self.entries.lock();

        if let Some(key) = find_key(&entries, &record.name) {
            entries.insert(key, record);
            return CacheInsert::Updated;
        }

        if entries.len() >= self.capacity {
            tracing::debug!(
                "Weather cache full ({} cities), not caching {}",
                self.capacity,
                record.name
            );
            return CacheInsert::Skipped;
        }

        entries.insert(record.name.clone(), record);
        CacheInsert::Inserted
    }

    /// Overwrite the record stored under `key`. Used by polling refresh,
    /// which keeps the existing key even if the provider renames the city.
    pub fn overwrite(&self, key: &str, record: WeatherRecord) {
        self.entries.lock().insert(key.to_string(), record);
    }

    /// Keys whose records are stale at `now`
    pub fn stale_keys(&self, now: i64) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(_, record)| !is_fresh(record, now, self.ttl_secs))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Copy of every cached city
    pub fn snapshot(&self) -> BTreeMap<String, WeatherRecord> {
        self.entries.lock().clone()
    }
}

/// Exact key match first, then a case-insensitive one ("minsk" finds "Minsk").
fn find_key(entries: &BTreeMap<String, WeatherRecord>, city: &str) -> Option<String> {
    if entries.contains_key(city) {
        return Some(city.to_string());
    }
    let wanted = city.to_lowercase();
    entries
        .keys()
        .find(|key| key.to_lowercase() == wanted)
        .cloned()
}
