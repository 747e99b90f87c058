//! Current-weather SDK for OpenWeatherMap
//!
//! Instances are created through a [`WeatherRegistry`] under unique keys and
//! answer queries either on demand (one city, cached for ten minutes) or by
//! polling (refresh every stale cached city and return them all).

pub mod cache;
pub mod client;
pub mod error;
pub mod provider;
pub mod registry;
pub mod types;

pub use cache::{is_fresh, CacheInsert, WeatherCache};
pub use client::WeatherSdk;
pub use error::WeatherSdkError;
pub use provider::WeatherProvider;
pub use registry::WeatherRegistry;
pub use types::*;
pub use weather_core::{Mode, Units};
