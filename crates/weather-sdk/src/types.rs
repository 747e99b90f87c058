use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::WeatherSdkError;

/// Condition summary, e.g. `Clouds` / `broken clouds`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub main: String,
    pub description: String,
}

/// Temperatures in the units requested from the provider (Kelvin by default)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub temp: f64,
    pub feels_like: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
}

/// Sunrise and sunset as Unix timestamps (UTC)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunTimes {
    pub sunrise: i64,
    pub sunset: i64,
}

/// Normalized current weather for one city.
///
/// `datetime` is the provider's report time in Unix seconds and doubles as
/// the fetch timestamp used for cache freshness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub weather: WeatherSummary,
    pub temperature: Temperature,
    /// Metres
    pub visibility: u32,
    pub wind: Wind,
    pub datetime: i64,
    pub sys: SunTimes,
    /// Shift in seconds from UTC
    pub timezone: i32,
    /// Canonical location name as reported by the provider
    pub name: String,
}

impl WeatherRecord {
    /// Report time as a UTC timestamp
    pub fn reported_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.datetime, 0)
    }

    /// Report time shifted into the location's own UTC offset
    pub fn local_time(&self) -> Option<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.timezone)?;
        self.reported_at().map(|t| t.with_timezone(&offset))
    }

    /// Seconds elapsed between the report time and `now` (Unix seconds)
    pub fn age_secs(&self, now: i64) -> i64 {
        now.saturating_sub(self.datetime)
    }
}

/// Result of a weather query.
///
/// On-demand instances answer with a single record; polling instances with
/// the whole cache keyed by canonical city name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WeatherResponse {
    Single(WeatherRecord),
    All(BTreeMap<String, WeatherRecord>),
}

impl WeatherResponse {
    pub fn into_single(self) -> Option<WeatherRecord> {
        match self {
            Self::Single(record) => Some(record),
            Self::All(_) => None,
        }
    }

    pub fn into_all(self) -> Option<BTreeMap<String, WeatherRecord>> {
        match self {
            Self::All(map) => Some(map),
            Self::Single(_) => None,
        }
    }
}

// Provider wire format (OpenWeatherMap /data/2.5/weather)

#[derive(Debug, Deserialize)]
pub(crate) struct ApiWeatherResponse {
    weather: Vec<ApiCondition>,
    main: ApiMain,
    visibility: u32,
    wind: ApiWind,
    dt: i64,
    sys: ApiSys,
    timezone: i32,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ApiMain {
    temp: f64,
    feels_like: f64,
}

#[derive(Debug, Deserialize)]
struct ApiWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct ApiSys {
    sunrise: i64,
    sunset: i64,
}

/// Error body returned with non-2xx statuses, e.g. `{"cod":401,"message":"Invalid API key..."}`
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: String,
}

impl TryFrom<ApiWeatherResponse> for WeatherRecord {
    type Error = WeatherSdkError;

    fn try_from(api: ApiWeatherResponse) -> Result<Self, Self::Error> {
        // Only the primary condition is kept
        let condition = api.weather.into_iter().next().ok_or_else(|| {
            WeatherSdkError::InvalidResponse("response has an empty 'weather' array".to_string())
        })?;

        Ok(Self {
            weather: WeatherSummary {
                main: condition.main,
                description: condition.description,
            },
            temperature: Temperature {
                temp: api.main.temp,
                feels_like: api.main.feels_like,
            },
            visibility: api.visibility,
            wind: Wind {
                speed: api.wind.speed,
            },
            datetime: api.dt,
            sys: SunTimes {
                sunrise: api.sys.sunrise,
                sunset: api.sys.sunset,
            },
            timezone: api.timezone,
            name: api.name,
        })
    }
}
