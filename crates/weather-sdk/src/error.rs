//! Error taxonomy for SDK instances and the provider adapter.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherSdkError {
    #[error("An SDK instance with key '{0}' already exists")]
    DuplicateKey(String),

    #[error("No SDK instance registered with key '{0}'")]
    InstanceNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Weather provider returned HTTP {status}: {message}")]
    UpstreamHttp { status: u16, message: String },

    #[error("Weather provider unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl WeatherSdkError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::DuplicateKey(key) => format!("An SDK instance named '{}' already exists.", key),
            Self::InstanceNotFound(key) => format!("No SDK instance named '{}'.", key),
            Self::InvalidArgument(msg) => format!("Invalid input: {}", msg),
            Self::UpstreamHttp { status: 401, .. } => {
                "Weather API key is invalid. Check settings.".to_string()
            }
            Self::UpstreamHttp { status: 404, .. } => {
                "City not found. Check the name and try again.".to_string()
            }
            Self::UpstreamHttp { status, .. } if *status >= 500 => {
                "Weather service is experiencing issues. Please try again later.".to_string()
            }
            Self::UpstreamHttp { .. } => "Weather request failed. Please try again.".to_string(),
            Self::UpstreamUnavailable(_) => {
                "Weather service unavailable. Check your connection.".to_string()
            }
            Self::InvalidResponse(_) => "Received unexpected weather data.".to_string(),
            Self::Client(_) => "Weather client could not be created.".to_string(),
        }
    }

    /// Whether the failure came from the remote provider rather than the caller.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamHttp { .. } | Self::UpstreamUnavailable(_) | Self::InvalidResponse(_)
        )
    }

    /// HTTP status reported by the provider, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UpstreamHttp { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for WeatherSdkError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::UpstreamHttp {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else if err.is_builder() {
            Self::Client(err.to_string())
        } else {
            // timeout, connect, DNS, interrupted body
            Self::UpstreamUnavailable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_user_messages() {
        let err = WeatherSdkError::DuplicateKey("a".into());
        assert!(err.user_message().contains("'a'"));

        let err = WeatherSdkError::UpstreamHttp {
            status: 401,
            message: "Invalid API key".into(),
        };
        assert!(err.user_message().contains("API key"));

        let err = WeatherSdkError::UpstreamHttp {
            status: 404,
            message: "city not found".into(),
        };
        assert!(err.user_message().contains("City not found"));

        let err = WeatherSdkError::UpstreamHttp {
            status: 503,
            message: String::new(),
        };
        assert!(err.user_message().contains("later"));
    }

    #[test]
    fn test_is_upstream() {
        assert!(WeatherSdkError::UpstreamUnavailable("timeout".into()).is_upstream());
        assert!(WeatherSdkError::UpstreamHttp {
            status: 500,
            message: String::new()
        }
        .is_upstream());
        assert!(!WeatherSdkError::InvalidArgument("city".into()).is_upstream());
        assert!(!WeatherSdkError::DuplicateKey("a".into()).is_upstream());
    }

    #[test]
    fn test_status() {
        let err = WeatherSdkError::UpstreamHttp {
            status: 429,
            message: String::new(),
        };
        assert_eq!(err.status(), Some(429));
        assert_eq!(WeatherSdkError::UpstreamUnavailable("x".into()).status(), None);
    }
}
