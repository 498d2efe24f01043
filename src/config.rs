//! Client configuration

use serde::{Deserialize, Serialize};

use crate::error::AssessError;

/// Environment variable holding the prediction service base URL
pub const API_URL_ENV: &str = "WELLCHECK_API_URL";

/// Base URL used when nothing is configured
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Path of the prediction endpoint under the base URL
pub const PREDICT_PATH: &str = "/predict";

/// Settings for reaching the prediction service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AssessError> {
        let base_url = base_url.into();
        let trimmed = base_url.trim();

        if trimmed.is_empty() {
            return Err(AssessError::Config("base URL is empty".to_string()));
        }
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(AssessError::Config(format!(
                "base URL must start with http:// or https://, got {trimmed}"
            )));
        }

        Ok(Self {
            base_url: trimmed.trim_end_matches('/').to_string(),
        })
    }

    /// Read the base URL from `WELLCHECK_API_URL`, falling back to the local default
    pub fn from_env() -> Result<Self, AssessError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AssessError> {
        match lookup(API_URL_ENV) {
            Some(url) if !url.trim().is_empty() => Self::new(url),
            _ => Ok(Self::default()),
        }
    }

    /// Full URL of the prediction endpoint
    pub fn predict_url(&self) -> String {
        format!("{}{}", self.base_url, PREDICT_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_local_service() {
        let config = ClientConfig::default();
        assert_eq!(config.predict_url(), "http://127.0.0.1:8000/predict");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = ClientConfig::new("https://api.example.org/v1/").unwrap();
        assert_eq!(config.predict_url(), "https://api.example.org/v1/predict");
    }

    #[test]
    fn test_rejects_bad_scheme() {
        assert!(ClientConfig::new("ftp://host").is_err());
        assert!(ClientConfig::new("  ").is_err());
    }

    #[test]
    fn test_lookup_fallback() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ClientConfig::default());

        let config = ClientConfig::from_lookup(|_| Some(String::new())).unwrap();
        assert_eq!(config, ClientConfig::default());

        let config =
            ClientConfig::from_lookup(|_| Some("http://predictor:9000".to_string())).unwrap();
        assert_eq!(config.base_url, "http://predictor:9000");
    }
}
