use crate::error::ConfigError;
use crate::retry::RetryPolicy;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Backend routes, relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub dashboard: String,
    pub upload_single: String,
    pub upload_multiple: String,
    pub simple_single: String,
    pub simple_multiple: String,
    pub probe: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            dashboard: "/api/dashboard-data".to_string(),
            upload_single: "/api/upload-csv".to_string(),
            upload_multiple: "/api/upload-multiple-csv".to_string(),
            simple_single: "/api/simple-upload".to_string(),
            simple_multiple: "/api/simple-upload-multiple".to_string(),
            probe: "/api/test-upload".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub api_base_url: String,
    pub endpoints: Endpoints,
    pub retry: RetryPolicy,
    pub refresh_delay: Duration,
    pub request_timeout: Duration,
    pub probe_before_upload: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            endpoints: Endpoints::default(),
            retry: RetryPolicy::default(),
            refresh_delay: Duration::from_millis(2000),
            request_timeout: Duration::from_secs(30),
            probe_before_upload: false,
        }
    }
}

impl DashboardConfig {
    /// Builds a config for `base_url`; an empty value means the local backend.
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        let config = Self {
            api_base_url: normalize_base_url(base_url),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.api_base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.api_base_url.clone()));
        }
        Ok(())
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }

    pub fn http_client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .unwrap_or_default()
    }
}

fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    }
}
