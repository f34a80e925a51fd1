use crate::config::DashboardConfig;
use crate::dashboard::snapshot::DashboardSnapshot;
use crate::dashboard::store::RefreshTrigger;
use crate::error::FetchError;
use crate::retry::RetryPolicy;
use tokio::time::sleep;
use tracing::{debug, info};

/// Reads dashboard snapshots from the backend.
#[derive(Clone)]
pub struct DashboardFetcher {
    http: reqwest::Client,
    config: DashboardConfig,
}

impl DashboardFetcher {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            http: config.http_client(),
            config,
        }
    }

    pub fn with_http_client(config: DashboardConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    pub async fn fetch(&self) -> Result<DashboardSnapshot, FetchError> {
        let url = self.config.url(&self.config.endpoints.dashboard);
        debug!("GET {}", url);

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    /// Gives the backend time to process an upload before it is read back.
    pub async fn wait_for_processing(&self) {
        info!(
            "Waiting {:?} for the backend to process the upload",
            self.config.refresh_delay
        );
        sleep(self.config.refresh_delay).await;
    }

    /// Fetches for `trigger`. Refreshes after an upload retry failed
    /// attempts; the others try once.
    pub async fn refresh(&self, trigger: RefreshTrigger) -> Result<DashboardSnapshot, FetchError> {
        let policy = match trigger {
            RefreshTrigger::AfterUpload => self.config.retry,
            RefreshTrigger::Mount | RefreshTrigger::Manual => RetryPolicy::once(),
        };

        policy
            .execute_if(|| self.fetch(), FetchError::is_retryable)
            .await
    }

    pub async fn refresh_after_upload(&self) -> Result<DashboardSnapshot, FetchError> {
        self.wait_for_processing().await;
        self.refresh(RefreshTrigger::AfterUpload).await
    }
}
