use crate::config::DashboardConfig;
use crate::error::UploadError;
use crate::upload::types::{
    BatchResponse, BatchSummary, DataType, FileStatus, UploadBatch, UploadFile, UploadMode,
    UploadOutcome, UploadStatus,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{debug, error, info};

const ERROR_BODY_PREVIEW: usize = 100;

/// Posts CSV batches to the ingestion endpoints.
#[derive(Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    config: DashboardConfig,
}

impl UploadClient {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            http: config.http_client(),
            config,
        }
    }

    pub fn with_http_client(config: DashboardConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Connectivity check before an upload. Failures are only logged.
    pub async fn probe(&self) {
        let url = self.config.url(&self.config.endpoints.probe);
        match self.http.get(&url).send().await {
            Ok(response) => debug!("Probe {} answered {}", url, response.status()),
            Err(e) => debug!("Probe {} failed: {}", url, e),
        }
    }

    /// Uploads `batch` through the primary endpoints, retrying per the
    /// configured policy.
    pub async fn submit(
        &self,
        batch: &UploadBatch,
        mode: UploadMode,
    ) -> Result<UploadOutcome, UploadError> {
        if self.config.probe_before_upload {
            self.probe().await;
        }

        info!(
            "Uploading {} file(s) as '{}' in {} mode",
            batch.len(),
            batch.data_type(),
            mode
        );

        let result = if mode.uses_multiple_endpoint(batch.len()) {
            self.submit_multiple(batch).await
        } else if batch.len() == 1 {
            self.submit_single(&batch.files()[0], batch.data_type()).await
        } else {
            self.submit_each(batch).await
        };

        if let Err(e) = &result {
            error!("Upload failed: {}", e);
        }
        result
    }

    /// Degraded path: no data type, no retries.
    pub async fn submit_simple(&self, batch: &UploadBatch) -> Result<UploadOutcome, UploadError> {
        info!("Uploading {} file(s) in simple mode", batch.len());
        let endpoints = &self.config.endpoints;

        if batch.len() == 1 {
            let file = &batch.files()[0];
            let form = single_form(file, None)?;
            let response = self.post_form(&self.config.url(&endpoints.simple_single), form).await?;
            Ok(UploadOutcome::Single {
                file_name: file.name.clone(),
                response,
            })
        } else {
            let form = multiple_form(batch.files(), None)?;
            let url = self.config.url(&endpoints.simple_multiple);
            let response = self.post_form(&url, form).await?;
            Ok(UploadOutcome::Batch(summarize(batch, response)?))
        }
    }

    async fn submit_single(
        &self,
        file: &UploadFile,
        data_type: DataType,
    ) -> Result<UploadOutcome, UploadError> {
        let url = self.config.url(&self.config.endpoints.upload_single);
        let url = url.as_str();

        let response = self
            .config
            .retry
            .execute_if(
                || async move {
                    let form = single_form(file, Some(data_type))?;
                    self.post_form(url, form).await
                },
                UploadError::is_retryable,
            )
            .await?;

        Ok(UploadOutcome::Single {
            file_name: file.name.clone(),
            response,
        })
    }

    async fn submit_multiple(&self, batch: &UploadBatch) -> Result<UploadOutcome, UploadError> {
        let url = self.config.url(&self.config.endpoints.upload_multiple);
        let url = url.as_str();
        let files = batch.files();
        let data_type = batch.data_type();

        let response = self
            .config
            .retry
            .execute_if(
                || async move {
                    let form = multiple_form(files, Some(data_type))?;
                    self.post_form(url, form).await
                },
                UploadError::is_retryable,
            )
            .await?;

        Ok(UploadOutcome::Batch(summarize(batch, response)?))
    }

    /// Single-file endpoint, one request per file. Fails only when every file
    /// failed, so the caller can still be offered the fallback.
    async fn submit_each(&self, batch: &UploadBatch) -> Result<UploadOutcome, UploadError> {
        let mut statuses = Vec::with_capacity(batch.len());
        let mut last_error = None;

        for file in batch.files() {
            match self.submit_single(file, batch.data_type()).await {
                Ok(_) => statuses.push(FileStatus::new(&file.name, UploadStatus::Success)),
                Err(e) => {
                    statuses.push(FileStatus::new(&file.name, UploadStatus::Error(e.to_string())));
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if statuses.iter().all(|s| !s.is_success()) => Err(e),
            _ => Ok(UploadOutcome::Batch(BatchSummary::from_statuses(&statuses))),
        }
    }

    async fn post_form(&self, url: &str, form: Form) -> Result<Value, UploadError> {
        debug!("POST {}", url);
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        interpret_response(response).await
    }
}

fn csv_part(file: &UploadFile) -> Result<Part, UploadError> {
    Part::bytes(file.content.clone())
        .file_name(file.name.clone())
        .mime_str("text/csv")
        .map_err(|e| UploadError::Transport(e.to_string()))
}

fn single_form(file: &UploadFile, data_type: Option<DataType>) -> Result<Form, UploadError> {
    let form = Form::new().part("file", csv_part(file)?);
    Ok(match data_type {
        Some(data_type) => form.text("data_type", data_type.as_str()),
        None => form,
    })
}

fn multiple_form(files: &[UploadFile], data_type: Option<DataType>) -> Result<Form, UploadError> {
    let mut form = Form::new();
    for file in files {
        form = form.part("files", csv_part(file)?);
    }
    Ok(match data_type {
        Some(data_type) => form.text("data_type", data_type.as_str()),
        None => form,
    })
}

fn summarize(batch: &UploadBatch, response: Value) -> Result<BatchSummary, UploadError> {
    let parsed: BatchResponse =
        serde_json::from_value(response).map_err(|e| UploadError::Decode(e.to_string()))?;
    Ok(BatchSummary::reconcile(batch.file_names(), parsed))
}

/// Maps a response onto the error taxonomy: non-2xx statuses carry the
/// server's `detail`, 2xx bodies must be JSON.
pub(crate) async fn interpret_response(response: reqwest::Response) -> Result<Value, UploadError> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UploadError::Http {
            status: status.as_u16(),
            detail: error_detail(&body),
        });
    }

    if !content_type.contains("application/json") {
        let shown = if content_type.is_empty() {
            "none".to_string()
        } else {
            content_type
        };
        return Err(UploadError::Protocol(shown));
    }

    let body = response
        .text()
        .await
        .map_err(|e| UploadError::Transport(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| UploadError::Decode(e.to_string()))
}

fn error_detail(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) => detail.clone(),
            Some(other) => other.to_string(),
            None => Value::Object(map).to_string(),
        },
        Ok(other) => other.to_string(),
        Err(_) => {
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            if preview.len() < body.len() {
                format!("{}...", preview)
            } else {
                preview
            }
        }
    }
}
