use crate::error::UploadError;
use crate::upload::client::UploadClient;
use crate::upload::types::{UploadBatch, UploadMode, UploadOutcome};
use tracing::{info, warn};

/// Which endpoint family produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPath {
    Primary,
    Simple,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadReport {
    pub outcome: UploadOutcome,
    pub path: UploadPath,
}

impl UploadReport {
    pub fn summary_message(&self) -> String {
        match self.path {
            UploadPath::Primary => self.outcome.summary_message(),
            UploadPath::Simple => format!("Simple mode: {}", self.outcome.summary_message()),
        }
    }
}

/// Asked once the primary path has failed. Returning `true` opts into the
/// simple endpoint.
pub trait FallbackConsent {
    fn confirm(&mut self, error: &UploadError) -> bool;
}

impl<F> FallbackConsent for F
where
    F: FnMut(&UploadError) -> bool,
{
    fn confirm(&mut self, error: &UploadError) -> bool {
        self(error)
    }
}

/// Primary upload, then the simple endpoint if the caller agrees. Validation
/// errors are returned without asking.
pub async fn upload_with_fallback<C: FallbackConsent>(
    client: &UploadClient,
    batch: &UploadBatch,
    mode: UploadMode,
    consent: &mut C,
) -> Result<UploadReport, UploadError> {
    let primary_error = match client.submit(batch, mode).await {
        Ok(outcome) => {
            return Ok(UploadReport {
                outcome,
                path: UploadPath::Primary,
            })
        }
        Err(e) => e,
    };

    if !primary_error.offers_fallback() || !consent.confirm(&primary_error) {
        return Err(primary_error);
    }

    warn!("Primary upload failed ({}), falling back to simple mode", primary_error);
    let outcome = client.submit_simple(batch).await?;
    info!("Simple upload succeeded");
    Ok(UploadReport {
        outcome,
        path: UploadPath::Simple,
    })
}
