use thiserror::Error;

/// Everything that can go wrong between picking files and the ingestion
/// endpoint answering.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error("Please select at least one CSV file")]
    NoFiles,

    #[error("Only CSV files can be uploaded: {0}")]
    NotCsv(String),

    #[error("Unknown data type: {0}")]
    UnknownDataType(String),

    #[error("Failed to read file {name}: {reason}")]
    Read { name: String, reason: String },

    #[error("Failed to send request: {0}")]
    Transport(String),

    #[error("Server error ({status}): {detail}")]
    Http { status: u16, detail: String },

    #[error("Unexpected Content-Type: {0}")]
    Protocol(String),

    #[error("Failed to parse upload response: {0}")]
    Decode(String),

    #[error("An upload is already in progress")]
    Busy,
}

impl UploadError {
    /// Errors raised before anything touches the network.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            UploadError::NoFiles
                | UploadError::NotCsv(_)
                | UploadError::UnknownDataType(_)
                | UploadError::Read { .. }
                | UploadError::Busy
        )
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            UploadError::Transport(_) | UploadError::Protocol(_) | UploadError::Decode(_) => true,
            UploadError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether the caller should be offered the simple upload endpoint.
    pub fn offers_fallback(&self) -> bool {
        !self.is_validation()
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            UploadError::Decode(err.to_string())
        } else {
            UploadError::Transport(err.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Connection error: {0}")]
    Transport(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::Status(status) if *status < 500)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid API base URL '{0}': expected http:// or https://")]
    InvalidBaseUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_not_retried() {
        let err = UploadError::Http {
            status: 400,
            detail: "bad columns".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(err.offers_fallback());
    }

    #[test]
    fn server_and_protocol_errors_are_retried() {
        assert!(UploadError::Http {
            status: 503,
            detail: String::new()
        }
        .is_retryable());
        assert!(UploadError::Protocol("text/html".to_string()).is_retryable());
        assert!(UploadError::Transport("refused".to_string()).is_retryable());
    }

    #[test]
    fn validation_errors_never_offer_fallback() {
        assert!(!UploadError::NoFiles.offers_fallback());
        assert!(!UploadError::NotCsv("notes.txt".to_string()).offers_fallback());
        assert!(!UploadError::NotCsv("notes.txt".to_string()).is_retryable());
    }
}
