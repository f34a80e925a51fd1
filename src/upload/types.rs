use crate::error::UploadError;
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum UploadStatus {
    Processing,
    Success,
    Error(String),
    Skipped(String),
    /// The backend counted more failures than it named; this file may be one.
    Unconfirmed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileStatus {
    pub name: String,
    pub status: UploadStatus,
}

impl FileStatus {
    pub fn new(name: impl Into<String>, status: UploadStatus) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, UploadStatus::Success)
    }
}

/// Classification of uploaded CSV content, sent as the `data_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Members,
    Utilization,
    Competitors,
    Finance,
    Occupancy,
    Sales,
    Reservation,
    #[default]
    Auto,
}

impl DataType {
    pub const ALL: [DataType; 8] = [
        DataType::Auto,
        DataType::Members,
        DataType::Utilization,
        DataType::Competitors,
        DataType::Finance,
        DataType::Occupancy,
        DataType::Sales,
        DataType::Reservation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Members => "members",
            DataType::Utilization => "utilization",
            DataType::Competitors => "competitors",
            DataType::Finance => "finance",
            DataType::Occupancy => "occupancy",
            DataType::Sales => "sales",
            DataType::Reservation => "reservation",
            DataType::Auto => "auto",
        }
    }

    /// Guesses the type from a file name, falling back to `Auto`.
    pub fn infer_from_filename(file_name: &str) -> Self {
        let name = file_name.to_lowercase();
        if name.contains("frame") || name.contains("occupancy") {
            DataType::Occupancy
        } else if name.contains("sales") {
            DataType::Sales
        } else if name.contains("member") {
            DataType::Members
        } else if name.contains("reservation") {
            DataType::Reservation
        } else if name.contains("utilization") {
            DataType::Utilization
        } else if name.contains("competitor") {
            DataType::Competitors
        } else if name.contains("finance") {
            DataType::Finance
        } else {
            DataType::Auto
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "members" | "member" => Ok(DataType::Members),
            "utilization" => Ok(DataType::Utilization),
            "competitors" => Ok(DataType::Competitors),
            "finance" => Ok(DataType::Finance),
            "occupancy" => Ok(DataType::Occupancy),
            "sales" => Ok(DataType::Sales),
            "reservation" => Ok(DataType::Reservation),
            "auto" | "" => Ok(DataType::Auto),
            other => Err(UploadError::UnknownDataType(other.to_string())),
        }
    }
}

#[derive(Derivative, Clone, PartialEq, Eq)]
#[derivative(Debug)]
pub struct UploadFile {
    pub name: String,
    #[derivative(Debug = "ignore")]
    pub content: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

pub fn is_csv_name(name: &str) -> bool {
    name.to_lowercase().ends_with(".csv")
}

/// A non-empty set of CSV files sharing one data type tag.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadBatch {
    files: Vec<UploadFile>,
    data_type: DataType,
}

impl UploadBatch {
    pub fn new(files: Vec<UploadFile>, data_type: DataType) -> Result<Self, UploadError> {
        if files.is_empty() {
            return Err(UploadError::NoFiles);
        }
        if let Some(file) = files.iter().find(|f| !is_csv_name(&f.name)) {
            return Err(UploadError::NotCsv(file.name.clone()));
        }
        Ok(Self { files, data_type })
    }

    /// Like `new`, with `Auto` replaced by a guess from the first file name.
    pub fn with_inferred_type(
        files: Vec<UploadFile>,
        data_type: DataType,
    ) -> Result<Self, UploadError> {
        let data_type = match (data_type, files.first()) {
            (DataType::Auto, Some(first)) => DataType::infer_from_filename(&first.name),
            (data_type, _) => data_type,
        };
        Self::new(files, data_type)
    }

    pub fn files(&self) -> &[UploadFile] {
        &self.files
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files.iter().map(|f| f.name.clone()).collect()
    }
}

/// How a batch is mapped onto the ingestion endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadMode {
    /// Single-file endpoint for one file, multi-file endpoint otherwise.
    #[default]
    Auto,
    /// One request per file against the single-file endpoint.
    Single,
    /// One request carrying every file against the multi-file endpoint.
    Multiple,
}

impl UploadMode {
    pub fn uses_multiple_endpoint(&self, file_count: usize) -> bool {
        match self {
            UploadMode::Auto => file_count > 1,
            UploadMode::Single => false,
            UploadMode::Multiple => true,
        }
    }
}

impl fmt::Display for UploadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadMode::Auto => f.write_str("auto"),
            UploadMode::Single => f.write_str("single"),
            UploadMode::Multiple => f.write_str("multiple"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub detail: String,
}

/// Body returned by the multi-file endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct BatchResponse {
    #[serde(default)]
    pub total: Option<usize>,
    #[serde(default)]
    pub success: Option<usize>,
    #[serde(default)]
    pub errors: Option<usize>,
    #[serde(default)]
    pub error_details: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub errors: usize,
    pub error_details: Vec<ErrorDetail>,
    file_names: Vec<String>,
}

impl BatchSummary {
    /// Counts are anchored to the files actually sent, so `total` is always
    /// the batch size and `success + errors == total`.
    pub(crate) fn reconcile(file_names: Vec<String>, response: BatchResponse) -> Self {
        let total = file_names.len();
        let failed_names: HashSet<&str> = response
            .error_details
            .iter()
            .map(|d| d.filename.as_str())
            .filter(|name| file_names.iter().any(|n| n == name))
            .collect();

        let reported_errors = response
            .errors
            .or_else(|| response.success.map(|s| total.saturating_sub(s)))
            .unwrap_or(0);
        let errors = reported_errors.max(failed_names.len()).min(total);

        if let Some(reported_total) = response.total {
            if reported_total != total {
                tracing::warn!(
                    "Backend reported {} files for a batch of {}",
                    reported_total,
                    total
                );
            }
        }

        Self {
            total,
            success: total - errors,
            errors,
            error_details: response.error_details,
            file_names,
        }
    }

    /// Builds a summary from outcomes gathered one request at a time.
    pub fn from_statuses(statuses: &[FileStatus]) -> Self {
        let mut error_details = Vec::new();
        for status in statuses {
            if let UploadStatus::Error(detail) = &status.status {
                error_details.push(ErrorDetail {
                    filename: status.name.clone(),
                    detail: detail.clone(),
                });
            }
        }
        let total = statuses.len();
        let errors = error_details.len();
        Self {
            total,
            success: total - errors,
            errors,
            error_details,
            file_names: statuses.iter().map(|s| s.name.clone()).collect(),
        }
    }

    fn detail_for(&self, name: &str) -> Option<&ErrorDetail> {
        self.error_details.iter().find(|d| d.filename == name)
    }

    /// Per-file view of the batch. Never reports more successes than
    /// `success`: files without a detail are only marked successful when
    /// every counted failure is accounted for by name.
    pub fn file_statuses(&self) -> Vec<FileStatus> {
        let named_failures = self
            .file_names
            .iter()
            .filter(|name| self.detail_for(name).is_some())
            .count();
        let unnamed_failures = self.errors > named_failures;

        self.file_names
            .iter()
            .map(|name| {
                let status = match self.detail_for(name) {
                    Some(detail) => UploadStatus::Error(detail.detail.clone()),
                    None if unnamed_failures => UploadStatus::Unconfirmed,
                    None => UploadStatus::Success,
                };
                FileStatus::new(name, status)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Single { file_name: String, response: Value },
    Batch(BatchSummary),
}

impl UploadOutcome {
    pub fn summary_message(&self) -> String {
        match self {
            UploadOutcome::Single { file_name, .. } => {
                format!("File '{}' uploaded successfully", file_name)
            }
            UploadOutcome::Batch(summary) => {
                let mut message = format!(
                    "{} of {} files uploaded successfully",
                    summary.success, summary.total
                );
                if summary.errors > 0 {
                    message.push_str(&format!("\n{} files failed", summary.errors));
                }
                message
            }
        }
    }

    /// One line per failed file, empty when everything went through.
    pub fn error_message(&self) -> Option<String> {
        match self {
            UploadOutcome::Batch(summary)
                if summary.errors > 0 && !summary.error_details.is_empty() =>
            {
                let lines: Vec<String> = summary
                    .error_details
                    .iter()
                    .map(|d| format!("{}: {}", d.filename, d.detail))
                    .collect();
                Some(format!("Some files failed: {}", lines.join("\n")))
            }
            _ => None,
        }
    }

    pub fn file_statuses(&self) -> Vec<FileStatus> {
        match self {
            UploadOutcome::Single { file_name, .. } => {
                vec![FileStatus::new(file_name, UploadStatus::Success)]
            }
            UploadOutcome::Batch(summary) => summary.file_statuses(),
        }
    }

    pub fn total(&self) -> usize {
        match self {
            UploadOutcome::Single { .. } => 1,
            UploadOutcome::Batch(summary) => summary.total,
        }
    }

    /// Files the backend accepted.
    pub fn successful(&self) -> usize {
        match self {
            UploadOutcome::Single { .. } => 1,
            UploadOutcome::Batch(summary) => summary.success,
        }
    }

    /// True when at least one file reached the backend, which is what makes a
    /// dashboard refresh worthwhile.
    pub fn any_success(&self) -> bool {
        match self {
            UploadOutcome::Single { .. } => true,
            UploadOutcome::Batch(summary) => summary.success > 0,
        }
    }
}
