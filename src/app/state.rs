use crate::error::UploadError;
use crate::upload::{
    load_files, DataType, FileSelector, FileStatus, UploadBatch, UploadFile, UploadMode,
    UploadOutcome, UploadPath, UploadStatus,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ActionProgress {
    #[default]
    NotStarted,
    Uploading {
        total: usize,
        path: UploadPath,
    },
    Completed {
        total: usize,
        successful: usize,
        failed: usize,
        skipped: usize,
    },
}

/// Everything the upload panel shows: the current selection, the request in
/// flight, and the outcome of the last one.
#[derive(Debug)]
pub struct UploadState {
    pub selection: Vec<UploadFile>,
    pub skipped: Vec<FileStatus>,
    pub data_type: DataType,
    pub mode: UploadMode,
    pub infer_data_type: bool,
    pub progress: ActionProgress,
    pub file_statuses: Vec<FileStatus>,
    pub message: Option<String>,
    pub error_message: Option<String>,
    /// Batch whose primary upload failed, waiting for the user to opt into
    /// the simple endpoint.
    pub pending_fallback: Option<UploadBatch>,
    pub show_details: bool,
    pub is_uploading: bool,
}

impl Default for UploadState {
    fn default() -> Self {
        Self {
            selection: Vec::new(),
            skipped: Vec::new(),
            data_type: DataType::Auto,
            mode: UploadMode::Auto,
            infer_data_type: true,
            progress: ActionProgress::NotStarted,
            file_statuses: Vec::new(),
            message: None,
            error_message: None,
            pending_fallback: None,
            show_details: false,
            is_uploading: false,
        }
    }
}

impl UploadState {
    /// Replaces the selection with explicitly picked files. Any non-CSV file
    /// rejects the whole pick and leaves the selection empty.
    pub fn select_files(&mut self, paths: &[PathBuf]) {
        self.skipped.clear();
        match load_files(paths) {
            Ok(files) => {
                self.set_selection(files);
                self.error_message = None;
            }
            Err(e) => {
                self.selection.clear();
                self.error_message = Some(e.to_string());
            }
        }
    }

    pub fn select_folder(&mut self, folder: PathBuf) {
        let selection = FileSelector::new(folder).collect();
        self.skipped = selection.skipped;
        if selection.files.is_empty() {
            self.selection.clear();
            self.error_message = Some(UploadError::NoFiles.to_string());
        } else {
            self.set_selection(selection.files);
            self.error_message = None;
        }
    }

    fn set_selection(&mut self, files: Vec<UploadFile>) {
        if self.infer_data_type {
            if let Some(first) = files.first() {
                self.data_type = DataType::infer_from_filename(&first.name);
            }
        }
        info!(
            "Selected {} CSV file(s), data type '{}'",
            files.len(),
            self.data_type
        );
        self.selection = files;
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.skipped.clear();
        self.error_message = None;
        self.data_type = DataType::Auto;
    }

    pub fn batch(&self) -> Result<UploadBatch, UploadError> {
        UploadBatch::new(self.selection.clone(), self.data_type)
    }

    pub fn selection_label(&self) -> String {
        match self.selection.len() {
            0 => "None".to_string(),
            1 => self.selection[0].name.clone(),
            n => format!("{} files selected", n),
        }
    }

    pub fn can_upload(&self) -> bool {
        !self.selection.is_empty() && !self.is_uploading
    }

    pub(crate) fn start(&mut self, batch: &UploadBatch, path: UploadPath) {
        self.is_uploading = true;
        self.message = None;
        self.error_message = None;
        self.pending_fallback = None;
        self.progress = ActionProgress::Uploading {
            total: batch.len(),
            path,
        };
        self.file_statuses = batch
            .file_names()
            .into_iter()
            .map(|name| FileStatus::new(name, UploadStatus::Processing))
            .collect();
    }

    pub(crate) fn complete(&mut self, outcome: &UploadOutcome, message: String) {
        let successful = outcome.successful();

        self.is_uploading = false;
        self.progress = ActionProgress::Completed {
            total: outcome.total() + self.skipped.len(),
            successful,
            failed: outcome.total() - successful,
            skipped: self.skipped.len(),
        };
        self.file_statuses = outcome.file_statuses();
        self.file_statuses.extend(self.skipped.iter().cloned());
        self.message = Some(message);
        self.error_message = outcome.error_message();
        self.selection.clear();
    }

    pub(crate) fn fail(&mut self, error: &UploadError, batch: UploadBatch, path: UploadPath) {
        self.is_uploading = false;
        let total = batch.len();
        self.progress = ActionProgress::Completed {
            total,
            successful: 0,
            failed: total,
            skipped: 0,
        };
        self.file_statuses = batch
            .file_names()
            .into_iter()
            .map(|name| FileStatus::new(name, UploadStatus::Error(error.to_string())))
            .collect();

        match path {
            UploadPath::Primary => {
                self.error_message = Some(error.to_string());
                if error.offers_fallback() {
                    self.pending_fallback = Some(batch);
                }
            }
            UploadPath::Simple => {
                self.error_message = Some(format!("All upload methods failed: {}", error));
            }
        }
    }

    pub fn get_progress_percentage(&self) -> f32 {
        match &self.progress {
            ActionProgress::NotStarted | ActionProgress::Uploading { .. } => 0.0,
            ActionProgress::Completed { total, .. } => {
                if *total == 0 {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }

    pub fn get_status_text(&self) -> String {
        match &self.progress {
            ActionProgress::NotStarted => String::new(),
            ActionProgress::Uploading { total, path } => match path {
                UploadPath::Primary => format!("Uploading {} file(s)...", total),
                UploadPath::Simple => format!("Uploading {} file(s) in simple mode...", total),
            },
            ActionProgress::Completed {
                total,
                successful,
                failed,
                skipped,
            } => {
                format!(
                    "Final Status: {} files | ✅ Success: {} | ⏩ Skipped: {} | ❌ Failed: {}",
                    total, successful, skipped, failed
                )
            }
        }
    }
}
