use crate::error::UploadError;
use crate::upload::types::{is_csv_name, FileStatus, UploadFile, UploadStatus};
use ignore::Walk;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Files picked from a folder: what will be uploaded and what was passed over.
#[derive(Debug, Default)]
pub struct Selection {
    pub files: Vec<UploadFile>,
    pub skipped: Vec<FileStatus>,
}

/// Turns user-picked paths into upload-ready files.
#[derive(Debug, Clone)]
pub struct FileSelector {
    folder_path: PathBuf,
}

impl FileSelector {
    pub fn new(folder_path: impl Into<PathBuf>) -> Self {
        Self {
            folder_path: folder_path.into(),
        }
    }

    /// Walks the folder (honouring `.gitignore`) and loads every CSV file.
    /// Anything else is reported as skipped rather than rejected.
    pub fn collect(&self) -> Selection {
        let mut selection = Selection::default();

        for result in Walk::new(&self.folder_path) {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Error walking {}: {}", self.folder_path.display(), e);
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let name = display_name(path);
            if !Self::is_csv_file(path) {
                debug!("Skipping {}", path.display());
                let reason = UploadStatus::Skipped("Not a CSV file".to_string());
                selection.skipped.push(FileStatus::new(name, reason));
                continue;
            }

            match fs::read(path) {
                Ok(content) => selection.files.push(UploadFile::new(name, content)),
                Err(e) => selection.skipped.push(FileStatus::new(
                    name,
                    UploadStatus::Skipped(format!("Failed to read file: {}", e)),
                )),
            }
        }

        selection
    }

    fn is_csv_file(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(is_csv_name)
            .unwrap_or(false)
    }
}

/// Loads an explicit selection. A single non-CSV path rejects the whole
/// selection before anything is read.
pub fn load_files(paths: &[PathBuf]) -> Result<Vec<UploadFile>, UploadError> {
    if paths.is_empty() {
        return Err(UploadError::NoFiles);
    }

    if let Some(path) = paths.iter().find(|p| !FileSelector::is_csv_file(p)) {
        return Err(UploadError::NotCsv(display_name(path)));
    }

    paths
        .iter()
        .map(|path| {
            let name = display_name(path);
            fs::read(path)
                .map(|content| UploadFile::new(name.clone(), content))
                .map_err(|e| UploadError::Read {
                    name,
                    reason: e.to_string(),
                })
        })
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}
