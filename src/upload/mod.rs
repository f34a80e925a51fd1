mod client;
mod fallback;
mod file_selector;
mod types;

pub use client::UploadClient;
pub use fallback::{upload_with_fallback, FallbackConsent, UploadPath, UploadReport};
pub use file_selector::{load_files, FileSelector, Selection};
pub use types::{
    is_csv_name, BatchSummary, DataType, ErrorDetail, FileStatus, UploadBatch, UploadFile,
    UploadMode, UploadOutcome, UploadStatus,
};
