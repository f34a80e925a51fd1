//! CSV ingestion and dashboard refresh for the sauna analytics dashboard.
//!
//! Files go through [`upload::UploadClient`] (with [`retry::RetryPolicy`] and
//! the user-confirmed simple-mode fallback), and a successful upload schedules
//! a delayed [`dashboard::DashboardFetcher`] refresh whose result lands in the
//! [`dashboard::DashboardStore`]. [`app`] wires both into an egui window.

pub mod app;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod retry;
pub mod upload;
pub mod utils;

pub use config::DashboardConfig;
pub use error::{ConfigError, FetchError, UploadError};
