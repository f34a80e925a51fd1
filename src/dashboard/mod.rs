mod fetcher;
mod snapshot;
mod store;

pub use fetcher::DashboardFetcher;
pub use snapshot::{Area, DashboardSnapshot, Labels};
pub use store::{DashboardStore, FetchState, RefreshTrigger, Resolution, FETCH_ERROR_MESSAGE};
