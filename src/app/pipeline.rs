use super::state::UploadState;
use crate::config::DashboardConfig;
use crate::dashboard::{DashboardFetcher, DashboardSnapshot, DashboardStore, RefreshTrigger};
use crate::error::{FetchError, UploadError};
use crate::upload::{UploadBatch, UploadClient, UploadMode, UploadOutcome, UploadPath, UploadReport};
use derivative::Derivative;
use std::future::Future;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{error, info};

#[derive(Debug)]
pub enum PipelineEvent {
    Upload {
        batch: UploadBatch,
        path: UploadPath,
        result: Result<UploadOutcome, UploadError>,
    },
    /// The post-upload processing delay has passed.
    RefreshDue,
    Refresh {
        seq: u64,
        result: Result<DashboardSnapshot, FetchError>,
    },
}

/// Runs uploads and refreshes on the tokio runtime and folds their results
/// back into the dashboard and upload state on the caller's thread.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Pipeline {
    #[derivative(Debug = "ignore")]
    runtime: Handle,
    #[derivative(Debug = "ignore")]
    uploader: UploadClient,
    #[derivative(Debug = "ignore")]
    fetcher: DashboardFetcher,
    store: DashboardStore,
    upload: UploadState,
    scheduled_refreshes: usize,
    #[derivative(Debug = "ignore")]
    sender: Sender<PipelineEvent>,
    #[derivative(Debug = "ignore")]
    receiver: Receiver<PipelineEvent>,
    #[derivative(Debug = "ignore")]
    waker: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl Pipeline {
    pub fn new(config: DashboardConfig, runtime: Handle) -> Self {
        let http = config.http_client();
        let (sender, receiver) = channel();
        Self {
            runtime,
            uploader: UploadClient::with_http_client(config.clone(), http.clone()),
            fetcher: DashboardFetcher::with_http_client(config, http),
            store: DashboardStore::new(),
            upload: UploadState::default(),
            scheduled_refreshes: 0,
            sender,
            receiver,
            waker: None,
        }
    }

    /// Called from background tasks after they post an event, e.g. to
    /// request a repaint.
    pub fn set_waker(&mut self, waker: impl Fn() + Send + Sync + 'static) {
        self.waker = Some(Arc::new(waker));
    }

    pub fn store(&self) -> &DashboardStore {
        &self.store
    }

    pub fn upload_state(&self) -> &UploadState {
        &self.upload
    }

    pub fn upload_state_mut(&mut self) -> &mut UploadState {
        &mut self.upload
    }

    /// True while a refresh is running or waiting out the post-upload delay.
    pub fn is_refreshing(&self) -> bool {
        self.scheduled_refreshes > 0 || self.store.state().is_loading
    }

    /// Starts a fetch now; its sequence number orders it against every
    /// other fetch by send time.
    pub fn refresh(&mut self, trigger: RefreshTrigger) -> u64 {
        let seq = self.store.begin(trigger);
        let fetcher = self.fetcher.clone();
        self.spawn_reporting(async move {
            let result = fetcher.refresh(trigger).await;
            PipelineEvent::Refresh { seq, result }
        });
        seq
    }

    fn schedule_refresh_after_upload(&mut self) {
        self.scheduled_refreshes += 1;
        let fetcher = self.fetcher.clone();
        self.spawn_reporting(async move {
            fetcher.wait_for_processing().await;
            PipelineEvent::RefreshDue
        });
    }

    /// Uploads the current selection through the primary endpoints.
    pub fn submit_selection(&mut self) -> Result<(), UploadError> {
        let batch = self.upload.batch()?;
        let mode = self.upload.mode;
        self.submit(batch, mode)
    }

    pub fn submit(&mut self, batch: UploadBatch, mode: UploadMode) -> Result<(), UploadError> {
        if self.upload.is_uploading {
            return Err(UploadError::Busy);
        }
        self.spawn_upload(batch, UploadPath::Primary, mode);
        Ok(())
    }

    /// The user agreed to retry the failed batch in simple mode.
    pub fn accept_fallback(&mut self) -> Result<(), UploadError> {
        if self.upload.is_uploading {
            return Err(UploadError::Busy);
        }
        let batch = self.upload.pending_fallback.take().ok_or(UploadError::NoFiles)?;
        self.spawn_upload(batch, UploadPath::Simple, UploadMode::Auto);
        Ok(())
    }

    pub fn dismiss_fallback(&mut self) {
        self.upload.pending_fallback = None;
    }

    fn spawn_upload(&mut self, batch: UploadBatch, path: UploadPath, mode: UploadMode) {
        self.upload.start(&batch, path);
        let uploader = self.uploader.clone();
        self.spawn_reporting(async move {
            let result = match path {
                UploadPath::Primary => uploader.submit(&batch, mode).await,
                UploadPath::Simple => uploader.submit_simple(&batch).await,
            };
            PipelineEvent::Upload { batch, path, result }
        });
    }

    fn spawn_reporting<F>(&self, work: F)
    where
        F: Future<Output = PipelineEvent> + Send + 'static,
    {
        let sender = self.sender.clone();
        let waker = self.waker.clone();
        self.runtime.spawn(async move {
            let event = work.await;
            let _ = sender.send(event);
            if let Some(wake) = waker {
                wake();
            }
        });
    }

    /// Drains finished work. Returns true if any state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.receiver.try_recv() {
            changed = true;
            self.apply(event);
        }
        changed
    }

    fn apply(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::RefreshDue => {
                self.scheduled_refreshes = self.scheduled_refreshes.saturating_sub(1);
                self.refresh(RefreshTrigger::AfterUpload);
            }
            PipelineEvent::Refresh { seq, result } => {
                self.store.resolve(seq, result);
            }
            PipelineEvent::Upload {
                batch,
                path,
                result: Ok(outcome),
            } => {
                let report = UploadReport { outcome, path };
                let message = report.summary_message();
                info!("{}", message);
                self.upload.complete(&report.outcome, message);
                if report.outcome.any_success() {
                    self.schedule_refresh_after_upload();
                } else {
                    error!("No file in a batch of {} was accepted", batch.len());
                }
            }
            PipelineEvent::Upload {
                batch,
                path,
                result: Err(e),
            } => {
                self.upload.fail(&e, batch, path);
            }
        }
    }
}
