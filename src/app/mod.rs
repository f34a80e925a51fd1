mod pipeline;
mod state;
mod ui;

use crate::config::DashboardConfig;
use crate::dashboard::RefreshTrigger;
use crate::utils::color::Palette;
use eframe::{egui, App};
pub use pipeline::{Pipeline, PipelineEvent};
pub use state::{ActionProgress, UploadState};
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Overview,
    Members,
    Utilization,
    Competitors,
    Finance,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Overview,
        Tab::Members,
        Tab::Utilization,
        Tab::Competitors,
        Tab::Finance,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Members => "Members",
            Tab::Utilization => "Utilization",
            Tab::Competitors => "Competitors",
            Tab::Finance => "Finance",
        }
    }
}

/// Deferred user actions collected while rendering a frame.
#[derive(Debug)]
enum UiAction {
    Refresh,
    SelectFiles(Vec<PathBuf>),
    SelectFolder(PathBuf),
    ClearSelection,
    Upload,
    AcceptFallback,
    DismissFallback,
    OpenBackend,
}

pub struct DashboardApp {
    pipeline: Pipeline,
    palette: Palette,
    active_tab: Tab,
    show_uploader: bool,
    api_base_url: String,
}

impl DashboardApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: DashboardConfig, runtime: Handle) -> Self {
        info!("Initializing dashboard against {}", config.api_base_url);
        let api_base_url = config.api_base_url.clone();
        let mut pipeline = Pipeline::new(config, runtime);

        let ctx = cc.egui_ctx.clone();
        pipeline.set_waker(move || ctx.request_repaint());
        pipeline.refresh(RefreshTrigger::Mount);

        Self {
            pipeline,
            palette: Palette::default(),
            active_tab: Tab::default(),
            show_uploader: false,
            api_base_url,
        }
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        if self.pipeline.poll() {
            ctx.request_repaint();
        }

        let busy = self.pipeline.is_refreshing() || self.pipeline.upload_state().is_uploading;
        if busy {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }

    fn handle(&mut self, action: UiAction) {
        match action {
            UiAction::Refresh => {
                self.pipeline.refresh(RefreshTrigger::Manual);
            }
            UiAction::SelectFiles(paths) => self.pipeline.upload_state_mut().select_files(&paths),
            UiAction::SelectFolder(folder) => {
                self.pipeline.upload_state_mut().select_folder(folder)
            }
            UiAction::ClearSelection => self.pipeline.upload_state_mut().clear_selection(),
            UiAction::Upload => {
                if let Err(e) = self.pipeline.submit_selection() {
                    warn!("Upload not started: {}", e);
                    self.pipeline.upload_state_mut().error_message = Some(e.to_string());
                }
            }
            UiAction::AcceptFallback => {
                if let Err(e) = self.pipeline.accept_fallback() {
                    self.pipeline.upload_state_mut().error_message = Some(e.to_string());
                }
            }
            UiAction::DismissFallback => self.pipeline.dismiss_fallback(),
            UiAction::OpenBackend => {
                if let Err(e) = open::that(&self.api_base_url) {
                    warn!("Failed to open {}: {}", self.api_base_url, e);
                }
            }
        }
    }
}

impl App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        let actions = self.render(ctx);
        for action in actions {
            self.handle(action);
        }
    }
}
