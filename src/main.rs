use anyhow::{Context, Result};
use clap::Parser;
use sauna_dashboard::app::DashboardApp;
use sauna_dashboard::dashboard::{Area, DashboardFetcher};
use sauna_dashboard::upload::{
    load_files, upload_with_fallback, DataType, UploadBatch, UploadClient, UploadMode,
};
use sauna_dashboard::{DashboardConfig, UploadError};
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sauna-dashboard")]
#[command(about = "Sauna analytics dashboard with CSV upload")]
struct Args {
    /// Backend base URL
    #[arg(long, env = "SAUNA_API_BASE_URL", default_value = "")]
    api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "SAUNA_REQUEST_TIMEOUT_SECS", default_value = "30")]
    timeout_secs: u64,

    /// Probe /api/test-upload before each upload
    #[arg(long)]
    probe: bool,

    /// CSV files to upload without opening the window
    #[arg(long, num_args = 1..)]
    upload: Vec<PathBuf>,

    /// Data type tag for --upload
    #[arg(long, default_value = "auto")]
    data_type: String,

    /// Endpoint mode for --upload: auto, single or multiple
    #[arg(long, default_value = "auto")]
    mode: String,

    /// Retry through the simple endpoint if the standard upload fails
    #[arg(long)]
    simple_fallback: bool,
}

fn parse_mode(mode: &str) -> Result<UploadMode> {
    match mode {
        "auto" => Ok(UploadMode::Auto),
        "single" => Ok(UploadMode::Single),
        "multiple" => Ok(UploadMode::Multiple),
        other => anyhow::bail!("Unknown upload mode: {}", other),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sauna_dashboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config =
        DashboardConfig::with_base_url(&args.api_url).context("Invalid configuration")?;
    config.request_timeout = Duration::from_secs(args.timeout_secs);
    config.probe_before_upload = args.probe;

    let runtime = Runtime::new().context("Failed to start tokio runtime")?;

    if !args.upload.is_empty() {
        return runtime.block_on(upload_headless(&args, config));
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_min_inner_size([500.0, 500.0]),
        ..Default::default()
    };

    let handle = runtime.handle().clone();
    eframe::run_native(
        "Sauna Analytics Dashboard",
        options,
        Box::new(move |cc| Box::new(DashboardApp::new(cc, config, handle))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run window: {}", e))
}

async fn upload_headless(args: &Args, config: DashboardConfig) -> Result<()> {
    let data_type: DataType = args.data_type.parse()?;
    let mode = parse_mode(&args.mode)?;
    let files = load_files(&args.upload)?;
    let batch = UploadBatch::with_inferred_type(files, data_type)?;

    let client = UploadClient::new(config.clone());
    let simple_fallback = args.simple_fallback;
    let mut consent = |e: &UploadError| {
        if simple_fallback {
            warn!("Standard upload failed ({}), retrying in simple mode", e);
        } else {
            warn!("Standard upload failed; pass --simple-fallback to retry in simple mode");
        }
        simple_fallback
    };

    let report = match upload_with_fallback(&client, &batch, mode, &mut consent).await {
        Ok(report) => report,
        Err(e) => {
            error!("Upload failed: {}", e);
            return Err(e.into());
        }
    };
    info!("{}", report.summary_message());
    if let Some(errors) = report.outcome.error_message() {
        warn!("{}", errors);
    }

    if report.outcome.any_success() {
        let fetcher = DashboardFetcher::new(config);
        match fetcher.refresh_after_upload().await {
            Ok(snapshot) => {
                for area in Area::ALL {
                    info!("{}: {} field(s)", area.title(), snapshot.area(area).len());
                }
            }
            Err(e) => warn!("Dashboard refresh after upload failed: {}", e),
        }
    }

    Ok(())
}
