use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod engine;

use config::Config;
use engine::SessionSettings;
use sentinel_core::Gallery;
use sentinel_hw::{ImageDirSource, JpegSnapshotWriter, SidecarDetector};

#[derive(Parser)]
#[command(name = "sentineld", about = "Sentinel face-identification service")]
struct Cli {
    /// TOML config file (also read from SENTINEL_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Gallery file produced by `sentinel enroll`
    #[arg(long)]
    gallery: Option<PathBuf>,
    /// Distance threshold (~0.4-0.6 typical)
    #[arg(long, allow_negative_numbers = true)]
    threshold: Option<f32>,
    /// Identity smoothing window, in frames
    #[arg(long)]
    window: Option<usize>,
    #[arg(long)]
    log_dir: Option<PathBuf>,
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,
    /// Directory of frames to process
    #[arg(long)]
    frames: Option<PathBuf>,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(v) = self.gallery {
            config.gallery_path = v;
        }
        if let Some(v) = self.threshold {
            config.threshold = v;
        }
        if let Some(v) = self.window {
            config.window = v;
        }
        if let Some(v) = self.log_dir {
            config.log_dir = v;
        }
        if let Some(v) = self.snapshot_dir {
            config.snapshot_dir = v;
        }
        if let Some(v) = self.frames {
            config.frame_dir = v;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut cli = Cli::parse();
    let config_path = cli
        .config
        .take()
        .or_else(|| std::env::var("SENTINEL_CONFIG").ok().map(PathBuf::from));
    let mut config = Config::load(config_path.as_deref())?;
    cli.apply(&mut config);

    tracing::info!(
        threshold = config.threshold,
        window = config.window,
        frames = %config.frame_dir.display(),
        "sentineld starting"
    );

    for dir in [&config.log_dir, &config.snapshot_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
    }

    // Missing or malformed gallery is fatal before any frame is read.
    let entries = sentinel_core::gallery::load_file(&config.gallery_path)?;
    let gallery = Gallery::load(entries)?;
    tracing::info!(
        entries = gallery.len(),
        labels = ?gallery.labels(),
        "gallery loaded"
    );
    if gallery.is_empty() {
        tracing::warn!("gallery is empty; every face will be reported as unknown");
    }

    let source = ImageDirSource::open(&config.frame_dir)?;
    let detector = match gallery.dimension() {
        Some(dim) => SidecarDetector::with_dimension(dim),
        None => SidecarDetector::new(),
    };
    let (log_path, sink) = engine::open_event_log(&config.log_dir)?;

    let handle = engine::start_session(
        source,
        detector,
        Arc::new(gallery),
        sink,
        JpegSnapshotWriter::new(&config.snapshot_dir),
        SessionSettings {
            threshold: config.threshold,
            window: config.window,
            queue_depth: config.queue_depth,
        },
    )?;
    tracing::info!("sentineld ready");

    let cancel = handle.cancel_flag();
    let wait = handle.wait();
    tokio::pin!(wait);

    let report = tokio::select! {
        report = &mut wait => report,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("sentineld shutting down");
            cancel.store(true, Ordering::SeqCst);
            wait.await
        }
    }?;

    report.log.sync_all().context("syncing event log")?;
    tracing::info!(
        path = %log_path.display(),
        frames = report.stats.frames,
        frames_read = report.capture.frames_read,
        cancelled = report.capture.cancelled,
        snapshots = report.stats.snapshots_written,
        snapshot_failures = report.stats.snapshot_failures,
        detector_failures = report.capture.detector_failures,
        "session complete; events saved"
    );
    if let Some(err) = report.capture.source_error {
        tracing::warn!(error = %err, "frame source ended with an error");
    }

    Ok(())
}
