use sentinel_core::events::EventLogError;
use sentinel_core::{DetectedFace, EventSink, Gallery, Pipeline, PipelineError, SessionStats, SnapshotSink};
use sentinel_hw::{Detector, Frame, FrameSource};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to create event log {path}: {source}")]
    OpenLog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("event log error: {0}")]
    EventLog(#[from] EventLogError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("engine thread exited")]
    ChannelClosed,
}

/// One captured frame with its detections, in capture order.
pub struct FrameJob {
    pub index: u64,
    pub timestamp: f64,
    pub frame: Frame,
    pub faces: Vec<DetectedFace>,
}

/// What the capture thread did before it stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    pub frames_read: u64,
    pub detector_failures: u64,
    pub cancelled: bool,
    /// Set when the source failed and the stream was ended early.
    pub source_error: Option<String>,
}

/// Outcome of a finished session.
pub struct SessionReport<W> {
    pub log: W,
    pub stats: SessionStats,
    pub capture: CaptureSummary,
}

/// Seconds since the Unix epoch with microsecond resolution.
pub fn epoch_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Create `events_%Y%m%d_%H%M%S.csv` in `log_dir` and write its header.
pub fn open_event_log(log_dir: &Path) -> Result<(PathBuf, EventSink<File>), EngineError> {
    let name = chrono::Local::now()
        .format("events_%Y%m%d_%H%M%S.csv")
        .to_string();
    let path = log_dir.join(name);
    let file = File::create(&path).map_err(|source| EngineError::OpenLog {
        path: path.clone(),
        source,
    })?;
    let sink = EventSink::new(file)?;
    tracing::info!(path = %path.display(), "event log opened");
    Ok((path, sink))
}

/// Running session: a capture thread feeding an engine thread.
pub struct SessionHandle<W> {
    cancel: Arc<AtomicBool>,
    capture_done: oneshot::Receiver<CaptureSummary>,
    engine_done: oneshot::Receiver<Result<(W, SessionStats), EngineError>>,
}

impl<W> SessionHandle<W> {
    /// Flag that stops the capture thread before its next read.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Wait for both threads. The engine drains every queued frame and
    /// closes the log before this resolves.
    pub async fn wait(self) -> Result<SessionReport<W>, EngineError> {
        let engine = self.engine_done.await.map_err(|_| EngineError::ChannelClosed)?;
        // The capture thread exits once the engine drops its receiver.
        let capture = self.capture_done.await.map_err(|_| EngineError::ChannelClosed)?;
        let (log, stats) = engine?;
        Ok(SessionReport {
            log,
            stats,
            capture,
        })
    }
}

/// Engine settings shared by both threads.
pub struct SessionSettings {
    pub threshold: f32,
    pub window: usize,
    pub queue_depth: usize,
}

/// Spawn the capture and engine threads.
///
/// Capture reads and detects frames and sends them over a bounded
/// channel; the engine is its only consumer, so frames reach the
/// smoother and the event log in capture order.
pub fn start_session<F, D, W, S>(
    source: F,
    detector: D,
    gallery: Arc<Gallery>,
    sink: EventSink<W>,
    snapshots: S,
    settings: SessionSettings,
) -> Result<SessionHandle<W>, EngineError>
where
    F: FrameSource + Send + 'static,
    D: Detector + Send + 'static,
    W: io::Write + Send + 'static,
    S: SnapshotSink<Frame = Frame> + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<FrameJob>(settings.queue_depth.max(1));
    let (engine_tx, engine_done) = oneshot::channel();
    let (capture_tx, capture_done) = oneshot::channel();
    let cancel = Arc::new(AtomicBool::new(false));

    let SessionSettings {
        threshold, window, ..
    } = settings;

    std::thread::Builder::new()
        .name("sentinel-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            let pipeline = Pipeline::new(&gallery, threshold, window, sink, snapshots);
            let result = run_engine(pipeline, rx);
            let _ = engine_tx.send(result);
            tracing::info!("engine thread exiting");
        })
        .map_err(|source| EngineError::Spawn {
            name: "engine",
            source,
        })?;

    let capture_cancel = cancel.clone();
    std::thread::Builder::new()
        .name("sentinel-capture".into())
        .spawn(move || {
            let summary = run_capture(source, detector, tx, &capture_cancel);
            let _ = capture_tx.send(summary);
        })
        .map_err(|source| EngineError::Spawn {
            name: "capture",
            source,
        })?;

    Ok(SessionHandle {
        cancel,
        capture_done,
        engine_done,
    })
}

/// Consume frames in order until the capture side hangs up.
///
/// An event-log failure aborts the session: the receiver is dropped so
/// capture stops, and rows already written stay aligned with frames.
fn run_engine<W, S>(
    mut pipeline: Pipeline<'_, W, S>,
    mut rx: mpsc::Receiver<FrameJob>,
) -> Result<(W, SessionStats), EngineError>
where
    W: io::Write,
    S: SnapshotSink<Frame = Frame>,
{
    while let Some(job) = rx.blocking_recv() {
        if let Err(e) = pipeline.process(job.index, job.timestamp, &job.frame, &job.faces) {
            tracing::error!(frame = job.index, ts = job.timestamp, error = %e, "event log failed; aborting session");
            return Err(e.into());
        }
    }
    Ok(pipeline.finish()?)
}

/// Read frames, run detection and hand jobs to the engine.
///
/// A detector failure downgrades the frame to "no faces"; a source
/// failure ends the stream.
fn run_capture<F: FrameSource, D: Detector>(
    mut source: F,
    mut detector: D,
    tx: mpsc::Sender<FrameJob>,
    cancel: &AtomicBool,
) -> CaptureSummary {
    let mut summary = CaptureSummary::default();
    let mut index = 0u64;

    loop {
        if cancel.load(Ordering::SeqCst) {
            tracing::info!(frames = index, "capture cancelled");
            summary.cancelled = true;
            break;
        }

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::info!(frames = index, "frame source exhausted");
                break;
            }
            Err(e) => {
                tracing::error!(frame = index, error = %e, "frame source failed; ending stream");
                summary.source_error = Some(e.to_string());
                break;
            }
        };
        let timestamp = epoch_seconds();
        summary.frames_read += 1;

        let faces = match detector.detect(&frame) {
            Ok(faces) => faces,
            Err(e) => {
                summary.detector_failures += 1;
                tracing::warn!(frame = index, ts = timestamp, error = %e, "detection failed; treating frame as no_face");
                Vec::new()
            }
        };

        let job = FrameJob {
            index,
            timestamp,
            frame,
            faces,
        };
        if tx.blocking_send(job).is_err() {
            tracing::debug!(frame = index, "engine gone; stopping capture");
            break;
        }
        index += 1;
    }

    summary
}
