//! Session object tying resolution, smoothing and logging together.

use crate::events::{self, EventLogError, EventRecord, EventSink, SnapshotSink};
use crate::gallery::Gallery;
use crate::resolver::FrameResolver;
use crate::smoother::TemporalSmoother;
use crate::types::{DetectedFace, RawDecision, SmoothedDecision};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("frame {frame_index} (ts {timestamp:.3}): {source}")]
    EventLog {
        frame_index: u64,
        timestamp: f64,
        #[source]
        source: EventLogError,
    },
    #[error("closing event log: {0}")]
    Close(#[source] EventLogError),
}

/// Everything the pipeline decided and did for one frame.
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    pub raw: RawDecision,
    pub smoothed: SmoothedDecision,
    pub record: EventRecord,
    /// Path of the snapshot written for this frame, if any.
    pub snapshot: Option<PathBuf>,
}

/// Counters for one recognition session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub snapshots_written: u64,
    pub snapshot_failures: u64,
}

/// One camera session: owns the smoothing history and the event log.
///
/// Frames must be fed in order by a single caller; both the smoother and
/// the log are order-sensitive.
pub struct Pipeline<'g, W: io::Write, S: SnapshotSink> {
    gallery: &'g Gallery,
    threshold: f32,
    resolver: FrameResolver,
    smoother: TemporalSmoother,
    sink: EventSink<W>,
    snapshots: S,
    stats: SessionStats,
}

impl<'g, W: io::Write, S: SnapshotSink> Pipeline<'g, W, S> {
    pub fn new(
        gallery: &'g Gallery,
        threshold: f32,
        window: usize,
        sink: EventSink<W>,
        snapshots: S,
    ) -> Self {
        Self {
            gallery,
            threshold,
            resolver: FrameResolver::new(),
            smoother: TemporalSmoother::new(window),
            sink,
            snapshots,
            stats: SessionStats::default(),
        }
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Resolve, smooth, log and (maybe) snapshot a single frame.
    ///
    /// Only an event-log failure is returned as an error; snapshot
    /// failures are logged and counted.
    pub fn process(
        &mut self,
        frame_index: u64,
        timestamp: f64,
        frame: &S::Frame,
        faces: &[DetectedFace],
    ) -> Result<FrameOutcome, PipelineError> {
        let raw = self.resolver.resolve(faces, self.gallery, self.threshold);
        let identity = self.smoother.push(raw.identity().clone());
        let smoothed = SmoothedDecision::new(identity, &raw);

        let record = self
            .sink
            .record(frame_index, timestamp, &smoothed)
            .map_err(|source| PipelineError::EventLog {
                frame_index,
                timestamp,
                source,
            })?;
        self.stats.frames += 1;

        tracing::debug!(
            frame = frame_index,
            raw = %raw.identity(),
            identity = %smoothed.identity,
            distance = ?smoothed.raw_distance,
            "frame processed"
        );

        let snapshot = match events::should_snapshot(&smoothed) {
            Some(bbox) => match self
                .snapshots
                .write_snapshot(frame, bbox, frame_index, timestamp)
            {
                Ok(path) => {
                    self.stats.snapshots_written += 1;
                    tracing::debug!(frame = frame_index, path = %path.display(), "snapshot saved");
                    Some(path)
                }
                Err(e) => {
                    self.stats.snapshot_failures += 1;
                    tracing::warn!(
                        frame = frame_index,
                        ts = timestamp,
                        error = %e,
                        "snapshot failed; continuing"
                    );
                    None
                }
            },
            None => None,
        };

        Ok(FrameOutcome {
            raw,
            smoothed,
            record,
            snapshot,
        })
    }

    /// Flush and close the event log, returning the writer and session counters.
    pub fn finish(self) -> Result<(W, SessionStats), PipelineError> {
        let stats = self.stats;
        let inner = self.sink.finish().map_err(PipelineError::Close)?;
        Ok((inner, stats))
    }
}
