//! sentinel-core — Per-frame identity resolution and temporal decisions.
//!
//! Matches face embeddings against an enrolled gallery by Euclidean
//! distance, collapses each frame to a single identity, smooths that
//! identity with a majority vote over recent frames, and writes one
//! event-log row per frame.

pub mod events;
pub mod gallery;
pub mod matcher;
pub mod pipeline;
pub mod resolver;
pub mod smoother;
pub mod types;

pub use events::{EventLogError, EventRecord, EventSink, SnapshotError, SnapshotSink};
pub use gallery::{Gallery, GalleryError, Neighbor};
pub use matcher::{EuclideanMatcher, Matcher, RawMatch};
pub use pipeline::{FrameOutcome, Pipeline, PipelineError, SessionStats};
pub use resolver::FrameResolver;
pub use smoother::TemporalSmoother;
pub use types::{
    BoundingBox, DetectedFace, Embedding, GalleryEntry, Identity, RawDecision, SmoothedDecision,
};

/// Default distance threshold for a positive match.
pub const DEFAULT_THRESHOLD: f32 = 0.50;

/// Default number of frames in the smoothing window.
pub const DEFAULT_WINDOW: usize = 5;
