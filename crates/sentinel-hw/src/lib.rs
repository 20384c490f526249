//! sentinel-hw — Frame acquisition and the collaborators around the core.
//!
//! Provides the frame type, a directory-backed frame source, the detector
//! seam with a sidecar-file implementation, and the JPEG snapshot writer.

pub mod detector;
pub mod frame;
pub mod snapshot;
pub mod source;

pub use detector::{Detector, DetectorError, SidecarDetector};
pub use frame::Frame;
pub use snapshot::JpegSnapshotWriter;
pub use source::{CaptureError, FrameSource, ImageDirSource};
