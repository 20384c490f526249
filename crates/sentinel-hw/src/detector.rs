//! Face detector seam.
//!
//! Detection and embedding extraction run outside this crate. A detector
//! maps one frame to zero or more `(embedding, box)` pairs.

use crate::frame::Frame;
use sentinel_core::DetectedFace;
use std::path::PathBuf;
use thiserror::Error;

/// Suffix replacing the image extension for precomputed detections.
pub const SIDECAR_EXTENSION: &str = "faces.json";

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("frame has no source path to locate detections for")]
    NoSource,
    #[error("failed to read detections {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed detections {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("face {index} in {path} has {actual}-dim embedding, expected {expected}")]
    Dimension {
        path: PathBuf,
        index: usize,
        expected: usize,
        actual: usize,
    },
}

/// Produces face embeddings and boxes for a frame.
pub trait Detector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, DetectorError>;
}

/// Reads detections precomputed by an external model.
///
/// For `frame_0007.jpg` the detections live in `frame_0007.faces.json`
/// as a JSON array of `{"embedding": [...], "box": {x, y, width, height}}`.
/// A missing sidecar means the frame has no faces.
#[derive(Debug, Clone, Default)]
pub struct SidecarDetector {
    dimension: Option<usize>,
}

impl SidecarDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject embeddings whose length differs from `dimension`.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: Some(dimension),
        }
    }

    pub fn sidecar_path(frame: &Frame) -> Option<PathBuf> {
        frame
            .source
            .as_ref()
            .map(|p| p.with_extension(SIDECAR_EXTENSION))
    }
}

impl Detector for SidecarDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, DetectorError> {
        let path = Self::sidecar_path(frame).ok_or(DetectorError::NoSource)?;

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(DetectorError::Io { path, source }),
        };

        let faces: Vec<DetectedFace> = match serde_json::from_str(&raw) {
            Ok(faces) => faces,
            Err(source) => return Err(DetectorError::Parse { path, source }),
        };

        if let Some(expected) = self.dimension {
            if let Some((index, face)) = faces
                .iter()
                .enumerate()
                .find(|(_, f)| f.embedding.dim() != expected)
            {
                return Err(DetectorError::Dimension {
                    path,
                    index,
                    expected,
                    actual: face.embedding.dim(),
                });
            }
        }

        Ok(faces)
    }
}
