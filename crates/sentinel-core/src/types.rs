use serde::{Deserialize, Serialize};
use std::fmt;

/// Label rendered for a frame with no detected face.
pub const NO_FACE: &str = "no_face";
/// Label rendered for a face that did not match the gallery.
pub const UNKNOWN: &str = "unknown";

/// Axis-aligned face box in frame pixels (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Area in pixels; zero for degenerate or inverted boxes.
    pub fn area(&self) -> i64 {
        if self.width <= 0 || self.height <= 0 {
            0
        } else {
            self.width as i64 * self.height as i64
        }
    }
}

/// Face embedding vector (typically 128-dimensional).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Compute Euclidean distance between two embeddings.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self { values }
    }
}

/// One enrolled reference embedding. Several entries may share a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub label: String,
    pub embedding: Embedding,
}

/// A face reported by the detector for a single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
    pub embedding: Embedding,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

/// Per-frame identity value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    NoFace,
    Unknown,
    Known(String),
}

impl Identity {
    pub fn as_str(&self) -> &str {
        match self {
            Identity::NoFace => NO_FACE,
            Identity::Unknown => UNKNOWN,
            Identity::Known(label) => label,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Identity::Unknown)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        match s {
            NO_FACE => Identity::NoFace,
            UNKNOWN => Identity::Unknown,
            label => Identity::Known(label.to_string()),
        }
    }
}

impl Serialize for Identity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Identity::from(s.as_str()))
    }
}

/// Unsmoothed decision for one frame.
///
/// `distance` and `bbox` are present exactly when a face was detected;
/// the constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDecision {
    identity: Identity,
    distance: Option<f32>,
    bbox: Option<BoundingBox>,
}

impl RawDecision {
    pub fn no_face() -> Self {
        Self {
            identity: Identity::NoFace,
            distance: None,
            bbox: None,
        }
    }

    /// Decision for a detected face. `identity` must not be `NoFace`.
    pub fn face(identity: Identity, distance: f32, bbox: BoundingBox) -> Self {
        debug_assert!(identity != Identity::NoFace);
        Self {
            identity,
            distance: Some(distance),
            bbox: Some(bbox),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn distance(&self) -> Option<f32> {
        self.distance
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        self.bbox
    }
}

/// Decision after temporal smoothing. Only the identity is smoothed;
/// distance and box are the current frame's raw values.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedDecision {
    pub identity: Identity,
    pub raw_distance: Option<f32>,
    pub raw_bbox: Option<BoundingBox>,
}

impl SmoothedDecision {
    pub fn new(identity: Identity, raw: &RawDecision) -> Self {
        Self {
            identity,
            raw_distance: raw.distance(),
            raw_bbox: raw.bbox(),
        }
    }
}
