//! Enrolled face gallery with nearest-neighbor lookup.

use crate::types::{Embedding, GalleryEntry, NO_FACE, UNKNOWN};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("gallery not found: {0} — run `sentinel enroll` first")]
    Missing(PathBuf),
    #[error("failed to read gallery {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed gallery {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode gallery {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("entry {index} ({label}) has {actual}-dim embedding, expected {expected}")]
    DimensionMismatch {
        index: usize,
        label: String,
        expected: usize,
        actual: usize,
    },
    #[error("label {0:?} is reserved")]
    ReservedLabel(String),
}

/// Closest gallery entry to a probe.
///
/// An empty gallery (or an incomparable probe) yields `label: None`
/// with an infinite distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<'a> {
    pub label: Option<&'a str>,
    pub distance: f32,
}

impl Neighbor<'_> {
    pub const NONE: Neighbor<'static> = Neighbor {
        label: None,
        distance: f32::INFINITY,
    };
}

/// Read-only set of enrolled embeddings for one session.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
    dimension: Option<usize>,
}

impl Gallery {
    /// Build a gallery from enrollment output. An empty list is valid.
    pub fn load(entries: Vec<GalleryEntry>) -> Result<Self, GalleryError> {
        let dimension = entries.first().map(|e| e.embedding.dim());

        for (index, entry) in entries.iter().enumerate() {
            if entry.label == UNKNOWN || entry.label == NO_FACE {
                return Err(GalleryError::ReservedLabel(entry.label.clone()));
            }
            if let Some(expected) = dimension {
                if entry.embedding.dim() != expected {
                    return Err(GalleryError::DimensionMismatch {
                        index,
                        label: entry.label.clone(),
                        expected,
                        actual: entry.embedding.dim(),
                    });
                }
            }
        }

        Ok(Self { entries, dimension })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embedding dimension shared by every entry, if any entries exist.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Distinct labels in first-enrolled order.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !labels.contains(&entry.label.as_str()) {
                labels.push(&entry.label);
            }
        }
        labels
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    /// Find the entry closest to `probe` by Euclidean distance.
    /// Exact ties keep the earlier entry.
    pub fn nearest_neighbor(&self, probe: &Embedding) -> Neighbor<'_> {
        let Some(dim) = self.dimension else {
            return Neighbor::NONE;
        };
        if probe.dim() != dim {
            tracing::warn!(
                expected = dim,
                actual = probe.dim(),
                "probe embedding dimension does not match gallery; treating as no match"
            );
            return Neighbor::NONE;
        }

        let mut best: Neighbor<'_> = Neighbor::NONE;
        for entry in &self.entries {
            let distance = probe.euclidean_distance(&entry.embedding);
            if best.label.is_none() || distance < best.distance {
                best = Neighbor {
                    label: Some(&entry.label),
                    distance,
                };
            }
        }
        best
    }
}

/// On-disk gallery: `{"dimension": 128, "entries": [{"label": .., "embedding": [..]}]}`.
#[derive(Debug, Serialize, Deserialize)]
struct GalleryFile {
    #[serde(default)]
    dimension: Option<usize>,
    entries: Vec<GalleryEntry>,
}

/// Read enrolled entries from a gallery file.
///
/// A missing file is [`GalleryError::Missing`]; callers treat it as fatal
/// before any frame is processed.
pub fn load_file(path: &Path) -> Result<Vec<GalleryEntry>, GalleryError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(GalleryError::Missing(path.to_path_buf()))
        }
        Err(source) => {
            return Err(GalleryError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let file: GalleryFile = serde_json::from_str(&raw).map_err(|source| GalleryError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(expected) = file.dimension {
        if let Some((index, entry)) = file
            .entries
            .iter()
            .enumerate()
            .find(|(_, e)| e.embedding.dim() != expected)
        {
            return Err(GalleryError::DimensionMismatch {
                index,
                label: entry.label.clone(),
                expected,
                actual: entry.embedding.dim(),
            });
        }
    }

    Ok(file.entries)
}

/// Write entries as a gallery file, creating the parent directory.
pub fn save_file(path: &Path, entries: &[GalleryEntry]) -> Result<(), GalleryError> {
    let io_err = |source| GalleryError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let file = GalleryFile {
        dimension: entries.first().map(|e| e.embedding.dim()),
        entries: entries.to_vec(),
    };
    let json = serde_json::to_string_pretty(&file).map_err(|source| GalleryError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(label: &str, values: Vec<f32>) -> GalleryEntry {
        GalleryEntry {
            label: label.into(),
            embedding: Embedding::new(values),
        }
    }

    #[test]
    fn test_empty_gallery_is_valid() {
        let gallery = Gallery::load(vec![]).unwrap();
        assert!(gallery.is_empty());
        assert_eq!(gallery.dimension(), None);
    }

    #[test]
    fn test_empty_gallery_nearest_is_infinite() {
        let gallery = Gallery::load(vec![]).unwrap();
        let n = gallery.nearest_neighbor(&Embedding::new(vec![1.0, 0.0]));
        assert!(n.label.is_none());
        assert!(n.distance.is_infinite());
    }

    #[test]
    fn test_nearest_scans_all_entries() {
        let gallery = Gallery::load(vec![
            entry("decoy1", vec![0.0, 1.0, 0.0]),
            entry("decoy2", vec![0.0, 0.0, 1.0]),
            entry("match", vec![1.0, 0.0, 0.0]),
        ])
        .unwrap();

        let n = gallery.nearest_neighbor(&Embedding::new(vec![0.9, 0.0, 0.0]));
        assert_eq!(n.label, Some("match"));
        assert!((n.distance - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_nearest_tie_keeps_first_entry() {
        let gallery = Gallery::load(vec![
            entry("first", vec![1.0, 0.0]),
            entry("second", vec![-1.0, 0.0]),
        ])
        .unwrap();
        let n = gallery.nearest_neighbor(&Embedding::new(vec![0.0, 0.0]));
        assert_eq!(n.label, Some("first"));
    }

    #[test]
    fn test_multiple_entries_per_label() {
        let gallery = Gallery::load(vec![
            entry("alice", vec![1.0, 0.0]),
            entry("bob", vec![0.0, 1.0]),
            entry("alice", vec![0.7, 0.7]),
        ])
        .unwrap();
        assert_eq!(gallery.len(), 3);
        assert_eq!(gallery.labels(), vec!["alice", "bob"]);

        let n = gallery.nearest_neighbor(&Embedding::new(vec![0.7, 0.7]));
        assert_eq!(n.label, Some("alice"));
        assert_eq!(n.distance, 0.0);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let err = Gallery::load(vec![
            entry("alice", vec![1.0, 0.0]),
            entry("bob", vec![1.0, 0.0, 0.0]),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            GalleryError::DimensionMismatch {
                index: 1,
                expected: 2,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_reserved_label_rejected() {
        let err = Gallery::load(vec![entry("unknown", vec![1.0])]).unwrap_err();
        assert!(matches!(err, GalleryError::ReservedLabel(_)));
    }

    #[test]
    fn test_probe_dimension_mismatch_is_no_match() {
        let gallery = Gallery::load(vec![entry("alice", vec![1.0, 0.0])]).unwrap();
        let n = gallery.nearest_neighbor(&Embedding::new(vec![1.0, 0.0, 0.0]));
        assert_eq!(n, Neighbor::NONE);
    }

    #[test]
    fn test_missing_file_is_missing_gallery() {
        let err = load_file(Path::new("/nonexistent/sentinel/gallery.json")).unwrap_err();
        assert!(matches!(err, GalleryError::Missing(_)));
    }

    #[test]
    fn test_file_round_trip_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("gallery.json");
        let entries = vec![entry("bob", vec![0.5, 0.5]), entry("alice", vec![1.0, 0.0])];

        save_file(&path, &entries).unwrap();
        let loaded = load_file(&path).unwrap();

        assert_eq!(loaded, entries);
    }

    #[test]
    fn test_file_dimension_header_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gallery.json");
        std::fs::write(
            &path,
            r#"{"dimension": 3, "entries": [{"label": "alice", "embedding": [1.0, 0.0]}]}"#,
        )
        .unwrap();

        let result = load_file(&path);
        assert!(matches!(result, Err(GalleryError::DimensionMismatch { .. })));
    }
}
