//! Build gallery entries from labeled reference images.
//!
//! Layout: `<ref_dir>/<label>/<image>`, one directory per person, any
//! number of images each. Every image contributes the embedding of its
//! first detected face.

use anyhow::{bail, Context, Result};
use sentinel_core::types::{NO_FACE, UNKNOWN};
use sentinel_core::GalleryEntry;
use sentinel_hw::source::list_images;
use sentinel_hw::{Detector, Frame};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct EnrollReport {
    pub entries: Vec<GalleryEntry>,
    /// Images with no usable face, or that failed to decode or detect.
    pub skipped: Vec<PathBuf>,
}

pub fn collect_entries<D: Detector>(ref_dir: &Path, detector: &mut D) -> Result<EnrollReport> {
    if !ref_dir.is_dir() {
        bail!("reference directory not found: {}", ref_dir.display());
    }

    let mut person_dirs: Vec<PathBuf> = std::fs::read_dir(ref_dir)
        .with_context(|| format!("listing {}", ref_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    person_dirs.sort();

    let mut report = EnrollReport::default();

    for person_dir in person_dirs {
        let Some(label) = person_dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        if label == UNKNOWN || label == NO_FACE {
            tracing::warn!(label = %label, "skipping reserved label");
            continue;
        }

        for image_path in list_images(&person_dir)? {
            let frame = match Frame::open(&image_path) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(path = %image_path.display(), error = %e, "skipping unreadable image");
                    report.skipped.push(image_path);
                    continue;
                }
            };

            let faces = match detector.detect(&frame) {
                Ok(faces) => faces,
                Err(e) => {
                    tracing::warn!(path = %image_path.display(), error = %e, "skipping image");
                    report.skipped.push(image_path);
                    continue;
                }
            };

            let Some(face) = faces.into_iter().next() else {
                tracing::debug!(path = %image_path.display(), "no face found");
                report.skipped.push(image_path);
                continue;
            };

            tracing::debug!(label = %label, path = %image_path.display(), "enrolled");
            report.entries.push(GalleryEntry {
                label: label.clone(),
                embedding: face.embedding,
            });
        }
    }

    Ok(report)
}
