//! JPEG snapshots of unrecognized faces.

use crate::frame::Frame;
use image::ImageFormat;
use sentinel_core::events::snapshot_file_name;
use sentinel_core::{BoundingBox, SnapshotError, SnapshotSink};
use std::path::{Path, PathBuf};

/// Writes face crops to `<dir>/unknown_<secs>_<frame>.jpg`.
pub struct JpegSnapshotWriter {
    dir: PathBuf,
}

impl JpegSnapshotWriter {
    /// The directory must already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SnapshotSink for JpegSnapshotWriter {
    type Frame = Frame;

    fn write_snapshot(
        &mut self,
        frame: &Frame,
        bbox: BoundingBox,
        frame_index: u64,
        timestamp: f64,
    ) -> Result<PathBuf, SnapshotError> {
        let crop = frame.crop(&bbox).ok_or(SnapshotError::EmptyCrop {
            bbox,
            frame_width: frame.width(),
            frame_height: frame.height(),
        })?;

        let path = self.dir.join(snapshot_file_name(timestamp, frame_index));
        match crop.save_with_format(&path, ImageFormat::Jpeg) {
            Ok(()) => Ok(path),
            Err(image::ImageError::IoError(source)) => Err(SnapshotError::Io { path, source }),
            Err(e) => Err(SnapshotError::Encode {
                path,
                reason: e.to_string(),
            }),
        }
    }
}
