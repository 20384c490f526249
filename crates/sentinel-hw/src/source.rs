//! Frame sources. End of stream is `Ok(None)`.

use crate::frame::Frame;
use std::path::{Path, PathBuf};
use thiserror::Error;

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "ppm"];

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("frame directory not found: {0}")]
    DirNotFound(PathBuf),
    #[error("failed to list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode frame {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Supplies successive frames until exhausted.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError>;
}

/// Replays image files from a directory in file-name order.
pub struct ImageDirSource {
    files: std::vec::IntoIter<PathBuf>,
    total: usize,
}

impl ImageDirSource {
    pub fn open(dir: &Path) -> Result<Self, CaptureError> {
        if !dir.is_dir() {
            return Err(CaptureError::DirNotFound(dir.to_path_buf()));
        }
        let files = list_images(dir)?;
        tracing::info!(dir = %dir.display(), frames = files.len(), "opened frame directory");

        Ok(Self {
            total: files.len(),
            files: files.into_iter(),
        })
    }

    /// Number of frames the directory held when opened.
    pub fn total(&self) -> usize {
        self.total
    }
}

impl FrameSource for ImageDirSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        let Some(path) = self.files.next() else {
            return Ok(None);
        };
        let frame = Frame::open(&path).map_err(|source| CaptureError::Decode { path, source })?;
        Ok(Some(frame))
    }
}

/// Image files directly under `dir`, sorted by file name.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, CaptureError> {
    let io_err = |source| CaptureError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && is_image(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(dir: &Path, name: &str, shade: u8) {
        RgbImage::from_pixel(4, 4, Rgb([shade, shade, shade]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn test_missing_dir() {
        let err = ImageDirSource::open(Path::new("/nonexistent/sentinel-frames")).err().unwrap();
        assert!(matches!(err, CaptureError::DirNotFound(_)));
    }

    #[test]
    fn test_frames_in_name_order_then_end() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "frame_0002.png", 20);
        write_png(dir.path(), "frame_0001.png", 10);
        std::fs::write(dir.path().join("frame_0001.faces.json"), "[]").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut source = ImageDirSource::open(dir.path()).unwrap();
        assert_eq!(source.total(), 2);

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.image.get_pixel(0, 0), &Rgb([10, 10, 10]));
        assert!(first.source.unwrap().ends_with("frame_0001.png"));

        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.image.get_pixel(0, 0), &Rgb([20, 20, 20]));

        assert!(source.next_frame().unwrap().is_none());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_frame_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.png"), b"not a png").unwrap();
        let mut source = ImageDirSource::open(dir.path()).unwrap();
        assert!(matches!(source.next_frame(), Err(CaptureError::Decode { .. })));
    }
}
