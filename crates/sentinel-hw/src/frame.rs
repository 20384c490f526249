//! Frame type and face-region cropping.

use image::{imageops, RgbImage};
use sentinel_core::BoundingBox;
use std::path::{Path, PathBuf};

/// A decoded RGB frame.
#[derive(Clone)]
pub struct Frame {
    pub image: RgbImage,
    /// File the frame was decoded from, when it came from disk.
    pub source: Option<PathBuf>,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self {
            image,
            source: None,
        }
    }

    /// Decode an image file into a frame.
    pub fn open(path: &Path) -> Result<Self, image::ImageError> {
        let image = image::open(path)?.to_rgb8();
        Ok(Self {
            image,
            source: Some(path.to_path_buf()),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Intersect `bbox` with the frame bounds as `(x, y, width, height)`.
    ///
    /// Returns `None` when nothing of the box lies inside the frame.
    pub fn clamp_box(&self, bbox: &BoundingBox) -> Option<(u32, u32, u32, u32)> {
        let x0 = i64::from(bbox.x).max(0);
        let y0 = i64::from(bbox.y).max(0);
        let x1 = (i64::from(bbox.x) + i64::from(bbox.width)).min(i64::from(self.width()));
        let y1 = (i64::from(bbox.y) + i64::from(bbox.height)).min(i64::from(self.height()));

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }

    /// Copy the face region out of the frame, clipped to the frame bounds.
    pub fn crop(&self, bbox: &BoundingBox) -> Option<RgbImage> {
        let (x, y, w, h) = self.clamp_box(bbox)?;
        Some(imageops::crop_imm(&self.image, x, y, w, h).to_image())
    }
}
