//! Per-frame reduction of detected faces to a single identity decision.

use crate::gallery::Gallery;
use crate::matcher::{EuclideanMatcher, Matcher, RawMatch};
use crate::types::{DetectedFace, Identity, RawDecision};

/// Collapses all faces in a frame to one representative decision.
///
/// Models a single-subject camera: every face is classified and the one
/// closest to the gallery wins, regardless of detection order or size.
#[derive(Debug, Clone, Default)]
pub struct FrameResolver<M = EuclideanMatcher> {
    matcher: M,
}

impl FrameResolver<EuclideanMatcher> {
    pub fn new() -> Self {
        Self {
            matcher: EuclideanMatcher,
        }
    }
}

impl<M: Matcher> FrameResolver<M> {
    pub fn with_matcher(matcher: M) -> Self {
        Self { matcher }
    }

    /// Resolve one frame's faces against the gallery.
    ///
    /// No faces yields `no_face`. Otherwise the face with the globally
    /// minimum distance is reported; exact ties keep the earliest face.
    pub fn resolve(&self, faces: &[DetectedFace], gallery: &Gallery, threshold: f32) -> RawDecision {
        let mut best: Option<(&DetectedFace, RawMatch)> = None;

        for face in faces {
            let result = self.matcher.classify(&face.embedding, gallery, threshold);
            let is_better = match &best {
                None => true,
                Some((_, prev)) => result.distance < prev.distance,
            };
            if is_better {
                best = Some((face, result));
            }
        }

        let Some((face, result)) = best else {
            return RawDecision::no_face();
        };

        let identity = match result.known_label() {
            Some(label) => Identity::Known(label.to_string()),
            None => Identity::Unknown,
        };

        tracing::trace!(
            faces = faces.len(),
            identity = %identity,
            distance = result.distance,
            "frame resolved"
        );

        RawDecision::face(identity, result.distance, face.bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, Embedding, GalleryEntry};

    fn gallery() -> Gallery {
        Gallery::load(vec![
            GalleryEntry {
                label: "alice".into(),
                embedding: Embedding::new(vec![0.0, 0.0]),
            },
            GalleryEntry {
                label: "bob".into(),
                embedding: Embedding::new(vec![10.0, 0.0]),
            },
        ])
        .unwrap()
    }

    fn face(x: f32, y: f32, box_x: i32) -> DetectedFace {
        DetectedFace {
            embedding: Embedding::new(vec![x, y]),
            bbox: BoundingBox::new(box_x, 0, 20, 20),
        }
    }

    #[test]
    fn test_no_faces_is_no_face() {
        let d = FrameResolver::new().resolve(&[], &gallery(), 0.5);
        assert_eq!(d, RawDecision::no_face());
    }

    #[test]
    fn test_single_known_face() {
        let d = FrameResolver::new().resolve(&[face(0.1, 0.0, 5)], &gallery(), 0.5);
        assert_eq!(d.identity(), &Identity::Known("alice".into()));
        assert!((d.distance().unwrap() - 0.1).abs() < 1e-6);
        assert_eq!(d.bbox(), Some(BoundingBox::new(5, 0, 20, 20)));
    }

    #[test]
    fn test_unknown_face_keeps_box_and_distance() {
        let d = FrameResolver::new().resolve(&[face(5.0, 0.0, 7)], &gallery(), 0.5);
        assert_eq!(d.identity(), &Identity::Unknown);
        assert_eq!(d.distance(), Some(5.0));
        assert_eq!(d.bbox(), Some(BoundingBox::new(7, 0, 20, 20)));
    }

    #[test]
    fn test_global_minimum_wins_over_detection_order() {
        // Unknown face first, then bob at 0.3, then alice at 0.2.
        let faces = [face(5.0, 0.0, 1), face(10.3, 0.0, 2), face(0.0, 0.2, 3)];
        let d = FrameResolver::new().resolve(&faces, &gallery(), 0.5);
        assert_eq!(d.identity(), &Identity::Known("alice".into()));
        assert_eq!(d.bbox().unwrap().x, 3);
    }

    #[test]
    fn test_closest_face_reported_even_when_unknown() {
        // Both faces miss the threshold; the nearer one is still chosen.
        let faces = [face(3.0, 0.0, 1), face(0.0, 0.9, 2)];
        let d = FrameResolver::new().resolve(&faces, &gallery(), 0.5);
        assert_eq!(d.identity(), &Identity::Unknown);
        assert_eq!(d.bbox().unwrap().x, 2);
        assert!((d.distance().unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_tie_keeps_first_face_deterministically() {
        let faces = [face(0.0, 0.3, 1), face(0.3, 0.0, 2), face(0.0, -0.3, 3)];
        let resolver = FrameResolver::new();
        let g = gallery();
        for _ in 0..10 {
            let d = resolver.resolve(&faces, &g, 0.5);
            assert_eq!(d.bbox().unwrap().x, 1);
        }
    }

    #[test]
    fn test_empty_gallery_resolves_unknown_with_first_box() {
        let g = Gallery::load(vec![]).unwrap();
        let faces = [face(0.0, 0.0, 11), face(1.0, 1.0, 12)];
        let d = FrameResolver::new().resolve(&faces, &g, 0.5);
        assert_eq!(d.identity(), &Identity::Unknown);
        assert!(d.distance().unwrap().is_infinite());
        assert_eq!(d.bbox().unwrap().x, 11);
    }
}
