use crate::gallery::Gallery;
use crate::types::Embedding;

/// Classification of a single probe embedding against the gallery.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMatch {
    /// Label of the nearest gallery entry, if the gallery had any comparable entry.
    pub label: Option<String>,
    /// Euclidean distance to the nearest entry; infinite when there was none.
    pub distance: f32,
    /// `distance < threshold`.
    pub is_known: bool,
}

impl RawMatch {
    /// Label to report: the matched label when known, otherwise `None`.
    pub fn known_label(&self) -> Option<&str> {
        if self.is_known {
            self.label.as_deref()
        } else {
            None
        }
    }
}

/// Strategy for classifying a probe embedding against an enrolled gallery.
pub trait Matcher {
    fn classify(&self, probe: &Embedding, gallery: &Gallery, threshold: f32) -> RawMatch;
}

/// Nearest-neighbor matcher under a strict Euclidean distance threshold.
///
/// The threshold is not validated: a negative value makes every face
/// unknown, and a distance exactly equal to the threshold is unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanMatcher;

impl Matcher for EuclideanMatcher {
    fn classify(&self, probe: &Embedding, gallery: &Gallery, threshold: f32) -> RawMatch {
        let nearest = gallery.nearest_neighbor(probe);
        RawMatch {
            label: nearest.label.map(str::to_string),
            distance: nearest.distance,
            is_known: nearest.distance < threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GalleryEntry;

    fn alice_gallery() -> Gallery {
        Gallery::load(vec![GalleryEntry {
            label: "alice".into(),
            embedding: Embedding::new(vec![0.0, 0.0]),
        }])
        .unwrap()
    }

    #[test]
    fn test_empty_gallery_never_known() {
        let gallery = Gallery::load(vec![]).unwrap();
        let probe = Embedding::new(vec![0.0, 0.0]);
        for threshold in [-1.0, 0.0, 0.5, 1e6, f32::MAX, f32::INFINITY] {
            let m = EuclideanMatcher.classify(&probe, &gallery, threshold);
            assert!(!m.is_known, "threshold {threshold} matched an empty gallery");
            assert!(m.label.is_none());
            assert!(m.distance.is_infinite());
        }
    }

    #[test]
    fn test_known_below_threshold() {
        let m = EuclideanMatcher.classify(&Embedding::new(vec![0.3, 0.0]), &alice_gallery(), 0.5);
        assert!(m.is_known);
        assert_eq!(m.known_label(), Some("alice"));
    }

    #[test]
    fn test_threshold_is_strict() {
        let m = EuclideanMatcher.classify(&Embedding::new(vec![0.5, 0.0]), &alice_gallery(), 0.5);
        assert_eq!(m.distance, 0.5);
        assert!(!m.is_known);
        assert_eq!(m.known_label(), None);
        assert_eq!(m.label.as_deref(), Some("alice"));
    }

    #[test]
    fn test_negative_threshold_forces_unknown() {
        let m = EuclideanMatcher.classify(&Embedding::new(vec![0.0, 0.0]), &alice_gallery(), -0.1);
        assert_eq!(m.distance, 0.0);
        assert!(!m.is_known);
    }

    #[test]
    fn test_threshold_monotonicity() {
        let gallery = alice_gallery();
        let probes: Vec<Embedding> = [0.0f32, 0.1, 0.25, 0.5, 0.75, 1.0, 3.0]
            .iter()
            .map(|&x| Embedding::new(vec![x, 0.0]))
            .collect();
        let thresholds = [-1.0f32, 0.0, 0.1, 0.3, 0.5, 0.8, 2.0, 10.0];

        for probe in &probes {
            let mut was_known = false;
            for &t in &thresholds {
                let known = EuclideanMatcher.classify(probe, &gallery, t).is_known;
                assert!(
                    known || !was_known,
                    "probe {:?} went known→unknown as threshold rose to {t}",
                    probe.values
                );
                was_known = known;
            }
        }
    }
}
