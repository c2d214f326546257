use crate::detect::result::{Detection, Prediction};

/// Minimum confidence for a detection to count as a package.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;

/// Left edge (pixels) a detection must lie strictly right of.
/// Anything at or left of this line is inside the exclusion zone.
pub const DEFAULT_MIN_X: f64 = 300.0;

/// Confidence and spatial filter applied to every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionFilter {
    pub min_confidence: f64,
    pub min_x: f64,
}

impl Default for DetectionFilter {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            min_x: DEFAULT_MIN_X,
        }
    }
}

impl DetectionFilter {
    pub fn new(min_confidence: f64, min_x: f64) -> Self {
        Self {
            min_confidence,
            min_x,
        }
    }

    /// Returns true when the detection passes both thresholds.
    pub fn retains(&self, detection: &Detection) -> bool {
        detection.confidence >= self.min_confidence && detection.bbox.x_min > self.min_x
    }

    /// Detections that survive the filter, in frame order.
    pub fn retained<'a>(&self, prediction: &'a Prediction) -> Vec<&'a Detection> {
        prediction
            .detections
            .iter()
            .filter(|d| self.retains(d))
            .collect()
    }

    pub fn count(&self, prediction: &Prediction) -> usize {
        prediction
            .detections
            .iter()
            .filter(|d| self.retains(d))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::BoundingBox;

    fn det(confidence: f64, x_min: f64) -> Detection {
        Detection::new(confidence, BoundingBox::new(x_min, 0.0, x_min + 90.0, 50.0))
    }

    #[test]
    fn low_confidence_is_dropped() {
        let prediction = Prediction::new(vec![
            Detection::new(0.9, BoundingBox::new(310.0, 0.0, 400.0, 50.0)),
            Detection::new(0.3, BoundingBox::new(320.0, 0.0, 400.0, 50.0)),
        ]);
        assert_eq!(DetectionFilter::default().count(&prediction), 1);
    }

    #[test]
    fn exclusion_zone_is_dropped() {
        let prediction = Prediction::new(vec![Detection::new(
            0.9,
            BoundingBox::new(100.0, 0.0, 400.0, 50.0),
        )]);
        assert_eq!(DetectionFilter::default().count(&prediction), 0);
    }

    #[test]
    fn confidence_threshold_is_inclusive() {
        let filter = DetectionFilter::default();
        assert!(filter.retains(&det(0.5, 301.0)));
        assert!(!filter.retains(&det(0.4999, 301.0)));
    }

    #[test]
    fn x_threshold_is_exclusive() {
        let filter = DetectionFilter::default();
        assert!(!filter.retains(&det(0.9, 300.0)));
        assert!(filter.retains(&det(0.9, 300.5)));
    }

    #[test]
    fn empty_frame_counts_zero() {
        assert_eq!(DetectionFilter::default().count(&Prediction::default()), 0);
    }

    #[test]
    fn raising_confidence_never_removes_a_detection() {
        let filter = DetectionFilter::default();
        for step in 0..=20 {
            let confidence = step as f64 / 20.0;
            if filter.retains(&det(confidence, 350.0)) {
                assert!(filter.retains(&det((confidence + 0.1).min(1.0), 350.0)));
            }
        }
    }

    #[test]
    fn retained_matches_count_and_keeps_order() {
        let prediction = Prediction::new(vec![
            det(0.95, 500.0),
            det(0.2, 500.0),
            det(0.7, 10.0),
            det(0.6, 301.0),
        ]);
        let filter = DetectionFilter::default();
        let kept = filter.retained(&prediction);
        assert_eq!(kept.len(), filter.count(&prediction));
        assert_eq!(kept[0].confidence, 0.95);
        assert_eq!(kept[1].confidence, 0.6);
    }

    #[test]
    fn custom_thresholds_apply() {
        let filter = DetectionFilter::new(0.8, 0.0);
        assert!(filter.retains(&det(0.85, 10.0)));
        assert!(!filter.retains(&det(0.75, 10.0)));
    }
}
