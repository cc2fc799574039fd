//! Light color classification
//!
//! The color of a light is obtained from a camera image by a
//! [`LightClassifier`]. The classifier used on the vehicle wraps an object
//! detector whose model is outside of this crate, see [`DetectionClassifier`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::{
    eqpt::cam::CamImage,
    msg::{Detection, LightColor},
};
use log::{trace, warn};

use super::ClassifierParams;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Determines the color of the traffic light visible in an image.
pub trait LightClassifier {
    /// Classify the image, giving `LightColor::Unknown` if no light could be
    /// found.
    fn classify(&mut self, image: &CamImage) -> LightColor;
}

/// An object detector capable of finding traffic lights in an image.
pub trait Detector {
    /// Run detection on the image.
    fn detect(&mut self, image: &CamImage) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A classifier which uses the most confident traffic light detection.
pub struct DetectionClassifier<D: Detector> {
    detector: D,

    /// Detections must score more than this to be used
    min_score: f32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<D: Detector> DetectionClassifier<D> {
    pub fn new(detector: D, min_score: f32) -> Self {
        Self {
            detector,
            min_score,
        }
    }

    pub fn from_params(detector: D, params: &ClassifierParams) -> Self {
        Self::new(detector, params.min_score)
    }
}

impl<D: Detector> LightClassifier for DetectionClassifier<D> {
    fn classify(&mut self, image: &CamImage) -> LightColor {
        let detections = match self.detector.detect(image) {
            Ok(d) => d,
            Err(e) => {
                warn!("Traffic light detection failed: {}", e);
                return LightColor::Unknown;
            }
        };

        let color = best_color(&detections, self.min_score);
        trace!(
            "{} detections, classified as {}",
            detections.len(),
            color
        );

        color
    }
}

/// Get the light color of the highest scoring detection which scores more than
/// `min_score`. Detections of unknown classes are ignored. Ties go to the first
/// detection.
pub fn best_color(detections: &[Detection], min_score: f32) -> LightColor {
    let mut best: Option<(f32, LightColor)> = None;

    for d in detections.iter() {
        let color = LightColor::from_class_id(d.class_id);

        if d.score <= min_score || color == LightColor::Unknown {
            continue;
        }

        match best {
            Some((score, _)) if score >= d.score => (),
            _ => best = Some((d.score, color)),
        }
    }

    best.map(|(_, c)| c).unwrap_or(LightColor::Unknown)
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;
    use comms_if::eqpt::cam::CamId;

    fn det(class_id: u32, score: f32) -> Detection {
        Detection {
            class_id,
            score,
            bbox: [0.0; 4],
        }
    }

    struct FixedDetector(Option<Vec<Detection>>);

    impl Detector for FixedDetector {
        fn detect(
            &mut self,
            _image: &CamImage,
        ) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
            self.0.clone().ok_or_else(|| "detector offline".into())
        }
    }

    #[test]
    fn test_best_color() {
        assert_eq!(best_color(&[], 0.5), LightColor::Unknown);

        // Threshold is exclusive
        assert_eq!(best_color(&[det(2, 0.5)], 0.5), LightColor::Unknown);
        assert_eq!(best_color(&[det(2, 0.51)], 0.5), LightColor::Red);

        // Most confident wins regardless of order
        assert_eq!(
            best_color(&[det(1, 0.7), det(2, 0.9), det(3, 0.6)], 0.5),
            LightColor::Red
        );
        assert_eq!(
            best_color(&[det(3, 0.95), det(2, 0.9)], 0.5),
            LightColor::Yellow
        );

        // Unknown classes don't hide a real light
        assert_eq!(
            best_color(&[det(10, 0.99), det(1, 0.6)], 0.5),
            LightColor::Green
        );

        // Ties go to the first
        assert_eq!(
            best_color(&[det(1, 0.8), det(2, 0.8)], 0.5),
            LightColor::Green
        );
    }

    #[test]
    fn test_detection_classifier() {
        let image = CamImage::blank(CamId::Front, 8, 6, Utc::now());

        let mut c = DetectionClassifier::new(FixedDetector(Some(vec![det(2, 0.9)])), 0.5);
        assert_eq!(c.classify(&image), LightColor::Red);

        let mut c = DetectionClassifier::new(FixedDetector(None), 0.5);
        assert_eq!(c.classify(&image), LightColor::Unknown);
    }
}
