//! Detector output, one JSON value per frame.
//!
//! `null` (or a blank line) means no face was found in that frame. Otherwise
//! the object carries the detector box, optional landmark points and the
//! expression probabilities.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::estimator::Observation;
use crate::expression::ExpressionSample;
use crate::geometry::{BoundingBox, Point};

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("malformed detection on line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Which face region feeds the overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxSource {
    /// The detector's own bounding box.
    #[default]
    Detector,
    /// Landmark extent plus margin; falls back to the detector box when no
    /// landmarks were reported.
    Landmarks,
}

impl BoxSource {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "detector" | "box" => Some(Self::Detector),
            "landmarks" | "landmark" => Some(Self::Landmarks),
            _ => None,
        }
    }
}

/// A single face found by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "box")]
    pub bounding_box: BoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<Vec<Point>>,
    #[serde(default)]
    pub expressions: ExpressionSample,
}

impl Detection {
    /// Resolve the region to draw for this frame.
    pub fn region(&self, source: BoxSource, margin: f32) -> BoundingBox {
        match source {
            BoxSource::Detector => self.bounding_box,
            BoxSource::Landmarks => self
                .landmarks
                .as_deref()
                .and_then(|points| BoundingBox::from_landmarks(points, margin))
                .unwrap_or(self.bounding_box),
        }
    }

    /// Reduce to what the estimator consumes.
    pub fn observe(&self, source: BoxSource, margin: f32) -> Observation {
        Observation {
            expressions: self.expressions,
            region: self.region(source, margin),
        }
    }
}

/// Parse one frame line. `line_no` is only used for error reporting.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<Detection>, DetectionError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed).map_err(|source| DetectionError::Malformed {
        line: line_no,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WITH_LANDMARKS: &str = r#"{
        "box": {"x": 10, "y": 20, "width": 100, "height": 120},
        "landmarks": [[20.0, 40.0], [70.0, 40.0], [45.0, 90.0]],
        "expressions": {"angry": 0.5, "happy": 0.2}
    }"#;

    #[test]
    fn test_null_and_blank_mean_no_face() {
        assert!(parse_line("null", 1).unwrap().is_none());
        assert!(parse_line("   ", 2).unwrap().is_none());
    }

    #[test]
    fn test_parse_full_detection() {
        let d = parse_line(WITH_LANDMARKS, 1).unwrap().unwrap();
        assert_eq!(d.bounding_box, BoundingBox::new(10.0, 20.0, 100.0, 120.0));
        assert_eq!(d.landmarks.as_ref().map(Vec::len), Some(3));
        assert_eq!(d.expressions.angry, 0.5);
        assert_eq!(d.expressions.fearful, 0.0);
    }

    #[test]
    fn test_expressions_optional() {
        let d = parse_line(r#"{"box": {"x": 0, "y": 0, "width": 1, "height": 1}}"#, 1)
            .unwrap()
            .unwrap();
        assert_eq!(d.expressions, ExpressionSample::default());
    }

    #[test]
    fn test_malformed_reports_line() {
        let err = parse_line(r#"{"box": 3}"#, 7).unwrap_err();
        assert!(matches!(err, DetectionError::Malformed { line: 7, .. }));
        assert!(err.to_string().contains("line 7"));
    }

    #[test]
    fn test_region_detector_box() {
        let d = parse_line(WITH_LANDMARKS, 1).unwrap().unwrap();
        assert_eq!(d.region(BoxSource::Detector, 0.1), d.bounding_box);
    }

    #[test]
    fn test_region_landmark_box() {
        let d = parse_line(WITH_LANDMARKS, 1).unwrap().unwrap();
        let r = d.region(BoxSource::Landmarks, 0.1);
        // extent 50 x 50 from (20, 40), 5 px per side
        assert!((r.x - 15.0).abs() < 1e-4);
        assert!((r.y - 35.0).abs() < 1e-4);
        assert!((r.width - 60.0).abs() < 1e-4);
        assert!((r.height - 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_region_landmarks_fall_back_to_box() {
        let mut d = parse_line(WITH_LANDMARKS, 1).unwrap().unwrap();
        d.landmarks = Some(Vec::new());
        assert_eq!(d.region(BoxSource::Landmarks, 0.1), d.bounding_box);
        d.landmarks = None;
        assert_eq!(d.region(BoxSource::Landmarks, 0.1), d.bounding_box);
    }

    #[test]
    fn test_box_source_from_name() {
        assert_eq!(BoxSource::from_name("Landmarks"), Some(BoxSource::Landmarks));
        assert_eq!(BoxSource::from_name("detector"), Some(BoxSource::Detector));
        assert_eq!(BoxSource::from_name("mesh"), None);
    }
}
