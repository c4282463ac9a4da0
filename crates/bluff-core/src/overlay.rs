use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;
use crate::scoring::Assessment;

/// Stroke and label-background color of the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayColor {
    Red,
    Green,
}

impl OverlayColor {
    pub fn for_classification(bluffing: bool) -> Self {
        if bluffing {
            Self::Red
        } else {
            Self::Green
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
        }
    }
}

/// Everything the renderer needs for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    #[serde(rename = "box")]
    pub bounding_box: BoundingBox,
    pub label: String,
    pub color: OverlayColor,
    #[serde(flatten)]
    pub assessment: Assessment,
}

impl Overlay {
    pub fn new(bounding_box: BoundingBox, assessment: Assessment) -> Self {
        Self {
            bounding_box,
            label: label(assessment.bluffing, assessment.confidence),
            color: OverlayColor::for_classification(assessment.bluffing),
            assessment,
        }
    }
}

/// Display label: the bluffing side shows the confidence, the other side its complement.
pub fn label(bluffing: bool, confidence: f32) -> String {
    if bluffing {
        format!("Bluffing {}%", round_percent(confidence))
    } else {
        format!("Not Bluffing {}%", round_percent(100.0 - confidence))
    }
}

/// Round half up and clamp into [0, 100].
fn round_percent(value: f32) -> u32 {
    (value + 0.5).floor().clamp(0.0, 100.0) as u32
}
