//! Bluff scoring policies.
//!
//! Three formulas have been used for the overlay over time. Rather than pick
//! one silently, each is a named [`ScoringPolicy`] selected by configuration:
//!
//! - [`ScoringPolicy::LinearThreshold`]: raw score as a percentage, bluffing above 10.
//! - [`ScoringPolicy::SigmoidRescale`]: logistic squash rescaled into [30, 90],
//!   bluffing above 50. The floor and ceiling keep the display away from
//!   extreme values while the face is at rest.
//! - [`ScoringPolicy::ExponentialSmoothing`]: percentage target blended into the
//!   previous confidence once per frame, bluffing when the unscaled raw score
//!   exceeds 0.1.

use serde::{Deserialize, Serialize};

use crate::expression::ExpressionSample;

/// Classification threshold for the linear policy (percentage scale).
pub const LINEAR_THRESHOLD: f32 = 10.0;
/// Classification threshold for the sigmoid policy (rescaled value).
pub const SIGMOID_THRESHOLD: f32 = 50.0;
/// Classification threshold for the smoothing policy (unscaled raw score).
pub const SMOOTHING_RAW_THRESHOLD: f32 = 0.1;

/// Lower bound of the sigmoid policy's output range.
pub const SIGMOID_FLOOR: f32 = 30.0;
/// Upper bound of the sigmoid policy's output range.
pub const SIGMOID_CEILING: f32 = 90.0;

pub const DEFAULT_SIGMOID_MIDPOINT: f32 = 0.3;
pub const DEFAULT_SIGMOID_SLOPE: f32 = 10.0;
/// Per-frame confidence smoothing factor.
pub const DEFAULT_CONFIDENCE_ALPHA: f32 = 0.2;

/// Scoring formula used to turn an [`ExpressionSample`] into a confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoringPolicy {
    LinearThreshold,
    SigmoidRescale {
        #[serde(default = "default_sigmoid_midpoint")]
        midpoint: f32,
        #[serde(default = "default_sigmoid_slope")]
        slope: f32,
    },
    ExponentialSmoothing {
        #[serde(default = "default_confidence_alpha")]
        alpha: f32,
    },
}

fn default_sigmoid_midpoint() -> f32 {
    DEFAULT_SIGMOID_MIDPOINT
}

fn default_sigmoid_slope() -> f32 {
    DEFAULT_SIGMOID_SLOPE
}

fn default_confidence_alpha() -> f32 {
    DEFAULT_CONFIDENCE_ALPHA
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::exponential_smoothing()
    }
}

/// Outcome of scoring one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Weighted expression sum, before any scaling.
    pub raw_score: f32,
    /// Per-frame target confidence in [0, 100].
    pub target: f32,
    /// Displayed confidence after smoothing (equal to `target` for unsmoothed policies).
    pub confidence: f32,
    pub bluffing: bool,
}

impl ScoringPolicy {
    pub fn sigmoid_rescale() -> Self {
        Self::SigmoidRescale {
            midpoint: DEFAULT_SIGMOID_MIDPOINT,
            slope: DEFAULT_SIGMOID_SLOPE,
        }
    }

    pub fn exponential_smoothing() -> Self {
        Self::ExponentialSmoothing {
            alpha: DEFAULT_CONFIDENCE_ALPHA,
        }
    }

    /// Parse a short policy name as used on the command line and in `BLUFF_POLICY`.
    ///
    /// Accepts `linear`, `sigmoid`, `smoothing` and the serialized kind names.
    /// Parameters take their defaults.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "linear" | "linear_threshold" => Some(Self::LinearThreshold),
            "sigmoid" | "sigmoid_rescale" => Some(Self::sigmoid_rescale()),
            "smoothing" | "exponential" | "exponential_smoothing" => {
                Some(Self::exponential_smoothing())
            }
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::LinearThreshold => "linear_threshold",
            Self::SigmoidRescale { .. } => "sigmoid_rescale",
            Self::ExponentialSmoothing { .. } => "exponential_smoothing",
        }
    }

    /// Fraction of the gap to the target closed per frame. 1.0 means no smoothing.
    pub fn smoothing_factor(&self) -> f32 {
        match self {
            Self::ExponentialSmoothing { alpha } => alpha.clamp(0.0, 1.0),
            _ => 1.0,
        }
    }

    /// Score one frame, blending into `previous` confidence where the policy smooths.
    pub fn assess(&self, sample: &ExpressionSample, previous: f32) -> Assessment {
        let raw_score = sample.raw_score();
        match *self {
            Self::LinearThreshold => {
                let target = percent(raw_score);
                Assessment {
                    raw_score,
                    target,
                    confidence: target,
                    bluffing: target > LINEAR_THRESHOLD,
                }
            }
            Self::SigmoidRescale { midpoint, slope } => {
                let target = sigmoid_rescaled(raw_score, midpoint, slope);
                Assessment {
                    raw_score,
                    target,
                    confidence: target,
                    bluffing: target > SIGMOID_THRESHOLD,
                }
            }
            Self::ExponentialSmoothing { .. } => {
                let target = percent(raw_score);
                Assessment {
                    raw_score,
                    target,
                    confidence: approach(previous, target, self.smoothing_factor()),
                    bluffing: raw_score > SMOOTHING_RAW_THRESHOLD,
                }
            }
        }
    }
}

/// Raw score as a percentage, clamped to [0, 100].
fn percent(raw_score: f32) -> f32 {
    (raw_score * 100.0).clamp(0.0, 100.0)
}

/// Logistic squash of `raw_score`, mapped affinely into [SIGMOID_FLOOR, SIGMOID_CEILING].
pub fn sigmoid_rescaled(raw_score: f32, midpoint: f32, slope: f32) -> f32 {
    let logistic = 1.0 / (1.0 + (-slope * (raw_score - midpoint)).exp());
    SIGMOID_FLOOR + (SIGMOID_CEILING - SIGMOID_FLOOR) * logistic
}

/// Move `current` toward `target` by `alpha` of the remaining gap.
///
/// With `alpha` in [0, 1] the result never leaves the interval between the two.
pub fn approach(current: f32, target: f32, alpha: f32) -> f32 {
    current + (target - current) * alpha
}
