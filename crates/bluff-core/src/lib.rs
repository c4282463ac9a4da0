//! bluff-core — confidence estimation for the bluff overlay.
//!
//! Turns per-frame facial expression probabilities from an external detector
//! into a display tuple (confidence, classification, bounding box, label).
//! Everything here is synchronous and free of I/O; the overlay loop in
//! `bluffd` and the `bluff` CLI both drive it.

pub mod detection;
pub mod estimator;
pub mod expression;
pub mod geometry;
pub mod overlay;
pub mod scoring;

pub use detection::{BoxSource, Detection, DetectionError};
pub use estimator::{Estimator, EstimatorConfig, EstimatorState, NoDetectionPolicy, Observation};
pub use expression::ExpressionSample;
pub use geometry::{BoundingBox, Point};
pub use overlay::{Overlay, OverlayColor};
pub use scoring::{Assessment, ScoringPolicy};

/// Neutral confidence: the initial smoothed value and the decay target.
pub const NEUTRAL_CONFIDENCE: f32 = 50.0;
