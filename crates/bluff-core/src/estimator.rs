//! Per-frame confidence estimation with explicit smoothing state.
//!
//! [`EstimatorState`] holds everything that outlives a single frame: the
//! smoothed confidence, the last drawn box, and the last assessment. It is a
//! plain value passed into and returned from [`EstimatorState::update`], so
//! whoever owns the render loop owns the state and is its only writer.
//!
//! Frames without a detection are handled by [`NoDetectionPolicy`] instead of
//! silently reusing whatever was on screen.

use serde::{Deserialize, Serialize};

use crate::expression::ExpressionSample;
use crate::geometry::{BoundingBox, DEFAULT_BOX_ALPHA};
use crate::overlay::Overlay;
use crate::scoring::{approach, Assessment, ScoringPolicy, DEFAULT_CONFIDENCE_ALPHA};
use crate::NEUTRAL_CONFIDENCE;

/// What to do on a frame where the detector found no face.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDetectionPolicy {
    /// Keep state and keep showing the last overlay.
    Hold,
    /// Keep state, draw nothing.
    #[default]
    Hide,
    /// Draw nothing, ease confidence back toward neutral and forget the box.
    DecayToNeutral,
}

impl NoDetectionPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "hold" => Some(Self::Hold),
            "hide" => Some(Self::Hide),
            "decay" | "decay_to_neutral" => Some(Self::DecayToNeutral),
            _ => None,
        }
    }
}

/// Estimator tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub policy: ScoringPolicy,
    /// Box smoothing factor; 1.0 disables box smoothing.
    pub box_alpha: f32,
    pub no_detection: NoDetectionPolicy,
    /// Per-frame step toward neutral under [`NoDetectionPolicy::DecayToNeutral`].
    pub decay_alpha: f32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            policy: ScoringPolicy::default(),
            box_alpha: DEFAULT_BOX_ALPHA,
            no_detection: NoDetectionPolicy::default(),
            decay_alpha: DEFAULT_CONFIDENCE_ALPHA,
        }
    }
}

impl EstimatorConfig {
    pub fn with_policy(policy: ScoringPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }
}

/// One frame's input once the face region has been resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub expressions: ExpressionSample,
    pub region: BoundingBox,
}

/// State carried from one frame to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorState {
    /// Smoothed confidence in [0, 100]; starts at neutral.
    pub smoothed_confidence: f32,
    /// Box drawn on the previous detected frame.
    pub last_box: Option<BoundingBox>,
    pub last_assessment: Option<Assessment>,
}

impl Default for EstimatorState {
    fn default() -> Self {
        Self {
            smoothed_confidence: NEUTRAL_CONFIDENCE,
            last_box: None,
            last_assessment: None,
        }
    }
}

impl EstimatorState {
    /// Advance by one frame.
    ///
    /// Returns the new state and the overlay to draw, or `None` to clear.
    pub fn update(
        self,
        observation: Option<&Observation>,
        config: &EstimatorConfig,
    ) -> (Self, Option<Overlay>) {
        match observation {
            Some(obs) => self.observe(obs, config),
            None => self.miss(config),
        }
    }

    fn observe(self, obs: &Observation, config: &EstimatorConfig) -> (Self, Option<Overlay>) {
        let assessment = config
            .policy
            .assess(&obs.expressions, self.smoothed_confidence);

        let bounding_box = match self.last_box {
            Some(prev) => prev.lerp(&obs.region, config.box_alpha.clamp(0.0, 1.0)),
            None => obs.region,
        };

        tracing::trace!(
            raw = assessment.raw_score,
            target = assessment.target,
            confidence = assessment.confidence,
            bluffing = assessment.bluffing,
            "frame assessed"
        );

        let next = Self {
            smoothed_confidence: assessment.confidence.clamp(0.0, 100.0),
            last_box: Some(bounding_box),
            last_assessment: Some(assessment),
        };
        (next, Some(Overlay::new(bounding_box, assessment)))
    }

    fn miss(self, config: &EstimatorConfig) -> (Self, Option<Overlay>) {
        match config.no_detection {
            NoDetectionPolicy::Hold => {
                let stale = match (self.last_box, self.last_assessment) {
                    (Some(b), Some(a)) => Some(Overlay::new(b, a)),
                    _ => None,
                };
                (self, stale)
            }
            NoDetectionPolicy::Hide => (self, None),
            NoDetectionPolicy::DecayToNeutral => {
                let next = Self {
                    smoothed_confidence: approach(
                        self.smoothed_confidence,
                        NEUTRAL_CONFIDENCE,
                        config.decay_alpha.clamp(0.0, 1.0),
                    ),
                    last_box: None,
                    last_assessment: None,
                };
                (next, None)
            }
        }
    }
}

/// Owns an [`EstimatorState`] together with its configuration.
#[derive(Debug, Clone)]
pub struct Estimator {
    config: EstimatorConfig,
    state: EstimatorState,
}

impl Estimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self {
            config,
            state: EstimatorState::default(),
        }
    }

    /// Process one frame; `None` means no face was detected.
    pub fn step(&mut self, observation: Option<&Observation>) -> Option<Overlay> {
        let (next, overlay) = self.state.update(observation, &self.config);
        self.state = next;
        overlay
    }

    pub fn state(&self) -> &EstimatorState {
        &self.state
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::OverlayColor;

    fn obs(angry: f32, region: BoundingBox) -> Observation {
        Observation {
            expressions: ExpressionSample::new(angry, 0.0, 0.0, 0.0),
            region,
        }
    }

    fn square(x: f32) -> BoundingBox {
        BoundingBox::new(x, x, 100.0, 100.0)
    }

    #[test]
    fn test_initial_state_is_neutral() {
        let s = EstimatorState::default();
        assert_eq!(s.smoothed_confidence, 50.0);
        assert!(s.last_box.is_none());
    }

    #[test]
    fn test_linear_examples() {
        let config = EstimatorConfig::with_policy(ScoringPolicy::LinearThreshold);

        let (_, overlay) = EstimatorState::default().update(Some(&obs(0.0, square(0.0))), &config);
        let overlay = overlay.unwrap();
        assert_eq!(overlay.assessment.raw_score, 0.0);
        assert!(!overlay.assessment.bluffing);
        assert_eq!(overlay.label, "Not Bluffing 100%");
        assert_eq!(overlay.color, OverlayColor::Green);

        let (_, overlay) = EstimatorState::default().update(Some(&obs(1.0, square(0.0))), &config);
        let overlay = overlay.unwrap();
        assert_eq!(overlay.assessment.target, 100.0);
        assert!(overlay.assessment.bluffing);
        assert_eq!(overlay.label, "Bluffing 100%");
        assert_eq!(overlay.color, OverlayColor::Red);
    }

    #[test]
    fn test_smoothing_converges_without_overshoot() {
        let mut est = Estimator::new(EstimatorConfig::default());
        let mut prev = est.state().smoothed_confidence;
        for _ in 0..50 {
            let overlay = est.step(Some(&obs(1.0, square(0.0)))).unwrap();
            let c = overlay.assessment.confidence;
            assert!(c >= prev && c <= 100.0);
            prev = c;
        }
        assert!(prev > 99.0);
    }

    #[test]
    fn test_smoothed_label_uses_smoothed_confidence() {
        let mut est = Estimator::new(EstimatorConfig::default());
        let overlay = est.step(Some(&obs(1.0, square(0.0)))).unwrap();
        // 50 -> 60 after one frame at alpha 0.2
        assert_eq!(overlay.label, "Bluffing 60%");
    }

    #[test]
    fn test_first_box_taken_as_is_then_smoothed() {
        let mut est = Estimator::new(EstimatorConfig::default());
        let first = est.step(Some(&obs(0.0, square(0.0)))).unwrap();
        assert_eq!(first.bounding_box, square(0.0));

        let second = est.step(Some(&obs(0.0, square(10.0)))).unwrap();
        assert!((second.bounding_box.x - 3.0).abs() < 1e-4);
        assert!((second.bounding_box.y - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_box_steady_state_no_drift() {
        let mut est = Estimator::new(EstimatorConfig::default());
        let b = BoundingBox::new(33.3, 71.7, 123.4, 150.1);
        for _ in 0..20 {
            let overlay = est.step(Some(&obs(0.2, b))).unwrap();
            assert_eq!(overlay.bounding_box, b);
        }
    }

    #[test]
    fn test_hide_keeps_state_and_clears() {
        let config = EstimatorConfig {
            no_detection: NoDetectionPolicy::Hide,
            ..EstimatorConfig::default()
        };
        let (state, _) = EstimatorState::default().update(Some(&obs(1.0, square(5.0))), &config);
        let (after, overlay) = state.update(None, &config);
        assert!(overlay.is_none());
        assert_eq!(after, state);
    }

    #[test]
    fn test_hold_reemits_stale_overlay() {
        let config = EstimatorConfig {
            no_detection: NoDetectionPolicy::Hold,
            ..EstimatorConfig::default()
        };
        let (state, shown) =
            EstimatorState::default().update(Some(&obs(1.0, square(5.0))), &config);
        let (after, stale) = state.update(None, &config);
        assert_eq!(stale, shown);
        assert_eq!(after, state);
    }

    #[test]
    fn test_hold_before_any_detection_draws_nothing() {
        let config = EstimatorConfig {
            no_detection: NoDetectionPolicy::Hold,
            ..EstimatorConfig::default()
        };
        let (_, overlay) = EstimatorState::default().update(None, &config);
        assert!(overlay.is_none());
    }

    #[test]
    fn test_decay_moves_toward_neutral_and_forgets_box() {
        let config = EstimatorConfig {
            no_detection: NoDetectionPolicy::DecayToNeutral,
            ..EstimatorConfig::default()
        };
        let mut state = EstimatorState {
            smoothed_confidence: 100.0,
            last_box: Some(square(0.0)),
            last_assessment: None,
        };
        let (next, overlay) = state.update(None, &config);
        assert!(overlay.is_none());
        assert!((next.smoothed_confidence - 90.0).abs() < 1e-4);
        assert!(next.last_box.is_none());

        state = next;
        for _ in 0..100 {
            state = state.update(None, &config).0;
            assert!(state.smoothed_confidence >= 50.0);
        }
        assert!((state.smoothed_confidence - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_decay_then_detection_snaps_to_new_box() {
        let config = EstimatorConfig {
            no_detection: NoDetectionPolicy::DecayToNeutral,
            ..EstimatorConfig::default()
        };
        let mut est = Estimator::new(config);
        est.step(Some(&obs(0.0, square(0.0))));
        est.step(None);
        let overlay = est.step(Some(&obs(0.0, square(200.0)))).unwrap();
        assert_eq!(overlay.bounding_box, square(200.0));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let json = r#"{"policy": {"kind": "linear_threshold"}, "no_detection": "hold"}"#;
        let config: EstimatorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.policy, ScoringPolicy::LinearThreshold);
        assert_eq!(config.no_detection, NoDetectionPolicy::Hold);
        assert_eq!(config.box_alpha, DEFAULT_BOX_ALPHA);
    }
}
