use serde::{Deserialize, Serialize};

/// Weight applied to the `angry` probability.
pub const ANGRY_WEIGHT: f32 = 1.2;
/// Weight applied to the `surprised` probability.
pub const SURPRISED_WEIGHT: f32 = 1.2;
/// Weight applied to the `fearful` probability.
pub const FEARFUL_WEIGHT: f32 = 1.5;
/// Weight applied to the `disgusted` probability.
pub const DISGUSTED_WEIGHT: f32 = 1.1;

/// Expression probabilities for one frame, each in [0, 1].
///
/// Only the four categories that feed the bluff score are kept. Fields the
/// detector leaves out default to 0; other categories it reports are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionSample {
    pub angry: f32,
    pub surprised: f32,
    pub fearful: f32,
    pub disgusted: f32,
}

impl ExpressionSample {
    pub fn new(angry: f32, surprised: f32, fearful: f32, disgusted: f32) -> Self {
        Self {
            angry,
            surprised,
            fearful,
            disgusted,
        }
    }

    /// Weighted sum of the four probabilities (unscaled, range [0, 5.0]).
    pub fn raw_score(&self) -> f32 {
        self.angry * ANGRY_WEIGHT
            + self.surprised * SURPRISED_WEIGHT
            + self.fearful * FEARFUL_WEIGHT
            + self.disgusted * DISGUSTED_WEIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_face_scores_zero() {
        assert_eq!(ExpressionSample::default().raw_score(), 0.0);
    }

    #[test]
    fn test_weights_per_field() {
        assert!((ExpressionSample::new(1.0, 0.0, 0.0, 0.0).raw_score() - 1.2).abs() < 1e-6);
        assert!((ExpressionSample::new(0.0, 1.0, 0.0, 0.0).raw_score() - 1.2).abs() < 1e-6);
        assert!((ExpressionSample::new(0.0, 0.0, 1.0, 0.0).raw_score() - 1.5).abs() < 1e-6);
        assert!((ExpressionSample::new(0.0, 0.0, 0.0, 1.0).raw_score() - 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_monotone_in_every_field() {
        let steps = [0.0f32, 0.1, 0.25, 0.5, 0.75, 1.0];
        for &base in &steps {
            for &bumped in steps.iter().filter(|&&s| s >= base) {
                let lo = ExpressionSample::new(base, base, base, base);
                for field in 0..4 {
                    let mut hi = lo;
                    match field {
                        0 => hi.angry = bumped,
                        1 => hi.surprised = bumped,
                        2 => hi.fearful = bumped,
                        _ => hi.disgusted = bumped,
                    }
                    assert!(hi.raw_score() >= lo.raw_score());
                }
            }
        }
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let sample: ExpressionSample = serde_json::from_str(r#"{"fearful": 0.5}"#).unwrap();
        assert_eq!(sample, ExpressionSample::new(0.0, 0.0, 0.5, 0.0));
    }

    #[test]
    fn test_unrelated_expressions_ignored() {
        let sample: ExpressionSample =
            serde_json::from_str(r#"{"happy": 0.9, "neutral": 0.1, "angry": 0.2}"#).unwrap();
        assert!((sample.raw_score() - 0.24).abs() < 1e-6);
    }
}
