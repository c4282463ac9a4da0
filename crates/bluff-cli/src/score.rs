//! `bluff score` — assess one expression sample.

use anyhow::Result;
use bluff_core::{BoundingBox, ExpressionSample, Overlay, ScoringPolicy, NEUTRAL_CONFIDENCE};

/// Score `sample` as the first frame after startup. The box is a placeholder.
pub fn assess(sample: ExpressionSample, policy: ScoringPolicy) -> Overlay {
    let assessment = policy.assess(&sample, NEUTRAL_CONFIDENCE);
    Overlay::new(BoundingBox::new(0.0, 0.0, 0.0, 0.0), assessment)
}

pub fn run(sample: ExpressionSample, policy: ScoringPolicy, json: bool) -> Result<()> {
    let overlay = assess(sample, policy);
    if json {
        println!("{}", serde_json::to_string_pretty(&overlay)?);
        return Ok(());
    }

    let a = &overlay.assessment;
    println!("{}", overlay.label);
    println!("  policy:     {}", policy.name());
    println!("  raw score:  {:.3}", a.raw_score);
    println!("  target:     {:.1}", a.target);
    println!("  confidence: {:.1}", a.confidence);
    println!("  color:      {}", overlay.color.name());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_linear() {
        let o = assess(ExpressionSample::default(), ScoringPolicy::LinearThreshold);
        assert_eq!(o.label, "Not Bluffing 100%");
    }

    #[test]
    fn test_angry_linear() {
        let o = assess(
            ExpressionSample::new(1.0, 0.0, 0.0, 0.0),
            ScoringPolicy::LinearThreshold,
        );
        assert_eq!(o.label, "Bluffing 100%");
    }

    #[test]
    fn test_smoothing_starts_from_neutral() {
        let o = assess(
            ExpressionSample::default(),
            ScoringPolicy::exponential_smoothing(),
        );
        // 50 -> 40, not bluffing shows 60
        assert_eq!(o.label, "Not Bluffing 60%");
    }
}
