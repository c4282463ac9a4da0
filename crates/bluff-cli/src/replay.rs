//! `bluff replay` — run the estimator over a recorded frame file.
//!
//! Unlike the daemon, replay processes every frame in order with no pacing
//! and no dropped frames, which makes it suitable for checking how a policy
//! behaves on a captured session.

use std::fs;
use std::io::{self, BufRead, BufReader, Write};

use anyhow::{Context, Result};
use bluff_core::detection::parse_line;
use bluff_core::geometry::DEFAULT_LANDMARK_MARGIN;
use bluff_core::{BoxSource, Estimator, EstimatorConfig, Overlay, ScoringPolicy};

/// Counters from replaying a frame stream.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Replay {
    pub frames: usize,
    pub detections: usize,
    pub bluffing: usize,
    pub malformed: usize,
}

/// Run every frame through `estimator`, handing each result to `on_frame`
/// (1-based frame number, overlay or `None` where nothing was drawn) as soon
/// as it is computed.
pub fn replay<R, F>(
    reader: R,
    mut estimator: Estimator,
    box_source: BoxSource,
    mut on_frame: F,
) -> Result<Replay>
where
    R: BufRead,
    F: FnMut(usize, Option<&Overlay>) -> Result<()>,
{
    let mut out = Replay::default();

    for (i, line) in reader.lines().enumerate() {
        let line = line.context("failed to read frame")?;
        let detection = match parse_line(&line, i + 1) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed frame");
                out.malformed += 1;
                continue;
            }
        };

        let observation = detection
            .as_ref()
            .map(|d| d.observe(box_source, DEFAULT_LANDMARK_MARGIN));
        let overlay = estimator.step(observation.as_ref());

        out.frames += 1;
        if observation.is_some() {
            out.detections += 1;
        }
        if overlay.as_ref().is_some_and(|o| o.assessment.bluffing) {
            out.bluffing += 1;
        }
        on_frame(out.frames, overlay.as_ref())?;
    }

    Ok(out)
}

pub fn run(path: &str, policy: ScoringPolicy, box_source: BoxSource, json: bool) -> Result<()> {
    let file = fs::File::open(path).with_context(|| format!("failed to open {path}"))?;
    let estimator = Estimator::new(EstimatorConfig::with_policy(policy));
    let mut stdout = io::stdout().lock();

    let result = replay(BufReader::new(file), estimator, box_source, |n, overlay| {
        if json {
            serde_json::to_writer(&mut stdout, &overlay)?;
            writeln!(stdout)?;
            return Ok(());
        }
        match overlay {
            Some(o) => writeln!(
                stdout,
                "{:>5}  {:<18} raw={:.3} confidence={:.1}",
                n, o.label, o.assessment.raw_score, o.assessment.confidence
            )?,
            None => writeln!(stdout, "{:>5}  (no face)", n)?,
        }
        Ok(())
    })?;
    stdout.flush()?;

    eprintln!(
        "{} frame(s), {} with a face, {} bluffing, {} malformed line(s) skipped [{}]",
        result.frames,
        result.detections,
        result.bluffing,
        result.malformed,
        policy.name()
    );
    Ok(())
}
