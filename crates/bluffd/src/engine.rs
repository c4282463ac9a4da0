use std::time::Duration;

use bluff_core::{BoxSource, Estimator};
use thiserror::Error;
use tokio::time::MissedTickBehavior;

use crate::config::Config;
use crate::render::OverlaySink;
use crate::source::{self, Frame, FrameFeed, Poll, SourceError};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("overlay sink error: {0}")]
    Sink(#[source] std::io::Error),
    #[error("frame reader task exited unexpectedly")]
    ReaderExited,
}

/// When the render loop runs a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// One step per newly published frame.
    EveryFrame,
    /// One step per timer tick; ticks without a new frame are skipped.
    Interval(Duration),
}

/// Per-run settings for the render loop.
#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    pub pacing: Pacing,
    pub box_source: BoxSource,
    pub landmark_margin: f32,
}

impl LoopSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            pacing: config.pacing(),
            box_source: config.box_source,
            landmark_margin: config.landmark_margin,
        }
    }
}

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Ticks that ran an estimator step.
    pub processed: u64,
    /// Frames overwritten before the loop got to them.
    pub dropped: u64,
    /// Processed frames that contained a face.
    pub detections: u64,
}

/// Open the configured source, then run the render loop until the stream ends.
pub async fn run<S: OverlaySink>(config: &Config, sink: &mut S) -> Result<LoopStats, EngineError> {
    let input = source::open(config.input.as_deref()).await?;
    let (feed, reader_done) = source::spawn(input)?;

    let settings = LoopSettings::from_config(config);
    let estimator = Estimator::new(config.estimator);
    tracing::info!(
        policy = estimator.config().policy.name(),
        no_detection = ?estimator.config().no_detection,
        box_source = ?settings.box_source,
        pacing = ?settings.pacing,
        "render loop started"
    );

    let stats = run_loop(feed, estimator, &settings, sink).await?;

    let published = reader_done
        .await
        .map_err(|_| EngineError::ReaderExited)??;
    tracing::info!(
        published,
        processed = stats.processed,
        dropped = stats.dropped,
        detections = stats.detections,
        "render loop finished"
    );
    Ok(stats)
}

/// Drive `estimator` from the frame feed until it closes.
///
/// The loop owns the estimator; each step finishes (including the sink draw)
/// before the next frame is looked at.
pub async fn run_loop<S: OverlaySink>(
    mut feed: FrameFeed,
    mut estimator: Estimator,
    settings: &LoopSettings,
    sink: &mut S,
) -> Result<LoopStats, EngineError> {
    let mut stats = LoopStats::default();
    let mut last_seq = 0u64;

    match settings.pacing {
        Pacing::EveryFrame => {
            while let Some(frame) = feed.next().await {
                tick(&mut estimator, &frame, &mut last_seq, settings, sink, &mut stats)?;
            }
        }
        Pacing::Interval(period) => {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match feed.poll() {
                    Poll::Frame(frame) => {
                        tick(&mut estimator, &frame, &mut last_seq, settings, sink, &mut stats)?;
                    }
                    Poll::Empty => tracing::trace!("no new frame this tick"),
                    Poll::Closed => break,
                }
            }
        }
    }

    Ok(stats)
}

fn tick<S: OverlaySink>(
    estimator: &mut Estimator,
    frame: &Frame,
    last_seq: &mut u64,
    settings: &LoopSettings,
    sink: &mut S,
    stats: &mut LoopStats,
) -> Result<(), EngineError> {
    let skipped = frame.seq.saturating_sub(*last_seq + 1);
    if skipped > 0 {
        tracing::debug!(skipped, seq = frame.seq, "frames dropped while busy");
        stats.dropped += skipped;
    }
    *last_seq = frame.seq;

    let observation = frame
        .detection
        .as_ref()
        .map(|d| d.observe(settings.box_source, settings.landmark_margin));
    let overlay = estimator.step(observation.as_ref());

    stats.processed += 1;
    if observation.is_some() {
        stats.detections += 1;
    }

    if let Some(o) = &overlay {
        tracing::debug!(seq = frame.seq, label = %o.label, "overlay");
    }
    sink.draw(overlay.as_ref()).map_err(EngineError::Sink)
}
