use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use bluff_core::geometry::DEFAULT_LANDMARK_MARGIN;
use bluff_core::{BoxSource, EstimatorConfig, NoDetectionPolicy, ScoringPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::Pacing;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Daemon configuration: defaults, then an optional TOML file named by
/// `BLUFF_CONFIG`, then `BLUFF_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Frame stream to read (default: stdin).
    pub input: Option<PathBuf>,
    /// Fixed tick interval in milliseconds. Unset or 0 runs one tick per frame.
    pub interval_ms: Option<u64>,
    /// Detector box or landmark-derived box.
    pub box_source: BoxSource,
    /// Margin around the landmark extent, as a fraction per side.
    pub landmark_margin: f32,
    pub estimator: EstimatorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: None,
            interval_ms: None,
            box_source: BoxSource::default(),
            landmark_margin: DEFAULT_LANDMARK_MARGIN,
            estimator: EstimatorConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `BLUFF_CONFIG` and `BLUFF_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("BLUFF_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.normalize();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay environment variables, read through `lookup`.
    ///
    /// Unknown names and unparsable numbers leave the current value in place.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(input) = lookup("BLUFF_INPUT") {
            self.input = if input.is_empty() || input == "-" {
                None
            } else {
                Some(PathBuf::from(input))
            };
        }
        if let Some(ms) = parsed(&lookup, "BLUFF_INTERVAL_MS") {
            self.interval_ms = Some(ms);
        }
        if let Some(source) = lookup("BLUFF_BOX_SOURCE").and_then(|v| BoxSource::from_name(&v)) {
            self.box_source = source;
        }
        if let Some(margin) = parsed(&lookup, "BLUFF_LANDMARK_MARGIN") {
            self.landmark_margin = margin;
        }

        let est = &mut self.estimator;
        if let Some(policy) = lookup("BLUFF_POLICY").and_then(|v| ScoringPolicy::from_name(&v)) {
            // Keep parameters from the file when the kind is unchanged.
            if policy.name() != est.policy.name() {
                est.policy = policy;
            }
        }
        match &mut est.policy {
            ScoringPolicy::ExponentialSmoothing { alpha } => {
                if let Some(v) = parsed(&lookup, "BLUFF_CONFIDENCE_ALPHA") {
                    *alpha = v;
                }
            }
            ScoringPolicy::SigmoidRescale { midpoint, slope } => {
                if let Some(v) = parsed(&lookup, "BLUFF_SIGMOID_MIDPOINT") {
                    *midpoint = v;
                }
                if let Some(v) = parsed(&lookup, "BLUFF_SIGMOID_SLOPE") {
                    *slope = v;
                }
            }
            ScoringPolicy::LinearThreshold => {}
        }
        if let Some(v) = parsed(&lookup, "BLUFF_BOX_ALPHA") {
            est.box_alpha = v;
        }
        if let Some(policy) =
            lookup("BLUFF_NO_DETECTION").and_then(|v| NoDetectionPolicy::from_name(&v))
        {
            est.no_detection = policy;
        }
        if let Some(v) = parsed(&lookup, "BLUFF_DECAY_ALPHA") {
            est.decay_alpha = v;
        }
    }

    /// Clamp smoothing factors into [0, 1] and the landmark margin to >= 0.
    pub fn normalize(&mut self) {
        let est = &mut self.estimator;
        est.box_alpha = est.box_alpha.clamp(0.0, 1.0);
        est.decay_alpha = est.decay_alpha.clamp(0.0, 1.0);
        if let ScoringPolicy::ExponentialSmoothing { alpha } = &mut est.policy {
            *alpha = alpha.clamp(0.0, 1.0);
        }
        self.landmark_margin = self.landmark_margin.max(0.0);
    }

    pub fn pacing(&self) -> Pacing {
        match self.interval_ms {
            Some(ms) if ms > 0 => Pacing::Interval(Duration::from_millis(ms)),
            _ => Pacing::EveryFrame,
        }
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}
