use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use bluff_core::{BoxSource, ScoringPolicy};

mod replay;
mod score;

#[derive(Parser, Debug)]
#[command(
    name = "bluff",
    version,
    about = "Bluff overlay tooling: score expression samples and replay recorded frame streams"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score a single expression sample from the initial (neutral) state
    Score {
        #[arg(long, default_value_t = 0.0)]
        angry: f32,
        #[arg(long, default_value_t = 0.0)]
        surprised: f32,
        #[arg(long, default_value_t = 0.0)]
        fearful: f32,
        #[arg(long, default_value_t = 0.0)]
        disgusted: f32,
        #[arg(long, value_enum, default_value_t = PolicyArg::Linear)]
        policy: PolicyArg,
        /// Print the overlay as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the estimator over every frame of a recorded JSON-lines file
    Replay {
        /// Frame file, one detection (or null) per line
        file: String,
        #[arg(long, value_enum, default_value_t = PolicyArg::Smoothing)]
        policy: PolicyArg,
        #[arg(long, value_enum, default_value_t = BoxArg::Detector)]
        box_source: BoxArg,
        /// Print one overlay JSON line per frame
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    Linear,
    Sigmoid,
    Smoothing,
}

impl From<PolicyArg> for ScoringPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Linear => ScoringPolicy::LinearThreshold,
            PolicyArg::Sigmoid => ScoringPolicy::sigmoid_rescale(),
            PolicyArg::Smoothing => ScoringPolicy::exponential_smoothing(),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BoxArg {
    Detector,
    Landmarks,
}

impl From<BoxArg> for BoxSource {
    fn from(arg: BoxArg) -> Self {
        match arg {
            BoxArg::Detector => BoxSource::Detector,
            BoxArg::Landmarks => BoxSource::Landmarks,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Score {
            angry,
            surprised,
            fearful,
            disgusted,
            policy,
            json,
        } => score::run(
            bluff_core::ExpressionSample::new(angry, surprised, fearful, disgusted),
            policy.into(),
            json,
        ),
        Command::Replay {
            file,
            policy,
            box_source,
            json,
        } => replay::run(&file, policy.into(), box_source.into(), json),
    }
}
