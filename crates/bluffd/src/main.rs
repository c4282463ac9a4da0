use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

mod config;
mod engine;
mod render;
mod source;

use config::Config;
use render::{BackgroundSink, DEFAULT_WRITE_QUEUE};

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the overlay stream; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("bluffd starting");

    let config = logged(Config::load().context("failed to load configuration"))?;
    let mut sink = logged(
        BackgroundSink::spawn(std::io::stdout(), DEFAULT_WRITE_QUEUE)
            .context("failed to start overlay writer"),
    )?;

    let stats = tokio::select! {
        result = engine::run(&config, &mut sink) => logged(result.context("overlay loop stopped"))?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("bluffd shutting down");
            return Ok(());
        }
    };

    let unwritten = sink.dropped();
    logged(sink.finish().context("overlay writer failed"))?;
    tracing::info!(
        processed = stats.processed,
        dropped = stats.dropped,
        unwritten,
        "bluffd finished"
    );

    Ok(())
}

/// Emit a terminal failure through the subscriber before it leaves `main`.
fn logged<T>(result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        let error = format!("{e:#}");
        tracing::error!(error = %error, "bluffd failed");
    }
    result
}
