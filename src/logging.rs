//! `tracing` subscriber setup

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use std::io::stderr;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level; `verbose` forces `debug`.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| build_filter(level));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(stderr);
    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format.as_str() {
        "json" => fmt_layer.json().boxed(),
        _ => fmt_layer.with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Our crate at `level`, noisy dependencies at `warn`
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!(
        "warn,weatherdesk={level},reqwest_retry={level},tower_http={level}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter() {
        let filter = build_filter("debug").to_string();
        assert!(filter.contains("weatherdesk=debug"));
        assert!(filter.contains("reqwest_retry=debug"));
    }
}
