//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! - LOG_LEVEL overrides the configured filter (e.g. "debug" or
//!   "info,learnsphere_review=debug").
//! - LOG_FORMAT overrides the configured format: "pretty" or "json".
//!
//! Logs are written to stderr so command output on stdout stays clean.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| config.format.clone());
    match format.as_str() {
        "json" => builder.json().init(),
        _ => builder.init(),
    }
}
