/*!
 * Logging Module
 * tracing subscriber setup: console plus daily-rolling app and error files
 */
pub mod config;
pub mod middleware;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::config::AppConfig;
use config::{default_directive, LogLevel};

/// Flush handles for the background log writers. Dropping them stops the
/// writer threads, so the caller keeps them alive for the process lifetime.
pub type LogGuards = Vec<WorkerGuard>;

/// Install the global subscriber. A second call keeps the first subscriber
/// and only returns fresh guards.
pub fn init(config: &AppConfig) -> LogGuards {
    let is_production = config.is_production();

    if let Err(e) = std::fs::create_dir_all(&config.log_dir) {
        eprintln!("Could not create log directory {}: {}", config.log_dir, e);
    }

    let (file_writer, file_guard) = non_blocking(rolling::daily(&config.log_dir, "app.log"));
    let (error_writer, error_guard) = non_blocking(rolling::daily(&config.log_dir, "error.log"));
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let level = LogLevel::resolve(config.log_level.as_deref(), is_production);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let installed = if is_production {
        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        let error_layer = fmt::layer()
            .json()
            .with_writer(error_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false);

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .try_init()
    } else {
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let error_layer = fmt::layer()
            .with_writer(error_writer)
            .with_ansi(false)
            .with_filter(LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty();

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .try_init()
    };

    match installed {
        Ok(()) => tracing::info!(
            "Logging initialized for {} environment at {} level",
            config.environment,
            level
        ),
        Err(e) => tracing::debug!("Global subscriber already set: {}", e),
    }

    vec![file_guard, error_guard, console_guard]
}
