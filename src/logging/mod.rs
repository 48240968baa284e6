pub mod config;
pub mod layers;

pub use layers::console::ConsoleOutput;

use crate::cli::{Args, LogLevel};
use crate::logging::config::LoggingConfig;
use crate::logging::layers::{console, file};
use crate::Result;
use anyhow::{anyhow, Context};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Guards that keep logging sinks active for the duration of the command.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    console_output: ConsoleOutput,
    log_file_path: Option<PathBuf>,
}

impl LoggingGuard {
    /// Returns the console output configuration used during initialization.
    pub fn console_output(&self) -> ConsoleOutput {
        self.console_output
    }

    /// Returns the log file path when the file sink is enabled.
    pub fn log_file_path(&self) -> Option<&Path> {
        self.log_file_path.as_deref()
    }
}

/// Initialize logging for one CLI invocation.
///
/// Level precedence, lowest first: `.circleci-docs/logging.toml` in the
/// working directory, `RUST_LOG`, then `--log-level`. Errors when invoked more
/// than once per process.
pub fn init(args: &Args) -> Result<LoggingGuard> {
    if LOGGER_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(anyhow!("logging already initialized"));
    }

    let workspace_root = env::current_dir().context("failed to resolve working directory")?;
    let config = LoggingConfig::load(Some(&workspace_root))?;
    let env_filter = build_filter(args.log_level, &config)?;

    type BaseRegistry = Registry;
    type FileSubscriber = file::FileLayerStack<BaseRegistry>;

    let log_file_path = file::log_file_path(&config, &workspace_root)?;
    let (file_layer, file_guard) =
        file::file_layer::<BaseRegistry>(&log_file_path, config.enable_file)?;

    let subscriber = tracing_subscriber::registry().with(file_layer);
    let console_layer = console::console_layer::<FileSubscriber>(config.console_output);
    subscriber
        .with(console_layer)
        .with(env_filter)
        .try_init()
        .context("failed to install tracing subscriber")?;
    tracing::debug!("Console logging to {}", config.console_output);

    Ok(LoggingGuard {
        _file_guard: file_guard,
        console_output: config.console_output,
        log_file_path: config.enable_file.then_some(log_file_path),
    })
}

/// Resolve the level filter from the CLI flag, `RUST_LOG`, or the config default.
pub fn build_filter(cli_level: Option<LogLevel>, config: &LoggingConfig) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return EnvFilter::try_new(level.as_directive())
            .with_context(|| format!("invalid log level {}", level));
    }
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_level))
        .context("failed to configure tracing level")
}
