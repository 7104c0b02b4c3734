//! Logging setup on top of `tracing-subscriber`.
//!
//! [`build`] turns a [`LogConfig`] into a [`Dispatch`] with one fmt layer per
//! sink (stderr and/or a log file); [`init`] installs it process-wide.

use std::{fmt, path::PathBuf, str::FromStr, sync::Arc};

use is_terminal::IsTerminal;
use tracing::{Dispatch, Level};
use tracing_subscriber::{
    fmt::{self as tfmt, MakeWriter},
    layer::SubscriberExt,
    EnvFilter, Layer, Registry,
};

use crate::error::{MagicError, Result};

pub mod file;

pub const DEFAULT_LOG_FILE: &str = "logs/logger.log";
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_RETENTION: usize = 10;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = MagicError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" | "text" => Ok(Self::Full),
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(MagicError::invalid_config(format!("unknown log format: {other}"))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Full => "full",
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `info` or `magickit=debug,warn`.
    pub level: String,
    pub format: LogFormat,
    /// Log to stderr.
    pub console: bool,
    /// Colors on the console sink. File sinks never get ANSI codes.
    pub ansi: bool,
    pub file: Option<PathBuf>,
    /// Rotate the log file at startup once it reaches this size.
    pub max_file_bytes: u64,
    /// Rotated files kept next to the active one.
    pub retention: usize,
    pub thread_ids: bool,
    pub thread_names: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
            console: true,
            ansi: std::io::stderr().is_terminal(),
            file: None,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            retention: DEFAULT_RETENTION,
            thread_ids: false,
            thread_names: false,
        }
    }
}

impl LogConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }
}

/// Build a dispatcher for `cfg` without installing it.
pub fn build(cfg: &LogConfig) -> Result<Dispatch> {
    let filter = EnvFilter::try_new(&cfg.level)
        .map_err(|e| MagicError::logger(format!("invalid log level {:?}: {e}", cfg.level)))?;

    let mut layers: Vec<BoxedLayer> = Vec::new();
    if cfg.console {
        layers.push(fmt_layer(cfg, std::io::stderr, cfg.ansi));
    }
    if let Some(path) = &cfg.file {
        let log_file = file::open_log_file(path, cfg.max_file_bytes, cfg.retention)?;
        layers.push(fmt_layer(cfg, Arc::new(log_file), false));
    }

    let subscriber = Registry::default().with(layers).with(filter);
    Ok(Dispatch::new(subscriber))
}

/// Install `cfg` as the global subscriber. Fails if one is already set.
pub fn init(cfg: &LogConfig) -> Result<()> {
    let dispatch = build(cfg)?;
    tracing::dispatcher::set_global_default(dispatch).map_err(|e| MagicError::logger(e.to_string()))?;
    tracing::debug!(level = %cfg.level, format = %cfg.format, file = ?cfg.file, "logging initialized");
    Ok(())
}

/// Install the default configuration unless a subscriber is already set.
pub fn try_init_default() -> bool {
    init(&LogConfig::default()).is_ok()
}

fn fmt_layer<W>(cfg: &LogConfig, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tfmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .with_thread_ids(cfg.thread_ids)
        .with_thread_names(cfg.thread_names);

    match cfg.format {
        LogFormat::Full => layer.boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}

/// Map a level name to a [`Level`].
///
/// Besides the standard names this accepts `warning`, `exception` and
/// `critical` (ERROR) and `success` (INFO).
pub fn parse_level(name: &str) -> Result<Level> {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" | "success" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" | "exception" | "critical" | "" => Ok(Level::ERROR),
        other => Err(MagicError::invalid_config(format!("unknown log level: {other}"))),
    }
}

/// Emit `message` at a level chosen at runtime.
pub fn log_with_level(level: Level, message: &str) {
    if level == Level::ERROR {
        tracing::error!("{message}");
    } else if level == Level::WARN {
        tracing::warn!("{message}");
    } else if level == Level::INFO {
        tracing::info!("{message}");
    } else if level == Level::DEBUG {
        tracing::debug!("{message}");
    } else {
        tracing::trace!("{message}");
    }
}
