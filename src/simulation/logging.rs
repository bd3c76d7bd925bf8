//! Logging and tracing setup
//!
//! Console output goes to stderr so reports printed on stdout stay clean.
//! With a log directory, a daily rolling JSON file is written alongside the
//! console output; the returned [`LoggingGuard`] must be held until the end of
//! `main` or buffered lines are lost.

use std::io;
use tracing::{debug, Level};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Boxed layer over the bare registry
type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level for this crate when `RUST_LOG` is unset
    pub level: Level,
    /// JSON lines on the console instead of the pretty format
    pub json_format: bool,
    /// Directory for the rolling log file, if any
    pub log_directory: Option<String>,
    /// File name prefix of the rolling log file
    pub log_file_prefix: String,
    /// Emit span enter/exit events
    pub enable_span_events: bool,
    /// Colours on the console
    pub enable_ansi: bool,
    /// Explicit filter directive, overrides `level` and `RUST_LOG`
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            log_directory: None,
            log_file_prefix: "docflow-sim".to_string(),
            enable_span_events: false,
            enable_ansi: true,
            env_filter: None,
        }
    }
}

/// Keeps the non-blocking writers flushing until dropped
#[derive(Debug, Default)]
pub struct LoggingGuard {
    _guards: Vec<WorkerGuard>,
}

impl LoggingConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for the command line: `--debug` wins over `--verbose`,
    /// otherwise only warnings are shown
    pub fn for_cli(verbose: bool, debug: bool) -> Self {
        if debug {
            Self::new().with_level(Level::DEBUG).with_span_events()
        } else if verbose {
            Self::new().with_level(Level::INFO)
        } else {
            Self::new().with_level(Level::WARN)
        }
    }

    /// Set the level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// JSON console output
    pub fn with_json_format(mut self) -> Self {
        self.json_format = true;
        self
    }

    /// Also write a daily rolling file under `directory`
    pub fn with_file_logging(mut self, directory: impl Into<String>) -> Self {
        self.log_directory = Some(directory.into());
        self
    }

    /// Prefix of the rolling file
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.log_file_prefix = prefix.into();
        self
    }

    /// Log span enter and exit
    pub fn with_span_events(mut self) -> Self {
        self.enable_span_events = true;
        self
    }

    /// No colours
    pub fn without_ansi(mut self) -> Self {
        self.enable_ansi = false;
        self
    }

    /// Explicit filter directive such as `docflow_sim=trace`
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    fn span_events(&self) -> FmtSpan {
        if self.enable_span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    /// Filter directive used when neither `env_filter` nor `RUST_LOG` is set
    pub fn default_directive(&self) -> String {
        format!("{}={}", env!("CARGO_PKG_NAME").replace('-', "_"), self.level)
    }

    fn filter(&self) -> Result<EnvFilter, Box<dyn std::error::Error + Send + Sync>> {
        match &self.env_filter {
            Some(filter) => Ok(EnvFilter::try_new(filter)?),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))),
        }
    }

    fn console_layer(&self, guards: &mut Vec<WorkerGuard>) -> BoxedLayer {
        let (writer, guard) = non_blocking(io::stderr());
        guards.push(guard);
        if self.json_format {
            fmt::layer().json().with_writer(writer).with_span_events(self.span_events()).boxed()
        } else {
            fmt::layer()
                .with_writer(writer)
                .with_ansi(self.enable_ansi)
                .with_target(false)
                .with_span_events(self.span_events())
                .boxed()
        }
    }

    fn file_layer(&self, directory: &str, guards: &mut Vec<WorkerGuard>) -> BoxedLayer {
        let appender = rolling::daily(directory, &self.log_file_prefix);
        let (writer, guard) = non_blocking(appender);
        guards.push(guard);
        fmt::layer().json().with_writer(writer).with_span_events(self.span_events()).boxed()
    }

    /// Install the global subscriber
    pub fn init(self) -> Result<LoggingGuard, Box<dyn std::error::Error + Send + Sync>> {
        let mut guards = Vec::new();
        let mut layers = vec![self.console_layer(&mut guards)];
        if let Some(directory) = &self.log_directory {
            layers.push(self.file_layer(directory, &mut guards));
        }

        Registry::default().with(layers).with(self.filter()?).try_init()?;
        debug!("Logging initialised: {:?}", self);
        Ok(LoggingGuard { _guards: guards })
    }

    /// Warnings only, no colours
    pub fn init_test() -> Result<LoggingGuard, Box<dyn std::error::Error + Send + Sync>> {
        Self::new().with_level(Level::WARN).without_ansi().init()
    }
}

/// Structured event tagged with the simulation component
#[macro_export]
macro_rules! sim_event {
    ($level:ident, $message:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::$level!(
            message = $message,
            component = "simulation",
            $($key = $value,)*
        );
    };
    ($level:ident, $message:expr) => {
        tracing::$level!(
            message = $message,
            component = "simulation",
        );
    };
}

/// Span for timing a unit of work
#[macro_export]
macro_rules! perf_span {
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info_span!(
            $name,
            component = "performance",
            $($key = $value,)*
        )
    };
    ($name:expr) => {
        tracing::info_span!(
            $name,
            component = "performance",
        )
    };
}

/// Span wrapping the handling of a failed event
#[macro_export]
macro_rules! error_span {
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::error_span!(
            $name,
            component = "error_handling",
            $($key = $value,)*
        )
    };
    ($name:expr) => {
        tracing::error_span!(
            $name,
            component = "error_handling",
        )
    };
}
