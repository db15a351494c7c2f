//! # Logger
//!
//! Installs the process-wide `tracing` subscriber used by every `ModuleHub` binary.
//!
//! * Console output is compact and colored.
//! * File output goes through a non-blocking rolling appender, optionally as JSON lines.
//! * Filtering starts from a default level, can take programmatic directives via
//!   [`LoggerBuilder::env_filter`], and honors `RUST_LOG`.
//! * The `profiling` feature attaches `tokio-console` (requires `--cfg tokio_unstable`).
//!
//! ## Example
//!
//! ```rust
//! # use modhub_logger::{Logger, LevelFilter};
//! let _logger = Logger::builder()
//!     .name("modhub-server")
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const DEFAULT_MAX_FILES: usize = 10;
const LOG_FILE_SUFFIX: &str = "log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug)]
struct LoggerSettings {
    console: bool,
    path: Option<PathBuf>,
    level: LevelFilter,
    rotation: Rotation,
    max_files: usize,
    json: bool,
    env_filter: Option<String>,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            console: true,
            path: None,
            level: LevelFilter::INFO,
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
            json: false,
            env_filter: None,
        }
    }
}

/// Builder state: no logger name yet.
#[derive(Debug)]
pub struct Unnamed;
/// Builder state: named logger.
#[derive(Debug)]
pub struct Named(String);
/// Builder state: console only.
#[derive(Debug)]
pub struct ConsoleOnly;
/// Builder state: file output configured.
#[derive(Debug)]
pub struct WithFile;

mod sealed {
    pub trait State {}
}
impl sealed::State for Unnamed {}
impl sealed::State for Named {}
impl sealed::State for ConsoleOnly {}
impl sealed::State for WithFile {}

/// Type-state builder for the global tracing subscriber.
///
/// A name is mandatory before [`LoggerBuilder::init`] becomes available; file-only
/// knobs (rotation, retention, JSON) unlock after [`LoggerBuilder::path`].
#[derive(Debug)]
pub struct LoggerBuilder<N: sealed::State = Unnamed, F: sealed::State = ConsoleOnly> {
    settings: LoggerSettings,
    name: N,
    output: PhantomData<F>,
}

impl<F: sealed::State> LoggerBuilder<Unnamed, F> {
    /// Names the logger; the name prefixes rolling log files.
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<Named, F> {
        LoggerBuilder { settings: self.settings, name: Named(name.into()), output: PhantomData }
    }
}

impl LoggerBuilder<Named, WithFile> {
    /// Number of rotated files to keep.
    #[must_use]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.settings.max_files = max;
        self
    }

    /// File rotation period.
    #[must_use]
    pub const fn rotation(mut self, rotation: Rotation) -> Self {
        self.settings.rotation = rotation;
        self
    }

    /// Writes JSON lines to the log file instead of plain text.
    #[must_use]
    pub const fn json(mut self, enabled: bool) -> Self {
        self.settings.json = enabled;
        self
    }
}

impl<F: sealed::State> LoggerBuilder<Named, F> {
    /// Minimum level emitted when neither `RUST_LOG` nor [`Self::env_filter`] says otherwise.
    #[must_use]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.settings.level = level;
        self
    }

    /// Programmatic filter directives such as `modhub_modules=debug,tower_http=info`.
    ///
    /// Invalid directives make [`LoggerBuilder::init`] fail.
    #[must_use]
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.settings.env_filter = Some(filter.into());
        self
    }

    /// Toggles console output.
    #[must_use]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.settings.console = enabled;
        self
    }

    /// Directory for rolling log files.
    pub fn path(self, path: impl Into<PathBuf>) -> LoggerBuilder<Named, WithFile> {
        let mut settings = self.settings;
        settings.path = Some(path.into());
        LoggerBuilder { settings, name: self.name, output: PhantomData }
    }

    /// Installs the global subscriber.
    ///
    /// Keep the returned [`Logger`] alive for the whole program: it owns the
    /// background writer of the file appender.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for an empty name, zero retention,
    ///   bad filter directives or when every output is disabled.
    /// * [`LoggerError::Appender`] when the log directory cannot be used.
    /// * [`LoggerError::Subscriber`] when a global subscriber is already set.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let Self { settings, name: Named(name), .. } = self;
        validate(&settings, &name)?;

        let filter = env_filter(&settings)?;
        let mut layers: Vec<BoxedLayer> = Vec::new();

        #[cfg(all(feature = "profiling", tokio_unstable))]
        if settings.console {
            layers.push(console_subscriber::spawn().boxed());
        }

        if settings.console {
            layers.push(layer().compact().with_ansi(true).boxed());
        }

        let guard = match &settings.path {
            Some(path) => {
                let (file_layer, guard) = file_layer(&settings, path, &name)?;
                layers.push(file_layer);
                Some(guard)
            }
            None => None,
        };

        if layers.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "No output enabled; turn on the console or set a log path".into(),
                context: None,
            });
        }

        tracing_subscriber::registry().with(layers).with(filter).try_init()?;

        Ok(Logger { guard })
    }
}

/// Handle to the installed logging system.
#[must_use = "dropping the handle stops the background log writer"]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Starts configuring the global subscriber.
    ///
    /// ```rust
    /// use modhub_logger::{LevelFilter, Logger};
    ///
    /// let _logger = Logger::builder().name("doc").level(LevelFilter::WARN).init().unwrap();
    /// ```
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { settings: LoggerSettings::default(), name: Unnamed, output: PhantomData }
    }

    /// The file writer guard, present only when file output is enabled.
    #[must_use]
    pub const fn guard(&self) -> Option<&WorkerGuard> {
        self.guard.as_ref()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Logger shutting down, flushing file output");
        }
    }
}

fn validate(settings: &LoggerSettings, name: &str) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::InvalidConfiguration {
            message: "Logger name cannot be empty".into(),
            context: None,
        });
    }
    if settings.max_files == 0 {
        return Err(LoggerError::InvalidConfiguration {
            message: "max_files must be greater than zero".into(),
            context: None,
        });
    }
    Ok(())
}

fn env_filter(settings: &LoggerSettings) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(settings.level.into());
    match &settings.env_filter {
        None => Ok(builder.from_env_lossy()),
        Some(directives) => {
            builder.parse(directives).map_err(|e| LoggerError::InvalidConfiguration {
                message: format!("Invalid filter '{directives}': {e}").into(),
                context: None,
            })
        }
    }
}

fn file_layer(
    settings: &LoggerSettings,
    path: &Path,
    name: &str,
) -> Result<(BoxedLayer, WorkerGuard), LoggerError> {
    fs::create_dir_all(path).map_err(|e| LoggerError::Internal {
        message: e.to_string().into(),
        context: Some(format!("Creating log directory {}", path.display()).into()),
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(settings.rotation.clone())
        .filename_prefix(name)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(settings.max_files)
        .build(path)
        .context("Building rolling file appender")?;

    let (writer, guard) = tracing_appender::non_blocking(appender);
    let plain = layer().with_writer(writer).with_ansi(false);
    let boxed = if settings.json { plain.json().boxed() } else { plain.boxed() };

    Ok((boxed, guard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn builder_defaults() {
        let builder = Logger::builder().name("test-app");
        assert!(builder.settings.console);
        assert_eq!(builder.settings.level, LevelFilter::INFO);
        assert_eq!(builder.settings.max_files, DEFAULT_MAX_FILES);
        assert!(builder.settings.path.is_none());
        assert!(builder.settings.env_filter.is_none());
    }

    #[test]
    fn file_settings_are_recorded() {
        let dir = tempfile::tempdir().expect("temp dir");
        let logs = dir.path().join("logs");
        let builder = Logger::builder()
            .name("test-app")
            .env_filter("modhub_modules=debug")
            .level(LevelFilter::DEBUG)
            .path(&logs)
            .max_files(3)
            .json(true);

        assert_eq!(builder.settings.level, LevelFilter::DEBUG);
        assert_eq!(builder.settings.max_files, 3);
        assert!(builder.settings.json);
        assert_eq!(builder.settings.path.as_deref(), Some(logs.as_path()));
        assert_eq!(builder.settings.env_filter.as_deref(), Some("modhub_modules=debug"));
    }

    #[test]
    #[serial]
    fn empty_name_is_rejected() {
        let err = Logger::builder().name("  ").init().expect_err("empty name must fail");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    #[serial]
    fn no_outputs_is_rejected() {
        let err = Logger::builder().name("quiet").console(false).init().expect_err("no output");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    #[serial]
    fn bad_filter_is_rejected() {
        let err = Logger::builder()
            .name("filtered")
            .env_filter("modhub=notalevel")
            .init()
            .expect_err("invalid directive");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }
}
