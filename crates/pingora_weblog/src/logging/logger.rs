use tracing::Dispatch;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Registry, fmt};

use super::{AccessRecord, AtomicLevel, Preset, TracingLogger};

/// Both presets write here unless told otherwise.
pub const DEFAULT_OUTPUT: &str = "stderr";

/// Sink for access records.
pub trait Logger: Send + Sync {
    fn log(&self, record: &AccessRecord);
}

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("unsupported output path {0:?} (expected \"stderr\" or \"stdout\")")]
    UnsupportedOutput(String),
    #[error("no output paths configured")]
    EmptyOutputs,
    #[error("invalid log level {0:?}")]
    InvalidLevel(String),
    #[error("a global logger is already installed")]
    GlobalAlreadySet,
    #[error("invalid log config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Modifiers applied on top of the selected preset.
#[derive(Debug)]
pub enum LoggerOption {
    /// Standard streams to write to; only `"stderr"` and `"stdout"` exist.
    OutputPaths(Vec<String>),
    /// Replace the output entirely. Takes precedence over `OutputPaths`.
    Writer(BoxMakeWriter),
    Ansi(bool),
    /// Include source file and line of the emitting callsite.
    Caller(bool),
    /// Recorded as a `logger` field on access records.
    Name(String),
}

struct Settings {
    outputs: Vec<String>,
    writer: Option<BoxMakeWriter>,
    ansi: bool,
    caller: bool,
    name: Option<String>,
}

impl Settings {
    fn from_preset(preset: Preset) -> Self {
        Self {
            outputs: vec![DEFAULT_OUTPUT.to_string()],
            writer: None,
            ansi: preset.ansi(),
            caller: false,
            name: None,
        }
    }

    fn apply(&mut self, option: LoggerOption) {
        match option {
            LoggerOption::OutputPaths(paths) => self.outputs = paths,
            LoggerOption::Writer(w) => self.writer = Some(w),
            LoggerOption::Ansi(on) => self.ansi = on,
            LoggerOption::Caller(on) => self.caller = on,
            LoggerOption::Name(name) => self.name = Some(name),
        }
    }
}

fn stream(path: &str) -> Result<BoxMakeWriter, LoggerError> {
    match path {
        "stderr" => Ok(BoxMakeWriter::new(std::io::stderr)),
        "stdout" => Ok(BoxMakeWriter::new(std::io::stdout)),
        other => Err(LoggerError::UnsupportedOutput(other.to_string())),
    }
}

fn open_outputs(paths: &[String]) -> Result<BoxMakeWriter, LoggerError> {
    let mut seen: Vec<&str> = Vec::new();
    let mut out: Option<BoxMakeWriter> = None;
    for path in paths.iter().map(|p| p.trim()) {
        if seen.contains(&path) {
            continue;
        }
        seen.push(path);
        let next = stream(path)?;
        out = Some(match out {
            Some(prev) => BoxMakeWriter::new(prev.and(next)),
            None => next,
        });
    }
    out.ok_or(LoggerError::EmptyOutputs)
}

/// Build a logger for `level`, choosing the preset from its current value.
pub fn try_new_logger(
    level: &AtomicLevel,
    options: Vec<LoggerOption>,
) -> Result<TracingLogger, LoggerError> {
    let preset = Preset::for_threshold(level);
    let mut settings = Settings::from_preset(preset);
    for option in options {
        settings.apply(option);
    }

    let writer = match settings.writer.take() {
        Some(w) => w,
        None => open_outputs(&settings.outputs)?,
    };

    let dispatch = match preset {
        Preset::Development => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_timer(fmt::time::SystemTime)
                .with_ansi(settings.ansi)
                .with_target(false)
                .with_file(settings.caller)
                .with_line_number(settings.caller)
                .with_filter(level.clone());
            Dispatch::new(Registry::default().with(layer))
        }
        Preset::Production => {
            let layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(writer)
                .with_timer(fmt::time::SystemTime)
                .with_target(false)
                .with_file(settings.caller)
                .with_line_number(settings.caller)
                .with_filter(level.clone());
            Dispatch::new(Registry::default().with(layer))
        }
    };

    Ok(TracingLogger::new(
        dispatch,
        level.clone(),
        preset,
        settings.name,
    ))
}

/// Like [`try_new_logger`], but a broken configuration is fatal.
///
/// Nothing else can be observed without a working logger, so there is no
/// recovery path here.
pub fn new_logger(level: &AtomicLevel, options: Vec<LoggerOption>) -> TracingLogger {
    match try_new_logger(level, options) {
        Ok(logger) => logger,
        Err(e) => panic!("logging::new_logger: {e}"),
    }
}
