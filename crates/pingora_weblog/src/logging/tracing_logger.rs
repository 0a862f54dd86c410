use std::backtrace::Backtrace;
use std::io::Write;

use tracing::Dispatch;
use tracing::field::display;

use crate::logging::{AccessRecord, AtomicLevel, Level, Logger, LoggerError, Preset};

/// Logger backed by its own `tracing` dispatcher.
///
/// The dispatcher is not installed globally on construction. Use
/// [`TracingLogger::install_global`] to make it the process default, or
/// [`TracingLogger::in_scope`] to route ordinary `tracing` macros through it.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    dispatch: Dispatch,
    level: AtomicLevel,
    preset: Preset,
    name: Option<String>,
}

macro_rules! emit_access {
    ($level:ident, $r:ident, $name:expr, $stack:expr) => {
        tracing::$level!(
            logger = $name,
            remote_ip = %$r.remote_ip,
            latency = ?$r.latency,
            host = %$r.host,
            request = %$r.request,
            status = $r.status,
            size = $r.size,
            user_agent = %$r.user_agent,
            request_id = $r.request_id.as_deref(),
            stacktrace = $stack,
            "{}",
            $r.message
        )
    };
}

impl TracingLogger {
    pub(crate) fn new(
        dispatch: Dispatch,
        level: AtomicLevel,
        preset: Preset,
        name: Option<String>,
    ) -> Self {
        Self {
            dispatch,
            level,
            preset,
            name,
        }
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    /// Threshold handle shared with whoever built this logger.
    pub fn level(&self) -> &AtomicLevel {
        &self.level
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Run `f` with this logger as the thread's default dispatcher.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    pub fn install_global(&self) -> Result<(), LoggerError> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())
            .map_err(|_| LoggerError::GlobalAlreadySet)
    }

    /// Flush the standard streams. Call before the process exits.
    pub fn sync(&self) {
        let _ = std::io::stderr().flush();
        let _ = std::io::stdout().flush();
    }
}

impl Logger for TracingLogger {
    fn log(&self, record: &AccessRecord) {
        if !self.level.enabled(record.level) {
            return;
        }
        let backtrace = self
            .preset
            .stacktrace_from()
            .filter(|from| record.level >= *from)
            .map(|_| Backtrace::force_capture());
        let stack = backtrace.as_ref().map(display);
        let name = self.name.as_deref();

        self.in_scope(|| match record.level {
            Level::Error => emit_access!(error, record, name, stack),
            Level::Warn => emit_access!(warn, record, name, stack),
            Level::Info => emit_access!(info, record, name, stack),
            Level::Debug => emit_access!(debug, record, name, stack),
            Level::Trace => emit_access!(trace, record, name, stack),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LoggerOption, new_logger, try_new_logger};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tracing_subscriber::fmt::writer::BoxMakeWriter;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn writer(&self) -> LoggerOption {
            let sink = self.clone();
            LoggerOption::Writer(BoxMakeWriter::new(move || sink.clone()))
        }

        fn lines(&self) -> Vec<String> {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf)
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    fn record(status: u16) -> AccessRecord {
        let (level, message) = crate::logging::classify(status);
        AccessRecord {
            level,
            message,
            remote_ip: "203.0.113.7".into(),
            latency: Duration::from_micros(1_500),
            host: "api.test".into(),
            request: "GET /users/42".into(),
            status,
            size: 128,
            user_agent: "curl/8.0".into(),
            request_id: Some("abc123".into()),
        }
    }

    #[test]
    fn production_writes_flat_json() {
        let out = Capture::default();
        let logger = new_logger(&AtomicLevel::new(Level::Info), vec![out.writer()]);
        assert_eq!(logger.preset(), Preset::Production);

        logger.log(&record(404));

        let lines = out.lines();
        assert_eq!(lines.len(), 1);
        let v: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(v["level"], "WARN");
        assert_eq!(v["message"], "Client error");
        assert_eq!(v["status"], 404);
        assert_eq!(v["size"], 128);
        assert_eq!(v["request"], "GET /users/42");
        assert_eq!(v["request_id"], "abc123");
        assert_eq!(v["latency"], "1.5ms");
        assert!(v.get("stacktrace").is_none());
        assert!(v.get("logger").is_none());
        // ISO8601, UTC
        let ts = v["timestamp"].as_str().unwrap();
        assert!(ts.contains('T') && ts.ends_with('Z'), "timestamp {ts}");
    }

    #[test]
    fn development_writes_console_lines() {
        let out = Capture::default();
        let logger = new_logger(
            &AtomicLevel::new(Level::Debug),
            vec![out.writer(), LoggerOption::Ansi(false)],
        );
        assert_eq!(logger.preset(), Preset::Development);

        logger.log(&record(200));

        let lines = out.lines();
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert!(line.contains("INFO"), "{line}");
        assert!(line.contains("Success"), "{line}");
        assert!(line.contains("status=200"), "{line}");
        assert!(line.contains("request_id=\"abc123\""), "{line}");
        assert!(!line.contains("stacktrace"), "{line}");
        assert!(!line.trim_start().starts_with('{'));
    }

    #[test]
    fn development_attaches_stacktrace_from_warn() {
        let out = Capture::default();
        let logger = new_logger(
            &AtomicLevel::new(Level::Debug),
            vec![out.writer(), LoggerOption::Ansi(false)],
        );
        logger.log(&record(503));
        let all = out.lines().join("\n");
        assert!(all.contains("ERROR"));
        assert!(all.contains("stacktrace="));
    }

    #[test]
    fn development_colors_levels_by_default() {
        let out = Capture::default();
        let logger = new_logger(&AtomicLevel::new(Level::Debug), vec![out.writer()]);
        logger.log(&record(200));
        assert!(out.lines().join("\n").contains("\u{1b}["));
    }

    #[test]
    fn threshold_changes_filtering_but_not_preset() {
        let out = Capture::default();
        let level = AtomicLevel::new(Level::Info);
        let logger = new_logger(&level, vec![out.writer()]);

        logger.log(&record(302));
        assert_eq!(out.lines().len(), 1);

        level.set_level(Level::Error);
        logger.log(&record(302));
        logger.log(&record(404));
        assert_eq!(out.lines().len(), 1);

        level.set_level(Level::Debug);
        assert_eq!(logger.preset(), Preset::Production);
        logger.log(&record(200));
        assert_eq!(out.lines().len(), 2);
        assert!(out.lines()[1].starts_with('{'));
    }

    #[test]
    fn scoped_tracing_macros_follow_threshold() {
        let out = Capture::default();
        let level = AtomicLevel::new(Level::Info);
        let logger = new_logger(&level, vec![out.writer()]);

        logger.in_scope(|| {
            tracing::debug!("hidden");
            tracing::info!(answer = 42, "shown");
        });
        level.set_level(Level::Debug);
        logger.in_scope(|| tracing::debug!("now visible"));

        let lines = out.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"answer\":42"));
        assert!(lines[1].contains("now visible"));
    }

    #[test]
    fn name_is_recorded() {
        let out = Capture::default();
        let logger = new_logger(
            &AtomicLevel::new(Level::Info),
            vec![out.writer(), LoggerOption::Name("access".into())],
        );
        logger.log(&record(200));
        let v: serde_json::Value = serde_json::from_str(&out.lines()[0]).unwrap();
        assert_eq!(v["logger"], "access");
    }

    #[test]
    fn unknown_output_is_rejected() {
        let err = try_new_logger(
            &AtomicLevel::default(),
            vec![LoggerOption::OutputPaths(vec!["/var/log/app.log".into()])],
        )
        .unwrap_err();
        assert!(matches!(err, LoggerError::UnsupportedOutput(_)));

        let err = try_new_logger(
            &AtomicLevel::default(),
            vec![LoggerOption::OutputPaths(Vec::new())],
        )
        .unwrap_err();
        assert!(matches!(err, LoggerError::EmptyOutputs));
    }

    #[test]
    fn standard_streams_are_accepted() {
        let logger = try_new_logger(
            &AtomicLevel::default(),
            vec![LoggerOption::OutputPaths(vec![
                "stderr".into(),
                "stdout".into(),
                "stderr".into(),
            ])],
        );
        assert!(logger.is_ok());
    }

    #[test]
    #[should_panic(expected = "logging::new_logger")]
    fn construction_failure_is_fatal() {
        new_logger(
            &AtomicLevel::default(),
            vec![LoggerOption::OutputPaths(vec!["syslog".into()])],
        );
    }
}
