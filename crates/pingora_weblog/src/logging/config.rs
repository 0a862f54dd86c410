use serde::Deserialize;

use super::logger::DEFAULT_OUTPUT;
use super::{AtomicLevel, Level, LoggerError, LoggerOption, TracingLogger, try_new_logger};

pub const LEVEL_ENV: &str = "WEBLOG_LEVEL";
pub const OUTPUT_ENV: &str = "WEBLOG_OUTPUT";

/// Logger settings as read from a config file or the environment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub level: Level,
    /// `"stderr"` and/or `"stdout"`
    pub outputs: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            outputs: vec![DEFAULT_OUTPUT.to_string()],
        }
    }
}

impl LogConfig {
    pub fn from_json(s: &str) -> Result<Self, LoggerError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Read `WEBLOG_LEVEL` and `WEBLOG_OUTPUT` (comma separated).
    pub fn from_env() -> Result<Self, LoggerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LoggerError> {
        let mut cfg = Self::default();
        if let Some(level) = lookup(LEVEL_ENV).filter(|s| !s.trim().is_empty()) {
            cfg.level = level.parse()?;
        }
        if let Some(outputs) = lookup(OUTPUT_ENV) {
            cfg.outputs = outputs
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(cfg)
    }

    /// Build the shared threshold and a logger bound to it.
    pub fn try_build(
        &self,
        mut options: Vec<LoggerOption>,
    ) -> Result<(AtomicLevel, TracingLogger), LoggerError> {
        let level = AtomicLevel::new(self.level);
        options.insert(0, LoggerOption::OutputPaths(self.outputs.clone()));
        let logger = try_new_logger(&level, options)?;
        Ok((level, logger))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Preset;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_info_on_stderr() {
        let cfg = LogConfig::from_lookup(env(&[])).unwrap();
        assert_eq!(cfg, LogConfig::default());
        assert_eq!(cfg.level, Level::Info);
        assert_eq!(cfg.outputs, vec!["stderr"]);
    }

    #[test]
    fn reads_environment() {
        let cfg = LogConfig::from_lookup(env(&[
            (LEVEL_ENV, "Debug"),
            (OUTPUT_ENV, "stdout, stderr"),
        ]))
        .unwrap();
        assert_eq!(cfg.level, Level::Debug);
        assert_eq!(cfg.outputs, vec!["stdout", "stderr"]);
    }

    #[test]
    fn bad_level_in_environment_is_an_error() {
        let err = LogConfig::from_lookup(env(&[(LEVEL_ENV, "loud")])).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidLevel(_)));
    }

    #[test]
    fn parses_json() {
        let cfg = LogConfig::from_json(r#"{"level": "WARN", "outputs": ["stdout"]}"#).unwrap();
        assert_eq!(cfg.level, Level::Warn);
        assert_eq!(cfg.outputs, vec!["stdout"]);

        let cfg = LogConfig::from_json(r#"{"level": "debug"}"#).unwrap();
        assert_eq!(cfg.outputs, vec!["stderr"]);

        assert!(matches!(
            LogConfig::from_json(r#"{"level": "chatty"}"#),
            Err(LoggerError::Config(_))
        ));
        assert!(LogConfig::from_json(r#"{"format": "json"}"#).is_err());
    }

    #[test]
    fn build_selects_preset_from_level() {
        let cfg = LogConfig {
            level: Level::Debug,
            ..LogConfig::default()
        };
        let (level, logger) = cfg.try_build(Vec::new()).unwrap();
        assert_eq!(logger.preset(), Preset::Development);
        assert_eq!(level.level(), Level::Debug);

        // the returned handle drives the logger's filtering
        level.set_level(Level::Error);
        assert_eq!(logger.level().level(), Level::Error);
    }

    #[test]
    fn build_rejects_file_outputs() {
        let cfg = LogConfig {
            outputs: vec!["./app.log".to_string()],
            ..LogConfig::default()
        };
        assert!(matches!(
            cfg.try_build(Vec::new()),
            Err(LoggerError::UnsupportedOutput(_))
        ));
    }
}
