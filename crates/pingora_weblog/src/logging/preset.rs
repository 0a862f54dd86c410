use super::{AtomicLevel, Level};

/// Bundle of encoder and output settings a logger is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Console lines, colored levels, backtraces on warnings and errors.
    Development,
    /// One JSON object per line with ISO8601 timestamps.
    Production,
}

impl Preset {
    /// Pick a preset from the threshold as it stands right now.
    ///
    /// This is evaluated once when a logger is built. Moving the threshold
    /// afterwards changes filtering only, never the encoding.
    pub fn for_threshold(level: &AtomicLevel) -> Self {
        if level.enabled(Level::Debug) {
            Preset::Development
        } else {
            Preset::Production
        }
    }

    pub fn ansi(&self) -> bool {
        matches!(self, Preset::Development)
    }

    /// Lowest level that gets a `stacktrace` field attached.
    pub fn stacktrace_from(&self) -> Option<Level> {
        match self {
            Preset::Development => Some(Level::Warn),
            Preset::Production => None,
        }
    }
}
