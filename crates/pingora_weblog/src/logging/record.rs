use std::time::Duration;

use super::Level;

/// One access-log entry: severity, message and the per-request fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    pub level: Level,
    pub message: &'static str,
    pub remote_ip: String,
    pub latency: Duration,
    pub host: String,
    /// `"METHOD URI"`
    pub request: String,
    pub status: u16,
    pub size: u64,
    pub user_agent: String,
    pub request_id: Option<String>,
}

impl AccessRecord {
    /// Latency rendered the way it is logged, e.g. `"123.456ms"`.
    pub fn latency_str(&self) -> String {
        format!("{:?}", self.latency)
    }
}

/// Map a final status code to the severity and message it is logged with.
pub fn classify(status: u16) -> (Level, &'static str) {
    match status {
        500.. => (Level::Error, "Server error"),
        400..=499 => (Level::Warn, "Client error"),
        300..=399 => (Level::Info, "Redirection"),
        _ => (Level::Info, "Success"),
    }
}
