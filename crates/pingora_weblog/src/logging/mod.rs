pub mod config;
pub mod level;
pub mod logger;
pub mod logging_middleware;
pub mod preset;
pub mod record;
pub mod tracing_logger;

pub use config::LogConfig;
pub use level::{AtomicLevel, Level};
pub use logger::{Logger, LoggerError, LoggerOption, new_logger, try_new_logger};
pub use logging_middleware::LoggingMiddleware;
pub use preset::Preset;
pub use record::{AccessRecord, classify};
pub use tracing_logger::TracingLogger;
