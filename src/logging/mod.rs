pub mod config;
pub mod logger;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use logger::init_logging;
