//! Shared infrastructure: logging setup and the audit macro

pub mod logger;

pub use logger::{cleanup_old_logs, init_logger, init_logger_with_file};
