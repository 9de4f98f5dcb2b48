//! Error types for the printer library

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// TCP connection to a network printer failed
    #[error("Connection to {addr} failed: {source}")]
    Connection {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Opening or writing a printer device file failed
    #[error("Device {} failed: {source}", path.display())]
    Device {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error while streaming the job
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout waiting for printer
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// The job was withdrawn before the printer accepted it
    #[error("Print cancelled")]
    Cancelled,
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
