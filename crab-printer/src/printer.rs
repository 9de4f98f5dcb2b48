//! Printer adapters for sending label data
//!
//! Supports:
//! - Network label printers (raw TCP, usually port 9100)
//! - Device files (USB line printers such as `/dev/usb/lp0`)
//!
//! A successful [`Printer::print`] is the "physical print finished" signal:
//! it resolves only after the whole job has been handed to the printer.

use crate::error::{PrintError, PrintResult};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Trait for printer adapters
#[allow(async_fn_in_trait)]
pub trait Printer {
    /// Send raw ESC/POS data to the printer
    async fn print(&self, data: &[u8]) -> PrintResult<()>;

    /// Check if the printer is online/reachable
    async fn is_online(&self) -> bool;
}

/// Network printer (raw TCP)
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    addr: SocketAddr,
    timeout: Duration,
}

impl NetworkPrinter {
    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        Self::from_addr(&format!("{}:{}", host, port))
    }

    /// Create from a socket address string (e.g., "192.168.1.100:9100")
    pub fn from_addr(addr: &str) -> PrintResult<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| PrintError::InvalidConfig(format!("Invalid address: {}", addr)))?;

        Ok(Self {
            addr,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set connect and write timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn send(&self, data: &[u8]) -> PrintResult<()> {
        let mut stream = tokio::time::timeout(self.timeout, TcpStream::connect(self.addr))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", self.addr)))?
            .map_err(|source| PrintError::Connection {
                addr: self.addr,
                source,
            })?;

        tokio::time::timeout(self.timeout, async {
            stream.write_all(data).await?;
            stream.flush().await?;
            stream.shutdown().await
        })
        .await
        .map_err(|_| PrintError::Timeout(format!("Write timeout: {}", self.addr)))??;
        Ok(())
    }
}

impl Printer for NetworkPrinter {
    #[instrument(skip(data), fields(addr = %self.addr, data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        self.send(data).await?;
        info!("Label job sent");
        Ok(())
    }

    #[instrument(fields(addr = %self.addr))]
    async fn is_online(&self) -> bool {
        let check_timeout = Duration::from_millis(500);

        match tokio::time::timeout(check_timeout, TcpStream::connect(self.addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                warn!(error = %e, "Printer offline");
                false
            }
            Err(_) => {
                warn!("Printer check timeout");
                false
            }
        }
    }
}

/// Printer exposed as a writable device file
#[derive(Debug, Clone)]
pub struct DevicePrinter {
    path: PathBuf,
}

impl DevicePrinter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn device_error(&self, source: std::io::Error) -> PrintError {
        PrintError::Device {
            path: self.path.clone(),
            source,
        }
    }
}

impl Printer for DevicePrinter {
    #[instrument(skip(data), fields(path = %self.path.display(), data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        let mut device = tokio::fs::OpenOptions::new()
            .write(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.device_error(e))?;

        device
            .write_all(data)
            .await
            .map_err(|e| self.device_error(e))?;
        device.flush().await.map_err(|e| self.device_error(e))?;
        device.sync_all().await.map_err(|e| self.device_error(e))?;

        info!("Label job written");
        Ok(())
    }

    async fn is_online(&self) -> bool {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => !meta.permissions().readonly(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Printer device missing");
                false
            }
        }
    }
}
