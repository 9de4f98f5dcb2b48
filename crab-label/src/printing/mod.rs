//! Label printing: ticket rendering, printer selection and the print session

pub mod session;
pub mod ticket;

pub use session::{LabelDraft, LabelSession, PrintOutcome, PrintedLabel, Preview};
pub use ticket::LabelTicketRenderer;

use crab_printer::{Density, DevicePrinter, NetworkPrinter, PrintResult, Printer};
use tracing::info;

use crate::config::LabelConfig;
use crate::error::{LabelError, LabelResult};

/// The printer selected by configuration
#[derive(Debug, Clone)]
pub enum LabelPrinter {
    Network(NetworkPrinter),
    Device(DevicePrinter),
}

impl LabelPrinter {
    /// `PRINTER_ADDR` wins over `PRINTER_DEVICE`
    pub fn from_config(config: &LabelConfig) -> LabelResult<Self> {
        if let Some(addr) = &config.printer_addr {
            let printer = NetworkPrinter::from_addr(addr)?.with_timeout(config.printer_timeout());
            info!(addr = %printer.addr(), "Using network label printer");
            return Ok(Self::Network(printer));
        }
        if let Some(path) = &config.printer_device {
            info!(path = %path.display(), "Using device label printer");
            return Ok(Self::Device(DevicePrinter::new(path)));
        }
        Err(LabelError::NoPrinter)
    }
}

impl Printer for LabelPrinter {
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        match self {
            Self::Network(p) => p.print(data).await,
            Self::Device(p) => p.print(data).await,
        }
    }

    async fn is_online(&self) -> bool {
        match self {
            Self::Network(p) => p.is_online().await,
            Self::Device(p) => p.is_online().await,
        }
    }
}

/// Renderer sized from configuration
pub fn renderer_from_config(config: &LabelConfig) -> LabelTicketRenderer {
    let density = Density::new(config.barcode_module, Density::PRINT.quiet());
    LabelTicketRenderer::new(config.paper_width, config.barcode_height).with_density(density)
}
