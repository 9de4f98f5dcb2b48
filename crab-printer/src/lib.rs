//! # crab-printer
//!
//! Label printer library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - Code 39 symbol encoding and layout at screen or print density
//! - ESC/POS command building, including symbol rasterization
//! - Network printing (raw TCP) and device-file printing
//! - Grayscale symbol images for on-screen preview (`image` feature)
//!
//! Business logic (WHAT to print) stays in application code:
//! - Label identifiers, payload text and ticket layout → crab-label
//!
//! ## Example
//!
//! ```ignore
//! use crab_printer::{Density, EscPosBuilder, NetworkPrinter, Printer, Symbol};
//!
//! let symbol = Symbol::encode("UN AC151230007 PR BS700D");
//!
//! let mut builder = EscPosBuilder::new(48);
//! builder.center();
//! builder.quad_size();
//! builder.line("AC151230007");
//! builder.reset_size();
//! builder.barcode_lengthwise(&symbol.layout(Density::PRINT), 120);
//! builder.cut_feed(4);
//!
//! let printer = NetworkPrinter::new("192.168.1.100", 9100)?;
//! printer.print(&builder.build()).await?;
//! ```

mod code39;
mod error;
mod escpos;
mod printer;

// Re-exports
pub use code39::{Bar, Density, Element, Layout, SENTINEL, Symbol, is_encodable, pattern};
pub use error::{PrintError, PrintResult};
pub use escpos::EscPosBuilder;
pub use printer::{DevicePrinter, NetworkPrinter, Printer};

#[cfg(feature = "image")]
pub use code39::to_image;
