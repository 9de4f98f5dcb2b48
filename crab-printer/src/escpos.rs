//! ESC/POS command builder for shipping labels
//!
//! Provides a fluent API for building label print data: text blocks,
//! separators and Code 39 symbols rasterized from a [`Layout`] along the
//! paper feed.

use crate::code39::Layout;
use tracing::{debug, instrument};

/// Largest raster block a single `GS v 0` command can describe
const MAX_RASTER_ROWS: usize = 0xFFFF;

/// ESC/POS command builder
///
/// Label content is ASCII; characters outside ASCII are printed as `?`.
pub struct EscPosBuilder {
    buf: Vec<u8>,
    width: usize,
}

impl EscPosBuilder {
    /// Create a new builder with the specified paper width in characters
    ///
    /// Common widths:
    /// - 58mm paper: 32 characters
    /// - 80mm paper: 48 characters
    pub fn new(width: usize) -> Self {
        let mut buf = Vec::with_capacity(8192);
        // Initialize printer (ESC @)
        buf.extend_from_slice(&[0x1B, 0x40]);
        Self { buf, width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    // === Text Output ===

    /// Write text, replacing non-ASCII characters
    pub fn text(&mut self, s: &str) -> &mut Self {
        self.buf
            .extend(s.chars().map(|c| if c.is_ascii() { c as u8 } else { b'?' }));
        self
    }

    /// Write text followed by newline
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.text(s);
        self.buf.push(b'\n');
        self
    }

    /// Print and feed n lines (ESC d n)
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x64, lines]);
        self
    }

    // === Alignment ===

    pub fn center(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x61, 0x01]);
        self
    }

    pub fn left(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x61, 0x00]);
        self
    }

    // === Text Style ===

    pub fn bold(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x01]);
        self
    }

    pub fn bold_off(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x00]);
        self
    }

    /// Double width and height
    pub fn double_size(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x21, 0x11]);
        self
    }

    /// Quadruple width and height, for the identifier headline
    pub fn quad_size(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x21, 0x33]);
        self
    }

    pub fn reset_size(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x21, 0x00]);
        self
    }

    // === Separators ===

    pub fn sep_double(&mut self) -> &mut Self {
        self.line(&"=".repeat(self.width))
    }

    pub fn sep_single(&mut self) -> &mut Self {
        self.line(&"-".repeat(self.width))
    }

    // === Layout Helpers ===

    /// Print left and right text on the same line
    pub fn line_lr(&mut self, left: &str, right: &str) -> &mut Self {
        let lw = left.chars().count();
        let rw = right.chars().count();

        if lw + rw >= self.width {
            self.text(left);
            self.text(" ");
            self.line(right)
        } else {
            let spaces = self.width - lw - rw;
            self.text(left);
            self.text(&" ".repeat(spaces));
            self.line(right)
        }
    }

    // === Barcodes ===

    /// Rasterize a symbol rotated a quarter turn, running along the paper feed
    ///
    /// Long payloads do not fit across the print head, so labels carry the
    /// symbol lengthwise. Each dot of the layout becomes one printed row that
    /// is `height` dots wide.
    #[instrument(skip(self, layout), fields(dots = layout.total_width()))]
    pub fn barcode_lengthwise(&mut self, layout: &Layout, height: u16) -> &mut Self {
        let row = layout.to_row();
        let width = usize::from(height.max(1));
        let black = pack_row(&vec![true; width]);
        let white = vec![0u8; black.len()];

        for chunk in row.chunks(MAX_RASTER_ROWS) {
            self.raster_header(width, chunk.len());
            for dot in chunk {
                self.buf
                    .extend_from_slice(if *dot { &black } else { &white });
            }
        }
        self.buf.push(b'\n');
        self
    }

    /// GS v 0 m xL xH yL yH
    fn raster_header(&mut self, width_dots: usize, rows: usize) {
        let x_bytes = width_dots.div_ceil(8);
        debug!(x_bytes, rows, "raster block");
        self.buf.extend_from_slice(&[0x1D, 0x76, 0x30, 0x00]);
        self.buf.push(x_bytes as u8);
        self.buf.push((x_bytes >> 8) as u8);
        self.buf.push(rows as u8);
        self.buf.push((rows >> 8) as u8);
    }

    // === Paper Control ===

    /// Feed n lines then cut (GS V 66 n)
    pub fn cut_feed(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x56, 0x42, lines]);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

/// Pack dots into bytes, most significant bit first
fn pack_row(row: &[bool]) -> Vec<u8> {
    row.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .filter(|(_, dot)| **dot)
                .fold(0u8, |byte, (bit, _)| byte | (1 << (7 - bit)))
        })
        .collect()
}
