//! Label ticket renderer
//!
//! Renders a label into ESC/POS bytes. The Code 39 symbol runs along the
//! paper feed because a full payload is far wider than the print head.

use chrono::NaiveDateTime;
use crab_printer::{Density, EscPosBuilder, Symbol};
use rust_decimal::Decimal;
use tracing::{instrument, warn};

use crate::codec::{LabelPayload, format_weight, lb_to_kg};

const STAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Label ticket renderer
pub struct LabelTicketRenderer {
    width: usize,
    barcode_height: u16,
    density: Density,
}

impl LabelTicketRenderer {
    /// Common widths: 32 characters on 58mm paper, 48 on 80mm
    pub fn new(width: usize, barcode_height: u16) -> Self {
        Self {
            width,
            barcode_height,
            density: Density::PRINT,
        }
    }

    pub fn with_density(mut self, density: Density) -> Self {
        self.density = density;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn density(&self) -> Density {
        self.density
    }

    /// Render a label printed at `printed_at` (local time)
    #[instrument(skip(self, payload), fields(identifier = %payload.identifier))]
    pub fn render(&self, payload: &LabelPayload, printed_at: NaiveDateTime) -> Vec<u8> {
        let mut b = EscPosBuilder::new(self.width);

        self.render_header(&mut b, payload, printed_at);
        self.render_weights(&mut b, payload);
        self.render_symbol(&mut b, payload);

        b.cut_feed(4);
        b.build()
    }

    fn render_header(&self, b: &mut EscPosBuilder, payload: &LabelPayload, at: NaiveDateTime) {
        b.center();
        b.quad_size();
        b.bold();
        b.line(&payload.identifier);
        b.bold_off();
        b.reset_size();

        b.double_size();
        let product = payload.product.trim();
        b.line(if product.is_empty() { "-" } else { product });
        b.reset_size();

        b.line(&source_line(payload));
        b.line(&at.format(STAMP_FORMAT).to_string());
        b.left();
        b.sep_double();
    }

    fn render_weights(&self, b: &mut EscPosBuilder, payload: &LabelPayload) {
        let w = &payload.weights;
        b.bold();
        b.line_lr("GROSS", &weight_pair(w.gross));
        b.bold_off();
        b.line_lr("NET", &weight_pair(w.net));
        b.line_lr("TARE", &weight_pair(w.tare));
        b.sep_single();
    }

    fn render_symbol(&self, b: &mut EscPosBuilder, payload: &LabelPayload) {
        let encoded = payload.encode();
        let symbol = Symbol::encode(&encoded);
        if !symbol.is_lossless() {
            warn!(skipped = ?symbol.skipped(), "Label barcode lost characters");
        }

        b.center();
        b.feed(1);
        b.barcode_lengthwise(&symbol.layout(self.density), self.barcode_height);
        b.feed(1);
        b.left();
    }
}

fn source_line(payload: &LabelPayload) -> String {
    let source = &payload.source;
    let base = match &source.letter {
        Some(letter) if source.is_set() => {
            format!("{} {}", source.group.as_str().to_uppercase(), letter)
        }
        _ => "-".to_string(),
    };
    match payload.special.as_deref().map(str::trim) {
        Some(special) if !special.is_empty() => format!("{base} ({special})"),
        _ => base,
    }
}

fn weight_pair(lb: Decimal) -> String {
    format!("{} LB / {} KG", format_weight(lb), format_weight(lb_to_kg(lb)))
}
