//! Label weights with one fractional digit
//!
//! Weights are entered in pounds. All arithmetic uses `Decimal` so a weight
//! printed as `1800.0` scans back as exactly `1800.0`.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Fractional digits carried on the label
const DECIMAL_PLACES: u32 = 1;

/// Pounds to kilograms (exact by definition)
pub const LB_TO_KG: Decimal = Decimal::from_parts(45_359_237, 0, 0, false, 8);

/// Round to one decimal, half away from zero; negatives clamp to zero
pub fn normalize(value: Decimal) -> Decimal {
    if value.is_sign_negative() {
        return Decimal::ZERO;
    }
    let mut rounded =
        value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(DECIMAL_PLACES);
    rounded
}

/// Parse a decimal as typed or scanned (`1800`, `81.5`, `1.8e3`)
pub fn parse_decimal(input: &str) -> Option<Decimal> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Parse operator input; anything unparsable counts as zero
pub fn parse_weight(input: &str) -> Decimal {
    parse_decimal(input).map(normalize).unwrap_or(Decimal::ZERO)
}

/// Format with exactly one fractional digit
pub fn format_weight(value: Decimal) -> String {
    normalize(value).to_string()
}

pub fn lb_to_kg(lb: Decimal) -> Decimal {
    normalize(lb * LB_TO_KG)
}

/// Net, tare and gross weight in pounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Weights {
    pub net: Decimal,
    pub tare: Decimal,
    pub gross: Decimal,
}

impl Weights {
    pub fn new(net: Decimal, tare: Decimal, gross: Decimal) -> Self {
        Self {
            net: normalize(net),
            tare: normalize(tare),
            gross: normalize(gross),
        }
    }

    /// From floating point readings; non-finite values become zero
    pub fn from_f64(net: f64, tare: f64, gross: f64) -> Self {
        let convert = |v: f64| Decimal::from_f64(v).unwrap_or(Decimal::ZERO);
        Self::new(convert(net), convert(tare), convert(gross))
    }

    /// From keypad text fields
    pub fn from_inputs(net: &str, tare: &str, gross: &str) -> Self {
        Self {
            net: parse_weight(net),
            tare: parse_weight(tare),
            gross: parse_weight(gross),
        }
    }

    pub fn net_kg(&self) -> Decimal {
        lb_to_kg(self.net)
    }

    pub fn tare_kg(&self) -> Decimal {
        lb_to_kg(self.tare)
    }

    pub fn gross_kg(&self) -> Decimal {
        lb_to_kg(self.gross)
    }
}
