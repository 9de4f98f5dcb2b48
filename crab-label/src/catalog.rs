//! Product catalog and default weights

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::codec::Weights;
use crate::numbering::{Source, SourceGroup};

/// Net weight pre-filled on the weights screen (lb)
pub const DEFAULT_NET_LB: Decimal = Decimal::from_parts(1800, 0, 0, false, 0);
/// Tare weight pre-filled on the weights screen (lb)
pub const DEFAULT_TARE_LB: Decimal = Decimal::from_parts(81, 0, 0, false, 0);

/// Pre-filled weights; gross is left for the operator
pub fn default_weights() -> Weights {
    Weights::new(DEFAULT_NET_LB, DEFAULT_TARE_LB, Decimal::ZERO)
}

/// Products offered for a group and letter
pub fn products(group: SourceGroup, letter: &str) -> &'static [&'static str] {
    match (group, letter.trim().to_ascii_uppercase().as_str()) {
        (SourceGroup::Silo, "A") => &["BS700D", "BS700A"],
        (SourceGroup::Silo, "B") => &["BS700D"],
        (SourceGroup::Silo, "C") => &["BS700R80", "BS700RA", "BS700D", "BS640T"],
        (SourceGroup::Silo, "D") => &["BS700D"],
        (SourceGroup::Dryer, "A") => &["700D-INT", "BS640T"],
        (SourceGroup::Dryer, "B") => &["BS700D", "BS640T"],
        (SourceGroup::Dryer, "C") => &["BS700D", "BS640T", "BS640UX"],
        (SourceGroup::Dryer, "D") => &["BS640AFOIL"],
        (SourceGroup::Compound, "A") => &["BX3WQ662X"],
        (SourceGroup::Compound, "B") => {
            &["CSDN-INT", "BS700D", "BS640AFOIL", "BS640UX", "PA6-205"]
        }
        // Extrusion lines are selectable but have no listed products yet
        (SourceGroup::Extrusion, "EA" | "EB") => &[],
        (SourceGroup::Other, "UX") => &["BS640UX"],
        (SourceGroup::Other, "LT") => &["CAPRO"],
        _ => &[],
    }
}

pub fn products_for(source: &Source) -> &'static [&'static str] {
    products(source.group, source.letter.as_deref().unwrap_or(""))
}

pub fn is_listed(source: &Source, product: &str) -> bool {
    products_for(source)
        .iter()
        .any(|p| p.eq_ignore_ascii_case(product.trim()))
}

/// Material with its own source code and fixed product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Special {
    Unextracted,
    Lactam,
}

impl Special {
    pub const ALL: [Special; 2] = [Special::Unextracted, Special::Lactam];

    pub fn as_str(&self) -> &'static str {
        match self {
            Special::Unextracted => "Unextracted",
            Special::Lactam => "Lactam",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Special::Unextracted => "UX",
            Special::Lactam => "LT",
        }
    }

    pub fn source(&self) -> Source {
        Source::new(SourceGroup::Other, self.code())
    }

    pub fn product(&self) -> &'static str {
        match self {
            Special::Unextracted => "BS640UX",
            Special::Lactam => "CAPRO",
        }
    }
}

impl fmt::Display for Special {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown special source: {0}")]
pub struct UnknownSpecial(pub String);

impl FromStr for Special {
    type Err = UnknownSpecial;

    /// Accepts the name or the two-letter code, case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|sp| {
                sp.as_str().eq_ignore_ascii_case(needle) || sp.code().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| UnknownSpecial(s.to_string()))
    }
}
