//! Barcode payload codec and label weights

pub mod payload;
pub mod weights;

pub use payload::{
    LabelPayload, ScanFields, build_payload, is_payload_char, parse_payload, sanitize,
};
pub use weights::{LB_TO_KG, Weights, format_weight, lb_to_kg, normalize, parse_weight};
