//! Barcode payload encode/decode
//!
//! Wire format (space separated, `SP` only when a special token exists):
//!
//! ```text
//! UN <identifier> PR <product> SRC <GROUP-LETTER|NA>[ SP <special>] NET <n.n> TAR <n.n> GRO <n.n>
//! ```
//!
//! Decoding is deliberately lenient: labels may appear in any order and
//! unknown tokens are ignored, because scanner noise can truncate or reorder
//! input. Field values must be single tokens to round-trip.

use crab_printer::{SENTINEL, is_encodable};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::weights::{Weights, format_weight, parse_decimal};
use crate::numbering::{Source, SourceInfo, derive_source_info};

const UNSET: &str = "NA";

const LABELS: [&str; 7] = ["UN", "PR", "SRC", "SP", "NET", "TAR", "GRO"];

/// Characters that survive sanitization (the Code 39 alphabet minus `*`)
pub fn is_payload_char(c: char) -> bool {
    c != SENTINEL && is_encodable(c)
}

/// Uppercase, then drop any character outside the payload alphabet
pub fn sanitize(s: &str) -> String {
    s.to_uppercase().chars().filter(|c| is_payload_char(*c)).collect()
}

fn sanitize_or_unset(s: &str) -> String {
    let clean = sanitize(s);
    let clean = clean.trim();
    if clean.is_empty() {
        UNSET.to_string()
    } else {
        clean.to_string()
    }
}

/// Fields carried by one label's barcode
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelPayload {
    pub identifier: String,
    pub product: String,
    pub source: Source,
    pub special: Option<String>,
    pub weights: Weights,
}

impl LabelPayload {
    /// Encode into sanitized barcode text
    pub fn encode(&self) -> String {
        let unit = sanitize_or_unset(&self.identifier);
        let product = sanitize_or_unset(&self.product);
        let src = self
            .source
            .token()
            .map(|token| sanitize_or_unset(&token))
            .unwrap_or_else(|| UNSET.to_string());
        let special = self
            .special
            .as_deref()
            .map(|s| sanitize(s).trim().to_string())
            .filter(|s| !s.is_empty())
            .map(|s| format!(" SP {s}"))
            .unwrap_or_default();

        format!(
            "UN {unit} PR {product} SRC {src}{special} NET {} TAR {} GRO {}",
            format_weight(self.weights.net),
            format_weight(self.weights.tare),
            format_weight(self.weights.gross),
        )
        .trim()
        .to_string()
    }

    /// Field names whose scanned value disagrees with this payload
    ///
    /// Fields missing from the scan are not reported.
    pub fn mismatches(&self, scan: &ScanFields) -> Vec<&'static str> {
        let expected = parse_payload(&self.encode()).unwrap_or_default();
        let mut fields = Vec::new();

        let mut check = |name: &'static str, ok: bool| {
            if !ok {
                fields.push(name);
            }
        };
        check("UN", agrees(&scan.unit_number, &expected.unit_number));
        check("PR", agrees(&scan.product, &expected.product));
        check("SRC", agrees(&scan.src, &expected.src));
        check("SP", agrees(&scan.special, &expected.special));
        check("NET", agrees(&scan.net, &expected.net));
        check("TAR", agrees(&scan.tare, &expected.tare));
        check("GRO", agrees(&scan.gross, &expected.gross));
        fields
    }
}

fn agrees<T: PartialEq>(scanned: &Option<T>, expected: &Option<T>) -> bool {
    scanned.is_none() || scanned == expected
}

/// Encode label fields into barcode text
pub fn build_payload(
    identifier: &str,
    product: &str,
    source: &Source,
    special: Option<&str>,
    weights: Weights,
) -> String {
    LabelPayload {
        identifier: identifier.to_string(),
        product: product.to_string(),
        source: source.clone(),
        special: special.map(str::to_string),
        weights,
    }
    .encode()
}

/// Fields recovered from scanned text; every field is optional
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanFields {
    pub unit_number: Option<String>,
    pub product: Option<String>,
    pub src: Option<String>,
    pub special: Option<String>,
    pub net: Option<Decimal>,
    pub tare: Option<Decimal>,
    pub gross: Option<Decimal>,
}

impl ScanFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Group and letter of the `SRC` token, if one was scanned
    pub fn source_info(&self) -> Option<SourceInfo> {
        self.src.as_deref().map(derive_source_info)
    }
}

/// Decode scanned text; `None` if nothing recognizable was found
pub fn parse_payload(text: &str) -> Option<ScanFields> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }

    // A label takes the token after it as its value, and that value is never
    // read as a label itself. The first occurrence of a label wins.
    let mut values: [Option<&str>; LABELS.len()] = [None; LABELS.len()];
    let mut i = 0;
    while i < tokens.len() {
        if let Some(slot) = LABELS.iter().position(|l| *l == tokens[i])
            && let Some(value) = tokens.get(i + 1)
        {
            values[slot].get_or_insert(*value);
            i += 2;
        } else {
            i += 1;
        }
    }

    let after = |label: &str| -> Option<String> {
        let slot = LABELS.iter().position(|l| *l == label)?;
        values[slot].map(str::to_string)
    };
    let number = |label: &str| after(label).and_then(|v| parse_decimal(&v));

    let fields = ScanFields {
        unit_number: after("UN"),
        product: after("PR"),
        src: after("SRC"),
        special: after("SP"),
        net: number("NET"),
        tare: number("TAR"),
        gross: number("GRO"),
    };

    if fields.is_empty() {
        debug!(tokens = tokens.len(), "Scan carried no recognized fields");
        return None;
    }
    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numbering::SourceGroup;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sample() -> LabelPayload {
        LabelPayload {
            identifier: "AC151230007".into(),
            product: "BS700D".into(),
            source: Source::new(SourceGroup::Silo, "A"),
            special: None,
            weights: Weights::from_f64(1800.0, 81.0, 1881.0),
        }
    }

    #[test]
    fn test_encode_format() {
        assert_eq!(
            sample().encode(),
            "UN AC151230007 PR BS700D SRC SILO-A NET 1800.0 TAR 81.0 GRO 1881.0"
        );
    }

    #[test]
    fn test_round_trip() {
        let parsed = parse_payload(&sample().encode()).unwrap();
        assert_eq!(
            parsed,
            ScanFields {
                unit_number: Some("AC151230007".into()),
                product: Some("BS700D".into()),
                src: Some("SILO-A".into()),
                special: None,
                net: Some(d("1800.0")),
                tare: Some(d("81.0")),
                gross: Some(d("1881.0")),
            }
        );
        assert!(sample().mismatches(&parsed).is_empty());
    }

    #[test]
    fn test_round_trip_with_label_words_as_values() {
        let mut payload = sample();
        payload.product = "NET".into();
        payload.special = Some("GRO".into());
        let text = payload.encode();
        assert_eq!(
            text,
            "UN AC151230007 PR NET SRC SILO-A SP GRO NET 1800.0 TAR 81.0 GRO 1881.0"
        );

        let parsed = parse_payload(&text).unwrap();
        assert_eq!(parsed.product.as_deref(), Some("NET"));
        assert_eq!(parsed.special.as_deref(), Some("GRO"));
        assert_eq!(parsed.net, Some(d("1800.0")));
        assert_eq!(parsed.gross, Some(d("1881.0")));
        assert!(payload.mismatches(&parsed).is_empty());
    }

    #[test]
    fn test_parse_first_label_wins() {
        let parsed = parse_payload("UN X1 UN X2 NET 5.0 NET 6.0").unwrap();
        assert_eq!(parsed.unit_number.as_deref(), Some("X1"));
        assert_eq!(parsed.net, Some(d("5.0")));
    }

    #[test]
    fn test_sanitize_product() {
        let mut payload = sample();
        payload.product = "bs-700d!!".into();
        assert!(payload.encode().contains(" PR BS-700D SRC "));
    }

    #[test]
    fn test_sanitize_alphabet() {
        assert_eq!(sanitize("a*b_c$d/e+f%g.h i-j"), "ABC$D/E+F%G.H I-J");
    }

    #[test]
    fn test_unset_source_is_na() {
        let mut payload = sample();
        payload.source = Source::none();
        assert!(payload.encode().contains(" SRC NA NET "));

        payload.source = Source::parse("dryer", "");
        assert!(payload.encode().contains(" SRC NA NET "));
    }

    #[test]
    fn test_special_segment() {
        let mut payload = sample();
        payload.source = Source::parse("other", "ux");
        payload.special = Some("Unextracted".into());
        let text = payload.encode();
        assert!(text.contains(" SRC OTHER-UX SP UNEXTRACTED NET "));

        let parsed = parse_payload(&text).unwrap();
        assert_eq!(parsed.special.as_deref(), Some("UNEXTRACTED"));

        payload.special = Some("!!".into());
        assert!(!payload.encode().contains(" SP "));
    }

    #[test]
    fn test_empty_product_is_na() {
        let mut payload = sample();
        payload.product = String::new();
        assert!(payload.encode().contains(" PR NA "));
    }

    #[test]
    fn test_encoded_text_is_code39_safe() {
        let mut payload = sample();
        payload.product = "bs 700 «d»".into();
        payload.special = Some("lactam*".into());
        assert!(payload.encode().chars().all(is_payload_char));
    }

    #[test]
    fn test_parse_rejects_short_input() {
        assert_eq!(parse_payload(""), None);
        assert_eq!(parse_payload("UN"), None);
        assert_eq!(parse_payload("   AC151230007  "), None);
    }

    #[test]
    fn test_parse_no_recognized_labels() {
        assert_eq!(parse_payload("HELLO WORLD"), None);
        assert_eq!(parse_payload("NET abc"), None);
    }

    #[test]
    fn test_parse_is_order_independent() {
        let parsed = parse_payload("GRO 10.5 junk UN X1 PR").unwrap();
        assert_eq!(parsed.unit_number.as_deref(), Some("X1"));
        assert_eq!(parsed.gross, Some(d("10.5")));
        assert_eq!(parsed.product, None);
    }

    #[test]
    fn test_parse_drops_bad_numbers() {
        let parsed = parse_payload("UN X1 NET 1O0 TAR 81.0").unwrap();
        assert_eq!(parsed.net, None);
        assert_eq!(parsed.tare, Some(d("81")));
    }

    #[test]
    fn test_truncated_scan() {
        let text = sample().encode();
        let parsed = parse_payload(&text[..25]).unwrap();
        assert_eq!(parsed.unit_number.as_deref(), Some("AC151230007"));
        assert_eq!(parsed.net, None);
        assert!(sample().mismatches(&parsed).is_empty());
    }

    #[test]
    fn test_mismatches() {
        let parsed = parse_payload("UN AC151230008 NET 1800.0").unwrap();
        assert_eq!(sample().mismatches(&parsed), vec!["UN"]);
    }

    #[test]
    fn test_source_info_from_scan() {
        let parsed = parse_payload(&sample().encode()).unwrap();
        let info = parsed.source_info().unwrap();
        assert_eq!(info.group, "silo");
        assert_eq!(info.letter, "A");
    }
}
