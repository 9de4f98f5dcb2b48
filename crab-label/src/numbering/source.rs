//! Source classification and identifier prefixes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix used when a group/letter combination has no mapping
pub const DEFAULT_PREFIX: &str = "AC";

/// Where the material on a label came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceGroup {
    Silo,
    Dryer,
    Compound,
    Extrusion,
    Other,
    #[default]
    None,
}

impl SourceGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceGroup::Silo => "silo",
            SourceGroup::Dryer => "dryer",
            SourceGroup::Compound => "compound",
            SourceGroup::Extrusion => "extrusion",
            SourceGroup::Other => "other",
            SourceGroup::None => "none",
        }
    }
}

impl fmt::Display for SourceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceGroup {
    type Err = std::convert::Infallible;

    /// Case-insensitive; `bulk` is an alias of `silo`, unknown names map to `Other`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let group = match s.trim().to_ascii_lowercase().as_str() {
            "silo" | "bulk" => SourceGroup::Silo,
            "dryer" => SourceGroup::Dryer,
            "compound" => SourceGroup::Compound,
            "extrusion" => SourceGroup::Extrusion,
            "" | "none" => SourceGroup::None,
            _ => SourceGroup::Other,
        };
        Ok(group)
    }
}

/// A source group plus its optional letter (`A`-`D`) or two-letter code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Source {
    pub group: SourceGroup,
    pub letter: Option<String>,
}

impl Source {
    pub fn new(group: SourceGroup, letter: impl Into<String>) -> Self {
        let letter = letter.into().trim().to_ascii_uppercase();
        Self {
            group,
            letter: (!letter.is_empty()).then_some(letter),
        }
    }

    /// No source selected
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse a group name and letter as entered by an operator
    pub fn parse(group: &str, letter: &str) -> Self {
        // FromStr for SourceGroup cannot fail
        let group = group.parse().unwrap_or_default();
        Self::new(group, letter)
    }

    pub fn is_set(&self) -> bool {
        self.group != SourceGroup::None && self.letter.is_some()
    }

    /// Two-letter identifier prefix
    pub fn prefix(&self) -> &'static str {
        prefix_for(self.group, self.letter.as_deref().unwrap_or(""))
    }

    /// `GROUP-LETTER`, or `None` when the source is unset
    pub fn token(&self) -> Option<String> {
        match (&self.group, &self.letter) {
            (SourceGroup::None, _) | (_, None) => None,
            (group, Some(letter)) => Some(format!(
                "{}-{}",
                group.as_str().to_ascii_uppercase(),
                letter
            )),
        }
    }
}

fn prefix_for(group: SourceGroup, letter: &str) -> &'static str {
    let letter = letter.trim().to_ascii_uppercase();
    match (group, letter.as_str()) {
        (SourceGroup::Dryer, "A") => "AD",
        (SourceGroup::Dryer, "B") => "BD",
        (SourceGroup::Dryer, "C") => "CD",
        (SourceGroup::Dryer, "D") => "DE",
        (SourceGroup::Silo, "A") => "AS",
        (SourceGroup::Silo, "B") => "BS",
        (SourceGroup::Silo, "C") => "CS",
        (SourceGroup::Silo, "D") => "DS",
        (SourceGroup::Compound, "A") => "AC",
        (SourceGroup::Compound, "B") => "BC",
        _ => DEFAULT_PREFIX,
    }
}

/// Resolve the identifier prefix of a group name and letter (case-insensitive)
///
/// ```
/// use crab_label::resolve_prefix;
///
/// assert_eq!(resolve_prefix("dryer", "D"), "DE");
/// assert_eq!(resolve_prefix("Bulk", "b"), "BS");
/// assert_eq!(resolve_prefix("compound", "C"), "AC");
/// ```
pub fn resolve_prefix(group: &str, letter: &str) -> &'static str {
    prefix_for(group.parse().unwrap_or_default(), letter)
}

/// Group and letter recovered from a scanned `SRC` token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub group: String,
    pub letter: String,
}

impl SourceInfo {
    pub fn to_source(&self) -> Source {
        Source::parse(&self.group, &self.letter)
    }
}

/// Split a `LETTERS-LETTER` token (e.g. `SILO-A`) into group and letter
///
/// Anything else is returned whole as the group with an empty letter.
pub fn derive_source_info(token: &str) -> SourceInfo {
    if let Some((group, letter)) = token.split_once('-')
        && !group.is_empty()
        && group.chars().all(|c| c.is_ascii_alphabetic())
        && letter.len() == 1
        && letter.chars().all(|c| c.is_ascii_alphabetic())
    {
        return SourceInfo {
            group: group.to_ascii_lowercase(),
            letter: letter.to_ascii_uppercase(),
        };
    }
    SourceInfo {
        group: token.to_string(),
        letter: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_table() {
        assert_eq!(resolve_prefix("dryer", "A"), "AD");
        assert_eq!(resolve_prefix("dryer", "B"), "BD");
        assert_eq!(resolve_prefix("dryer", "C"), "CD");
        assert_eq!(resolve_prefix("dryer", "D"), "DE");
        assert_eq!(resolve_prefix("silo", "A"), "AS");
        assert_eq!(resolve_prefix("silo", "D"), "DS");
        assert_eq!(resolve_prefix("bulk", "C"), "CS");
        assert_eq!(resolve_prefix("compound", "A"), "AC");
        assert_eq!(resolve_prefix("compound", "B"), "BC");
    }

    #[test]
    fn test_prefix_fallbacks() {
        assert_eq!(resolve_prefix("compound", "C"), "AC");
        assert_eq!(resolve_prefix("compound", "D"), "AC");
        assert_eq!(resolve_prefix("unknown", "Z"), "AC");
        assert_eq!(resolve_prefix("other", "UX"), "AC");
        assert_eq!(resolve_prefix("extrusion", "EA"), "AC");
        assert_eq!(resolve_prefix("", ""), "AC");
        assert_eq!(resolve_prefix("silo", ""), "AC");
    }

    #[test]
    fn test_prefix_is_case_insensitive() {
        assert_eq!(resolve_prefix("DRYER", "d"), "DE");
        assert_eq!(resolve_prefix(" Silo ", " b "), "BS");
    }

    #[test]
    fn test_source_token() {
        assert_eq!(Source::parse("silo", "a").token().as_deref(), Some("SILO-A"));
        assert_eq!(Source::parse("other", "UX").token().as_deref(), Some("OTHER-UX"));
        assert_eq!(
            Source::parse("Extrusion", "ea").token().as_deref(),
            Some("EXTRUSION-EA")
        );
        assert_eq!(Source::parse("dryer", "").token(), None);
        assert_eq!(Source::none().token(), None);
        assert!(!Source::parse("silo", "").is_set());
    }

    #[test]
    fn test_derive_source_info() {
        assert_eq!(
            derive_source_info("SILO-A"),
            SourceInfo {
                group: "silo".into(),
                letter: "A".into()
            }
        );
        assert_eq!(derive_source_info("OTHER-UX").group, "OTHER-UX");
        assert_eq!(derive_source_info("NA").group, "NA");
        assert_eq!(derive_source_info("NA").letter, "");
        assert_eq!(derive_source_info("-A").group, "-A");
        assert_eq!(derive_source_info("SILO-A").to_source().prefix(), "AS");
    }
}
