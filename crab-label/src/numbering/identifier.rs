//! Label identifiers: preview and commit
//!
//! Layout: `<Prefix:2><Decade:1><Year:1><DayOfYear:3><Sequence:3>`, e.g.
//! `AC151230007` is prefix `AC`, year digit `5`, day 123, sequence 7.
//!
//! [`LabelNumbering::preview`] reads the sequence store and never mutates
//! it, so the number shown on screen stays stable until a print completes.
//! [`LabelNumbering::commit`] is the only mutation and must run once per
//! physically completed print.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, instrument};

use super::source::Source;
use crate::day::{DayKey, effective_day};
use crate::storage::SequenceStore;

/// Fixed digit between prefix and year digit
pub const DECADE_DIGIT: char = '1';

/// A label identifier; only committed identifiers are unique
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelIdentifier(String);

impl LabelIdentifier {
    /// Compose an identifier from its parts
    pub fn compose(prefix: &str, effective: NaiveDateTime, sequence: u32) -> Self {
        let year_digit = effective.year().rem_euclid(10);
        Self(format!(
            "{prefix}{DECADE_DIGIT}{year_digit}{:03}{:03}",
            effective.ordinal(),
            sequence
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn prefix(&self) -> &str {
        self.0.get(..2).unwrap_or("")
    }

    pub fn day_of_year(&self) -> Option<u32> {
        self.0.get(4..7)?.parse().ok()
    }

    /// Trailing sequence (three digits, more past 999)
    pub fn sequence(&self) -> Option<u32> {
        self.0.get(7..)?.parse().ok()
    }
}

impl fmt::Display for LabelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LabelIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier generator and committer over an injected sequence store
pub struct LabelNumbering<S> {
    store: S,
}

impl<S: SequenceStore> LabelNumbering<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Next identifier for `now` and `source`, without reserving it
    ///
    /// Repeated calls without an intervening [`commit`](Self::commit) return
    /// the same identifier.
    pub fn preview(&self, now: NaiveDateTime, source: &Source) -> LabelIdentifier {
        let effective = effective_day(now);
        let day = DayKey::from_datetime(effective);
        let sequence = self.store.reserve_next(day);
        LabelIdentifier::compose(source.prefix(), effective, sequence)
    }

    /// Permanently reserve the next identifier and return it
    #[instrument(skip(self, source), fields(group = %source.group))]
    pub fn commit(&mut self, now: NaiveDateTime, source: &Source) -> LabelIdentifier {
        let effective = effective_day(now);
        let day = DayKey::from_datetime(effective);
        let sequence = self.store.commit_next(day);
        let identifier = LabelIdentifier::compose(source.prefix(), effective, sequence);

        info!(identifier = %identifier, day = %day, sequence, "Label identifier committed");
        crate::audit_log!("commit", identifier.as_str(), format!("day={day} seq={sequence}"));
        identifier
    }
}
