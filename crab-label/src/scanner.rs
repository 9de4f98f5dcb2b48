//! Keyboard-wedge scan assembly
//!
//! A wedge scanner "types" the barcode text followed by Enter. Keys arriving
//! in quick succession are collected into one buffer; a long pause means a
//! human is typing and the buffer starts over.

use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::codec::{ScanFields, parse_payload};
use crate::numbering::SourceInfo;

/// Gap after which buffered keys are discarded
pub const RESET_GAP: Duration = Duration::from_millis(150);
/// Idle time after which the buffer is finalized without Enter
pub const IDLE_FINALIZE: Duration = Duration::from_millis(180);
/// Gaps shorter than this are taken as scanner output
pub const SCANNER_CADENCE: Duration = Duration::from_millis(40);

/// One key press as delivered by the input layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    /// Any other control key; ignored
    Other,
}

/// A finalized scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanEvent {
    pub raw: String,
    pub fields: Option<ScanFields>,
    pub source: Option<SourceInfo>,
}

impl ScanEvent {
    pub fn from_raw(raw: String) -> Self {
        let fields = parse_payload(&raw);
        let source = fields.as_ref().and_then(ScanFields::source_info);
        Self {
            raw,
            fields,
            source,
        }
    }
}

#[derive(Debug, Default)]
pub struct ScanAssembler {
    buffer: String,
    last_key: Option<Instant>,
    cadence: bool,
}

impl ScanAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one key; returns a scan when Enter completes a buffer
    pub fn push(&mut self, key: Key, at: Instant) -> Option<ScanEvent> {
        match key {
            Key::Enter => self.finalize(),
            Key::Other => None,
            Key::Char(c) => {
                let gap = self.last_key.map(|last| at.saturating_duration_since(last));
                if gap.is_none_or(|gap| gap > RESET_GAP) && !self.buffer.is_empty() {
                    trace!(discarded = self.buffer.len(), "Key gap too long, buffer reset");
                    self.buffer.clear();
                }
                self.cadence = gap.is_some_and(|gap| gap < SCANNER_CADENCE);
                self.buffer.push(c);
                self.last_key = Some(at);
                None
            }
        }
    }

    /// Finalize a buffer that has been idle for [`IDLE_FINALIZE`]
    pub fn poll(&mut self, now: Instant) -> Option<ScanEvent> {
        let deadline = self.deadline()?;
        if now >= deadline {
            self.finalize()
        } else {
            None
        }
    }

    /// When [`poll`](Self::poll) will next finalize, if anything is buffered
    pub fn deadline(&self) -> Option<Instant> {
        if self.buffer.is_empty() {
            return None;
        }
        self.last_key.map(|last| last + IDLE_FINALIZE)
    }

    /// Whether the most recent key arrived at scanner speed
    ///
    /// Input layers use this to keep scanner output out of focused text fields.
    pub fn is_scanner_cadence(&self) -> bool {
        self.cadence
    }

    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    fn finalize(&mut self) -> Option<ScanEvent> {
        self.last_key = None;
        self.cadence = false;
        if self.buffer.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.buffer);
        let event = ScanEvent::from_raw(raw);
        debug!(
            raw = %event.raw,
            recognized = event.fields.is_some(),
            "Scan finalized"
        );
        Some(event)
    }
}

/// Assemble scans from a key stream until either channel closes
///
/// Keys carry their own timestamps so the idle deadline follows key time
/// rather than delivery time.
pub async fn assemble_scans(
    mut keys: mpsc::Receiver<(Key, Instant)>,
    scans: mpsc::Sender<ScanEvent>,
) {
    let mut assembler = ScanAssembler::new();
    loop {
        let event = match assembler.deadline() {
            Some(deadline) => {
                tokio::select! {
                    key = keys.recv() => match key {
                        Some((key, at)) => assembler.push(key, at),
                        None => break,
                    },
                    _ = tokio::time::sleep_until(deadline.into()) => {
                        assembler.poll(Instant::now())
                    }
                }
            }
            None => match keys.recv().await {
                Some((key, at)) => assembler.push(key, at),
                None => break,
            },
        };

        if let Some(event) = event
            && scans.send(event).await.is_err()
        {
            return;
        }
    }

    // Flush whatever was typed before the input closed
    if let Some(event) = assembler.finalize() {
        let _ = scans.send(event).await;
    }
}
