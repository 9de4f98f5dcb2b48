//! Print session: preview, print, commit
//!
//! A session holds the label being prepared. [`LabelSession::preview`] can be
//! called any number of times and always shows the same identifier until a
//! print completes. The sequence store is only touched after the printer (or
//! an external print path) reports completion; failure, cancellation or a
//! dropped print future leave it unchanged.

use chrono::NaiveDateTime;
use crab_printer::{Density, Layout, PrintError, Printer, Symbol};
use serde::Serialize;
use std::future::Future;
use tracing::{info, instrument, warn};

use super::ticket::LabelTicketRenderer;
use crate::catalog::{Special, default_weights};
use crate::codec::{LabelPayload, Weights};
use crate::day::Clock;
use crate::error::{LabelError, LabelResult};
use crate::numbering::{LabelIdentifier, LabelNumbering, Source};
use crate::scanner::ScanEvent;
use crate::storage::SequenceStore;

/// Operator selections for the next label
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LabelDraft {
    pub source: Source,
    pub special: Option<String>,
    pub product: String,
    pub weights: Weights,
}

impl LabelDraft {
    /// Draft with the default pre-filled weights
    pub fn new(source: Source, product: impl Into<String>) -> Self {
        Self {
            source,
            special: None,
            product: product.into(),
            weights: default_weights(),
        }
    }

    /// Draft for a special source with its fixed product
    pub fn for_special(special: Special) -> Self {
        Self {
            special: Some(special.as_str().to_string()),
            ..Self::new(special.source(), special.product())
        }
    }

    pub fn with_weights(mut self, weights: Weights) -> Self {
        self.weights = weights;
        self
    }
}

/// What the next label will look like
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub identifier: LabelIdentifier,
    pub payload: LabelPayload,
    pub at: NaiveDateTime,
}

impl Preview {
    /// Barcode text
    pub fn barcode_text(&self) -> String {
        self.payload.encode()
    }

    pub fn symbol(&self) -> Symbol {
        Symbol::encode(&self.barcode_text())
    }

    /// Symbol laid out for on-screen display
    pub fn screen_layout(&self) -> Layout {
        self.symbol().layout(Density::SCREEN)
    }
}

/// Completion signal of an external print path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintOutcome {
    Completed,
    Failed(String),
    Cancelled,
}

/// A label that was physically printed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintedLabel {
    /// Identifier on the paper
    pub printed: LabelIdentifier,
    /// Identifier reserved by the commit; differs from `printed` only if
    /// another writer committed on the same store during the print
    pub committed: LabelIdentifier,
    pub payload: LabelPayload,
    pub printed_at: NaiveDateTime,
    bytes: Vec<u8>,
}

impl PrintedLabel {
    /// The exact job that was sent
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

pub struct LabelSession<S, C> {
    numbering: LabelNumbering<S>,
    clock: C,
    renderer: LabelTicketRenderer,
    draft: LabelDraft,
    last_printed: Option<PrintedLabel>,
}

impl<S: SequenceStore, C: Clock> LabelSession<S, C> {
    pub fn new(store: S, clock: C, renderer: LabelTicketRenderer) -> Self {
        Self {
            numbering: LabelNumbering::new(store),
            clock,
            renderer,
            draft: LabelDraft::default(),
            last_printed: None,
        }
    }

    pub fn numbering(&self) -> &LabelNumbering<S> {
        &self.numbering
    }

    pub fn draft(&self) -> &LabelDraft {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: LabelDraft) {
        self.draft = draft;
    }

    pub fn draft_mut(&mut self) -> &mut LabelDraft {
        &mut self.draft
    }

    pub fn last_printed(&self) -> Option<&PrintedLabel> {
        self.last_printed.as_ref()
    }

    /// Next label for the current draft; never mutates the store
    pub fn preview(&self) -> Preview {
        let at = self.clock.now();
        let identifier = self.numbering.preview(at, &self.draft.source);
        let payload = LabelPayload {
            identifier: identifier.to_string(),
            product: self.draft.product.clone(),
            source: self.draft.source.clone(),
            special: self.draft.special.clone(),
            weights: self.draft.weights,
        };
        Preview {
            identifier,
            payload,
            at,
        }
    }

    /// ESC/POS job for a preview
    pub fn render(&self, preview: &Preview) -> Vec<u8> {
        self.renderer.render(&preview.payload, preview.at)
    }

    /// Print the current preview and commit once the printer accepts the job
    #[instrument(skip(self, printer))]
    pub async fn print<P: Printer>(&mut self, printer: &P) -> LabelResult<PrintedLabel> {
        let preview = self.preview();
        let bytes = self.render(&preview);

        match printer.print(&bytes).await {
            Ok(()) => Ok(self.commit_printed(preview, bytes)),
            Err(PrintError::Cancelled) => {
                info!(identifier = %preview.identifier, "Print cancelled, nothing committed");
                Err(LabelError::PrintCancelled)
            }
            Err(e) => {
                warn!(
                    identifier = %preview.identifier,
                    error = %e,
                    "Print failed, nothing committed"
                );
                Err(e.into())
            }
        }
    }

    /// Wait for an external print path to finish `preview`, then commit
    ///
    /// Dropping the returned future before `outcome` resolves commits nothing.
    #[instrument(skip(self, preview, outcome), fields(identifier = %preview.identifier))]
    pub async fn complete_print<F>(
        &mut self,
        preview: Preview,
        outcome: F,
    ) -> LabelResult<PrintedLabel>
    where
        F: Future<Output = PrintOutcome>,
    {
        match outcome.await {
            PrintOutcome::Completed => {
                let bytes = self.render(&preview);
                Ok(self.commit_printed(preview, bytes))
            }
            PrintOutcome::Failed(reason) => {
                warn!(reason = %reason, "Print failed, nothing committed");
                Err(LabelError::PrintFailed(reason))
            }
            PrintOutcome::Cancelled => {
                info!("Print cancelled, nothing committed");
                Err(LabelError::PrintCancelled)
            }
        }
    }

    /// Send the last printed label again; never commits
    #[instrument(skip(self, printer))]
    pub async fn reprint<P: Printer>(&self, printer: &P) -> LabelResult<PrintedLabel> {
        let last = self
            .last_printed
            .as_ref()
            .ok_or(LabelError::NothingToReprint)?;
        printer.print(last.bytes()).await?;

        info!(identifier = %last.printed, "Label reprinted");
        crate::audit_log!("reprint", last.printed.as_str());
        Ok(last.clone())
    }

    /// Fields of a scan that disagree with the last printed label
    ///
    /// `None` when nothing was printed yet or the scan carried no fields.
    pub fn verify_scan(&self, scan: &ScanEvent) -> Option<Vec<&'static str>> {
        let last = self.last_printed.as_ref()?;
        let fields = scan.fields.as_ref()?;
        Some(last.payload.mismatches(fields))
    }

    fn commit_printed(&mut self, preview: Preview, bytes: Vec<u8>) -> PrintedLabel {
        // Same time as the preview so the day bucket matches the paper
        let committed = self.numbering.commit(preview.at, &preview.payload.source);
        if committed != preview.identifier {
            warn!(
                printed = %preview.identifier,
                committed = %committed,
                "Sequence advanced by another writer during print"
            );
        }

        let printed = PrintedLabel {
            printed: preview.identifier,
            committed,
            payload: preview.payload,
            printed_at: preview.at,
            bytes,
        };
        self.last_printed = Some(printed.clone());
        printed
    }
}
