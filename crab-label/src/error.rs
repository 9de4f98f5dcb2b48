//! Errors of the label print workflow
//!
//! Storage problems never show up here: the sequence store degrades to
//! memory instead of failing a print.

use crab_printer::PrintError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelError {
    /// The printer adapter rejected or failed the job
    #[error("Printer error: {0}")]
    Print(#[from] PrintError),

    /// The print completed with a failure reported by the print path
    #[error("Print failed: {0}")]
    PrintFailed(String),

    /// The print was cancelled before completion
    #[error("Print cancelled")]
    PrintCancelled,

    #[error("No label has been printed yet")]
    NothingToReprint,

    #[error("No printer configured (set PRINTER_ADDR or PRINTER_DEVICE)")]
    NoPrinter,
}

pub type LabelResult<T> = Result<T, LabelError>;
