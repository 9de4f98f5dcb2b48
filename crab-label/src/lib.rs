//! # crab-label
//!
//! Shipping label engine: identifiers, barcode payloads and the print
//! workflow around them.
//!
//! ## Modules
//!
//! ```text
//! crab-label/src/
//! ├── day.rs         # Effective-day rule, day keys, clocks
//! ├── storage/       # Key-value collaborator and sequence store
//! ├── numbering/     # Source prefixes, identifier preview/commit
//! ├── codec/         # Payload encode/decode, weights
//! ├── scanner.rs     # Keyboard-wedge scan assembly
//! ├── catalog.rs     # Products per source, special sources
//! ├── printing/      # Ticket rendering and the print session
//! ├── config.rs      # Environment configuration
//! └── common/        # Logging
//! ```
//!
//! Symbol encoding and printer transport live in `crab-printer`.

pub mod catalog;
pub mod codec;
pub mod common;
pub mod config;
pub mod day;
pub mod error;
pub mod numbering;
pub mod printing;
pub mod scanner;
pub mod storage;

pub use codec::{LabelPayload, ScanFields, Weights, build_payload, parse_payload, sanitize};
pub use config::LabelConfig;
pub use day::{Clock, DayKey, FixedClock, SystemClock, effective_day};
pub use error::{LabelError, LabelResult};
pub use numbering::{
    LabelIdentifier, LabelNumbering, Source, SourceGroup, SourceInfo, derive_source_info,
    resolve_prefix,
};
pub use printing::{
    LabelDraft, LabelPrinter, LabelSession, LabelTicketRenderer, PrintOutcome, PrintedLabel,
    Preview,
};
pub use scanner::{Key, ScanAssembler, ScanEvent};
pub use storage::{
    KeyValueStore, MemoryKeyValueStore, MemorySequenceStore, PersistentSequenceStore,
    RedbKeyValueStore, SequenceStore, SharedKeyValueStore,
};

pub use common::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// Session wired to the configured redb file and wall clock
pub type StationSession = LabelSession<PersistentSequenceStore<SharedKeyValueStore>, SystemClock>;

/// Create the work directory and start logging to `<work_dir>/logs`
pub fn setup_environment(config: &LabelConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.work_dir)?;
    init_logger_with_file(&config.log_level, config.log_json, Some(&config.log_dir()))?;
    tracing::info!(
        work_dir = %config.work_dir.display(),
        timezone = %config.timezone,
        "Label station environment ready"
    );
    Ok(())
}

/// Open a print session from configuration
pub fn open_session(config: &LabelConfig) -> StationSession {
    LabelSession::new(
        storage::open_sequence_store(&config.db_path()),
        SystemClock::new(config.timezone),
        printing::renderer_from_config(config),
    )
}
