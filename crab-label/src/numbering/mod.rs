//! Label numbering: source prefixes and the preview/commit protocol

pub mod identifier;
pub mod source;

pub use identifier::{DECADE_DIGIT, LabelIdentifier, LabelNumbering};
pub use source::{
    DEFAULT_PREFIX, Source, SourceGroup, SourceInfo, derive_source_info, resolve_prefix,
};
