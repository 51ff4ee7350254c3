//! Core data errors (parsing, validation).
//!
//! These are bounded and stable: core errors represent refusals of bad
//! data, not failed operations. Operation errors live in
//! `backup::BackupError`.

use thiserror::Error;

use crate::error::{Effect, Transience};

/// A WAL coordinate in textual form failed to parse.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidWalText {
    #[error("wal position `{raw}` is invalid: {reason}")]
    Lsn { raw: String, reason: String },
    #[error("segment file name `{raw}` is invalid: {reason}")]
    SegmentFileName { raw: String, reason: String },
}

/// Caller-supplied backup label rejected at session start.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("backup label is invalid: {reason}")]
pub struct InvalidLabel {
    pub reason: String,
}

/// Rejected WAL segment size configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("wal segment size {bytes} is invalid: {reason}")]
pub struct InvalidSegmentSize {
    pub bytes: u64,
    pub reason: &'static str,
}

/// Malformed backup label artifact.
///
/// Parsing is all-or-nothing: the first offending line fails the whole
/// artifact and nothing is recovered from it. `line` is 1-based.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LabelError {
    #[error("label artifact is empty")]
    Empty,

    #[error("line {line}: expected a `{expected}: ...` field")]
    MissingField { line: usize, expected: &'static str },

    #[error("line {line}: malformed start location: {reason}")]
    BadStartLine { line: usize, reason: &'static str },

    #[error("line {line}: unreadable wal position in {field}: {source}")]
    BadWalPosition {
        line: usize,
        field: &'static str,
        source: InvalidWalText,
    },

    #[error("line {line}: unreadable start segment name: {source}")]
    BadSegmentName { line: usize, source: InvalidWalText },

    #[error("line {line}: segment name `{name}` does not match the start position")]
    SegmentMismatch { line: usize, name: String },

    #[error("line {line}: unsupported backup method `{method}`")]
    BadMethod { line: usize, method: String },

    #[error("line {line}: unknown backup origin `{origin}`")]
    BadOrigin { line: usize, origin: String },

    #[error("line {line}: unreadable start time: {reason}")]
    BadTimestamp { line: usize, reason: String },

    #[error("unexpected content after the label fields")]
    TrailingData,
}

/// Canonical error enum for the core data types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoreError {
    #[error(transparent)]
    WalText(#[from] InvalidWalText),
    #[error(transparent)]
    Label(#[from] LabelError),
    #[error(transparent)]
    InvalidLabel(#[from] InvalidLabel),
    #[error(transparent)]
    SegmentSize(#[from] InvalidSegmentSize),
}

impl CoreError {
    pub fn transience(&self) -> Transience {
        // Core errors are pure data/input failures.
        Transience::Permanent
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}
