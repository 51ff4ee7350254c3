//! The backup label artifact.
//!
//! A started session hands the operator a small text artifact that the
//! restore tooling stores alongside the copied data files. Layout is the
//! host archive's, field for field:
//!
//! ```text
//! START WAL LOCATION: 0/2000028 (file 000000010000000000000002)
//! CHECKPOINT LOCATION: 0/2000060
//! BACKUP METHOD: streamed
//! BACKUP FROM: master
//! START TIME: 2026-08-25T09:30:00.125Z
//! LABEL: nightly
//! ```
//!
//! Parsing is strict and all-or-nothing. The artifact is the only thing
//! a stop call trusts, so a damaged one is refused outright rather than
//! patched up.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::error::{InvalidLabel, InvalidWalText, LabelError};
use super::time::WallClock;
use super::wal::{Lsn, SegmentName, WalPosition, WalSegmentSize};

/// Which role the session was started on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupOrigin {
    Primary,
    Standby,
}

impl BackupOrigin {
    /// Artifact wording. `master` is the host archive's token for the
    /// primary role; restore tooling matches on it.
    pub const fn artifact_token(self) -> &'static str {
        match self {
            BackupOrigin::Primary => "master",
            BackupOrigin::Standby => "standby",
        }
    }
}

impl fmt::Display for BackupOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.artifact_token())
    }
}

/// The durable fields of a backup session, as written to and read back
/// from the label artifact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupLabel {
    /// Operator-chosen name. Single line, see [`validate_label`].
    pub label: String,
    /// Position WAL replay must reach before the copy is consistent.
    pub start: WalPosition,
    /// Location of the checkpoint record backing `start`.
    pub checkpoint: Lsn,
    pub started_at: WallClock,
    pub origin: BackupOrigin,
}

impl BackupLabel {
    /// Render the artifact text.
    ///
    /// Infallible: every field has a total textual form. A `started_at`
    /// beyond the RFC 3339 year range degrades to an empty time field
    /// rather than failing mid-session.
    pub fn render(&self, size: WalSegmentSize) -> String {
        let file = SegmentName::format(self.start.timeline, self.start.segment(size), size);
        format!(
            "START WAL LOCATION: {start} (file {file})\n\
             CHECKPOINT LOCATION: {checkpoint}\n\
             BACKUP METHOD: streamed\n\
             BACKUP FROM: {origin}\n\
             START TIME: {time}\n\
             LABEL: {label}\n",
            start = self.start.lsn,
            checkpoint = self.checkpoint,
            origin = self.origin,
            time = render_time(self.started_at),
            label = self.label,
        )
    }

    /// Parse an artifact previously produced by [`BackupLabel::render`].
    ///
    /// The embedded segment file name must agree with the start position;
    /// a mismatch means the artifact was edited or mixed up with another
    /// backup's. The trailing newline is optional, anything beyond it is
    /// not.
    pub fn parse(text: &str, size: WalSegmentSize) -> Result<Self, LabelError> {
        if text.is_empty() {
            return Err(LabelError::Empty);
        }
        let lines: Vec<&str> = text.split('\n').collect();
        let field = |idx: usize, expected: &'static str| -> Result<&str, LabelError> {
            let line = idx + 1;
            lines
                .get(idx)
                .and_then(|text| text.strip_prefix(expected))
                .and_then(|rest| rest.strip_prefix(": "))
                .ok_or(LabelError::MissingField { line, expected })
        };

        let start_value = field(0, "START WAL LOCATION")?;
        let (lsn_text, rest) = start_value.split_once(" (file ").ok_or(LabelError::BadStartLine {
            line: 1,
            reason: "expected `LSN (file NAME)`",
        })?;
        let name_text = rest.strip_suffix(')').ok_or(LabelError::BadStartLine {
            line: 1,
            reason: "missing closing parenthesis",
        })?;
        let start_lsn = Lsn::parse(lsn_text).map_err(|source| LabelError::BadWalPosition {
            line: 1,
            field: "START WAL LOCATION",
            source,
        })?;
        let (timeline, segment) = SegmentName::parse(name_text, size)
            .map_err(|source| LabelError::BadSegmentName { line: 1, source })?;
        if !timeline.is_valid() {
            return Err(LabelError::BadSegmentName {
                line: 1,
                source: InvalidWalText::SegmentFileName {
                    raw: name_text.to_string(),
                    reason: "timeline 0 never names a backup timeline".to_string(),
                },
            });
        }
        if start_lsn.segment(size) != segment {
            return Err(LabelError::SegmentMismatch {
                line: 1,
                name: name_text.to_string(),
            });
        }

        let checkpoint = Lsn::parse(field(1, "CHECKPOINT LOCATION")?).map_err(|source| {
            LabelError::BadWalPosition {
                line: 2,
                field: "CHECKPOINT LOCATION",
                source,
            }
        })?;

        let method = field(2, "BACKUP METHOD")?;
        if method != "streamed" {
            return Err(LabelError::BadMethod {
                line: 3,
                method: method.to_string(),
            });
        }

        let origin = match field(3, "BACKUP FROM")? {
            "master" => BackupOrigin::Primary,
            "standby" => BackupOrigin::Standby,
            other => {
                return Err(LabelError::BadOrigin {
                    line: 4,
                    origin: other.to_string(),
                })
            }
        };

        let started_at = parse_time(field(4, "START TIME")?)
            .map_err(|reason| LabelError::BadTimestamp { line: 5, reason })?;

        let label = field(5, "LABEL")?.to_string();

        match lines.len() {
            6 => {}
            7 if lines[6].is_empty() => {}
            _ => return Err(LabelError::TrailingData),
        }

        Ok(Self {
            label,
            start: WalPosition::new(timeline, start_lsn),
            checkpoint,
            started_at,
            origin,
        })
    }
}

/// Check an operator-supplied label before a session starts.
///
/// The label becomes the artifact's final line, so it must stay a single
/// line and fit the configured byte cap.
pub fn validate_label(label: &str, max_bytes: usize) -> Result<(), InvalidLabel> {
    if label.len() > max_bytes {
        return Err(InvalidLabel {
            reason: format!("{} bytes exceeds the {max_bytes} byte cap", label.len()),
        });
    }
    if label.contains('\n') || label.contains('\r') {
        return Err(InvalidLabel {
            reason: "contains a line break".to_string(),
        });
    }
    Ok(())
}

fn render_time(at: WallClock) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(at.0 as i128 * 1_000_000)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_default()
}

fn parse_time(raw: &str) -> Result<WallClock, String> {
    let parsed = OffsetDateTime::parse(raw, &Rfc3339).map_err(|e| e.to_string())?;
    let ms = u64::try_from(parsed.unix_timestamp_nanos() / 1_000_000)
        .map_err(|_| "precedes the unix epoch".to_string())?;
    Ok(WallClock(ms))
}
