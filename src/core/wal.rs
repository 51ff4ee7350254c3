//! WAL coordinates: timelines, log sequence numbers, segments.
//!
//! The textual conventions here are the host archive's, byte for byte:
//! an LSN prints as `HI/LO` (upper and lower 32 bits, uppercase hex, no
//! padding) and a segment file name packs timeline and segment number
//! into 24 uppercase hex digits. Getting either wrong makes an archived
//! backup non-restorable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{InvalidSegmentSize, InvalidWalText};

/// WAL timeline identifier.
///
/// Timelines branch on promotion. Id 0 is the engine's "not yet
/// determined" sentinel and never names a valid backup timeline.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimelineId(u32);

impl TimelineId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Whether this is a real timeline rather than the zero sentinel.
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Debug for TimelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimelineId({})", self.0)
    }
}

impl fmt::Display for TimelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Byte position in the WAL stream.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lsn(u64);

impl Lsn {
    pub const fn new(lsn: u64) -> Self {
        Self(lsn)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Number of the segment containing this position.
    pub const fn segment(self, size: WalSegmentSize) -> SegmentNumber {
        SegmentNumber(self.0 / size.bytes())
    }

    /// Byte offset within the containing segment.
    pub const fn segment_offset(self, size: WalSegmentSize) -> u64 {
        self.0 % size.bytes()
    }

    /// Number of the last segment a backup stopping here still needs.
    ///
    /// A stop position exactly on a segment boundary belongs to the
    /// previous segment: nothing of the newly begun segment is required.
    pub const fn last_required_segment(self, size: WalSegmentSize) -> SegmentNumber {
        SegmentNumber(self.0.saturating_sub(1) / size.bytes())
    }

    pub fn parse(raw: &str) -> Result<Self, InvalidWalText> {
        let invalid = |reason: &str| InvalidWalText::Lsn {
            raw: raw.to_string(),
            reason: reason.to_string(),
        };
        let (hi, lo) = raw
            .split_once('/')
            .ok_or_else(|| invalid("expected HI/LO"))?;
        if hi.is_empty() || lo.is_empty() {
            return Err(invalid("expected HI/LO"));
        }
        // from_str_radix alone would admit signs and unicode digits.
        if !hi.bytes().all(|b| b.is_ascii_hexdigit()) || !lo.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(invalid("non-hex digit"));
        }
        let hi = u32::from_str_radix(hi, 16).map_err(|_| invalid("high half out of range"))?;
        let lo = u32::from_str_radix(lo, 16).map_err(|_| invalid("low half out of range"))?;
        Ok(Self(((hi as u64) << 32) | lo as u64))
    }
}

impl fmt::Debug for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lsn({self})")
    }
}

impl fmt::Display for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}/{:X}", self.0 >> 32, self.0 & 0xFFFF_FFFF)
    }
}

impl FromStr for Lsn {
    type Err = InvalidWalText;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// An ordered (timeline, lsn) pair.
///
/// Ordering across differing timelines is only meaningful when one is an
/// ancestor of the other; callers get that guarantee from timeline
/// resolution, not from this type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WalPosition {
    pub timeline: TimelineId,
    pub lsn: Lsn,
}

impl WalPosition {
    pub const fn new(timeline: TimelineId, lsn: Lsn) -> Self {
        Self { timeline, lsn }
    }

    /// Number of the segment containing this position.
    pub const fn segment(self, size: WalSegmentSize) -> SegmentNumber {
        self.lsn.segment(size)
    }
}

/// Ordinal of a WAL segment within the stream (lsn / segment size).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentNumber(u64);

impl SegmentNumber {
    pub const fn new(number: u64) -> Self {
        Self(number)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SegmentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Size of one WAL segment in bytes.
///
/// Must be a power of two between 1 MiB and 1 GiB. The naming scheme
/// packs 2^32 bytes of WAL into one "log id", so a name's low field holds
/// `2^32 / size` segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalSegmentSize(u64);

impl WalSegmentSize {
    /// Host default: 16 MiB.
    pub const DEFAULT: WalSegmentSize = WalSegmentSize(16 * 1024 * 1024);

    pub const MIN_BYTES: u64 = 1024 * 1024;
    pub const MAX_BYTES: u64 = 1024 * 1024 * 1024;

    pub fn new(bytes: u64) -> Result<Self, InvalidSegmentSize> {
        if !(Self::MIN_BYTES..=Self::MAX_BYTES).contains(&bytes) {
            return Err(InvalidSegmentSize {
                bytes,
                reason: "must be between 1 MiB and 1 GiB",
            });
        }
        if !bytes.is_power_of_two() {
            return Err(InvalidSegmentSize {
                bytes,
                reason: "must be a power of two",
            });
        }
        Ok(Self(bytes))
    }

    pub const fn bytes(self) -> u64 {
        self.0
    }

    /// Segments per 2^32 bytes of WAL (the split point of a segment name's
    /// middle and low fields).
    pub const fn segments_per_log_id(self) -> u64 {
        (1u64 << 32) / self.0
    }
}

/// A WAL segment file name: `{timeline:08X}{hi:08X}{lo:08X}`.
///
/// `hi`/`lo` split the segment number at [`WalSegmentSize::segments_per_log_id`],
/// matching the host archive layout.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentName(String);

impl SegmentName {
    pub fn format(timeline: TimelineId, segment: SegmentNumber, size: WalSegmentSize) -> Self {
        let per = size.segments_per_log_id();
        Self(format!(
            "{:08X}{:08X}{:08X}",
            timeline.get(),
            segment.get() / per,
            segment.get() % per
        ))
    }

    /// Split a name back into its timeline and segment number.
    ///
    /// Strict: exactly 24 uppercase hex digits, and the low field must sit
    /// below the segments-per-log-id bound for `size`.
    pub fn parse(
        raw: &str,
        size: WalSegmentSize,
    ) -> Result<(TimelineId, SegmentNumber), InvalidWalText> {
        let invalid = |reason: &str| InvalidWalText::SegmentFileName {
            raw: raw.to_string(),
            reason: reason.to_string(),
        };
        if raw.len() != 24 || !raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'A'..=b'F')) {
            return Err(invalid("expected 24 uppercase hex digits"));
        }
        let timeline =
            u32::from_str_radix(&raw[0..8], 16).map_err(|_| invalid("timeline out of range"))?;
        let hi = u32::from_str_radix(&raw[8..16], 16)
            .map_err(|_| invalid("log id field out of range"))?;
        let lo = u32::from_str_radix(&raw[16..24], 16)
            .map_err(|_| invalid("segment field out of range"))?;
        let per = size.segments_per_log_id();
        if (lo as u64) >= per {
            return Err(invalid("segment field exceeds segments per log id"));
        }
        Ok((
            TimelineId::new(timeline),
            SegmentNumber::new(hi as u64 * per + lo as u64),
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for SegmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SegmentName({})", self.0)
    }
}

impl fmt::Display for SegmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
