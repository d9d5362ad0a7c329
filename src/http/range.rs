//! HTTP Range request resolution module
//!
//! Resolves a single `bytes=<start>-<end>` range against a known object length.
//! Resolution is pure: the same `(header, total_length, policy)` always yields
//! the same outcome.

use serde::{Deserialize, Serialize};

/// How ranges that cannot be satisfied are answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePolicy {
    /// Never answer 416; unsatisfiable ranges fall back to full content
    #[default]
    Lenient,
    /// RFC 7233: unsatisfiable ranges are answered with 416
    Strict,
}

/// Inclusive byte range `start..=end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by the range
    #[inline]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value for this range
    pub fn content_range(&self, total_length: u64) -> String {
        format!("bytes {}-{}/{total_length}", self.start, self.end)
    }
}

/// Outcome of resolving a Range header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeResolution {
    /// Serve the whole object with 200
    Full,
    /// Serve the given slice with 206
    Partial(ByteRange),
    /// Answer 416 (strict policy only)
    NotSatisfiable,
}

/// Range as written by the client, before it is checked against the object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequestedRange {
    start: u64,
    end: Option<u64>,
}

/// Resolve a Range header against an object of `total_length` bytes
///
/// Only `bytes=start-end` and `bytes=start-` are honored. Suffix ranges
/// (`bytes=-N`), multi-range and malformed headers are answered with the full
/// content.
///
/// # Examples
/// ```
/// use media_streamer::http::range::{resolve_range, RangePolicy, RangeResolution};
///
/// let r = resolve_range(Some("bytes=500-"), 1000, RangePolicy::Lenient);
/// assert!(matches!(r, RangeResolution::Partial(b) if b.start == 500 && b.end == 999));
///
/// assert_eq!(resolve_range(None, 1000, RangePolicy::Lenient), RangeResolution::Full);
/// ```
pub fn resolve_range(
    range_header: Option<&str>,
    total_length: u64,
    policy: RangePolicy,
) -> RangeResolution {
    let Some(requested) = range_header.and_then(parse_range_header) else {
        return RangeResolution::Full;
    };

    let start = requested.start;
    let end = requested
        .end
        .unwrap_or_else(|| total_length.saturating_sub(1));

    if start >= total_length || start > end {
        return match policy {
            RangePolicy::Lenient => RangeResolution::Full,
            RangePolicy::Strict => RangeResolution::NotSatisfiable,
        };
    }

    // Body framing requires Content-Length to match what the file can yield
    let end = end.min(total_length - 1);

    RangeResolution::Partial(ByteRange { start, end })
}

/// Parse `bytes=start-end` / `bytes=start-`
fn parse_range_header(header: &str) -> Option<RequestedRange> {
    let spec = header.trim().strip_prefix("bytes=")?;

    // Single range only
    if spec.contains(',') {
        return None;
    }

    let (start_str, end_str) = spec.split_once('-')?;
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    // Suffix ranges are not honored
    if start_str.is_empty() {
        return None;
    }

    let start = start_str.parse::<u64>().ok()?;
    let end = if end_str.is_empty() {
        None
    } else {
        Some(end_str.parse::<u64>().ok()?)
    };

    Some(RequestedRange { start, end })
}
