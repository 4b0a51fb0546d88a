//! Encoder progress protocol.
//!
//! The encoder reports on stdout with either a bare number (percent done) or
//! a line containing [`FINISHED_SENTINEL`]. Every stdout chunk is classified
//! on its own; chunks are never buffered or joined across reads. Anything
//! else on the channel is noise and is dropped without an error.

use serde::Serialize;

/// Substring marking that the encoder has completed its work.
pub const FINISHED_SENTINEL: &str = "Finished";

/// A classified stdout chunk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Percentage reported by the encoder, as-is (not clamped to 0-100).
    Progress { percent: f64 },
    /// The encoder printed the completion sentinel.
    Finished,
}

/// Classify one raw stdout chunk.
///
/// Returns `None` for chunks that are neither a non-negative number nor
/// contain the sentinel. Numeric classification wins over the sentinel.
pub fn parse_chunk(chunk: &str) -> Option<ProgressEvent> {
    if let Some(percent) = parse_percent(chunk) {
        return Some(ProgressEvent::Progress { percent });
    }

    if chunk.contains(FINISHED_SENTINEL) {
        return Some(ProgressEvent::Finished);
    }

    None
}

fn parse_percent(chunk: &str) -> Option<f64> {
    let trimmed = chunk.trim();
    if trimmed.is_empty() {
        return None;
    }

    // `f64::from_str` also accepts "inf" and "NaN"; neither is a percentage.
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}
