//! Splits a delimited completion into per-channel payloads.
//!
//! Markers are `=== <channel> ===` for the four channel names, with optional
//! whitespace around the name. Any other `===` run is ordinary content.
//! Parsing never fails: a missing marker yields an empty payload.

use crate::models::generation::{Channel, ChannelSelection, GenerationResult};

const MARKER_FENCE: &str = "===";
const CODE_FENCE: &str = "```";

/// A recognised channel marker and the byte span it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Marker {
    channel: Channel,
    start: usize,
    end: usize,
}

/// Finds every channel marker in document order.
fn scan_markers(text: &str) -> Vec<Marker> {
    let mut markers = Vec::new();
    let mut from = 0;

    while let Some(offset) = text[from..].find(MARKER_FENCE) {
        let start = from + offset;
        match marker_at(text, start) {
            Some(marker) => {
                from = marker.end;
                markers.push(marker);
            }
            None => from = start + 1,
        }
    }
    markers
}

/// Tries to read `=== name ===` beginning at `start`.
fn marker_at(text: &str, start: usize) -> Option<Marker> {
    let rest = &text[start + MARKER_FENCE.len()..];
    let name_start = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    let after_ws = &rest[name_start..];

    let name_len = after_ws
        .find(|c: char| !(c.is_ascii_lowercase() || c == '_'))
        .unwrap_or(after_ws.len());
    let channel = Channel::from_name(&after_ws[..name_len])?;

    let tail = &after_ws[name_len..];
    let trailing_ws = tail.len() - tail.trim_start_matches([' ', '\t']).len();
    let closing = &tail[trailing_ws..];
    if !closing.starts_with(MARKER_FENCE) {
        return None;
    }

    let consumed = MARKER_FENCE.len() + name_start + name_len + trailing_ws + MARKER_FENCE.len();
    Some(Marker {
        channel,
        start,
        end: start + consumed,
    })
}

/// Returns the contents of the first code fence, language-tagged or bare,
/// wherever it sits in the text. Text without a fence is only trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(open) = text.find(CODE_FENCE) else {
        return text;
    };
    let after_open = &text[open + CODE_FENCE.len()..];
    // drop the language tag line, if any
    let body = match after_open.find('\n') {
        Some(pos) if is_fence_tag(&after_open[..pos]) => &after_open[pos + 1..],
        _ => after_open,
    };
    match body.find(CODE_FENCE) {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

fn is_fence_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parses the requested channels out of a full completion text.
pub fn parse_channels(text: &str, selection: &ChannelSelection) -> GenerationResult {
    let markers = scan_markers(text);
    let mut result = GenerationResult::default();

    for channel in selection.requested() {
        let Some(idx) = markers.iter().position(|m| m.channel == channel) else {
            continue;
        };
        let body_start = markers[idx].end;
        let body_end = markers
            .get(idx + 1)
            .map(|next| next.start)
            .unwrap_or(text.len());
        let body = &text[body_start..body_end];

        let payload = if channel.is_structured() {
            strip_code_fences(body)
        } else {
            body.trim()
        };
        result.set(channel, payload.to_string());
    }

    if selection.natural_en
        && result.natural_en.is_empty()
        && !markers.iter().any(|m| m.channel == Channel::NaturalEn)
        && !text.contains(MARKER_FENCE)
    {
        result.natural_en = text.trim().to_string();
    }

    result
}
