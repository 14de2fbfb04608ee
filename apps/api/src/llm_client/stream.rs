//! Server-sent-event decoding for streamed chat completions.
//!
//! Bytes are buffered until a full line is available, so a multi-byte
//! character split across network chunks is reassembled before decoding.

use serde::Deserialize;
use tracing::debug;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// A single SSE `data: {...}` frame.
#[derive(Debug, Deserialize)]
struct StreamFrame {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Accumulates `choices[0].delta.content` across an SSE byte stream.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    pending: Vec<u8>,
    text: String,
    frames: usize,
    done: bool,
    error: Option<String>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one network chunk. Complete lines are decoded immediately.
    pub fn push(&mut self, chunk: &[u8]) {
        if self.done {
            return;
        }
        self.pending.extend_from_slice(chunk);

        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.handle_line(&line[..line.len() - 1]);
            if self.done {
                self.pending.clear();
                return;
            }
        }
    }

    /// True once the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Provider error reported inside the stream, if any. Ends the stream.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Number of content-bearing frames decoded so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Flushes any unterminated trailing line and returns the accumulated text.
    pub fn finish(mut self) -> String {
        if !self.done && !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.handle_line(&line);
        }
        self.text
    }

    fn handle_line(&mut self, raw: &[u8]) {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line,
            Err(e) => {
                debug!("Skipping non-UTF-8 SSE line: {e}");
                return;
            }
        };

        let Some(data) = line.strip_prefix(DATA_PREFIX) else {
            // blank separators, comments, `event:` and `id:` fields
            return;
        };
        let data = data.trim();

        if data == DONE_SENTINEL {
            self.done = true;
            return;
        }
        if data.is_empty() {
            return;
        }

        match serde_json::from_str::<StreamFrame>(data) {
            Ok(StreamFrame {
                error: Some(error), ..
            }) => {
                let message = error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .or_else(|| error.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string());
                self.error = Some(message);
                self.done = true;
            }
            Ok(frame) => {
                let content = frame
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.delta.content);
                if let Some(content) = content {
                    self.text.push_str(&content);
                    self.frames += 1;
                }
            }
            Err(e) => debug!("Skipping undecodable SSE frame: {e}"),
        }
    }
}
