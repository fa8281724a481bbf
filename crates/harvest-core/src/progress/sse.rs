//! Incremental `text/event-stream` decoder.
//!
//! Network chunks may split lines and events anywhere; the decoder buffers
//! partial lines and only emits a frame on the blank line that terminates it.
//! A line longer than `MAX_LINE_BYTES` is dropped together with the event it
//! belongs to.

/// Longest line kept while waiting for its newline.
pub const MAX_LINE_BYTES: usize = 1 << 20;

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Event type from the `event:` field; `"message"` when absent.
    pub event: String,
    /// `data:` lines joined with `\n`.
    pub data: String,
    /// Last `id:` seen on this stream, if any.
    pub id: Option<String>,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    /// Skipping the rest of an oversized line.
    discarding: bool,
    event: Option<String>,
    data: String,
    has_data: bool,
    last_id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns every frame completed by this chunk, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        // Buffered bytes hold no newline, so only the new chunk is scanned.
        let mut scan = self.buf.len();
        let mut buf = std::mem::take(&mut self.buf);
        buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(rel) = buf[scan..].iter().position(|&b| b == b'\n') {
            let end = scan + rel;
            if self.discarding {
                self.discarding = false;
            } else {
                let line = buf[start..end].strip_suffix(b"\r").unwrap_or(&buf[start..end]);
                if let Some(frame) = self.process_line(&String::from_utf8_lossy(line)) {
                    frames.push(frame);
                }
            }
            start = end + 1;
            scan = start;
        }

        buf.drain(..start);
        if self.discarding {
            buf.clear();
        } else if buf.len() > MAX_LINE_BYTES {
            tracing::warn!(bytes = buf.len(), "dropping oversized event-stream line");
            buf.clear();
            self.discarding = true;
            self.reset_event();
        }
        self.buf = buf;
        frames
    }

    /// Bytes buffered without a terminating newline.
    pub fn pending_bytes(&self) -> usize {
        self.buf.len()
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            // comment / keep-alive
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            "id" => {
                if !value.contains('\0') {
                    self.last_id = Some(value.to_string());
                }
            }
            // `retry:` only matters to auto-reconnecting clients; reconnect is policy-driven here.
            _ => {}
        }
        None
    }

    fn reset_event(&mut self) {
        self.event = None;
        self.data.clear();
        self.has_data = false;
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if !self.has_data {
            return None;
        }
        self.has_data = false;
        Some(SseFrame {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "message".to_string()),
            data: std::mem::take(&mut self.data),
            id: self.last_id.clone(),
        })
    }
}
