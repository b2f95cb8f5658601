//! Incremental byte-to-line framing for the NDJSON stream.
//!
//! Chunks arrive at arbitrary boundaries: a multi-byte UTF-8 character or a
//! logical line may legitimately span two reads. The framer keeps the
//! undecodable tail bytes and the incomplete final line buffered across
//! pushes, so the emitted records are identical no matter how the stream was
//! chunked.

/// Stateful line framer over a chunked byte stream.
#[derive(Debug, Default)]
pub struct LineFramer {
    /// Undecoded tail bytes (a possibly split multi-byte sequence).
    pending: Vec<u8>,
    /// Decoded text not yet terminated by a newline.
    text: String,
}

impl LineFramer {
    /// Create a new framer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, returning every complete line it finishes.
    ///
    /// Lines are returned without the trailing `\n` (and without a trailing
    /// `\r`, so CRLF streams frame the same as LF streams).
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        self.decode_pending();
        self.drain_lines()
    }

    /// Drain the remainder after end-of-stream.
    ///
    /// Returns the final unterminated record, or `None` if only whitespace is
    /// left. Any bytes still pending are decoded lossily: the stream ended in
    /// the middle of a character.
    pub fn finish(&mut self) -> Option<String> {
        if !self.pending.is_empty() {
            let tail = std::mem::take(&mut self.pending);
            self.text.push_str(&String::from_utf8_lossy(&tail));
        }
        let rest = std::mem::take(&mut self.text);
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest)
        }
    }

    /// Decode the maximal valid UTF-8 prefix of the pending bytes.
    ///
    /// An incomplete trailing sequence stays pending for the next push; an
    /// invalid sequence in the middle becomes U+FFFD and decoding continues.
    fn decode_pending(&mut self) {
        let buf = std::mem::take(&mut self.pending);
        let mut rest = buf.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    break;
                }
                Err(err) => {
                    let valid_up_to = err.valid_up_to();
                    self.text
                        .push_str(&String::from_utf8_lossy(&rest[..valid_up_to]));
                    match err.error_len() {
                        Some(invalid_len) => {
                            self.text.push('\u{FFFD}');
                            rest = &rest[valid_up_to + invalid_len..];
                        }
                        None => {
                            // Split multi-byte sequence: wait for more bytes.
                            self.pending = rest[valid_up_to..].to_vec();
                            break;
                        }
                    }
                }
            }
        }
    }

    fn drain_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(pos) = self.text.find('\n') {
            let mut line: String = self.text.drain(..=pos).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            lines.push(line);
        }
        lines
    }
}
