//! Incremental splitter for concatenated JSON values.
//!
//! The engine streams events, pull progress and stats as top-level JSON
//! values with no required delimiter. [`JsonStreamParser`] tracks nesting
//! depth and string escapes to find where each value ends, independent of
//! how the bytes were chunked, and hands every complete value to
//! `serde_json`.

use bytes::{Buf, BytesMut};
use serde_json::Value;
use tracing::trace;

use crate::config::DEFAULT_MAX_JSON_VALUE;
use crate::error::{Result, StreamError, Unit};

/// Incremental JSON value parser.
#[derive(Debug)]
pub struct JsonStreamParser {
    buf: BytesMut,
    /// Next byte of `buf` to scan.
    pos: usize,
    /// Start of the value currently being scanned.
    start: Option<usize>,
    depth: usize,
    in_string: bool,
    escaped: bool,
    /// Scanning a top-level number or literal.
    bare: bool,
    /// Absolute input offset of `buf[0]`.
    offset: u64,
    max_value_size: usize,
}

impl Default for JsonStreamParser {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonStreamParser {
    pub fn new() -> Self {
        Self::with_max_value_size(DEFAULT_MAX_JSON_VALUE)
    }

    /// Create a parser that refuses to buffer a single value larger than `max`.
    pub fn with_max_value_size(max: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            pos: 0,
            start: None,
            depth: 0,
            in_string: false,
            escaped: false,
            bare: false,
            offset: 0,
            max_value_size: max,
        }
    }

    /// Append `chunk` and return every value it completed, in order.
    ///
    /// On error the parser is reset and values completed earlier in the same
    /// chunk are discarded.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Value>> {
        self.buf.extend_from_slice(chunk);
        match self.scan() {
            Ok(values) => Ok(values),
            Err(err) => {
                self.clear();
                Err(err)
            }
        }
    }

    /// Flush a trailing top-level number or literal at end of input.
    ///
    /// Fails with [`StreamError::Truncated`] if any other partial value is
    /// still buffered.
    pub fn finish(&mut self) -> Result<Option<Value>> {
        if self.buf.is_empty() {
            return Ok(None);
        }
        if self.bare {
            let end = self.buf.len();
            let value = self.complete(end);
            self.clear();
            return match value {
                Err(StreamError::Json(err)) if err.is_eof() => {
                    Err(StreamError::Truncated(Unit::JsonValue))
                }
                other => other.map(Some),
            };
        }
        self.clear();
        Err(StreamError::Truncated(Unit::JsonValue))
    }

    /// Returns true if no partial value is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of bytes buffered for the value in progress.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Drop all buffered input and reset the scanner.
    pub fn clear(&mut self) {
        self.offset += self.buf.len() as u64;
        self.buf.clear();
        self.pos = 0;
        self.start = None;
        self.depth = 0;
        self.in_string = false;
        self.escaped = false;
        self.bare = false;
    }

    fn scan(&mut self) -> Result<Vec<Value>> {
        let mut values = Vec::new();
        // Bytes before `consumed` belong to values already returned or to
        // whitespace between values.
        let mut consumed = 0usize;

        while self.pos < self.buf.len() {
            let byte = self.buf[self.pos];

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                    if self.depth == 0 {
                        self.pos += 1;
                        values.push(self.complete(self.pos)?);
                        consumed = self.pos;
                        continue;
                    }
                }
                self.pos += 1;
                continue;
            }

            if self.bare {
                if is_bare_continuation(byte) {
                    self.pos += 1;
                    continue;
                }
                // The delimiter is not consumed; it may start the next value.
                values.push(self.complete(self.pos)?);
                consumed = self.pos;
                continue;
            }

            match byte {
                b' ' | b'\t' | b'\n' | b'\r' => {
                    if self.start.is_none() {
                        consumed = self.pos + 1;
                    }
                }
                b'"' => {
                    self.begin();
                    self.in_string = true;
                }
                b'{' | b'[' => {
                    self.begin();
                    self.depth += 1;
                }
                b'}' | b']' => {
                    if self.depth == 0 {
                        return Err(self.unexpected(byte));
                    }
                    self.depth -= 1;
                    if self.depth == 0 {
                        self.pos += 1;
                        values.push(self.complete(self.pos)?);
                        consumed = self.pos;
                        continue;
                    }
                }
                _ if self.depth > 0 => {}
                b'-' | b'0'..=b'9' | b't' | b'f' | b'n' => {
                    self.begin();
                    self.bare = true;
                }
                _ => return Err(self.unexpected(byte)),
            }
            self.pos += 1;
        }

        self.discard(consumed);

        if let Some(start) = self.start {
            let size = self.buf.len() - start;
            if size > self.max_value_size {
                return Err(StreamError::ValueTooLarge {
                    size,
                    max: self.max_value_size,
                });
            }
        }

        Ok(values)
    }

    fn begin(&mut self) {
        if self.depth == 0 {
            self.start = Some(self.pos);
        }
    }

    fn complete(&mut self, end: usize) -> Result<Value> {
        let start = self.start.take().unwrap_or(end);
        self.bare = false;
        let value = serde_json::from_slice(&self.buf[start..end])?;
        trace!(len = end - start, "parsed JSON value");
        Ok(value)
    }

    fn discard(&mut self, consumed: usize) {
        if consumed == 0 {
            return;
        }
        self.buf.advance(consumed);
        self.pos -= consumed;
        if let Some(start) = self.start.as_mut() {
            *start -= consumed;
        }
        self.offset += consumed as u64;
    }

    fn unexpected(&self, byte: u8) -> StreamError {
        StreamError::UnexpectedByte {
            byte,
            offset: self.offset + self.pos as u64,
        }
    }
}

fn is_bare_continuation(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'+' | b'-')
}
