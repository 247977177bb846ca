//! Incremental, cross-chunk JSON stream driver (spec §4.4).
//!
//! [`StreamDriver`] accepts byte chunks of arbitrary size and boundary —
//! including splits mid-token, mid-string, or mid multi-byte UTF-8 character
//! — and emits [`StreamEvent`]s as soon as they are determinable: a
//! `*Start` the instant a top-level container opens, then a `Value`
//! carrying the whole built tree followed by `*End` the instant it closes
//! (or just `Value` for a bare top-level scalar). Boundary detection is a
//! small byte-by-byte state machine (depth, in-string, escape-pending, and a
//! pending-UTF-8-continuation count); once a boundary closes, the
//! accumulated slice is handed off to the ordinary [`crate::parser`] rather
//! than re-implemented here.

use crate::error::{Error, ErrorKind};
use crate::parser;
use crate::value::Value;

/// Tunable ceilings for [`StreamDriver`] (spec §4.4, §9, §4.8).
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    pub max_chunk_bytes: usize,
    pub max_document_bytes: usize,
    pub max_depth: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_chunk_bytes: 100 * 1024 * 1024,
            max_document_bytes: 100 * 1024 * 1024,
            max_depth: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    Value(Value),
    Error(Error),
    Eof,
}

/// Consumer-controlled cancellation signal returned from the event
/// callback, replacing a raw bool (spec §4.4 says the consumer "returns a
/// boolean"; redesigned here per spec §9's call for an explicit, typed
/// stop/continue rather than an easily-misread boolean).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Abort,
}

enum ScanOutcome {
    Complete(usize),
    Pending,
    Aborted,
}

pub struct StreamDriver {
    config: StreamConfig,
    buffer: Vec<u8>,
    scan_pos: usize,
    depth: usize,
    in_string: bool,
    escape_pending: bool,
    started_value: bool,
    scalar: bool,
    utf8_need: u8,
}

impl StreamDriver {
    pub fn new() -> Self {
        Self::with_config(StreamConfig::default())
    }

    pub fn with_config(config: StreamConfig) -> Self {
        Self {
            config,
            buffer: Vec::new(),
            scan_pos: 0,
            depth: 0,
            in_string: false,
            escape_pending: false,
            started_value: false,
            scalar: false,
            utf8_need: 0,
        }
    }

    /// Feed one chunk, invoking `on_event` for every event the new bytes
    /// make determinable. `on_event`'s return value is checked after every
    /// call so a consumer can abort mid-document with a clean teardown.
    pub fn feed(
        &mut self,
        chunk: &[u8],
        mut on_event: impl FnMut(StreamEvent) -> Control,
    ) -> Result<(), Error> {
        if chunk.len() > self.config.max_chunk_bytes {
            let err =
                Error::new(ErrorKind::OutOfMemory, "chunk exceeds the configured maximum").record();
            on_event(StreamEvent::Error(err.clone()));
            return Err(err);
        }
        self.buffer.extend_from_slice(chunk);
        // Measured against the live per-document buffer, not a lifetime
        // total: the ceiling is "per-document buffered size" (spec §4.4),
        // and the buffer is drained back to empty every time a top-level
        // value completes, just as the original's `buffer_size` resets to 0
        // per value (`json_streaming.c`).
        if self.buffer.len() > self.config.max_document_bytes {
            let err = Error::new(
                ErrorKind::OutOfMemory,
                "document exceeds the configured maximum",
            )
            .record();
            on_event(StreamEvent::Error(err.clone()));
            return Err(err);
        }

        loop {
            match self.scan_boundary(&mut on_event).map_err(Error::record)? {
                ScanOutcome::Aborted => return Ok(()),
                ScanOutcome::Pending => return Ok(()),
                ScanOutcome::Complete(end) => {
                    let slice = self.buffer[..end].to_vec();
                    self.buffer.drain(..end);
                    self.scan_pos = 0;

                    match parser::parse(&slice) {
                        Ok(value) => {
                            let closing_event = match &value {
                                Value::Object(_) => Some(StreamEvent::ObjectEnd),
                                Value::Array(_) => Some(StreamEvent::ArrayEnd),
                                _ => None,
                            };
                            // VALUE fires before the closing *_END event (spec
                            // §8 scenario 3; matches the original's
                            // `stream_try_parse_complete_value`, which emits
                            // JSON_EVENT_VALUE first).
                            if on_event(StreamEvent::Value(value)) == Control::Abort {
                                return Ok(());
                            }
                            if let Some(event) = closing_event {
                                if on_event(event) == Control::Abort {
                                    return Ok(());
                                }
                            }
                        }
                        Err(err) => {
                            on_event(StreamEvent::Error(err.clone()));
                            return Err(err);
                        }
                    }
                }
            }
        }
    }

    /// Signal end of input. A scalar value with no trailing delimiter (the
    /// final token in the stream) is only resolvable here; an incomplete
    /// container or string is reported as [`ErrorKind::UnexpectedEof`] —
    /// everywhere else in this driver that condition means "keep waiting".
    /// Trailing whitespace left over after the last top-level value closed
    /// (e.g. `{"a":1} `) is not "incomplete"; it is drained first so a
    /// cleanly-terminated stream reaches [`StreamEvent::Eof`] rather than an
    /// error (spec §8, "trailing whitespace...is valid").
    pub fn finish(&mut self, mut on_event: impl FnMut(StreamEvent) -> Control) -> Result<(), Error> {
        if self.depth == 0 && !self.in_string {
            let trailing = self.buffer.iter().take_while(|&&b| is_json_whitespace(b)).count();
            self.buffer.drain(..trailing);
        }
        if !self.buffer.is_empty() {
            if self.utf8_need > 0 || self.depth > 0 || self.in_string {
                let err = Error::new(
                    ErrorKind::UnexpectedEof,
                    "stream ended with an incomplete value",
                )
                .record();
                on_event(StreamEvent::Error(err.clone()));
                return Err(err);
            }
            match parser::parse(&self.buffer) {
                Ok(value) => {
                    on_event(StreamEvent::Value(value));
                }
                Err(err) => {
                    on_event(StreamEvent::Error(err.clone()));
                    return Err(err);
                }
            }
            self.buffer.clear();
        }
        on_event(StreamEvent::Eof);
        Ok(())
    }

    /// Advance `scan_pos` through the buffer. Emits a `*Start` event the
    /// instant a top-level container opens and returns the end offset of a
    /// complete top-level value once one closes; returns `Pending` if the
    /// buffer should not yet be handed to the parser.
    fn scan_boundary(
        &mut self,
        mut on_event: impl FnMut(StreamEvent) -> Control,
    ) -> Result<ScanOutcome, Error> {
        while self.scan_pos < self.buffer.len() {
            let byte = self.buffer[self.scan_pos];
            self.note_utf8_continuation(byte)?;

            if !self.started_value {
                if is_json_whitespace(byte) {
                    self.scan_pos += 1;
                    continue;
                }
                self.started_value = true;
                self.scalar = !matches!(byte, b'{' | b'[');
            }

            if self.in_string {
                if self.escape_pending {
                    self.escape_pending = false;
                } else if byte == b'\\' {
                    self.escape_pending = true;
                } else if byte == b'"' {
                    self.in_string = false;
                    if self.depth == 0 && self.scalar {
                        self.scan_pos += 1;
                        let end = self.scan_pos;
                        self.started_value = false;
                        return Ok(ScanOutcome::Complete(end));
                    }
                }
                self.scan_pos += 1;
                continue;
            }

            match byte {
                b'"' => self.in_string = true,
                b'{' | b'[' => {
                    let opening_top_level = self.depth == 0;
                    self.depth += 1;
                    if self.depth > self.config.max_depth {
                        return Err(Error::new(
                            ErrorKind::StackOverflow,
                            "stream nesting exceeds the configured limit",
                        ));
                    }
                    if opening_top_level {
                        let start_event = if byte == b'{' {
                            StreamEvent::ObjectStart
                        } else {
                            StreamEvent::ArrayStart
                        };
                        if on_event(start_event) == Control::Abort {
                            return Ok(ScanOutcome::Aborted);
                        }
                    }
                }
                b'}' | b']' => {
                    if self.depth == 0 {
                        return Err(Error::new(
                            ErrorKind::UnexpectedToken,
                            "unbalanced closing bracket in stream",
                        ));
                    }
                    self.depth -= 1;
                    if self.depth == 0 {
                        self.scan_pos += 1;
                        let end = self.scan_pos;
                        self.started_value = false;
                        return Ok(ScanOutcome::Complete(end));
                    }
                }
                b if is_json_whitespace(b) && self.depth == 0 && self.scalar => {
                    let end = self.scan_pos;
                    self.started_value = false;
                    return Ok(ScanOutcome::Complete(end));
                }
                _ => {}
            }
            self.scan_pos += 1;
        }
        Ok(ScanOutcome::Pending)
    }

    /// Track how many continuation bytes (`0x80..=0xBF`) are still owed to
    /// complete the UTF-8 character currently in progress, so a chunk split
    /// mid character degrades to "keep waiting" instead of miscounting
    /// structural bytes (which are always single-byte ASCII and therefore
    /// cannot collide with a continuation byte, whose high bit is always
    /// set).
    fn note_utf8_continuation(&mut self, byte: u8) -> Result<(), Error> {
        if self.utf8_need > 0 {
            if byte & 0xC0 != 0x80 {
                return Err(Error::new(
                    ErrorKind::InvalidUtf8,
                    "truncated multi-byte UTF-8 sequence",
                ));
            }
            self.utf8_need -= 1;
        } else if byte & 0x80 == 0 {
            // plain ASCII
        } else if byte & 0xE0 == 0xC0 {
            self.utf8_need = 1;
        } else if byte & 0xF0 == 0xE0 {
            self.utf8_need = 2;
        } else if byte & 0xF8 == 0xF0 {
            self.utf8_need = 3;
        } else {
            return Err(Error::new(ErrorKind::InvalidUtf8, "invalid UTF-8 lead byte"));
        }
        Ok(())
    }
}

impl Default for StreamDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// The four bytes JSON permits as whitespace (spec §4.1) — not Rust's
/// `u8::is_ascii_whitespace`, which also matches form-feed `0x0C` and would
/// let the stream split on a byte the one-shot lexer rejects.
fn is_json_whitespace(byte: u8) -> bool {
    matches!(byte, 0x20 | 0x09 | 0x0A | 0x0D)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(driver: &mut StreamDriver, chunk: &[u8]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        driver
            .feed(chunk, |event| {
                events.push(event);
                Control::Continue
            })
            .unwrap();
        events
    }

    #[test]
    fn object_start_fires_immediately_value_and_end_fire_together() {
        let mut driver = StreamDriver::new();
        let mut events = Vec::new();
        events.extend(drain(&mut driver, br#"{"a":1,"#));
        assert_eq!(events, vec![StreamEvent::ObjectStart]);
        events.extend(drain(&mut driver, br#""b":[true,false]}"#));
        assert_eq!(
            events,
            vec![
                StreamEvent::ObjectStart,
                StreamEvent::Value(
                    crate::parser::parse(br#"{"a":1,"b":[true,false]}"#).unwrap()
                ),
                StreamEvent::ObjectEnd,
            ]
        );
    }

    #[test]
    fn array_split_across_three_chunks_emits_start_then_value_and_end() {
        let mut driver = StreamDriver::new();
        let mut events = Vec::new();
        events.extend(drain(&mut driver, b"[1,"));
        events.extend(drain(&mut driver, b"2,"));
        events.extend(drain(&mut driver, b"3]"));
        assert_eq!(
            events,
            vec![
                StreamEvent::ArrayStart,
                StreamEvent::Value(Value::Array(vec![
                    Value::Number(1.0),
                    Value::Number(2.0),
                    Value::Number(3.0)
                ])),
                StreamEvent::ArrayEnd,
            ]
        );
    }

    #[test]
    fn split_mid_multibyte_character_waits_for_more_data() {
        let mut driver = StreamDriver::new();
        let full = "\"caf\u{00e9}\"".as_bytes().to_vec();
        let (first, second) = full.split_at(full.len() - 1);
        assert!(drain(&mut driver, first).is_empty());
        let events = drain(&mut driver, second);
        assert_eq!(events, vec![StreamEvent::Value(Value::String("café".into()))]);
    }

    #[test]
    fn whitespace_separated_scalars_each_produce_one_value_event() {
        let mut driver = StreamDriver::new();
        let events = drain(&mut driver, b"1 2 3 ");
        assert_eq!(
            events,
            vec![
                StreamEvent::Value(Value::Number(1.0)),
                StreamEvent::Value(Value::Number(2.0)),
                StreamEvent::Value(Value::Number(3.0)),
            ]
        );
    }

    #[test]
    fn trailing_scalar_with_no_delimiter_resolves_on_finish() {
        let mut driver = StreamDriver::new();
        assert!(drain(&mut driver, b"42").is_empty());
        let mut events = Vec::new();
        driver
            .finish(|event| {
                events.push(event);
                Control::Continue
            })
            .unwrap();
        assert_eq!(
            events,
            vec![StreamEvent::Value(Value::Number(42.0)), StreamEvent::Eof]
        );
    }

    #[test]
    fn unclosed_container_at_finish_is_unexpected_eof() {
        let mut driver = StreamDriver::new();
        assert!(drain(&mut driver, b"{\"a\":1").is_empty());
        let mut events = Vec::new();
        let result = driver.finish(|event| {
            events.push(event);
            Control::Continue
        });
        assert_eq!(result.unwrap_err().kind, ErrorKind::UnexpectedEof);
    }

    #[test]
    fn consumer_can_abort_as_soon_as_the_container_opens() {
        let mut driver = StreamDriver::new();
        let mut seen = Vec::new();
        driver
            .feed(br#"{"a":1,"b":2,"c":3}"#, |event| {
                seen.push(event);
                Control::Abort
            })
            .unwrap();
        assert_eq!(seen, vec![StreamEvent::ObjectStart]);
    }

    #[test]
    fn nesting_beyond_the_stream_limit_overflows() {
        let mut driver = StreamDriver::with_config(StreamConfig {
            max_depth: 2,
            ..StreamConfig::default()
        });
        let deep = "[".repeat(3);
        let err = driver
            .feed(deep.as_bytes(), |_| Control::Continue)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::StackOverflow);
    }

    #[test]
    fn trailing_whitespace_after_a_closed_container_finishes_cleanly() {
        let mut driver = StreamDriver::new();
        let mut events = Vec::new();
        events.extend(drain(&mut driver, br#"{"a":1} "#));
        driver
            .finish(|event| {
                events.push(event);
                Control::Continue
            })
            .unwrap();
        assert_eq!(
            events,
            vec![
                StreamEvent::ObjectStart,
                StreamEvent::Value(crate::parser::parse(br#"{"a":1}"#).unwrap()),
                StreamEvent::ObjectEnd,
                StreamEvent::Eof,
            ]
        );
    }

    #[test]
    fn document_ceiling_is_per_document_not_cumulative_over_the_stream() {
        let mut driver = StreamDriver::with_config(StreamConfig {
            max_document_bytes: 16,
            ..StreamConfig::default()
        });
        for _ in 0..10 {
            driver.feed(b"{\"a\":1}", |_| Control::Continue).unwrap();
        }
    }

    #[test]
    fn form_feed_at_top_level_is_rejected_like_the_one_shot_parser() {
        // A leading form-feed is not JSON whitespace (spec §4.1); the
        // trailing space gives the scalar a delimiter so the driver hands
        // the whole (invalid) slice to the parser within this `feed` call
        // instead of waiting on `finish`.
        let mut driver = StreamDriver::new();
        let mut saw_error = false;
        let _ = driver.feed(b"\x0C1 ", |event| {
            if matches!(event, StreamEvent::Error(_)) {
                saw_error = true;
            }
            Control::Continue
        });
        assert!(saw_error, "form-feed is not permitted JSON whitespace");
        assert!(
            crate::parser::parse(b"\x0C1").is_err(),
            "the one-shot parser must reject the same bytes"
        );
    }
}
