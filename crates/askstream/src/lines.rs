//! Line framing over an unreliable read boundary.
//!
//! Response bodies arrive in windows of arbitrary size. `LineBuffer` keeps the
//! unterminated tail of each window and prepends it to the next one, so a
//! window boundary never splits or merges lines.

use std::collections::VecDeque;
use std::fmt::Display;

use bytes::Bytes;
use futures::{Stream, StreamExt as _};

use crate::errors::StreamError;

/// Carry-over buffer that turns byte windows into complete lines.
#[derive(Default, Debug)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    /// Appends a window and returns every line it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        // Only the new bytes can contain a newline not yet consumed.
        let scan_from = self.buf.len();
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        let mut pos = scan_from;
        while let Some(offset) = self.buf[pos..].iter().position(|b| *b == b'\n') {
            let end = pos + offset;
            lines.push(decode_line(&self.buf[start..end]));
            start = end + 1;
            pos = start;
        }
        self.buf.drain(..start);
        lines
    }

    /// Flushes the unterminated tail at end of stream.
    ///
    /// An empty tail produces no line.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = decode_line(&self.buf);
        self.buf.clear();
        Some(line)
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Lazy line sequence over a byte-window stream.
pub struct LineReader<S> {
    source: S,
    buffer: LineBuffer,
    pending: VecDeque<String>,
    finished: bool,
}

impl<S, E> LineReader<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    pub fn new(source: S) -> Self {
        Self {
            source,
            buffer: LineBuffer::default(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Returns the next complete line, `None` once the source is exhausted.
    ///
    /// A transport error is returned once and ends the sequence.
    pub async fn next_line(&mut self) -> Option<Result<String, StreamError>> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Some(Ok(line));
            }
            if self.finished {
                return None;
            }
            match self.source.next().await {
                Some(Ok(chunk)) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    self.pending.extend(self.buffer.push(&chunk));
                }
                Some(Err(err)) => {
                    self.finished = true;
                    self.pending.clear();
                    return Some(Err(StreamError::transport(format!(
                        "reading response body: {err}"
                    ))));
                }
                None => {
                    self.finished = true;
                    if let Some(tail) = self.buffer.finish() {
                        self.pending.push_back(tail);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    const SAMPLE: &str = "event: classification\n\
data: {\"route\":\"retrieval\",\"rewritten_query\":\"q\",\"confidence\":0.9}\n\
\n\
event: answer\n\
data: Hel\n\
data: lo \n\
\n\
event: followup_question\n\
data: Why?\n\
\n\
event: done\n\
data: \n";

    fn lines_for_windows(windows: &[&[u8]]) -> Vec<String> {
        let mut buffer = LineBuffer::default();
        let mut lines = Vec::new();
        for window in windows {
            lines.extend(buffer.push(window));
        }
        lines.extend(buffer.finish());
        lines
    }

    #[test]
    fn keeps_partial_line_across_windows() {
        let mut buffer = LineBuffer::default();
        assert!(buffer.push(b"event: ans").is_empty());
        assert_eq!(buffer.push(b"wer\ndata: x"), vec!["event: answer"]);
        assert_eq!(buffer.push(b"y\n"), vec!["data: xy"]);
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn flushes_unterminated_tail_at_end() {
        assert_eq!(
            lines_for_windows(&[b"data: a\ndata: b".as_slice()]),
            vec!["data: a", "data: b"]
        );
    }

    #[test]
    fn blank_lines_are_preserved_and_crlf_is_stripped() {
        assert_eq!(
            lines_for_windows(&[b"event: done\r\n\r\ndata: x\r\n".as_slice()]),
            vec!["event: done", "", "data: x"]
        );
    }

    #[test]
    fn multibyte_character_split_across_windows_survives() {
        let bytes = "data: héllo\n".as_bytes();
        let split = bytes.iter().position(|b| *b == 0xC3).expect("é") + 1;
        assert_eq!(
            lines_for_windows(&[&bytes[..split], &bytes[split..]]),
            vec!["data: héllo"]
        );
    }

    #[test]
    fn any_split_point_reproduces_whole_stream_lines() {
        let bytes = SAMPLE.as_bytes();
        let expected = lines_for_windows(&[bytes]);
        for a in 0..=bytes.len() {
            assert_eq!(
                lines_for_windows(&[&bytes[..a], &bytes[a..]]),
                expected,
                "split at {a}"
            );
        }
        for step in 1..=7 {
            let windows: Vec<&[u8]> = bytes.chunks(step).collect();
            assert_eq!(lines_for_windows(&windows), expected, "step {step}");
        }
    }

    #[tokio::test]
    async fn reader_skips_empty_windows_and_flushes_tail() {
        let source = stream::iter(vec![
            Ok::<_, std::io::Error>(Bytes::from_static(b"event: an")),
            Ok(Bytes::new()),
            Ok(Bytes::from_static(b"swer\ndata: tail")),
        ]);
        let mut reader = LineReader::new(source);
        assert_eq!(reader.next_line().await.expect("line").expect("ok"), "event: answer");
        assert_eq!(reader.next_line().await.expect("line").expect("ok"), "data: tail");
        assert!(reader.next_line().await.is_none());
    }

    #[tokio::test]
    async fn reader_propagates_transport_error_once() {
        let source = stream::iter(vec![
            Ok(Bytes::from_static(b"data: a\ndata: partial")),
            Err(std::io::Error::other("connection reset")),
            Ok(Bytes::from_static(b"\ndata: never\n")),
        ]);
        let mut reader = LineReader::new(source);
        assert_eq!(reader.next_line().await.expect("line").expect("ok"), "data: a");
        let err = reader.next_line().await.expect("item").expect_err("error");
        assert!(matches!(err, StreamError::Transport { ref message } if message.contains("connection reset")));
        assert!(reader.next_line().await.is_none());
    }
}
