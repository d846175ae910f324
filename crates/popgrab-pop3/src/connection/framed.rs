//! Framed I/O for the POP3 protocol.
//!
//! POP3 responses are CRLF-terminated lines. Multi-line responses (LIST,
//! UIDL, RETR) are terminated by a line containing a single dot, and content
//! lines that begin with a dot are byte-stuffed with an extra leading dot
//! (RFC 1939 section 3). This module provides buffered reading with proper
//! handling of both.

#![allow(clippy::missing_errors_doc)]

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::Result;

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Maximum line length to prevent memory exhaustion.
const MAX_LINE_LENGTH: usize = 1024 * 1024; // 1 MB

/// Maximum multi-line response size to prevent memory exhaustion.
const MAX_RESPONSE_SIZE: usize = 100 * 1024 * 1024; // 100 MB

/// Framed connection for the POP3 protocol.
///
/// Handles line-based reading with dot-stuffed multi-line support and
/// buffered writing.
pub struct FramedStream<S> {
    reader: BufReader<S>,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new framed stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
        }
    }

    /// Reads a single CRLF-terminated line, returned without the terminator.
    pub async fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();

        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Err(crate::Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }

            // Look for CRLF
            if let Some(pos) = find_crlf(buf) {
                line.extend_from_slice(&buf[..pos]);
                self.reader.consume(pos + 2);
                break;
            }

            // No CRLF found, consume all and continue
            let len = buf.len();
            line.extend_from_slice(buf);
            self.reader.consume(len);

            if line.len() > MAX_LINE_LENGTH {
                return Err(crate::Error::Protocol("line too long".to_string()));
            }
        }

        Ok(line)
    }

    /// Reads the body of a multi-line response: every line up to (but not
    /// including) the lone-dot terminator, with byte-stuffing undone.
    ///
    /// Must be called after the `+OK` status line of a LIST, UIDL, or RETR
    /// exchange has already been consumed.
    pub async fn read_multiline(&mut self) -> Result<Vec<Vec<u8>>> {
        let mut lines = Vec::new();
        let mut total = 0usize;

        loop {
            let mut line = self.read_line().await?;

            if line == b"." {
                break;
            }

            // Undo byte-stuffing: a content line starting with a dot was
            // transmitted with an extra leading dot.
            if line.first() == Some(&b'.') {
                line.remove(0);
            }

            total += line.len();
            if total > MAX_RESPONSE_SIZE {
                return Err(crate::Error::Protocol("response too large".to_string()));
            }

            lines.push(line);
        }

        Ok(lines)
    }

    /// Writes a serialized command to the stream.
    pub async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;

        Ok(())
    }

    /// Gets a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
    }

    /// Consumes the framed stream and returns the inner stream.
    ///
    /// Note: Any buffered data will be lost.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

/// Finds the position of CRLF in a buffer.
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_find_crlf() {
        assert_eq!(find_crlf(b"hello\r\n"), Some(5));
        assert_eq!(find_crlf(b"\r\n"), Some(0));
        assert_eq!(find_crlf(b"no newline"), None);
        assert_eq!(find_crlf(b"just\n"), None);
        assert_eq!(find_crlf(b"just\r"), None);
    }

    #[tokio::test]
    async fn test_read_simple_line() {
        use tokio_test::io::Builder;

        let mock = Builder::new().read(b"+OK POP3 ready\r\n").build();
        let mut framed = FramedStream::new(mock);

        let line = framed.read_line().await.unwrap();
        assert_eq!(line, b"+OK POP3 ready");
    }

    #[tokio::test]
    async fn test_read_line_split_across_reads() {
        use tokio_test::io::Builder;

        let mock = Builder::new().read(b"+OK par").read(b"tial\r\n").build();
        let mut framed = FramedStream::new(mock);

        let line = framed.read_line().await.unwrap();
        assert_eq!(line, b"+OK partial");
    }

    #[tokio::test]
    async fn test_read_multiline_terminator() {
        use tokio_test::io::Builder;

        let mock = Builder::new()
            .read(b"1 200\r\n2 150\r\n.\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let lines = framed.read_multiline().await.unwrap();
        assert_eq!(lines, vec![b"1 200".to_vec(), b"2 150".to_vec()]);
    }

    #[tokio::test]
    async fn test_read_multiline_dot_unstuffing() {
        use tokio_test::io::Builder;

        let mock = Builder::new()
            .read(b"normal line\r\n..starts with dot\r\n.\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let lines = framed.read_multiline().await.unwrap();
        assert_eq!(
            lines,
            vec![b"normal line".to_vec(), b".starts with dot".to_vec()]
        );
    }

    #[tokio::test]
    async fn test_read_multiline_empty_body() {
        use tokio_test::io::Builder;

        let mock = Builder::new().read(b".\r\n").build();
        let mut framed = FramedStream::new(mock);

        let lines = framed.read_multiline().await.unwrap();
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_eof_is_an_error() {
        use tokio_test::io::Builder;

        let mock = Builder::new().read(b"truncated").build();
        let mut framed = FramedStream::new(mock);

        let result = framed.read_line().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_line_length_limit() {
        use tokio_test::io::Builder;

        let long_line = "A".repeat(MAX_LINE_LENGTH + 100);
        let mock = Builder::new().read(long_line.as_bytes()).build();
        let mut framed = FramedStream::new(mock);

        let result = framed.read_line().await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("line too long"));
    }

    #[tokio::test]
    async fn test_write_command() {
        use tokio_test::io::Builder;

        let mock = Builder::new().write(b"STAT\r\n").build();
        let mut framed = FramedStream::new(mock);

        framed.write_command(b"STAT\r\n").await.unwrap();
    }
}
