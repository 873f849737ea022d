//! # Input line source.
//!
//! [`LineSource`] yields input lines one at a time from standard input or
//! a named file: an iterative growable-buffer read, lazy and finite, with
//! the line terminator (`\n` or `\r\n`) stripped. Each line is one opaque
//! job argument; no quoting or field-splitting happens here.

use std::path::Path;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::config::InputSource;

/// Lazy line reader over a byte stream.
pub struct LineSource {
    reader: BufReader<Box<dyn AsyncRead + Unpin + Send>>,
    buf: String,
}

impl LineSource {
    /// Reads from the process's standard input.
    pub fn stdin() -> Self {
        Self::from_reader(tokio::io::stdin())
    }

    /// Reads from a named file.
    pub async fn open(path: &Path) -> std::io::Result<Self> {
        Ok(Self::from_reader(tokio::fs::File::open(path).await?))
    }

    /// Reads from any async byte stream (used by tests).
    pub fn from_reader(reader: impl AsyncRead + Unpin + Send + 'static) -> Self {
        Self {
            reader: BufReader::new(Box::new(reader)),
            buf: String::new(),
        }
    }

    /// Builds the source a [`Config`](crate::Config) asks for.
    pub async fn from_config(input: &InputSource) -> std::io::Result<Self> {
        match input {
            InputSource::Stdin => Ok(Self::stdin()),
            InputSource::File(path) => Self::open(path).await,
        }
    }

    /// Returns the next line with its terminator stripped, or `None` at
    /// end of stream. A final line without a terminator still counts.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.buf.clear();
        let n = self.reader.read_line(&mut self.buf).await?;
        if n == 0 {
            return Ok(None);
        }
        if self.buf.ends_with('\n') {
            self.buf.pop();
            if self.buf.ends_with('\r') {
                self.buf.pop();
            }
        }
        Ok(Some(self.buf.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(data: &str) -> Vec<String> {
        let mut src = LineSource::from_reader(std::io::Cursor::new(data.as_bytes().to_vec()));
        let mut lines = Vec::new();
        while let Some(line) = src.next_line().await.expect("read") {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn strips_terminators_and_keeps_inner_whitespace() {
        let lines = collect("a b\nc\r\n  d  \n").await;
        assert_eq!(lines, vec!["a b", "c", "  d  "]);
    }

    #[tokio::test]
    async fn last_line_without_newline_counts() {
        let lines = collect("one\ntwo").await;
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn empty_lines_are_preserved() {
        let lines = collect("a\n\nb\n").await;
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[tokio::test]
    async fn empty_stream_yields_nothing() {
        assert!(collect("").await.is_empty());
    }

    #[tokio::test]
    async fn file_source_reads_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "x\ny\n").expect("write");
        let mut src = LineSource::open(&path).await.expect("open");
        assert_eq!(src.next_line().await.unwrap().as_deref(), Some("x"));
        assert_eq!(src.next_line().await.unwrap().as_deref(), Some("y"));
        assert_eq!(src.next_line().await.unwrap(), None);
    }
}
