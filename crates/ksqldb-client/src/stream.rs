//! Lazy row stream over a delimited `/query-stream` response.
//!
//! The body is newline-delimited JSON: a header object first, then one JSON array
//! per row. The server may end the stream early with an error object instead of a
//! row.

use crate::context::RequestContext;
use crate::decode::{DecodeError, JsonKind};
use crate::error::{ClientError, Result};
use crate::types::{ResponseError, Row};
use futures_util::stream::{self, BoxStream, Stream};
use futures_util::TryFutureExt;
use serde_json::Value;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Bytes received so far, cut into lines as newlines arrive.
///
/// `scanned` marks how much of `buf` is known to hold no newline, so each
/// chunk is searched once however many chunks a long frame spans.
#[derive(Debug, Default)]
struct LineBuffer {
    buf: Vec<u8>,
    scanned: usize,
}

impl LineBuffer {
    fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Remove and return the next complete line, newline included.
    fn take_line(&mut self) -> Option<Vec<u8>> {
        match self.buf[self.scanned..].iter().position(|b| *b == b'\n') {
            Some(rel) => {
                let pos = self.scanned + rel;
                self.scanned = 0;
                Some(self.buf.drain(..=pos).collect())
            }
            None => {
                self.scanned = self.buf.len();
                None
            }
        }
    }

    /// Remove and return whatever is left, complete line or not.
    fn take_rest(&mut self) -> Vec<u8> {
        self.scanned = 0;
        std::mem::take(&mut self.buf)
    }
}

/// Splits a streaming response body into non-blank lines.
pub(crate) struct FrameReader {
    response: reqwest::Response,
    ctx: RequestContext,
    lines: LineBuffer,
    eof: bool,
}

impl FrameReader {
    pub(crate) fn new(response: reqwest::Response, ctx: RequestContext) -> Self {
        Self {
            response,
            ctx,
            lines: LineBuffer::default(),
            eof: false,
        }
    }

    /// Next non-blank line, or `None` once the body is exhausted.
    pub(crate) async fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(line) = self.lines.take_line() {
                if is_blank(&line) {
                    continue;
                }
                return Ok(Some(line));
            }

            if self.eof {
                let rest = self.lines.take_rest();
                if is_blank(&rest) {
                    return Ok(None);
                }
                return Ok(Some(rest));
            }

            let chunk = self
                .ctx
                .run(
                    self.response
                        .chunk()
                        .map_err(|e| ClientError::BodyRead(e.into())),
                )
                .await?;

            match chunk {
                Some(bytes) => self.lines.extend(&bytes),
                None => self.eof = true,
            }
        }
    }
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// True for an object frame carrying a ksqlDB error instead of data.
pub(crate) fn is_error_frame(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.contains_key("@type") || map.contains_key("error_code"))
}

pub(crate) fn error_frame(value: Value) -> ClientError {
    match serde_json::from_value::<ResponseError>(value) {
        Ok(err) => ClientError::Server(err),
        Err(e) => ClientError::Frame(e),
    }
}

/// Decode one row frame.
fn decode_row(line: &[u8]) -> Result<Row> {
    let value: Value = serde_json::from_slice(line).map_err(ClientError::Frame)?;
    match value {
        Value::Array(row) => Ok(row),
        other if is_error_frame(&other) => Err(error_frame(other)),
        other => Err(DecodeError::mismatch("row", JsonKind::Array, &other).into()),
    }
}

/// Rows of a pull query, read from the network as they are polled.
///
/// Ends when the server closes the stream. The first failure (network, an
/// undecodable frame, or an error frame sent by the server) is yielded as an
/// `Err` and ends the stream. Dropping the stream releases the connection.
///
/// A stream has a single consumer; it is `Send` but not `Sync`.
pub struct RowStream {
    inner: BoxStream<'static, Result<Row>>,
}

impl RowStream {
    pub(crate) fn new(reader: FrameReader) -> Self {
        let inner = stream::try_unfold(reader, |mut reader| async move {
            match reader.next_line().await? {
                Some(line) => {
                    let row = decode_row(&line)?;
                    Ok(Some((row, reader)))
                }
                None => Ok::<_, ClientError>(None),
            }
        });

        Self {
            inner: Box::pin(inner),
        }
    }
}

impl Stream for RowStream {
    type Item = Result<Row>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for RowStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowStream").finish_non_exhaustive()
    }
}
