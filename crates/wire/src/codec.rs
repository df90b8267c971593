// SPDX-License-Identifier: MIT

//! Length-free streaming JSON framing: concatenated JSON objects,
//! UTF-8. This replaces a 4-byte length-prefix scheme — a deliberate
//! redesign, not an oversight; see `DESIGN.md`.
//!
//! A [`FrameReader`] buffers raw bytes and repeatedly attempts to parse
//! one JSON value via [`serde_json::Deserializer::from_slice`]; an
//! `UnexpectedEof` decode error just means "read more bytes," not a
//! protocol violation, since a message may arrive split across reads.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("connection closed mid-message")]
    Closed,
}

const READ_CHUNK: usize = 8192;

/// Buffered reader that yields one JSON value at a time from a stream of
/// concatenated JSON objects.
pub struct FrameReader<R> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, buf: Vec::with_capacity(READ_CHUNK), pos: 0 }
    }

    /// Reads the next complete JSON value, or `Ok(None)` on a clean EOF
    /// between messages (no bytes buffered, no partial message pending).
    pub async fn read_message<T: DeserializeOwned>(&mut self) -> Result<Option<T>, ProtocolError> {
        loop {
            if self.pos < self.buf.len() {
                let mut stream =
                    serde_json::Deserializer::from_slice(&self.buf[self.pos..]).into_iter::<T>();
                match stream.next() {
                    Some(Ok(value)) => {
                        self.pos += stream.byte_offset();
                        self.compact();
                        return Ok(Some(value));
                    }
                    Some(Err(e)) if e.is_eof() => {
                        // Partial message: fall through and read more.
                    }
                    Some(Err(e)) => return Err(ProtocolError::Decode(e)),
                    None => {
                        // Only whitespace buffered; need more bytes.
                    }
                }
            }

            let mut chunk = [0u8; READ_CHUNK];
            let n = self.inner.read(&mut chunk).await?;
            if n == 0 {
                return if self.pos == self.buf.len() {
                    Ok(None)
                } else {
                    Err(ProtocolError::Closed)
                };
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Probes the underlying stream for EOF without consuming a message.
    /// Used to detect a client disconnect while a handler is blocked on
    /// something other than `read_message` (e.g. waiting on an ask's
    /// answer). Any byte actually read is pushed back onto the buffer so
    /// it's not lost if the client wasn't actually closing.
    pub async fn closed(&mut self) -> bool {
        let mut byte = [0u8; 1];
        match self.inner.read(&mut byte).await {
            Ok(0) => true,
            Ok(n) => {
                self.buf.extend_from_slice(&byte[..n]);
                false
            }
            Err(_) => true,
        }
    }

    fn compact(&mut self) {
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
    }
}

/// Serializes `value` and writes it to `writer`. No length prefix and no
/// separator between messages — consecutive writes just concatenate,
/// which is exactly what [`FrameReader`] expects on the other end.
pub async fn write_message<T, W>(writer: &mut W, value: &T) -> Result<(), ProtocolError>
where
    T: Serialize,
    W: AsyncWrite + Unpin,
{
    let bytes = serde_json::to_vec(value)?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
