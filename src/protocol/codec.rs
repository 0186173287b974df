use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::ProtocolConfig;
use crate::error::CodecError;

/// Splits an incoming byte stream into terminator-delimited request lines.
///
/// Bytes stay in the buffer untouched until a complete terminator has been
/// seen; only then is the prefix checked and decoded as ASCII.
pub struct LineReader {
    buffer: BytesMut,
    terminator: Vec<u8>,
    block_size: usize,
    max_buffer: usize,
    timeout: Option<Duration>,
}

impl LineReader {
    pub fn new(settings: &ProtocolConfig) -> Self {
        Self {
            buffer: BytesMut::with_capacity(settings.read_block_size),
            terminator: settings.terminator.as_bytes().to_vec(),
            block_size: settings.read_block_size,
            max_buffer: settings.max_buffer_size,
            timeout: settings.read_timeout(),
        }
    }

    /// Bytes received but not yet returned as part of a line.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Reads until one full line is buffered and returns it without the
    /// terminator and without trimming.
    ///
    /// Returns `Ok(None)` when the peer closes the stream before a
    /// terminator arrives; whatever partial line was buffered is dropped.
    pub async fn read_line<R>(&mut self, reader: &mut R) -> Result<Option<String>, CodecError>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            if let Some(line) = self.take_line()? {
                return Ok(Some(line));
            }

            if self.buffer.len() > self.max_buffer {
                return Err(CodecError::Overflow {
                    len: self.buffer.len(),
                    limit: self.max_buffer,
                });
            }

            if self.fill(reader).await? == 0 {
                return Ok(None);
            }
        }
    }

    /// Pops the first complete line off the buffer, if there is one.
    pub fn take_line(&mut self) -> Result<Option<String>, CodecError> {
        let Some(pos) = find_terminator(&self.buffer, &self.terminator) else {
            return Ok(None);
        };

        let line = self.buffer.split_to(pos);
        self.buffer.advance(self.terminator.len());

        if !line.is_ascii() {
            return Err(CodecError::NotAscii);
        }
        String::from_utf8(line.to_vec())
            .map(Some)
            .map_err(|_| CodecError::NotAscii)
    }

    async fn fill<R>(&mut self, reader: &mut R) -> Result<usize, CodecError>
    where
        R: AsyncRead + Unpin,
    {
        self.buffer.reserve(self.block_size);
        let mut block = (&mut *reader).take(self.block_size as u64);
        let read = block.read_buf(&mut self.buffer);

        let n = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .map_err(|_| CodecError::Timeout(limit))??,
            None => read.await?,
        };
        Ok(n)
    }
}

fn find_terminator(buf: &[u8], terminator: &[u8]) -> Option<usize> {
    if terminator.is_empty() || buf.len() < terminator.len() {
        return None;
    }
    buf.windows(terminator.len()).position(|w| w == terminator)
}
