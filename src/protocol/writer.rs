use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::CodecError;
use crate::protocol::status::Status;

/// Encodes outbound frames and pushes them fully onto the stream.
#[derive(Debug, Clone)]
pub struct FrameWriter {
    terminator: String,
}

impl FrameWriter {
    pub fn new(terminator: impl Into<String>) -> Self {
        Self {
            terminator: terminator.into(),
        }
    }

    pub fn terminator(&self) -> &str {
        &self.terminator
    }

    /// Writes `line` followed by the terminator. Characters outside ASCII
    /// are sent as `?`.
    pub async fn send_text<W>(&self, stream: &mut W, line: &str) -> Result<(), CodecError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = encode_ascii(line);
        buf.extend_from_slice(self.terminator.as_bytes());
        write_fully(stream, &buf).await
    }

    /// Writes the base64 encoding of `data`. No terminator is appended.
    pub async fn send_binary<W>(&self, stream: &mut W, data: &[u8]) -> Result<(), CodecError>
    where
        W: AsyncWrite + Unpin,
    {
        let encoded = BASE64_STANDARD.encode(data);
        write_fully(stream, encoded.as_bytes()).await
    }

    pub async fn send_status<W>(&self, stream: &mut W, status: Status) -> Result<(), CodecError>
    where
        W: AsyncWrite + Unpin,
    {
        self.send_text(stream, &status.to_string()).await
    }
}

fn encode_ascii(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect()
}

async fn write_fully<W>(stream: &mut W, mut buf: &[u8]) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin,
{
    while !buf.is_empty() {
        let n = stream.write(buf).await?;
        if n == 0 {
            return Err(CodecError::WriteZero);
        }
        buf = &buf[n..];
    }
    stream.flush().await?;
    Ok(())
}
