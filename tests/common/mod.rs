#![allow(dead_code)]

use std::path::Path;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use hftpd::config::ProtocolConfig;
use hftpd::protocol::connection::{Connection, SessionContext};
use tempfile::TempDir;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream, ReadHalf,
    WriteHalf,
};
use tokio::task::JoinHandle;

/// Creates a temporary served directory holding `files`.
pub fn served_dir(files: &[(&str, &[u8])]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        std::fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

/// Deterministic non-text payload, including CR and LF bytes.
pub fn binary_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 256) as u8).collect()
}

pub fn context(root: &Path, protocol: ProtocolConfig) -> SessionContext {
    SessionContext::new(root, protocol)
}

/// Runs one session over an in-memory pipe.
pub fn spawn_session(
    ctx: SessionContext,
) -> (TestClient<DuplexStream>, JoinHandle<anyhow::Result<()>>) {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let handle = tokio::spawn(async move {
        let mut conn = Connection::new(server, &ctx);
        conn.run().await
    });
    (TestClient::new(client), handle)
}

/// Minimal protocol client used by the integration tests.
pub struct TestClient<S> {
    reader: BufReader<ReadHalf<S>>,
    writer: WriteHalf<S>,
}

impl<S> TestClient<S>
where
    S: AsyncRead + AsyncWrite,
{
    pub fn new(stream: S) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    pub async fn send(&mut self, line: &str) {
        self.send_raw(format!("{line}\r\n").as_bytes()).await;
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Next line without its terminator, or `None` once the server closed.
    pub async fn line(&mut self) -> Option<String> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await.unwrap();
        if n == 0 {
            return None;
        }
        Some(line.trim_end_matches(['\r', '\n']).to_string())
    }

    pub async fn status(&mut self) -> String {
        self.line().await.expect("server closed before sending a status")
    }

    /// Reads lines up to the empty line closing a listing.
    pub async fn listing(&mut self) -> Vec<String> {
        let mut names = Vec::new();
        loop {
            let line = self.line().await.expect("listing cut short");
            if line.is_empty() {
                return names;
            }
            names.push(line);
        }
    }

    /// Decodes base64 frames up to the empty frame closing a slice.
    pub async fn slice(&mut self) -> Vec<u8> {
        let mut data = Vec::new();
        loop {
            let line = self.line().await.expect("slice cut short");
            if line.is_empty() {
                return data;
            }
            data.extend(BASE64_STANDARD.decode(line.as_bytes()).unwrap());
        }
    }

    /// Frames of a slice, still encoded.
    pub async fn slice_frames(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        loop {
            let line = self.line().await.expect("slice cut short");
            if line.is_empty() {
                return frames;
            }
            frames.push(line);
        }
    }

    pub async fn expect_closed(&mut self) {
        assert_eq!(self.line().await, None, "server should have closed the connection");
    }
}
