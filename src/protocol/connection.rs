use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::config::ProtocolConfig;
use crate::error::{CodecError, DispatchError};
use crate::files::FileStore;
use crate::protocol::codec::LineReader;
use crate::protocol::command::Request;
use crate::protocol::status::Status;
use crate::protocol::writer::FrameWriter;

/// Immutable settings handed to every session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub store: FileStore,
    pub protocol: Arc<ProtocolConfig>,
}

impl SessionContext {
    pub fn new(root: impl Into<PathBuf>, protocol: ProtocolConfig) -> Self {
        Self {
            store: FileStore::new(root),
            protocol: Arc::new(protocol),
        }
    }
}

pub struct Connection<S> {
    stream: S,
    reader: LineReader,
    writer: FrameWriter,
    store: FileStore,
    chunk_size: usize,
    state: ConnectionState,
}

#[derive(Debug)]
enum ConnectionState {
    Reading,
    Dispatching(String),
    /// Optional last status to send before the socket goes away
    Closing(Option<Status>),
    Closed,
}

enum Flow {
    Continue,
    Quit,
    /// The response was cut short after `0 OK`; the framing cannot be resumed
    Abort,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, ctx: &SessionContext) -> Self {
        Self {
            stream,
            reader: LineReader::new(&ctx.protocol),
            writer: FrameWriter::new(ctx.protocol.terminator.clone()),
            store: ctx.store.clone(),
            chunk_size: ctx.protocol.slice_chunk_size,
            state: ConnectionState::Reading,
        }
    }

    /// Serves requests until the client quits, breaks framing or the
    /// transport fails. The stream is shut down on every path.
    ///
    /// Only unexpected transport failures come back as `Err`; peer
    /// disconnects and idle timeouts end the session quietly.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let result = self.drive().await;
        self.close().await;

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_disconnect() => {
                debug!(error = %e, "Peer disconnected");
                Ok(())
            }
            Err(CodecError::Timeout(limit)) => {
                info!(timeout = ?limit, "Closing idle connection");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn drive(&mut self) -> Result<(), CodecError> {
        loop {
            // a `?` below leaves the state at Closed
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);

            self.state = match state {
                ConnectionState::Reading => self.read_request().await?,

                ConnectionState::Dispatching(line) => self.handle_line(&line).await?,

                ConnectionState::Closing(farewell) => {
                    if let Some(status) = farewell {
                        self.writer.send_status(&mut self.stream, status).await?;
                    }
                    ConnectionState::Closed
                }

                ConnectionState::Closed => break,
            };
        }

        Ok(())
    }

    async fn read_request(&mut self) -> Result<ConnectionState, CodecError> {
        let raw = match self.reader.read_line(&mut self.stream).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Client closed connection");
                return Ok(ConnectionState::Closed);
            }
            Err(e) => {
                return match e.status() {
                    Some(status) => {
                        warn!(error = %e, "Rejecting unreadable request");
                        Ok(ConnectionState::Closing(Some(status)))
                    }
                    None => Err(e),
                };
            }
        };

        if raw.contains('\n') {
            warn!("Request line contains a bare line feed");
            return Ok(ConnectionState::Closing(Some(Status::BadEol)));
        }

        let line = raw.trim();
        if line.is_empty() {
            return Ok(ConnectionState::Reading);
        }
        Ok(ConnectionState::Dispatching(line.to_string()))
    }

    async fn handle_line(&mut self, line: &str) -> Result<ConnectionState, CodecError> {
        match self.dispatch(line).await {
            Ok(Flow::Continue) => Ok(ConnectionState::Reading),
            Ok(Flow::Quit) => Ok(ConnectionState::Closed),
            Ok(Flow::Abort) => Ok(ConnectionState::Closing(None)),
            Err(DispatchError::Transport(e)) => Err(e),
            Err(e) => {
                let status = e.status().unwrap_or(Status::InternalError);
                if status == Status::InternalError {
                    error!(request = line, error = %e, "Request failed");
                } else {
                    debug!(request = line, status = status.code(), error = %e, "Request rejected");
                }
                self.writer.send_status(&mut self.stream, status).await?;
                Ok(ConnectionState::Reading)
            }
        }
    }

    async fn dispatch(&mut self, line: &str) -> Result<Flow, DispatchError> {
        let request = Request::parse(line)?;
        debug!(command = request.name().as_str(), "Dispatching request");

        match request {
            Request::Quit => {
                self.send_ok().await?;
                Ok(Flow::Quit)
            }
            Request::GetFileListing => {
                self.get_file_listing().await?;
                Ok(Flow::Continue)
            }
            Request::GetMetadata { filename } => {
                self.get_metadata(&filename).await?;
                Ok(Flow::Continue)
            }
            Request::GetSlice {
                filename,
                offset,
                size,
            } => self.get_slice(&filename, offset, size).await,
        }
    }

    async fn get_file_listing(&mut self) -> Result<(), DispatchError> {
        let names = self.store.list().await?;
        self.send_ok().await?;

        let terminator = self.writer.terminator();
        let mut body = String::new();
        for name in &names {
            body.push_str(name);
            body.push_str(terminator);
        }
        // send_text closes the listing with an empty line
        self.writer.send_text(&mut self.stream, &body).await?;

        debug!(entries = names.len(), "Sent file listing");
        Ok(())
    }

    async fn get_metadata(&mut self, filename: &str) -> Result<(), DispatchError> {
        let size = self.store.size_of(filename).await?;
        self.send_ok().await?;
        self.writer
            .send_text(&mut self.stream, &size.to_string())
            .await?;

        debug!(file = filename, bytes = size, "Sent metadata");
        Ok(())
    }

    /// Streams the range after `0 OK`. A read failure past that point
    /// cannot be reported in-band, so it aborts the session instead.
    async fn get_slice(
        &mut self,
        filename: &str,
        offset: i64,
        size: i64,
    ) -> Result<Flow, DispatchError> {
        let mut slice = self
            .store
            .open_slice(filename, offset, size, self.chunk_size)
            .await?;
        self.send_ok().await?;

        let mut sent: u64 = 0;
        loop {
            let chunk = match slice.next_chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    error!(file = filename, offset, bytes = sent, error = %e, "Slice read failed");
                    return Ok(Flow::Abort);
                }
            };
            self.writer.send_binary(&mut self.stream, chunk).await?;
            self.writer.send_text(&mut self.stream, "").await?;
            sent += chunk.len() as u64;
        }
        self.writer.send_text(&mut self.stream, "").await?;

        debug!(file = filename, offset, bytes = sent, "Sent slice");
        Ok(Flow::Continue)
    }

    async fn send_ok(&mut self) -> Result<(), CodecError> {
        self.writer.send_status(&mut self.stream, Status::Ok).await
    }

    async fn close(&mut self) {
        self.state = ConnectionState::Closed;
        if let Err(e) = self.stream.shutdown().await {
            debug!(error = %e, "Error while closing connection");
        }
    }
}
