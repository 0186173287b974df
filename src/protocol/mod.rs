//! File-serving line protocol.
//!
//! Clients send one ASCII command per line and receive a status line
//! (`<code> <message>`) followed, on success, by the payload for that
//! command.
//!
//! # Architecture
//!
//! - **`codec`**: splits the inbound byte stream into request lines
//! - **`writer`**: writes text lines and base64 frames back to the client
//! - **`command`**: parses a request line into a typed [`command::Request`]
//! - **`status`**: the code/message table
//! - **`connection`**: the per-client state machine tying them together
//!
//! # Commands
//!
//! | request | success payload |
//! |---|---|
//! | `QUIT` | none, then the server closes |
//! | `GET_FILE_LISTING` | one name per line, then an empty line |
//! | `GET_METADATA <file>` | size in bytes as one decimal line |
//! | `GET_SLICE <file> <offset> <size>` | base64 lines, then an empty line |
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for a full line
//!        └──────┬──────┘
//!               │ Line received
//!               ├─ bare LF / garbage → Closing
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatching    │ ← Parse, run, write response
//!        └──────┬───────────┘
//!               ├─ error status → Reading
//!               ├─ done → Reading
//!               └─ QUIT → Closed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use hftpd::protocol::connection::{Connection, SessionContext};
//! use hftpd::config::ProtocolConfig;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = SessionContext::new("testdata", ProtocolConfig::default());
//!     let listener = TcpListener::bind("127.0.0.1:19500").await?;
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         let ctx = ctx.clone();
//!         tokio::spawn(async move {
//!             let mut conn = Connection::new(socket, &ctx);
//!             if let Err(e) = conn.run().await {
//!                 tracing::error!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod codec;
pub mod command;
pub mod connection;
pub mod status;
pub mod writer;
