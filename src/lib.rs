//! hftpd - line-oriented file server
//!
//! Serves the entries of one directory over a plain-text TCP protocol:
//! listings, file sizes and base64-encoded byte ranges.

pub mod config;
pub mod error;
pub mod files;
pub mod protocol;
pub mod server;
