//! Server configuration.
//!
//! Values come from an optional YAML file named by `HFTPD_CONFIG`, then the
//! `LISTEN` and `HFTPD_ROOT` environment variables override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

pub const CONFIG_ENV: &str = "HFTPD_CONFIG";
pub const LISTEN_ENV: &str = "LISTEN";
pub const ROOT_ENV: &str = "HFTPD_ROOT";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub protocol: ProtocolConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind, e.g. `127.0.0.1:19500`
    pub listen_addr: String,
    /// Directory whose entries are served
    pub root: PathBuf,
    /// Upper bound on concurrently served connections; unbounded when absent
    pub max_connections: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:19500".to_string(),
            root: PathBuf::from("testdata"),
            max_connections: None,
        }
    }
}

/// Framing and transfer limits applied to every session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Line terminator, both directions
    pub terminator: String,
    /// Maximum bytes pulled from the socket per read
    pub read_block_size: usize,
    /// Unterminated bytes tolerated before the session is dropped
    pub max_buffer_size: usize,
    /// Largest file chunk encoded into a single slice frame
    pub slice_chunk_size: usize,
    /// Idle limit while waiting for a request; `None` waits forever
    pub read_timeout_secs: Option<u64>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            terminator: "\r\n".to_string(),
            read_block_size: 4096,
            max_buffer_size: 64 * 1024,
            slice_chunk_size: 4096,
            read_timeout_secs: None,
        }
    }
}

impl ProtocolConfig {
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Builds the configuration from the process environment.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with a custom variable lookup.
    pub fn load_with<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match lookup(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(addr) = lookup(LISTEN_ENV) {
            cfg.server.listen_addr = addr;
        }
        if let Some(root) = lookup(ROOT_ENV) {
            cfg.server.root = PathBuf::from(root);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&contents)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_yaml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let p = &self.protocol;
        if p.terminator.is_empty() {
            bail!("protocol.terminator must not be empty");
        }
        if !p.terminator.is_ascii() {
            bail!("protocol.terminator must be ASCII");
        }
        if p.read_block_size == 0 {
            bail!("protocol.read_block_size must be positive");
        }
        if p.slice_chunk_size == 0 {
            bail!("protocol.slice_chunk_size must be positive");
        }
        if p.max_buffer_size < p.terminator.len() {
            bail!("protocol.max_buffer_size is smaller than the terminator");
        }
        if self.server.max_connections == Some(0) {
            bail!("server.max_connections must be positive when set");
        }
        Ok(())
    }
}
