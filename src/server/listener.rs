use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{Instrument, info, info_span, warn};

use crate::config::Config;
use crate::protocol::connection::{Connection, SessionContext};

/// Pause after a failed accept so a persistent error (e.g. out of file
/// descriptors) does not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accepts clients and hands each one to its own session task.
pub struct Listener {
    listener: TcpListener,
    ctx: SessionContext,
    limit: Option<Arc<Semaphore>>,
}

impl Listener {
    pub async fn bind(cfg: &Config) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(&cfg.server.listen_addr).await?;
        let ctx = SessionContext::new(cfg.server.root.clone(), cfg.protocol.clone());
        Ok(Self::new(listener, ctx, cfg.server.max_connections))
    }

    pub fn new(listener: TcpListener, ctx: SessionContext, max_connections: Option<usize>) -> Self {
        Self {
            listener,
            ctx,
            limit: max_connections.map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts one connection and spawns its session without waiting for it.
    ///
    /// With a connection limit configured, this first waits for a free slot.
    pub async fn accept_one(&self) -> io::Result<(SocketAddr, JoinHandle<()>)> {
        let permit = match &self.limit {
            Some(limit) => Some(limit.clone().acquire_owned().await.map_err(io::Error::other)?),
            None => None,
        };

        let (socket, peer) = self.listener.accept().await?;
        info!("Accepted connection from {}", peer);

        let ctx = self.ctx.clone();
        let session = async move {
            let _permit = permit;
            let mut conn = Connection::new(socket, &ctx);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
            info!("Connection closed");
        };

        let handle = tokio::spawn(session.instrument(info_span!("session", %peer)));
        Ok((peer, handle))
    }

    /// Runs the accept loop forever. Accept failures are logged and retried.
    pub async fn serve(self) -> anyhow::Result<()> {
        loop {
            if let Err(e) = self.accept_one().await {
                warn!(error = %e, "Failed to accept connection");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = Listener::bind(cfg).await?;
    info!(
        root = %cfg.server.root.display(),
        "Listening on {}", cfg.server.listen_addr
    );

    listener.serve().await
}
