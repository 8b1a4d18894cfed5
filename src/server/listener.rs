use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::handler::Dispatcher;
use crate::http::connection::{Connection, ConnectionSettings};

/// Accepts connections and serves each one on its own task.
pub struct Listener {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    settings: ConnectionSettings,
}

impl Listener {
    pub async fn bind(cfg: &Config, dispatcher: Arc<Dispatcher>) -> anyhow::Result<Self> {
        let addr = cfg.server.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("binding {addr}"))?;

        Ok(Self {
            listener,
            dispatcher,
            settings: cfg.server.connection_settings(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop. Only returns if the local address is lost.
    pub async fn run(self) -> anyhow::Result<()> {
        let local = self.local_addr()?;
        info!("Server started on {}:{}", local.ip(), local.port());

        loop {
            let (socket, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    // e.g. EMFILE; the listener itself is still usable
                    tracing::warn!(error = %e, "accept failed");
                    continue;
                }
            };
            info!("Connection from {}", peer);

            let dispatcher = Arc::clone(&self.dispatcher);
            let settings = self.settings;
            tokio::spawn(async move {
                let mut conn = Connection::new(socket, peer, dispatcher, settings);
                if let Err(e) = conn.run().await {
                    tracing::error!("Connection error from {}: {}", peer, e);
                }
            });
        }
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("local_addr", &self.listener.local_addr().ok())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Binds according to `cfg` and serves forever.
pub async fn run(cfg: &Config, dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    Listener::bind(cfg, dispatcher).await?.run().await
}
