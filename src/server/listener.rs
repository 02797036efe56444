use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::http::connection::Session;
use crate::routing::RouteConfig;

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let routes = Arc::new(RouteConfig::from_config(cfg)?);
    let listener = TcpListener::bind(&cfg.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.server.listen_addr))?;
    info!("Listening on {}", cfg.server.listen_addr);

    serve(listener, routes, cfg.server.read_timeout()).await
}

/// Accepts connections forever, one task per connection.
///
/// `routes` must be fully built before this is called; sessions only read it.
pub async fn serve(
    listener: TcpListener,
    routes: Arc<RouteConfig>,
    read_timeout: Duration,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);

        let routes = Arc::clone(&routes);
        tokio::spawn(async move {
            let (reader, writer) = socket.into_split();
            let mut session = Session::new(reader, writer, routes, Some(read_timeout));
            if let Err(e) = session.run().await {
                tracing::error!("Connection error from {}: {:#}", peer, e);
            }
            tracing::debug!("Closed connection from {}", peer);
        });
    }
}
