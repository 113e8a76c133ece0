//! TCP listener for the feed endpoint.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::FeedService;
use crate::routes::router;

/// HTTP server serving calendar feeds.
pub struct HttpServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl HttpServer {
    /// Binds to the address in `config`.
    pub async fn bind(config: &ServerConfig) -> ServerResult<Self> {
        let listener = TcpListener::bind(config.bind).await?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "HTTP server listening");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Returns the bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves requests until `shutdown` completes, then waits for in-flight
    /// requests to finish.
    pub async fn run_until_shutdown<S>(self, service: FeedService, shutdown: S) -> ServerResult<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, router(service))
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("HTTP server stopped");
        Ok(())
    }
}
