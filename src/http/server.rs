//! HTTP server.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::Result;

/// HTTP server for the Promptshare API.
pub struct HttpServer {
    listener: TcpListener,
    router: Router,
}

impl HttpServer {
    /// Bind the listen address.
    pub async fn bind(addr: SocketAddr, router: Router) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            error!(addr = %addr, error = %e, "Failed to bind HTTP listener");
            e
        })?;
        Ok(Self { listener, router })
    }

    /// The bound address; useful when binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the provided signal resolves, then drain in-flight requests.
    ///
    /// Peer addresses are exposed to the gates through `ConnectInfo`.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(addr = %self.local_addr()?, "Starting HTTP server with graceful shutdown");

        axum::serve(
            self.listener,
            self.router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .await
        .map_err(|e| {
            error!(error = %e, "HTTP server failed");
            e
        })?;

        Ok(())
    }
}
