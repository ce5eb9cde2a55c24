//! Test utilities for qka-client
//!
//! Runs a gateway router on an ephemeral local port so tests can drive it
//! through a real [`QkaClient`].

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::{QkaClient, QkaClientError, Result};

/// A test server that shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: QkaClient,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve `router` and build a client holding `token`
    ///
    /// ```ignore
    /// use qka_api::{create_router, AppState};
    /// use qka_client::testing::TestServer;
    ///
    /// let server = TestServer::start(create_router(state), "test-token").await?;
    /// let ops = server.client.list_operations().await?;
    /// ```
    pub async fn start(router: axum::Router, token: &str) -> Result<Self> {
        Self::start_with_timeout(router, token, Duration::from_secs(5), Duration::from_secs(2))
            .await
    }

    pub async fn start_with_timeout(
        router: axum::Router,
        token: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| QkaClientError::Transport(e.to_string()))?;
        let addr = listener
            .local_addr()
            .map_err(|e| QkaClientError::Transport(e.to_string()))?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        let client = QkaClient::with_config(&format!("http://{}", addr), token, timeout, connect_timeout)?;

        Ok(Self {
            addr,
            client,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A second client against the same server, e.g. with a different token
    pub fn client_with_token(&self, token: &str) -> Result<QkaClient> {
        QkaClient::new(&self.base_url(), token)
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
