//! Dispatch server listener
//!
//! Handles the TCP accept loop and spawns connection handlers.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::dispatch::{DispatchConfig, Dispatcher};
use crate::error::Result;
use crate::notify::HandleId;
use crate::registry::Provider;
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;

/// Emergency dispatch signaling server
pub struct DispatchServer {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
    next_handle_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl DispatchServer {
    /// Create a new server with the given configuration and provider seed
    pub fn new(config: ServerConfig, dispatch: DispatchConfig, providers: Vec<Provider>) -> Self {
        Self::with_dispatcher(config, Arc::new(Dispatcher::new(dispatch, providers)))
    }

    /// Create a new server around an existing dispatcher
    pub fn with_dispatcher(config: ServerConfig, dispatcher: Arc<Dispatcher>) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            dispatcher,
            next_handle_id: AtomicU64::new(1),
            connection_semaphore,
        }
    }

    /// Get a reference to the dispatcher
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Dispatch server listening");

        // Ring-timeout sweep, if configured
        let _sweep_handle = self.dispatcher.spawn_sweep_task();

        self.accept_loop(&listener).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Dispatch server listening");

        let sweep_handle = self.dispatcher.spawn_sweep_task();

        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        };

        if let Some(handle) = sweep_handle {
            handle.abort();
        }

        result
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit; the permit lives as long as the connection
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let handle_id = HandleId(self.next_handle_id.fetch_add(1, Ordering::Relaxed));

        tracing::debug!(
            handle_id = %handle_id,
            peer = %peer_addr,
            "New connection"
        );

        if let Err(e) = self.configure_socket(&socket) {
            tracing::error!(error = %e, "Failed to configure socket");
            return;
        }

        let config = self.config.clone();
        let dispatcher = Arc::clone(&self.dispatcher);

        tokio::spawn(async move {
            let _permit = permit;
            let connection = Connection::new(handle_id, socket, peer_addr, config, dispatcher);

            if let Err(e) = connection.run().await {
                tracing::debug!(
                    handle_id = %handle_id,
                    error = %e,
                    "Connection error"
                );
            }

            tracing::debug!(handle_id = %handle_id, "Connection closed");
        });
    }

    fn configure_socket(&self, socket: &TcpStream) -> std::io::Result<()> {
        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }

        Ok(())
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    use super::*;
    use crate::geo::Location;
    use crate::registry::ProviderId;

    async fn start_server() -> (Arc<DispatchServer>, SocketAddr, tokio::task::JoinHandle<()>) {
        // Grab an ephemeral port for the server to bind
        let probe = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = probe.local_addr().unwrap();
        drop(probe);

        let server = Arc::new(DispatchServer::new(
            ServerConfig::with_addr(addr),
            DispatchConfig::default(),
            vec![Provider::doctor(
                "doc1",
                "Dr. Sarah Johnson",
                "Emergency Medicine",
                Location::new(40.7128, -74.006),
            )],
        ));

        let task = {
            let server = Arc::clone(&server);
            tokio::spawn(async move {
                let _ = server.run().await;
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        (server, addr, task)
    }

    #[tokio::test]
    async fn test_register_over_tcp() {
        let (server, addr, task) = start_server().await;

        let socket = TcpStream::connect(addr).await.unwrap();
        let (read_half, mut write_half) = socket.into_split();
        let mut reader = BufReader::new(read_half);

        // A malformed frame is dropped without killing the connection
        write_half.write_all(b"not json\n").await.unwrap();
        write_half
            .write_all(b"{\"event\":\"provider:register\",\"data\":{\"provider_id\":\"doc1\"}}\n")
            .await
            .unwrap();

        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert!(line.contains("provider:registered"));

        let provider = server
            .dispatcher()
            .registry()
            .get(&ProviderId::new("doc1"))
            .await
            .unwrap();
        assert!(provider.is_reachable());

        task.abort();
    }

    #[tokio::test]
    async fn test_disconnect_clears_registration() {
        let (server, addr, task) = start_server().await;

        let socket = TcpStream::connect(addr).await.unwrap();
        let (read_half, mut write_half) = socket.into_split();
        let mut reader = BufReader::new(read_half);

        write_half
            .write_all(b"{\"event\":\"provider:register\",\"data\":{\"provider_id\":\"doc1\"}}\n")
            .await
            .unwrap();
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();

        // Drop the socket; the server should clear the handle
        drop(write_half);
        drop(reader);
        tokio::time::sleep(Duration::from_millis(50)).await;

        let provider = server
            .dispatcher()
            .registry()
            .get(&ProviderId::new("doc1"))
            .await
            .unwrap();
        assert!(provider.handle.is_none());
        assert!(!provider.available);

        task.abort();
    }
}
