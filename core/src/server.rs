//! Main chat server implementation

use crate::config::Environment;
use crate::connection::ConnectionHandler;
use crate::router::Router;
use crate::state::ChatState;
use crate::{Config, Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Main chat server
pub struct Server {
    /// Server configuration
    config: Arc<Config>,
    /// Session and channel registries, one lock for both
    state: Arc<Mutex<ChatState>>,
    /// Command router, fixed once the server is built
    router: Arc<Router>,
}

impl Server {
    /// Create a new server instance around a fully wired router
    pub fn new(config: Config, router: Router) -> Self {
        let state = ChatState::new(&config.session);
        Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(state)),
            router: Arc::new(router),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared chat state
    pub fn state(&self) -> Arc<Mutex<ChatState>> {
        self.state.clone()
    }

    /// Handler for serving individual connections
    pub fn connection_handler(&self) -> ConnectionHandler {
        ConnectionHandler::new(self.config.clone(), self.state.clone(), self.router.clone())
    }

    /// Bind the listener for the given environment
    pub async fn bind(&self, environment: Environment) -> Result<TcpListener> {
        let address = self.config.listen_address(environment);
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| Error::Connection(format!("Failed to bind {}: {}", address, e)))?;
        tracing::info!(
            "{} listening on {} ({:?})",
            self.config.server.name,
            listener.local_addr()?,
            environment
        );
        Ok(listener)
    }

    /// Start the server
    pub async fn start(&self, environment: Environment) -> Result<()> {
        let listener = self.bind(environment).await?;
        self.serve(listener).await
    }

    /// Accept connections forever, one task per client
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let handler = self.connection_handler();
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handler.handle_connection(stream, addr.to_string()).await {
                            tracing::error!("Error handling connection from {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}
