//! WebSocket Server - one session per viewer
//!
//! # Architecture
//!
//! ```text
//! Broker --[IdeMessage]--> Subscription --> session --[JSON]--> viewer
//!                                              ^                  |
//!                                              +-----[close]------+
//! ```
//!
//! Viewers only listen. Anything they send is read and ignored, except for
//! the close that ends their session.

mod session;

use std::io;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use session::run_session;

use super::broker::Registry;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("websocket handshake failed")]
    Handshake(#[source] tungstenite::Error),

    #[error("websocket transport failed")]
    Transport(#[from] tungstenite::Error),
}

/// Live-update server bound to a single address.
pub struct WsServer {
    listener: TcpListener,
    registry: Registry,
}

impl WsServer {
    /// Bind `addr`; failure is a setup error.
    pub async fn bind(addr: SocketAddr, registry: Registry) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, registry })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop; every connection gets its own session task.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    crate::debug!("ws"; "connection from {}", peer);
                    let registry = self.registry.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_viewer(stream, peer, &registry).await {
                            crate::log!("ws"; "viewer {}: {:#}", peer, anyhow::Error::new(e));
                        }
                    });
                }
                Err(e) => {
                    crate::log!("ws"; "accept error: {}", e);
                }
            }
        }
    }
}

async fn serve_viewer(
    stream: TcpStream,
    peer: SocketAddr,
    registry: &Registry,
) -> Result<(), SessionError> {
    let socket = tokio_tungstenite::accept_async(stream)
        .await
        .map_err(SessionError::Handshake)?;
    run_session(socket, registry, &peer.to_string()).await
}
