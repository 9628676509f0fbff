//! One viewer connection.
//!
//! ```text
//! Connecting --ack--> Registered --msg--> Delivering --+
//!                         ^                            |
//!                         +----------------------------+
//!                         |
//!                      closed --> Unregistering --> Closed
//! ```
//!
//! Unregistering is the [`Subscription`] drop, so it runs exactly once on
//! every way out of [`run_session`], errors included.

use std::future::Future;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tungstenite::protocol::Message;

use super::SessionError;
use crate::actor::broker::{Registry, Subscription};
use crate::actor::messages::{IdeMessage, InfoMessage};

/// What the remote side did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketEvent {
    /// Closed cleanly or dropped; both end the session the same way.
    Closed,
    /// Anything else a viewer sends; viewers have nothing to say.
    Other,
}

/// Transport seen by a session.
pub trait ViewerSocket: Send {
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Must be cancel safe: the session races it against broadcasts.
    fn recv_event(&mut self) -> impl Future<Output = SocketEvent> + Send;
}

impl<S> ViewerSocket for WebSocketStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_text(&mut self, text: String) -> Result<(), SessionError> {
        self.send(Message::Text(text.into())).await?;
        Ok(())
    }

    async fn recv_event(&mut self) -> SocketEvent {
        match self.next().await {
            None | Some(Ok(Message::Close(_))) => SocketEvent::Closed,
            Some(Err(e)) => {
                crate::debug!("ws"; "read failed: {}", e);
                SocketEvent::Closed
            }
            Some(Ok(_)) => SocketEvent::Other,
        }
    }
}

enum Wake {
    Broadcast(Option<IdeMessage>),
    Remote(SocketEvent),
}

/// Serve one viewer until it goes away.
///
/// Also returns when the broker stops, since nothing more can arrive.
pub async fn run_session<S: ViewerSocket>(
    mut socket: S,
    registry: &Registry,
    peer: &str,
) -> Result<(), SessionError> {
    socket.send_text(InfoMessage::connected().to_json()).await?;

    let mut subscription: Subscription = registry.register();
    crate::log!("ws"; "viewer {} connected as {}", peer, subscription.id());

    loop {
        let wake = tokio::select! {
            msg = subscription.recv() => Wake::Broadcast(msg),
            event = socket.recv_event() => Wake::Remote(event),
        };

        match wake {
            Wake::Broadcast(Some(msg)) => socket.send_text(msg.to_json()).await?,
            Wake::Broadcast(None) => {
                crate::debug!("ws"; "broker stopped, closing {}", subscription.id());
                break;
            }
            Wake::Remote(SocketEvent::Closed) => {
                crate::log!("ws"; "viewer {} ({}) disconnected", peer, subscription.id());
                break;
            }
            Wake::Remote(SocketEvent::Other) => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::mpsc;

    use super::*;
    use crate::actor::within_deadline;
    use crate::actor::messages::MessageKind;

    /// In-memory socket: sent frames go to `sent`, remote events come from
    /// `events`; dropping the events sender acts like an abrupt hang-up.
    struct FakeSocket {
        sent: mpsc::UnboundedSender<String>,
        events: mpsc::UnboundedReceiver<SocketEvent>,
        /// Sends allowed before the transport fails.
        budget: Arc<AtomicUsize>,
    }

    impl ViewerSocket for FakeSocket {
        async fn send_text(&mut self, text: String) -> Result<(), SessionError> {
            let left = self.budget.load(Ordering::SeqCst);
            if left == 0 {
                return Err(tungstenite::Error::ConnectionClosed.into());
            }
            self.budget.store(left - 1, Ordering::SeqCst);
            let _ = self.sent.send(text);
            Ok(())
        }

        async fn recv_event(&mut self) -> SocketEvent {
            self.events.recv().await.unwrap_or(SocketEvent::Closed)
        }
    }

    struct Remote {
        sent: mpsc::UnboundedReceiver<String>,
        events: mpsc::UnboundedSender<SocketEvent>,
    }

    fn fake_socket(budget: usize) -> (FakeSocket, Remote) {
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let socket = FakeSocket {
            sent: sent_tx,
            events: events_rx,
            budget: Arc::new(AtomicUsize::new(budget)),
        };
        let remote = Remote {
            sent: sent_rx,
            events: events_tx,
        };
        (socket, remote)
    }

    async fn wait_registered(registry: &Registry, count: usize) {
        within_deadline(async {
            while registry.len() != count {
                tokio::task::yield_now().await;
            }
        })
        .await;
    }

    /// Deliver one message to every registered subscriber, like the broker.
    async fn broadcast(registry: &Registry, msg: IdeMessage) {
        let (tx, rx) = mpsc::channel(1);
        let broker = tokio::spawn(crate::actor::broker::Broker::new(rx, registry.clone()).run());
        tx.send(msg).await.unwrap();
        drop(tx);
        broker.await.unwrap();
    }

    #[tokio::test]
    async fn test_ack_then_delivery_then_clean_close() {
        let registry = Registry::new();
        let (socket, mut remote) = fake_socket(usize::MAX);
        let reg = registry.clone();
        let session = tokio::spawn(async move { run_session(socket, &reg, "test").await });

        assert_eq!(
            within_deadline(remote.sent.recv()).await.unwrap(),
            r#"{"kind":"info","message":"connected"}"#
        );
        wait_registered(&registry, 1).await;

        let msg = IdeMessage::new("boing", MessageKind::Program, "import pytch\n");
        broadcast(&registry, msg.clone()).await;
        assert_eq!(within_deadline(remote.sent.recv()).await.unwrap(), msg.to_json());

        remote.events.send(SocketEvent::Closed).unwrap();
        session.await.unwrap().unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_abrupt_hang_up_unregisters() {
        let registry = Registry::new();
        let (socket, remote) = fake_socket(usize::MAX);
        let reg = registry.clone();
        let session = tokio::spawn(async move { run_session(socket, &reg, "test").await });
        wait_registered(&registry, 1).await;

        drop(remote);
        session.await.unwrap().unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_mid_delivery_unregisters() {
        let registry = Registry::new();
        // the ack goes through, the first broadcast fails
        let (socket, _remote) = fake_socket(1);
        let reg = registry.clone();
        let session = tokio::spawn(async move { run_session(socket, &reg, "test").await });
        wait_registered(&registry, 1).await;

        broadcast(&registry, IdeMessage::new("boing", MessageKind::Program, "")).await;
        let result = session.await.unwrap();
        assert!(matches!(result, Err(SessionError::Transport(_))));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_failed_ack_never_registers() {
        let registry = Registry::new();
        let (socket, _remote) = fake_socket(0);

        assert!(run_session(socket, &registry, "test").await.is_err());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_viewer_chatter_is_ignored() {
        let registry = Registry::new();
        let (socket, mut remote) = fake_socket(usize::MAX);
        let reg = registry.clone();
        let session = tokio::spawn(async move { run_session(socket, &reg, "test").await });
        within_deadline(remote.sent.recv()).await.unwrap();
        wait_registered(&registry, 1).await;

        remote.events.send(SocketEvent::Other).unwrap();
        broadcast(&registry, IdeMessage::new("zap", MessageKind::Narrative, "<div></div>")).await;
        assert!(within_deadline(remote.sent.recv()).await.unwrap().contains(r#""tutorial_name":"zap""#));
        assert_eq!(registry.len(), 1);

        drop(remote.events);
        session.await.unwrap().unwrap();
    }
}
