//! Broker - fans every message out to all registered viewers.
//!
//! ```text
//! CompilerActor --IdeMessage--> Broker --+--> session 1000
//!                                        +--> session 1001
//!                                        +--> ...
//! ```
//!
//! Sessions register through the shared [`Registry`] and hold a
//! [`Subscription`]; dropping it unregisters, whatever way the session ends.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::CHANNEL_BUFFER;
use super::messages::IdeMessage;

/// First id handed out; ids are never reused within a run.
const FIRST_SUBSCRIBER_ID: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct RegistryInner {
    next_id: u64,
    /// Ordered by id, so delivery follows registration order.
    outbound: BTreeMap<SubscriberId, mpsc::Sender<IdeMessage>>,
}

/// Subscriber registry shared by the broker and every session.
///
/// The lock is never held across an `.await`.
#[derive(Debug, Clone)]
pub struct Registry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                next_id: FIRST_SUBSCRIBER_ID,
                outbound: BTreeMap::new(),
            })),
        }
    }

    /// Allocate a fresh id and outbound channel.
    pub fn register(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
        let id = {
            let mut inner = self.inner.lock();
            let id = SubscriberId(inner.next_id);
            inner.next_id += 1;
            inner.outbound.insert(id, tx);
            id
        };
        crate::debug!("broker"; "registered {} (total: {})", id, self.len());

        Subscription {
            id,
            rx,
            registry: self.clone(),
        }
    }

    /// Returns whether `id` was registered.
    fn unregister(&self, id: SubscriberId) -> bool {
        let removed = self.inner.lock().outbound.remove(&id).is_some();
        if removed {
            crate::debug!("broker"; "unregistered {} (total: {})", id, self.len());
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().outbound.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.inner.lock().outbound.contains_key(&id)
    }

    /// Outbound channels registered right now, in id order.
    fn snapshot(&self) -> Vec<(SubscriberId, mpsc::Sender<IdeMessage>)> {
        self.inner
            .lock()
            .outbound
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect()
    }
}

/// A registered viewer's end of the fan-out.
///
/// Unregisters on drop.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<IdeMessage>,
    registry: Registry,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next broadcast message; `None` once the broker has stopped.
    pub async fn recv(&mut self) -> Option<IdeMessage> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}

pub struct Broker {
    rx: mpsc::Receiver<IdeMessage>,
    registry: Registry,
}

impl Broker {
    pub fn new(rx: mpsc::Receiver<IdeMessage>, registry: Registry) -> Self {
        Self { rx, registry }
    }

    /// Fan-out loop.
    ///
    /// The recipients of a message are fixed when its delivery starts;
    /// deliveries are awaited one after another.
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            let recipients = self.registry.snapshot();
            if recipients.is_empty() {
                crate::debug!("broker"; "no viewers for `{}`", msg.tutorial_name);
                continue;
            }

            for (id, tx) in &recipients {
                // a closed channel means the session is on its way out
                if tx.send(msg.clone()).await.is_err() {
                    crate::debug!("broker"; "{} went away mid-delivery", id);
                }
            }
            crate::debug!("broker"; "{:?} of `{}` sent to {} viewers", msg.kind, msg.tutorial_name, recipients.len());
        }
        crate::debug!("broker"; "input closed, stopping");
    }
}
