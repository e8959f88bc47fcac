//! Single-reader fan-out broker.
//!
//! The older topology for this gateway: one consumer worker per topic feeds
//! a broker, and every HTTP connection subscribes to it. A single task owns
//! the subscriber set; subscribe, unsubscribe, publish and shutdown all
//! arrive as messages on its event channel, so the set is never touched
//! concurrently and no subscriber channel is ever written after it has been
//! closed.
//!
//! Publishing writes to each subscriber sequentially, so one slow reader
//! back-pressures the whole topic. That is a known property of this
//! topology and part of why the per-connection runner replaced it.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

use crate::worker::Publisher;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Attempted to unsubscribe a consumer that was not subscribed")]
    NotSubscribed,

    /// The broker task has already shut down.
    #[error("broker is not running")]
    Closed,
}

/// One consumer's registration with the broker.
pub struct Subscription {
    pub id: u64,
    pub data: mpsc::Receiver<String>,
}

enum Event {
    Subscribe {
        reply: oneshot::Sender<Subscription>,
    },
    Unsubscribe {
        id: u64,
        reply: oneshot::Sender<Result<(), BrokerError>>,
    },
    Publish {
        msg: String,
    },
    Shutdown,
}

/// Handle for interacting with a running broker task. Cheap to clone.
#[derive(Clone)]
pub struct Broker {
    events: mpsc::Sender<Event>,
}

impl Broker {
    /// Create a broker and the task driving it. The task must be spawned
    /// for any of the handle's operations to complete.
    pub fn new() -> (Broker, BrokerTask) {
        let (events_tx, events_rx) = mpsc::channel(1);
        (
            Broker { events: events_tx },
            BrokerTask {
                events: events_rx,
                subscribers: HashMap::new(),
                next_id: 0,
            },
        )
    }

    /// Register a new consumer and receive its data channel.
    pub async fn subscribe(&self) -> Result<Subscription, BrokerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.events
            .send(Event::Subscribe { reply: reply_tx })
            .await
            .map_err(|_| BrokerError::Closed)?;
        reply_rx.await.map_err(|_| BrokerError::Closed)
    }

    /// Remove a consumer, closing its data channel.
    pub async fn unsubscribe(&self, id: u64) -> Result<(), BrokerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.events
            .send(Event::Unsubscribe { id, reply: reply_tx })
            .await
            .map_err(|_| BrokerError::Closed)?;
        reply_rx.await.map_err(|_| BrokerError::Closed)?
    }

    /// Fan `msg` out to every subscriber.
    pub async fn publish(&self, msg: String) -> Result<(), BrokerError> {
        self.events
            .send(Event::Publish { msg })
            .await
            .map_err(|_| BrokerError::Closed)
    }

    /// Close every subscriber channel and stop the broker task.
    pub async fn shutdown(&self) {
        let _ = self.events.send(Event::Shutdown).await;
    }
}

#[async_trait]
impl Publisher for Broker {
    async fn publish(&self, msg: String) -> bool {
        Broker::publish(self, msg).await.is_ok()
    }
}

/// The task owning the subscriber set.
pub struct BrokerTask {
    events: mpsc::Receiver<Event>,
    subscribers: HashMap<u64, mpsc::Sender<String>>,
    next_id: u64,
}

impl BrokerTask {
    /// Run until shutdown is requested or every handle is dropped.
    pub async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            match event {
                Event::Subscribe { reply } => {
                    let (data_tx, data_rx) = mpsc::channel(1);
                    let id = self.next_id;
                    self.next_id += 1;
                    self.subscribers.insert(id, data_tx);
                    let _ = reply.send(Subscription { id, data: data_rx });
                }
                Event::Unsubscribe { id, reply } => {
                    // Removing the sender drops it, which closes the
                    // subscriber's channel; the entry is gone before the
                    // next publish, so a closed channel is never written.
                    let result = match self.subscribers.remove(&id) {
                        Some(_) => Ok(()),
                        None => Err(BrokerError::NotSubscribed),
                    };
                    let _ = reply.send(result);
                }
                Event::Publish { msg } => {
                    for subscriber in self.subscribers.values() {
                        // Sequential delivery; a reader that went away
                        // without unsubscribing is skipped.
                        let _ = subscriber.send(msg.clone()).await;
                    }
                }
                Event::Shutdown => {
                    info!(
                        subscribers = self.subscribers.len(),
                        "shutting down broker"
                    );
                    self.subscribers.clear();
                    return;
                }
            }
        }
    }
}
