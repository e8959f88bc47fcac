//! The per-connection consumer worker.
//!
//! One worker per HTTP connection: it binds the injected log client to a
//! partition at the requested offset, reports start success or failure over
//! a oneshot handshake, then drains messages through the transformer until
//! it is told to shut down. Transform failures are per-message and never
//! terminate the worker; a subscribe failure is fatal and reported before
//! the loop is entered.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

use streambridge_core::{BackendEvent, TransformError, Transformer};

use crate::client::PartitionConsumer;

/// The transformation seam between the worker and the codec pipeline.
pub trait Transform: Send + Sync {
    fn transform(&self, event: &BackendEvent) -> Result<String, TransformError>;
}

impl Transform for Transformer {
    fn transform(&self, event: &BackendEvent) -> Result<String, TransformError> {
        Transformer::transform(self, event)
    }
}

/// Sink for transformed envelopes.
///
/// `publish` suspends until the downstream reader accepts the message and
/// returns `false` once the reader is gone, at which point the worker tears
/// down.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, msg: String) -> bool;
}

/// Drains one log partition into a [`Publisher`] for the lifetime of a
/// connection.
pub struct ConsumerWorker {
    client: Box<dyn PartitionConsumer>,
    transformer: Box<dyn Transform>,
    publisher: Box<dyn Publisher>,
    partition: i32,
    offset: i64,
    started: Option<oneshot::Sender<bool>>,
    shutdown: mpsc::Receiver<String>,
}

impl ConsumerWorker {
    pub fn new(
        client: Box<dyn PartitionConsumer>,
        transformer: Box<dyn Transform>,
        publisher: Box<dyn Publisher>,
        partition: i32,
        offset: i64,
        started: oneshot::Sender<bool>,
        shutdown: mpsc::Receiver<String>,
    ) -> Self {
        Self {
            client,
            transformer,
            publisher,
            partition,
            offset,
            started: Some(started),
            shutdown,
        }
    }

    /// Run the worker to completion.
    ///
    /// Owns the log client and closes it exactly once on exit. The start
    /// handshake fires exactly once: `false` if the partition subscription
    /// fails (the worker then terminates without consuming), `true`
    /// otherwise.
    pub async fn run(mut self) {
        if let Err(err) = self
            .client
            .consume_partition(self.partition, self.offset)
            .await
        {
            error!(
                partition = self.partition,
                offset = self.offset,
                error = %err,
                "failed to start partition consumer"
            );
            if let Some(started) = self.started.take() {
                let _ = started.send(false);
            }
            return;
        }

        let mut messages = self.client.messages();
        let mut errors = self.client.errors();
        if let Some(started) = self.started.take() {
            let _ = started.send(true);
        }

        loop {
            tokio::select! {
                Some(message) = messages.recv() => {
                    let event = BackendEvent {
                        data: message.value,
                        offset: message.offset,
                    };
                    match self.transformer.transform(&event) {
                        Ok(envelope) => {
                            if !self.publisher.publish(envelope).await {
                                break;
                            }
                        }
                        Err(err) => {
                            error!(offset = event.offset, error = %err, "skipping message");
                        }
                    }
                }
                Some(delivery) = errors.recv() => {
                    error!(topic = %delivery.topic, error = %delivery.error, "error consuming from topic");
                }
                reason = self.shutdown.recv() => {
                    let reason = reason.unwrap_or_else(|| String::from("controller dropped"));
                    info!("shutting down consumer: {}", reason);
                    break;
                }
            }
        }

        if let Err(err) = self.client.close().await {
            error!(error = %err, "failed to close partition consumer");
        }
    }
}
