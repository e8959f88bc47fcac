//! Construction and control of per-connection consumer workers.
//!
//! The runner is the factory the HTTP layer calls on every new connection:
//! it wires a fresh log client, transformer and rendezvous data channel into
//! a [`ConsumerWorker`], launches it, and blocks on the start handshake so
//! the caller gets well-defined success/failure semantics before any bytes
//! are streamed.

use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use streambridge_core::{AvroCodec, Transformer};

use crate::client::PartitionConsumer;
use crate::error::StartConsumerError;
use crate::kafka::KafkaPartitionConsumer;
use crate::worker::{ConsumerWorker, Publisher, Transform};

/// Builds a fresh log client for each connection.
pub type ClientFactory = Box<dyn Fn() -> Box<dyn PartitionConsumer> + Send + Sync>;

/// Anything able to start a consumer for a connection. Implemented by
/// [`ConsumerRunner`]; HTTP handlers depend on this seam so tests can stub
/// the whole lifecycle.
#[async_trait]
pub trait ConsumerStarter: Send + Sync {
    async fn start_consumer(&self, offset: i64)
        -> Result<ConsumerController, StartConsumerError>;
}

/// Per-topic factory for consumer workers.
pub struct ConsumerRunner {
    partition: i32,
    transformer: Box<dyn CloneTransform>,
    clients: ClientFactory,
}

/// A [`Transform`] that can be duplicated for each spawned worker.
trait CloneTransform: Transform {
    fn clone_transform(&self) -> Box<dyn Transform>;
}

impl<T: Transform + Clone + 'static> CloneTransform for T {
    fn clone_transform(&self) -> Box<dyn Transform> {
        Box::new(self.clone())
    }
}

impl ConsumerRunner {
    /// Production wiring: Kafka clients for `topic`, transformer bound to
    /// the registry schema. Connections historically always consume
    /// partition 0.
    pub fn new(brokers: Vec<String>, topic: impl Into<String>, schema: apache_avro::Schema) -> Self {
        let topic = topic.into();
        let clients: ClientFactory = Box::new(move || {
            Box::new(KafkaPartitionConsumer::new(brokers.clone(), topic.clone()))
        });
        Self::with_clients(Transformer::new(AvroCodec::new(schema)), clients)
    }

    /// Wiring seam for tests: any transformer, any client factory.
    pub fn with_clients<T>(transformer: T, clients: ClientFactory) -> Self
    where
        T: Transform + Clone + 'static,
    {
        Self {
            partition: 0,
            transformer: Box::new(transformer),
            clients,
        }
    }
}

#[async_trait]
impl ConsumerStarter for ConsumerRunner {
    /// Launch a worker at `offset` and wait for its start handshake.
    ///
    /// Never returns a controller without a running worker: on handshake
    /// failure the worker has already terminated and the error is returned
    /// instead.
    async fn start_consumer(
        &self,
        offset: i64,
    ) -> Result<ConsumerController, StartConsumerError> {
        let (data_tx, data_rx) = mpsc::channel(1);
        let (started_tx, started_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let worker = ConsumerWorker::new(
            (self.clients)(),
            self.transformer.clone_transform(),
            Box::new(ChannelPublisher { data: data_tx }),
            self.partition,
            offset,
            started_tx,
            shutdown_rx,
        );
        tokio::spawn(worker.run());

        match started_rx.await {
            Ok(true) => Ok(ConsumerController {
                data: data_rx,
                shutdown: Some(shutdown_tx),
            }),
            _ => Err(StartConsumerError),
        }
    }
}

/// Forwards envelopes onto a connection's data channel. The channel is a
/// rendezvous: a slow reader suspends this connection's worker and no one
/// else's.
struct ChannelPublisher {
    data: mpsc::Sender<String>,
}

#[async_trait]
impl Publisher for ChannelPublisher {
    async fn publish(&self, msg: String) -> bool {
        self.data.send(msg).await.is_ok()
    }
}

/// Handle held by the HTTP layer for one running consumer.
///
/// Reading the data stream and requesting shutdown are the only two
/// operations a connection ever needs. The data channel closes exactly once,
/// when the worker exits and drops its publisher.
#[derive(Debug)]
pub struct ConsumerController {
    data: mpsc::Receiver<String>,
    shutdown: Option<mpsc::Sender<String>>,
}

impl ConsumerController {
    /// Receive the next envelope, or `None` once the worker has exited.
    pub async fn recv(&mut self) -> Option<String> {
        self.data.recv().await
    }

    /// Poll-based access to the data stream, for wrapping in a response body.
    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<String>> {
        self.data.poll_recv(cx)
    }

    /// Ask the worker to shut down, delivering `reason` for its logs.
    ///
    /// Only the first call does anything; the worker receives the reason,
    /// closes its log client and exits, which in turn ends the data stream.
    pub fn stop(&mut self, reason: &str) {
        if let Some(shutdown) = self.shutdown.take() {
            if shutdown.try_send(reason.to_string()).is_err() {
                debug!("stop requested after the worker already exited");
            }
        }
    }
}
