//! The partition consumer capability consumed by workers.
//!
//! The log client itself is an injected collaborator: production code binds
//! [`crate::kafka::KafkaPartitionConsumer`], tests bind channel-backed
//! stubs. Workers only ever see this trait.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::ConsumerError;

/// A message delivered from a log partition, in partition order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub value: Bytes,
    pub offset: i64,
}

/// An out-of-band delivery error from the log client, tagged with its topic.
#[derive(Debug)]
pub struct DeliveryError {
    pub topic: String,
    pub error: ConsumerError,
}

/// A single-partition subscription to the message log.
///
/// `consume_partition` establishes the subscription synchronously; after it
/// succeeds, `messages` and `errors` each yield their receiver exactly once
/// (subsequent calls return an already-closed channel). `close` is
/// idempotent.
#[async_trait]
pub trait PartitionConsumer: Send + 'static {
    /// Bind to `partition` at `offset`. Offset `-1` seeks to the newest
    /// message; non-negative offsets seek to that absolute position.
    async fn consume_partition(&mut self, partition: i32, offset: i64)
        -> Result<(), ConsumerError>;

    /// The ordered message stream for the subscribed partition.
    fn messages(&mut self) -> mpsc::UnboundedReceiver<LogMessage>;

    /// Out-of-band delivery errors.
    fn errors(&mut self) -> mpsc::UnboundedReceiver<DeliveryError>;

    /// Tear down the subscription.
    async fn close(&mut self) -> Result<(), ConsumerError>;
}

/// A receiver with no live sender, handed out when a stream is taken twice.
pub(crate) fn closed_channel<T>() -> mpsc::UnboundedReceiver<T> {
    let (_, rx) = mpsc::unbounded_channel();
    rx
}
