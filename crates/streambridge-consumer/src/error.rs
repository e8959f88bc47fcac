//! Error types for the consumer lifecycle.

use thiserror::Error;

/// Errors surfaced by a partition consumer.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// The partition subscription could not be established. Fatal for the
    /// connection; no worker loop runs after this.
    #[error("failed to subscribe to partition: {0}")]
    Subscribe(String),

    /// The underlying log client reported a delivery problem. Per-event,
    /// logged with its topic, never fatal.
    #[error("kafka error: {0}")]
    Kafka(String),

    /// The log client did not close cleanly. Logged, never propagated.
    #[error("failed to close consumer: {0}")]
    Close(String),
}

/// Returned by [`crate::runner::ConsumerRunner::start_consumer`] when the
/// worker reports that it could not bind to its partition.
#[derive(Debug, Error)]
#[error("failed to start consumer")]
pub struct StartConsumerError;
