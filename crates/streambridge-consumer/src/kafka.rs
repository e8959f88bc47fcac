//! Kafka binding for the [`PartitionConsumer`] capability.
//!
//! Wraps an rdkafka [`StreamConsumer`] assigned to a single partition at an
//! explicit offset. A pump task forwards the record stream into the
//! message/error channels the worker multiplexes over; closing the
//! subscription aborts the pump and unassigns the partition.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::{Offset, TopicPartitionList};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::client::{closed_channel, DeliveryError, LogMessage, PartitionConsumer};
use crate::error::ConsumerError;

/// A [`PartitionConsumer`] backed by a Kafka partition.
pub struct KafkaPartitionConsumer {
    brokers: Vec<String>,
    topic: String,
    consumer: Option<Arc<StreamConsumer>>,
    pump: Option<JoinHandle<()>>,
    messages: Option<mpsc::UnboundedReceiver<LogMessage>>,
    errors: Option<mpsc::UnboundedReceiver<DeliveryError>>,
}

impl KafkaPartitionConsumer {
    pub fn new(brokers: Vec<String>, topic: impl Into<String>) -> Self {
        Self {
            brokers,
            topic: topic.into(),
            consumer: None,
            pump: None,
            messages: None,
            errors: None,
        }
    }

    fn subscribe(&self, partition: i32, offset: i64) -> Result<StreamConsumer, ConsumerError> {
        // Each connection gets a throwaway group id: offsets are managed by
        // the client, never committed.
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", self.brokers.join(","))
            .set("group.id", format!("streambridge-{}", Uuid::new_v4()))
            .set("enable.auto.commit", "false")
            .set("enable.partition.eof", "false")
            .create()
            .map_err(|e| ConsumerError::Subscribe(e.to_string()))?;

        let start = if offset < 0 {
            Offset::End
        } else {
            Offset::Offset(offset)
        };
        let mut assignment = TopicPartitionList::new();
        assignment
            .add_partition_offset(&self.topic, partition, start)
            .map_err(|e| ConsumerError::Subscribe(e.to_string()))?;
        consumer
            .assign(&assignment)
            .map_err(|e| ConsumerError::Subscribe(e.to_string()))?;

        debug!(topic = %self.topic, partition, offset, "assigned partition");
        Ok(consumer)
    }
}

#[async_trait]
impl PartitionConsumer for KafkaPartitionConsumer {
    async fn consume_partition(
        &mut self,
        partition: i32,
        offset: i64,
    ) -> Result<(), ConsumerError> {
        let consumer = Arc::new(self.subscribe(partition, offset)?);

        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let (error_tx, error_rx) = mpsc::unbounded_channel();
        let topic = self.topic.clone();
        let stream_consumer = consumer.clone();

        let pump = tokio::spawn(async move {
            let mut stream = stream_consumer.stream();
            while let Some(next) = stream.next().await {
                let delivered = match next {
                    Ok(record) => {
                        let value = record
                            .payload()
                            .map(Bytes::copy_from_slice)
                            .unwrap_or_default();
                        message_tx
                            .send(LogMessage {
                                value,
                                offset: record.offset(),
                            })
                            .is_ok()
                    }
                    Err(err) => error_tx
                        .send(DeliveryError {
                            topic: topic.clone(),
                            error: ConsumerError::Kafka(err.to_string()),
                        })
                        .is_ok(),
                };
                // Both receivers gone means the worker has exited.
                if !delivered {
                    break;
                }
            }
        });

        self.consumer = Some(consumer);
        self.pump = Some(pump);
        self.messages = Some(message_rx);
        self.errors = Some(error_rx);
        Ok(())
    }

    fn messages(&mut self) -> mpsc::UnboundedReceiver<LogMessage> {
        self.messages.take().unwrap_or_else(closed_channel)
    }

    fn errors(&mut self) -> mpsc::UnboundedReceiver<DeliveryError> {
        self.errors.take().unwrap_or_else(closed_channel)
    }

    async fn close(&mut self) -> Result<(), ConsumerError> {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        if let Some(consumer) = self.consumer.take() {
            consumer
                .unassign()
                .map_err(|e| ConsumerError::Close(e.to_string()))?;
        }
        Ok(())
    }
}
