//! Per-connection consumer lifecycle for the streambridge gateway.
//!
//! Each HTTP connection owns one [`worker::ConsumerWorker`] bound to a log
//! partition at a client-requested offset. The worker drains messages through
//! the transformer and publishes envelopes onto the connection's data
//! channel; the [`runner::ConsumerRunner`] builds and launches workers and
//! hands the HTTP layer a [`runner::ConsumerController`] for teardown.
//!
//! The [`broker`] module keeps the older single-reader fan-out topology,
//! where one worker feeds every client subscribed to a topic.

pub mod broker;
pub mod client;
pub mod error;
pub mod kafka;
pub mod runner;
pub mod worker;

pub use client::{DeliveryError, LogMessage, PartitionConsumer};
pub use error::{ConsumerError, StartConsumerError};
pub use runner::{ConsumerController, ConsumerRunner, ConsumerStarter};
pub use worker::{ConsumerWorker, Publisher, Transform};
