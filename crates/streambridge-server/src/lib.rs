//! HTTP boundary for the streambridge gateway.
//!
//! Hosts the streaming endpoints, one per topic, plus the healthcheck.
//! Everything long-lived happens in `streambridge-consumer`; this crate
//! parses configuration, fetches the Avro schema at boot, composes the
//! router and streams consumer output to clients until they disconnect.

pub mod config;
pub mod handler;
pub mod schema_registry;
pub mod service;
pub mod shutdown;

pub use config::Config;
pub use schema_registry::{SchemaFetchError, SchemaRegistryClient};
pub use service::BackendService;
