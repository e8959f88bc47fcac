//! Core data model and transformation pipeline for the streambridge gateway.
//!
//! This crate holds the pure parts of the system: the message model flowing
//! in from the log client, the Avro and JSON codecs, and the transformer that
//! turns a raw log message into the envelope streamed to HTTP clients.
//! Nothing here performs I/O.

pub mod codec;
pub mod error;
pub mod model;
pub mod transformer;

pub use codec::AvroCodec;
pub use error::TransformError;
pub use model::{BackendEvent, Envelope, ResourceChanged, ResourceChangedData};
pub use transformer::Transformer;
