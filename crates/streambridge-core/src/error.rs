//! Error types for the transformation pipeline.

use thiserror::Error;

/// Failure modes of transforming one log message into an envelope.
///
/// All variants are per-message: the consumer logs them and moves on to the
/// next message, so a single bad record never terminates a stream.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The message payload could not be decoded against the Avro schema.
    #[error("avro decode failed: {0}")]
    AvroDecode(apache_avro::Error),

    /// The decoded message carried no resource data.
    #[error("no message data provided")]
    EmptyPayload,

    /// The inner `data` field was not a JSON object.
    #[error("payload decode failed: {0}")]
    PayloadDecode(serde_json::Error),

    /// The outgoing document or envelope could not be marshalled.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),
}
