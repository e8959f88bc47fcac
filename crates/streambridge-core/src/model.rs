//! Message model for the backend streaming pipeline.
//!
//! Three representations of a resource-changed message exist in the system:
//! the raw [`BackendEvent`] delivered by the log client, the Avro-decoded
//! [`ResourceChanged`] record, and the JSON [`ResourceChangedData`] document
//! that downstream users consume. The [`Envelope`] is the final wire format
//! written to the HTTP response, one per message.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A single message consumed from the log, before any decoding.
///
/// `offset` is the absolute position of the message within its partition and
/// is threaded through the pipeline as the user-visible timepoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEvent {
    pub data: Bytes,
    pub offset: i64,
}

/// An incoming resource-changed message, as decoded from Avro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceChanged {
    pub resource_kind: String,
    pub resource_uri: String,
    /// Upstream correlation id. Decoded but never propagated downstream.
    pub context_id: String,
    pub resource_id: String,
    /// The changed resource itself, as an opaque JSON document.
    pub data: String,
    pub event: EventRecord,
}

/// Event metadata within an incoming resource-changed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub published_at: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub fields_changed: Vec<String>,
}

/// The document consumed by streaming API users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceChangedData {
    pub resource_kind: String,
    pub resource_uri: String,
    pub resource_id: String,
    pub data: serde_json::Map<String, serde_json::Value>,
    pub event: ResourceEvent,
}

/// Event metadata attached to the document consumed by streaming API users.
///
/// `timepoint` carries the log offset of the message, not any timestamp from
/// the incoming event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEvent {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields_changed: Vec<String>,
    pub timepoint: i64,
    pub published_at: String,
    #[serde(rename = "type")]
    pub event_type: String,
}

/// The line written to the HTTP response for each message.
///
/// `data` is the stringified [`ResourceChangedData`] JSON; `offset` duplicates
/// the timepoint inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub data: String,
    pub offset: i64,
}
