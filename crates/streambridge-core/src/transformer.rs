//! Transformation of raw log messages into user-facing envelopes.

use crate::codec::AvroCodec;
use crate::error::TransformError;
use crate::model::{BackendEvent, Envelope, ResourceChangedData, ResourceEvent};

/// Turns a [`BackendEvent`] into the serialised envelope streamed to clients.
///
/// Stateless apart from the schema-bound codec; clone freely, one per
/// consumer worker.
#[derive(Debug, Clone)]
pub struct Transformer {
    codec: AvroCodec,
}

impl Transformer {
    pub fn new(codec: AvroCodec) -> Self {
        Self { codec }
    }

    /// Decode the message and re-encode it as an envelope string.
    ///
    /// The message's log offset becomes both the document's
    /// `event.timepoint` and the envelope's `offset`. A message with an
    /// empty `data` field is rejected with [`TransformError::EmptyPayload`].
    pub fn transform(&self, event: &BackendEvent) -> Result<String, TransformError> {
        let decoded = self.codec.decode(&event.data)?;
        if decoded.data.is_empty() {
            return Err(TransformError::EmptyPayload);
        }
        let payload = serde_json::from_str(&decoded.data).map_err(TransformError::PayloadDecode)?;

        let document = ResourceChangedData {
            resource_kind: decoded.resource_kind,
            resource_uri: decoded.resource_uri,
            resource_id: decoded.resource_id,
            data: payload,
            event: ResourceEvent {
                fields_changed: decoded.event.fields_changed,
                timepoint: event.offset,
                published_at: decoded.event.published_at,
                event_type: decoded.event.event_type,
            },
        };

        let data = serde_json::to_string(&document).map_err(TransformError::Encode)?;
        let envelope = Envelope {
            data,
            offset: event.offset,
        };
        serde_json::to_string(&envelope).map_err(TransformError::Encode)
    }
}
