//! Avro codec for incoming resource-changed messages.
//!
//! The schema is retrieved from the schema registry at startup and injected
//! here; decoding is otherwise pure. JSON encoding and decoding throughout
//! the pipeline goes through `serde_json` directly.

use apache_avro::Schema;

use crate::error::TransformError;
use crate::model::ResourceChanged;

/// Decoder for Avro-framed resource-changed payloads, bound to one schema.
#[derive(Debug, Clone)]
pub struct AvroCodec {
    schema: Schema,
}

impl AvroCodec {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    /// Decode a raw datum into a [`ResourceChanged`] record.
    pub fn decode(&self, data: &[u8]) -> Result<ResourceChanged, TransformError> {
        let value = apache_avro::from_avro_datum(&self.schema, &mut &data[..], None)
            .map_err(TransformError::AvroDecode)?;
        apache_avro::from_value(&value).map_err(TransformError::AvroDecode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EventRecord;

    const SCHEMA: &str = r#"{
        "type": "record",
        "name": "resource_changed_data",
        "fields": [
            {"name": "resource_kind", "type": "string"},
            {"name": "resource_uri", "type": "string"},
            {"name": "context_id", "type": "string"},
            {"name": "resource_id", "type": "string"},
            {"name": "data", "type": "string"},
            {"name": "event", "type": {
                "type": "record",
                "name": "event_record",
                "fields": [
                    {"name": "published_at", "type": "string"},
                    {"name": "type", "type": "string"},
                    {"name": "fields_changed", "type": {"type": "array", "items": "string"}}
                ]
            }}
        ]
    }"#;

    fn record() -> ResourceChanged {
        ResourceChanged {
            resource_kind: "filing-history".into(),
            resource_uri: "/company/0/filing-history/1".into(),
            context_id: "ctx-1".into(),
            resource_id: "1".into(),
            data: r#"{"a":1}"#.into(),
            event: EventRecord {
                published_at: "2023-06-01T12:00:00".into(),
                event_type: "changed".into(),
                fields_changed: vec!["description".into()],
            },
        }
    }

    fn encode(schema: &Schema, record: &ResourceChanged) -> Vec<u8> {
        let value = apache_avro::to_value(record.clone()).unwrap();
        apache_avro::to_avro_datum(schema, value).unwrap()
    }

    #[test]
    fn decodes_an_encoded_record() {
        let schema = Schema::parse_str(SCHEMA).unwrap();
        let codec = AvroCodec::new(schema.clone());
        let datum = encode(&schema, &record());

        let decoded = codec.decode(&datum).unwrap();
        assert_eq!(decoded, record());
    }

    #[test]
    fn rejects_garbage_input() {
        let schema = Schema::parse_str(SCHEMA).unwrap();
        let codec = AvroCodec::new(schema);

        let err = codec.decode(&[0xff, 0x01, 0x02]).unwrap_err();
        assert!(matches!(err, TransformError::AvroDecode(_)));
    }
}
