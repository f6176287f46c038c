//! Helpers for translating chunk records to and from Firestore's typed field encoding.
//!
//! Firestore wraps every value in a type tag (`stringValue`, `integerValue`, `mapValue`, ...).
//! 64-bit integers travel as decimal strings.

use crate::firestore::types::{ChunkMetadata, ChunkRecord, StoredChunk};
use serde_json::{Map, Value, json};

/// Build the `fields` object written for a chunk record.
pub(crate) fn build_fields(record: &ChunkRecord) -> Value {
    json!({
        "input": { "stringValue": record.text },
        "metadata": {
            "mapValue": {
                "fields": {
                    "source": { "stringValue": record.metadata.source },
                    "chunk": { "integerValue": record.metadata.chunk.to_string() }
                }
            }
        }
    })
}

/// Map the `fields` object of a fetched document into a stored chunk.
pub(crate) fn parse_stored_chunk(id: &str, fields: &Map<String, Value>) -> StoredChunk {
    let text = fields
        .get("input")
        .and_then(string_value)
        .unwrap_or_default()
        .to_string();

    let metadata = fields
        .get("metadata")
        .and_then(map_fields)
        .and_then(|metadata| {
            let source = metadata.get("source").and_then(string_value)?;
            let chunk = metadata.get("chunk").and_then(integer_value)?;
            Some(ChunkMetadata {
                source: source.to_string(),
                chunk,
            })
        });

    StoredChunk {
        id: id.to_string(),
        text,
        metadata,
    }
}

fn string_value(value: &Value) -> Option<&str> {
    value.get("stringValue").and_then(Value::as_str)
}

fn integer_value(value: &Value) -> Option<usize> {
    match value.get("integerValue")? {
        Value::String(text) => text.parse().ok(),
        Value::Number(number) => number.as_u64().and_then(|n| usize::try_from(n).ok()),
        _ => None,
    }
}

fn map_fields(value: &Value) -> Option<&Map<String, Value>> {
    value
        .get("mapValue")
        .and_then(|map| map.get("fields"))
        .and_then(Value::as_object)
}
