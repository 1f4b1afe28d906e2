//! Entry codec: per-entry documents and batch exports
//!
//! Both formats are JSON. A per-entry document is the entry object with a
//! `schema` key added; a batch export wraps many entry objects in an
//! envelope tagged with [`BATCH_FORMAT`].

use crate::domain::JournalEntry;
use crate::error::{DecodeError, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema version written into every per-entry document
pub const SCHEMA_VERSION: u64 = 2;

/// Format tag of batch export documents
pub const BATCH_FORMAT: &str = "jotter-export";

/// Batch export version written by this build
pub const BATCH_VERSION: u32 = 1;

const SCHEMA_KEY: &str = "schema";

/// UI-only keys older versions persisted; dropped on load
const TRANSIENT_KEYS: &[&str] = &["isEditing"];

/// Seconds between the Unix epoch and 2001-01-01, the epoch legacy files count from
const LEGACY_EPOCH_OFFSET: f64 = 978_307_200.0;

/// Encode one entry as a standalone document
pub fn encode(entry: &JournalEntry) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(&entry_to_value(entry)?)?)
}

/// Decode one standalone entry document
pub fn decode(bytes: &[u8]) -> std::result::Result<JournalEntry, DecodeError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::Corrupt(e.to_string()))?;
    entry_from_value(value)
}

fn entry_to_value(entry: &JournalEntry) -> Result<Value> {
    let mut value = serde_json::to_value(entry)?;
    if let Value::Object(map) = &mut value {
        map.insert(SCHEMA_KEY.to_string(), Value::from(SCHEMA_VERSION));
    }
    Ok(value)
}

fn entry_from_value(value: Value) -> std::result::Result<JournalEntry, DecodeError> {
    let Value::Object(mut map) = value else {
        return Err(DecodeError::UnsupportedSchema(
            "entry document is not a JSON object".to_string(),
        ));
    };

    let schema = match map.remove(SCHEMA_KEY) {
        None => 1,
        Some(v) => v.as_u64().ok_or_else(|| {
            DecodeError::UnsupportedSchema(format!("schema version is not a number: {}", v))
        })?,
    };
    if schema == 0 || schema > SCHEMA_VERSION {
        return Err(DecodeError::UnsupportedSchema(format!(
            "schema version {} (this build reads up to {})",
            schema, SCHEMA_VERSION
        )));
    }

    for key in TRANSIENT_KEYS {
        map.remove(*key);
    }
    if schema == 1 {
        upgrade_legacy_date(&mut map);
    }

    let mut entry: JournalEntry = serde_json::from_value(Value::Object(map))
        .map_err(|e| DecodeError::UnsupportedSchema(e.to_string()))?;
    entry.normalize();
    Ok(entry)
}

/// Schema 1 stored dates as seconds since 2001-01-01
fn upgrade_legacy_date(map: &mut Map<String, Value>) {
    let Some(seconds) = map.get("date").and_then(Value::as_f64) else {
        return;
    };
    let unix = seconds + LEGACY_EPOCH_OFFSET;
    let secs = unix.floor();
    let nanos = ((unix - secs) * 1e9).round().min(999_999_999.0) as u32;
    if let Some(date) = Utc.timestamp_opt(secs as i64, nanos).single() {
        map.insert("date".to_string(), Value::String(date.to_rfc3339()));
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchDocument {
    format: String,
    version: u32,
    exported_at: DateTime<Utc>,
    entries: Vec<Value>,
}

/// Entries recovered from a batch export, one result per stored entry
#[derive(Debug)]
pub struct DecodedBatch {
    pub exported_at: Option<DateTime<Utc>>,
    pub entries: Vec<std::result::Result<JournalEntry, DecodeError>>,
}

/// Encode a whole collection as one export document
pub fn encode_batch(entries: &[JournalEntry]) -> Result<Vec<u8>> {
    let document = BatchDocument {
        format: BATCH_FORMAT.to_string(),
        version: BATCH_VERSION,
        exported_at: Utc::now(),
        entries: entries
            .iter()
            .map(entry_to_value)
            .collect::<Result<Vec<_>>>()?,
    };
    Ok(serde_json::to_vec_pretty(&document)?)
}

/// Decode an export document.
///
/// The envelope must be valid; individual entries that fail to decode are
/// reported in place so callers can skip them. A bare JSON array of entries
/// (the older export layout) is accepted as well.
pub fn decode_batch(bytes: &[u8]) -> std::result::Result<DecodedBatch, DecodeError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::Corrupt(e.to_string()))?;

    let (exported_at, raw_entries) = match value {
        Value::Array(items) => (None, items),
        Value::Object(_) => {
            let document: BatchDocument = serde_json::from_value(value)
                .map_err(|e| DecodeError::UnsupportedSchema(e.to_string()))?;
            if document.format != BATCH_FORMAT {
                return Err(DecodeError::UnsupportedSchema(format!(
                    "unknown export format '{}'",
                    document.format
                )));
            }
            if document.version > BATCH_VERSION {
                return Err(DecodeError::UnsupportedSchema(format!(
                    "export version {} (this build reads up to {})",
                    document.version, BATCH_VERSION
                )));
            }
            (Some(document.exported_at), document.entries)
        }
        _ => {
            return Err(DecodeError::UnsupportedSchema(
                "export document is neither an object nor an array".to_string(),
            ))
        }
    };

    Ok(DecodedBatch {
        exported_at,
        entries: raw_entries.into_iter().map(entry_from_value).collect(),
    })
}
