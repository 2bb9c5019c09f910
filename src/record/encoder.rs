//! Canonical JSON encoding of log records.

use chrono::SecondsFormat;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::config::{
    CALLER_KEY, CORRELATION_KEY, LEVEL_KEY, MESSAGE_KEY, STACK_KEY, TIME_KEY,
};
use crate::error_handling::EncodeError;

use super::{Fields, LogRecord};

/// Serialized form of one record: a single JSON object.
///
/// Owns its bytes; enqueueing moves it, never borrows producer buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload(Vec<u8>);

impl EncodedPayload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for EncodedPayload {
    fn from(bytes: Vec<u8>) -> Self {
        EncodedPayload(bytes)
    }
}

impl From<&str> for EncodedPayload {
    fn from(s: &str) -> Self {
        EncodedPayload(s.as_bytes().to_vec())
    }
}

/// Stateless JSON encoder with optional pre-bound static fields.
///
/// Output key order: `ts`, `level`, `msg`, `caller` (when known), static
/// fields, record fields, then `request_id` when the record carries a
/// correlation id that no field already provides, and last `stack` when the
/// record carries a backtrace. Record fields override
/// static fields of the same name; fields named like one of the canonical
/// keys are skipped.
#[derive(Debug, Clone, Default)]
pub struct JsonEncoder {
    static_fields: Fields,
}

impl JsonEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this encoder with `fields` bound on top of the
    /// existing static fields.
    pub fn with_fields(&self, fields: &Fields) -> Self {
        let mut static_fields = self.static_fields.clone();
        for (k, v) in fields {
            static_fields.insert(k.clone(), v.clone());
        }
        Self { static_fields }
    }

    pub fn static_fields(&self) -> &Fields {
        &self.static_fields
    }

    /// Encodes `record` as one self-contained JSON object.
    ///
    /// On error nothing is produced; there is no partial payload.
    pub fn encode(&self, record: &LogRecord) -> Result<EncodedPayload, EncodeError> {
        let view = PayloadView {
            record,
            static_fields: &self.static_fields,
        };
        let bytes = serde_json::to_vec(&view)?;
        Ok(EncodedPayload(bytes))
    }
}

fn is_reserved(key: &str) -> bool {
    key == TIME_KEY
        || key == LEVEL_KEY
        || key == MESSAGE_KEY
        || key == CALLER_KEY
        || key == STACK_KEY
}

struct PayloadView<'a> {
    record: &'a LogRecord,
    static_fields: &'a Fields,
}

impl Serialize for PayloadView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let record = self.record;
        let mut map = serializer.serialize_map(None)?;

        map.serialize_entry(
            TIME_KEY,
            &record.ts.to_rfc3339_opts(SecondsFormat::Millis, true),
        )?;
        map.serialize_entry(LEVEL_KEY, &record.level)?;
        map.serialize_entry(MESSAGE_KEY, &record.message)?;
        if let Some(caller) = &record.caller {
            map.serialize_entry(CALLER_KEY, caller)?;
        }

        for (k, v) in self.static_fields {
            if is_reserved(k) || record.fields.contains_key(k) {
                continue;
            }
            map.serialize_entry(k, v)?;
        }
        for (k, v) in &record.fields {
            if is_reserved(k) {
                continue;
            }
            map.serialize_entry(k, v)?;
        }

        if let Some(id) = &record.correlation_id {
            if !record.fields.contains_key(CORRELATION_KEY)
                && !self.static_fields.contains_key(CORRELATION_KEY)
            {
                map.serialize_entry(CORRELATION_KEY, id)?;
            }
        }
        if let Some(stack) = &record.stack {
            map.serialize_entry(STACK_KEY, stack)?;
        }

        map.end()
    }
}
