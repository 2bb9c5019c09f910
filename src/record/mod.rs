//! Log records and their canonical JSON encoding.
//!
//! A [`LogRecord`] is built by a producer, checked against a sink's
//! [`Level`] threshold and turned into an [`EncodedPayload`] by a
//! [`JsonEncoder`]. Once encoded the payload is owned by whoever holds it;
//! nothing aliases producer memory.

mod encoder;
mod level;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error_handling::EncodeError;

pub use encoder::{EncodedPayload, JsonEncoder};
pub use level::Level;
pub use serde_json::Value;

/// Ordered field name to value mapping. Insertion order is preserved.
pub type Fields = serde_json::Map<String, Value>;

/// One structured log event.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// When the event happened.
    pub ts: DateTime<Utc>,
    /// Severity.
    pub level: Level,
    /// Human-readable message.
    pub message: String,
    /// Caller-supplied structured fields.
    pub fields: Fields,
    /// `file:line` of the producing call, if captured.
    pub caller: Option<String>,
    /// Correlation id known to the producer, if any.
    pub correlation_id: Option<String>,
    /// Captured backtrace, set for `Error` and above by [`crate::Logger`].
    pub stack: Option<String>,
}

impl LogRecord {
    /// Creates a record stamped with the current time.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            level,
            message: message.into(),
            fields: Fields::new(),
            caller: None,
            correlation_id: None,
            stack: None,
        }
    }

    /// Adds one field. Later values for the same key replace earlier ones.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Adds one field from any serializable value.
    ///
    /// Fails with [`EncodeError::UnsupportedField`] when the value has no JSON
    /// representation (for example a map keyed by tuples).
    pub fn try_field<T>(mut self, key: impl Into<String>, value: &T) -> Result<Self, EncodeError>
    where
        T: Serialize + ?Sized,
    {
        let key = key.into();
        let value = serde_json::to_value(value).map_err(|e| EncodeError::UnsupportedField {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.fields.insert(key, value);
        Ok(self)
    }

    /// Merges a field set into the record.
    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Overrides the timestamp.
    pub fn at(mut self, ts: DateTime<Utc>) -> Self {
        self.ts = ts;
        self
    }
}
