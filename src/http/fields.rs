//! Request-scoped context fields.

use std::convert::Infallible;

use axum::response::{IntoResponseParts, ResponseParts};

use crate::record::{Fields, Value};

/// Fields a request handler wants on its request's log record.
///
/// Owned by one request: build it up while handling, then return it as part
/// of the response (`(fields, body)`) or put it into the request extensions
/// from an outer layer. The middleware converts it into an immutable
/// [`Fields`] once, when the record is emitted.
///
/// ```
/// use logbatch::http::LogFields;
///
/// let mut fields = LogFields::new().with("user_id", 42);
/// fields.insert("plan", "pro");
/// assert_eq!(fields.freeze()["plan"], "pro");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogFields {
    fields: Fields,
}

impl LogFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`LogFields::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds or replaces one field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Merges `other` in; its values win on conflicts.
    pub fn merge(&mut self, other: LogFields) -> &mut Self {
        self.fields.extend(other.fields);
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Ends accumulation and returns the collected fields.
    pub fn freeze(self) -> Fields {
        self.fields
    }
}

impl From<Fields> for LogFields {
    fn from(fields: Fields) -> Self {
        Self { fields }
    }
}

impl IntoResponseParts for LogFields {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        match res.extensions_mut().get_mut::<LogFields>() {
            Some(existing) => {
                existing.merge(self);
            }
            None => {
                res.extensions_mut().insert(self);
            }
        }
        Ok(res)
    }
}
