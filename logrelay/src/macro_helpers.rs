//! Helpers used by the exported macros, not part of the public API.

pub use serde_json::Value;

/// Converts a macro argument into a log call argument.
///
/// Values that fail to serialize (e.g. maps with non-string keys) are replaced by their error text so a log call
/// never fails.
pub fn to_argument<T>(value: &T) -> Value
where
    T: serde::Serialize + ?Sized,
{
    serde_json::to_value(value).unwrap_or_else(|error| Value::String(error.to_string()))
}
