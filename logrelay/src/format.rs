//! Turning log call arguments into a single message string.
//!
//! Arguments are folded left to right into an accumulator:
//!
//! - structured arguments (`null`, arrays, objects) are converted through the [`Serializer`] first, strings are
//!   used verbatim and numbers and booleans use their textual form;
//! - if the accumulator still holds an unconsumed placeholder (`%s`, `%i`, `%n` or `%o`), the first one is replaced by
//!   the argument text;
//! - otherwise the argument text is appended after a single space.
//!
//! The result is trimmed. Placeholders without a matching argument are left as they are.
//!
//! Scanning is a single pass: text that was substituted for a placeholder is never scanned for placeholders again,
//! so `format(["%s", "%s", "x"])` yields `"%s x"`.
//! Appended text is part of the template, which is what makes the first argument's placeholders work at all.
//!
//! # Examples
//!
//! ```rust
//! use logrelay::args;
//! use logrelay::format::{JsonSerializer, format_message};
//!
//! assert_eq!(format_message(&args!["foo %s bar %s", 1, 2], &JsonSerializer), "foo 1 bar 2");
//! assert_eq!(format_message(&args!["foo %s %s", "bar"], &JsonSerializer), "foo bar %s");
//! assert_eq!(format_message(&args!["took", 12, "ms"], &JsonSerializer), "took 12 ms");
//! ```

use std::borrow::Cow;
use std::fmt::Debug;

use serde_json::Value;

use crate::isolate::isolate;

/// Converts structured values to text.
///
/// The hub uses its serializer both for structured log call arguments and for submission payloads.
pub trait Serializer: Debug + Send + Sync {
    /// Converts `value` to text.
    fn serialize(&self, value: &Value) -> String;
}

/// The default serializer, producing compact JSON.
#[derive(Debug, Default, Copy, Clone)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize(&self, value: &Value) -> String {
        // `Display` for `Value` is infallible compact JSON.
        value.to_string()
    }
}

/// Adapts a closure into a [`Serializer`].
///
/// ```rust
/// use logrelay::format::{FnSerializer, Serializer};
/// use serde_json::json;
///
/// let pretty = FnSerializer::new(|value| serde_json::to_string_pretty(value).unwrap_or_default());
/// assert_eq!(pretty.serialize(&json!([1])), "[\n  1\n]");
/// ```
pub struct FnSerializer<F>(F);

impl<F> FnSerializer<F>
where
    F: Fn(&Value) -> String + Send + Sync,
{
    /// Wraps `serialize`.
    pub fn new(serialize: F) -> Self {
        Self(serialize)
    }
}

impl<F> Debug for FnSerializer<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FnSerializer").finish_non_exhaustive()
    }
}

impl<F> Serializer for FnSerializer<F>
where
    F: Fn(&Value) -> String + Send + Sync,
{
    fn serialize(&self, value: &Value) -> String {
        (self.0)(value)
    }
}

/// Placeholder type markers, all substituted the same way.
const PLACEHOLDER_MARKERS: [u8; 4] = [b's', b'i', b'n', b'o'];

/// Returns the byte offset of the first placeholder in `text`.
fn find_placeholder(text: &str) -> Option<usize> {
    text.as_bytes()
        .windows(2)
        .position(|pair| pair[0] == b'%' && PLACEHOLDER_MARKERS.contains(&pair[1]))
}

/// Converts a single argument to the text that is substituted or appended.
fn argument_text<'a>(argument: &'a Value, serializer: &dyn Serializer) -> Cow<'a, str> {
    match argument {
        Value::String(text) => Cow::Borrowed(text),
        Value::Bool(value) => Cow::Owned(value.to_string()),
        Value::Number(number) => Cow::Owned(number.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => {
            // A user serializer must not be able to make a log call fail.
            let serialized = isolate(|| serializer.serialize(argument));
            Cow::Owned(serialized.unwrap_or_else(|| argument.to_string()))
        }
    }
}

/// Formats log call arguments into a message.
pub fn format_message(arguments: &[Value], serializer: &dyn Serializer) -> String {
    let mut message = String::new();
    // Everything before `scan_from` is either consumed template or substituted text.
    let mut scan_from = 0;

    for argument in arguments {
        let text = argument_text(argument, serializer);

        match find_placeholder(&message[scan_from..]) {
            Some(offset) => {
                let start = scan_from + offset;
                message.replace_range(start..start + 2, &text);
                scan_from = start + text.len();
            }
            None => {
                message.push(' ');
                message.push_str(&text);
            }
        }
    }

    message.trim().to_owned()
}
