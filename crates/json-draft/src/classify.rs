//! Shape classification: which values get a draft of their own.

use log::warn;

use crate::value::Value;

/// Options for a draft session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Serialize every plain record before drafting it and pass records that
    /// fail through by reference. Default is `true`.
    pub check_serializable: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            check_serializable: true,
        }
    }
}

/// Returns `true` if `value` is drafted lazily rather than passed by reference.
///
/// Arrays are always draftable. Plain records are draftable if they serialize;
/// a record holding an unserializable opaque value is rejected with a
/// diagnostic. Primitives, `null` and opaque values are never draftable.
///
/// # Example
///
/// ```
/// use json_draft::{is_draftable, Value};
/// use serde_json::json;
///
/// assert!(is_draftable(&Value::from(json!([1, 2]))));
/// assert!(is_draftable(&Value::from(json!({"a": 1}))));
/// assert!(!is_draftable(&Value::from(json!("a"))));
/// assert!(!is_draftable(&Value::Null));
/// ```
pub fn is_draftable(value: &Value) -> bool {
    is_draftable_with(value, &Options::default())
}

/// [`is_draftable`] with explicit options.
pub fn is_draftable_with(value: &Value, options: &Options) -> bool {
    match value {
        Value::Array(_) => true,
        Value::Object(_) => {
            if !options.check_serializable {
                return true;
            }
            match serde_json::to_writer(std::io::sink(), value) {
                Ok(()) => true,
                Err(err) => {
                    warn!("cannot draft object, passing it by reference: {err}");
                    false
                }
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Opaque(_) => {
            false
        }
    }
}
