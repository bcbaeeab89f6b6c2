//! Keys addressing a child of a draft.

use std::fmt;

use crate::error::DraftError;
use crate::state::Kind;

/// A key on a record or an array.
///
/// Keys are resolved against the container they are used on: on records an
/// index is the field named by its decimal digits, on arrays a field must be
/// a canonical index or `"length"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Record field
    Field(String),
    /// Array element
    Index(usize),
    /// Array length
    Length,
}

/// A key resolved against a container kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Addr {
    Field(String),
    Index(usize),
    Length,
}

impl Key {
    pub(crate) fn resolve(&self, kind: Kind) -> Result<Addr, DraftError> {
        match (kind, self) {
            (Kind::Object, Key::Field(name)) => Ok(Addr::Field(name.clone())),
            (Kind::Object, Key::Index(index)) => Ok(Addr::Field(index.to_string())),
            (Kind::Object, Key::Length) => Ok(Addr::Field("length".to_string())),
            (Kind::Array, Key::Index(index)) => Ok(Addr::Index(*index)),
            (Kind::Array, Key::Length) => Ok(Addr::Length),
            (Kind::Array, Key::Field(name)) if name == "length" => Ok(Addr::Length),
            (Kind::Array, Key::Field(name)) if is_valid_index(name) => name
                .parse()
                .map(Addr::Index)
                .map_err(|_| DraftError::InvalidIndex(name.clone())),
            (Kind::Array, Key::Field(name)) => Err(DraftError::InvalidIndex(name.clone())),
        }
    }
}

/// Canonical non-negative integer: digits only, no leading zero.
fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|&b| b.is_ascii_digit())
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Field(name) => f.write_str(name),
            Key::Index(index) => write!(f, "{index}"),
            Key::Length => f.write_str("length"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Field(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Field(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Key::Field(name.clone())
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}
