//! json-draft — copy-on-write drafts over JSON-shaped trees.
//!
//! A recipe mutates a [`Draft`] of a value with ordinary get/set/delete calls;
//! the original value is never altered, and the produced value shares every
//! subtree the recipe did not change with the original.
//!
//! Drafts are created lazily: only the records and arrays a recipe actually
//! reads get a draft of their own, and only the nodes on the path to a write
//! are copied, each at most once per session.
//!
//! # Example
//!
//! ```
//! use json_draft::{produce, DraftError, Value};
//! use serde_json::json;
//!
//! let base = Value::from(json!([{"x": 1}, 2, 3]));
//! let next = produce(&base, |draft| {
//!     draft.set(0, 1)?;
//!     draft.pop()?;
//!     draft.set(1, 66)?;
//!     Ok::<_, DraftError>(())
//! })
//! .unwrap();
//!
//! assert_eq!(next, Value::from(json!([1, 66])));
//! assert_eq!(base, Value::from(json!([{"x": 1}, 2, 3])));
//! ```

pub mod classify;
pub mod draft;
pub mod error;
pub mod finalize;
pub mod key;
mod mark;
pub mod produce;
pub mod state;
pub mod value;

pub use classify::{is_draftable, is_draftable_with, Options};
pub use draft::{Draft, PropertyDescriptor};
pub use error::DraftError;
pub use finalize::finish_draft;
pub use key::Key;
pub use produce::{create_draft, create_draft_with, produce, produce_with, revoke};
pub use state::{Kind, Slot};
pub use value::{Opaque, Record, Value};
