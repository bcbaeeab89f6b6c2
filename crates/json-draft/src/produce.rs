//! Draft sessions: create a draft, run a recipe against it, finish it.

use log::debug;

use crate::classify::{is_draftable_with, Options};
use crate::draft::Draft;
use crate::error::DraftError;
use crate::finalize::finish_draft;
use crate::value::Value;

/// Creates the root draft of a session over `base`.
///
/// # Errors
///
/// [`DraftError::NotDraftable`] if `base` is not an array or a serializable
/// plain record.
pub fn create_draft(base: &Value) -> Result<Draft, DraftError> {
    create_draft_with(base, Options::default())
}

/// [`create_draft`] with explicit options.
pub fn create_draft_with(base: &Value, options: Options) -> Result<Draft, DraftError> {
    if !is_draftable_with(base, &options) {
        return Err(DraftError::NotDraftable(base.type_name().to_string()));
    }
    Draft::new(base, None, options)
}

/// Disables `draft` and every draft reachable from it.
pub fn revoke(draft: &Draft) {
    let children = {
        let mut s = draft.state().borrow_mut();
        if s.revoked {
            return;
        }
        s.revoked = true;
        s.child_drafts()
    };
    for child in &children {
        revoke(child);
    }
}

/// Produces the next version of `base` by running `recipe` against a draft.
///
/// `base` is never modified. Subtrees the recipe does not change are shared
/// with `base`; if nothing changes, the result is `base` itself. If the recipe
/// fails (or panics) the session is revoked and its error is returned as-is.
///
/// # Example
///
/// ```
/// use json_draft::{produce, DraftError, Value};
/// use serde_json::json;
///
/// let base = Value::from(json!({"a": {"b": {"c": 1}}, "other": [1, 2]}));
/// let next = produce(&base, |draft| {
///     draft.set("y", 1)?;
///     draft.at("a")?.at("b")?.set("c", 3)?;
///     Ok::<_, DraftError>(())
/// })
/// .unwrap();
///
/// assert_eq!(next, Value::from(json!({"a": {"b": {"c": 3}}, "other": [1, 2], "y": 1})));
/// assert!(next.get("other").unwrap().same(base.get("other").unwrap()));
/// assert_eq!(base, Value::from(json!({"a": {"b": {"c": 1}}, "other": [1, 2]})));
/// ```
pub fn produce<F, E>(base: &Value, recipe: F) -> Result<Value, E>
where
    F: FnOnce(&Draft) -> Result<(), E>,
    E: From<DraftError>,
{
    produce_with(base, Options::default(), recipe)
}

/// [`produce`] with explicit options.
pub fn produce_with<F, E>(base: &Value, options: Options, recipe: F) -> Result<Value, E>
where
    F: FnOnce(&Draft) -> Result<(), E>,
    E: From<DraftError>,
{
    let draft = create_draft_with(base, options)?;
    let guard = RevokeOnDrop {
        draft: &draft,
        armed: true,
    };
    recipe(&draft)?;
    guard.disarm();
    Ok(finish_draft(&draft)?)
}

/// Revokes the session unless the recipe returned successfully.
struct RevokeOnDrop<'a> {
    draft: &'a Draft,
    armed: bool,
}

impl RevokeOnDrop<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RevokeOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!("recipe failed, revoking draft session");
            revoke(self.draft);
        }
    }
}
