//! Assembling the result of a draft session.

use log::debug;
use std::rc::Rc;

use crate::draft::Draft;
use crate::error::DraftError;
use crate::state::{Container, Slot, StateRef};
use crate::value::Value;

/// Ends the session of `draft` and returns its result.
///
/// An unchanged root returns its base value itself. Otherwise every changed
/// node is rebuilt and every unchanged subtree is shared with the base.
///
/// # Errors
///
/// [`DraftError::Revoked`] if the session was revoked; a revoked session has
/// no result.
pub fn finish_draft(draft: &Draft) -> Result<Value, DraftError> {
    let modified = {
        let s = draft.state().borrow();
        if s.revoked {
            return Err(DraftError::Revoked);
        }
        s.modified
    };
    if !modified {
        let mut s = draft.state().borrow_mut();
        s.finalized = true;
        return Ok(s.base.to_value());
    }
    let result = finalize(draft.state());
    debug!("finished draft session with a new {}", result.type_name());
    Ok(result)
}

pub(crate) fn finalize(state: &StateRef) -> Value {
    build(state, true)
}

/// Like [`finalize`], without sealing the visited nodes.
pub(crate) fn snapshot(state: &StateRef) -> Value {
    build(state, false)
}

fn build(state: &StateRef, seal: bool) -> Value {
    let copy = {
        let mut s = state.borrow_mut();
        if seal {
            s.finalized = true;
        }
        match &s.copy {
            Some(copy) => copy.clone(),
            None => return s.base.to_value(),
        }
    };
    match copy {
        Container::Array(items) => Value::Array(Rc::new(
            items.iter().map(|slot| resolve(slot, seal)).collect(),
        )),
        Container::Object(map) => Value::Object(Rc::new(
            map.iter()
                .map(|(key, slot)| (key.clone(), resolve(slot, seal)))
                .collect(),
        )),
    }
}

fn resolve(slot: &Slot, seal: bool) -> Value {
    match slot {
        Slot::Draft(draft) => build(draft.state(), seal),
        Slot::Value(value) => value.clone(),
    }
}
