//! Change propagation up the draft tree.

use log::trace;
use std::rc::{Rc, Weak};

use crate::state::{Container, StateRef};

/// Marks `state` and every unmarked ancestor as changed.
///
/// Each newly marked node gets its copy: a shallow duplicate of its base with
/// the scratch mapping written over it. The walk stops at the first node that
/// is already marked, so every node is copied at most once per session.
pub(crate) fn mark(state: &StateRef) {
    let mut next = Some(Rc::clone(state));
    while let Some(current) = next.take() {
        let mut s = current.borrow_mut();
        if s.modified {
            break;
        }
        s.modified = true;
        let mut copy = Container::duplicate(&s.base);
        if let Some(staged) = s.drafts.take() {
            copy.overlay(staged);
        }
        trace!("marked {:?} node with {} entries", s.kind(), copy.len());
        s.copy = Some(copy);
        next = s.parent.as_ref().and_then(Weak::upgrade);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::produce::create_draft;
    use crate::state::Slot;
    use crate::value::Value;
    use serde_json::json;

    #[test]
    fn mark_is_idempotent() {
        let base = Value::from(json!({"a": {"b": 1}, "c": 2}));
        let d = create_draft(&base).unwrap();
        let a = d.at("a").unwrap();

        mark(d.state());
        let first = d.state().borrow().copy.clone().unwrap();
        a.set("b", 5).unwrap();
        mark(d.state());
        let second = d.state().borrow().copy.clone().unwrap();

        assert_eq!(first.len(), second.len());
        for (x, y) in first.slots().iter().zip(second.slots().iter()) {
            match (x, y) {
                (Slot::Draft(x), Slot::Draft(y)) => assert!(x.ptr_eq(y)),
                (Slot::Value(x), Slot::Value(y)) => assert!(x.same(y)),
                _ => panic!("slot changed kind after a second mark"),
            }
        }
    }

    #[test]
    fn mark_folds_scratch_into_copy() {
        let base = Value::from(json!({"a": {"b": 1}, "c": 2}));
        let d = create_draft(&base).unwrap();
        let a = d.at("a").unwrap();
        assert!(d.state().borrow().drafts.is_some());

        mark(d.state());
        let s = d.state().borrow();
        assert!(s.modified);
        assert!(s.drafts.is_none());
        let copy = s.copy.as_ref().unwrap();
        match copy.slots().first() {
            Some(Slot::Draft(child)) => assert!(child.ptr_eq(&a)),
            other => panic!("expected drafted child, got {other:?}"),
        }
    }

    #[test]
    fn mark_walks_to_the_root_once() {
        let base = Value::from(json!({"a": {"b": {"c": 1}}}));
        let d = create_draft(&base).unwrap();
        let b = d.at("a").unwrap().at("b").unwrap();

        mark(b.state());
        assert!(d.is_modified());
        let root_copy = d.state().borrow().copy.clone().unwrap();

        mark(b.state());
        let again = d.state().borrow().copy.clone().unwrap();
        match (root_copy.slots().first(), again.slots().first()) {
            (Some(Slot::Draft(x)), Some(Slot::Draft(y))) => assert!(x.ptr_eq(y)),
            other => panic!("unexpected root copy: {other:?}"),
        }
    }
}
