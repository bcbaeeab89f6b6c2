//! The draft handle: intercepted reads, writes and deletes over one node.
//!
//! A [`Draft`] never touches its base value. Reads lazily wrap draftable
//! children in drafts of their own; the first real write materializes a
//! shallow copy of the node and of every unchanged ancestor, and
//! all further reads and writes go through that copy.

use log::trace;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::classify::{is_draftable_with, Options};
use crate::error::DraftError;
use crate::finalize;
use crate::key::{Addr, Key};
use crate::mark::mark;
use crate::state::{Base, DraftState, Kind, Slot, StateRef};
use crate::value::Value;

/// Property descriptor reported by [`Draft::describe`].
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub value: Slot,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

/// Interceptable handle over one node of a draft tree.
///
/// Cloning a `Draft` clones the handle; both refer to the same node.
#[derive(Clone)]
pub struct Draft {
    state: StateRef,
}

impl Draft {
    pub(crate) fn new(
        base: &Value,
        parent: Option<&StateRef>,
        options: Options,
    ) -> Result<Draft, DraftError> {
        let base = Base::from_value(base)
            .ok_or_else(|| DraftError::NotDraftable(base.type_name().to_string()))?;
        Ok(Draft {
            state: Rc::new(RefCell::new(DraftState::new(base, parent, options))),
        })
    }

    pub(crate) fn state(&self) -> &StateRef {
        &self.state
    }

    /// Returns `true` if both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Draft) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    fn live(&self) -> Result<std::cell::RefMut<'_, DraftState>, DraftError> {
        let state = self.state.borrow_mut();
        if state.revoked {
            return Err(DraftError::Revoked);
        }
        Ok(state)
    }

    /// Reads the entry at `key`.
    ///
    /// Returns `Ok(None)` for a missing key. A draftable child is returned as
    /// a [`Slot::Draft`], created on first read and reused afterwards; any
    /// other value is returned as a [`Slot::Value`].
    pub fn get(&self, key: impl Into<Key>) -> Result<Option<Slot>, DraftError> {
        let key = key.into();
        let mut s = self.live()?;
        let addr = key.resolve(s.kind())?;
        if addr == Addr::Length {
            return Ok(Some(Slot::Value(Value::from(s.source_len()))));
        }
        if !s.modified {
            if let Some(cached) = s.drafts.as_ref().and_then(|d| d.get(&addr)) {
                if cached.is_truthy() {
                    return Ok(Some(cached.clone()));
                }
            }
        }

        let Some(slot) = s.source_get(&addr) else {
            return Ok(None);
        };
        if s.finalized {
            return Ok(Some(slot));
        }
        s.ensure_drafts();

        let value = match slot {
            Slot::Value(value) if !s.modified || s.base.get(&addr).is_some_and(|b| b.same(&value)) => {
                value
            }
            // written or already drafted during this session
            other => return Ok(Some(other)),
        };

        let slot = if is_draftable_with(&value, &s.options) {
            trace!("drafting {} at {key}", value.type_name());
            Slot::Draft(Draft::new(&value, Some(&self.state), s.options)?)
        } else {
            Slot::Value(value)
        };
        s.stage(addr, slot.clone());
        Ok(Some(slot))
    }

    /// Writes `value` at `key`.
    ///
    /// Writing a value identical to the base value of an unchanged node is a
    /// no-op. Otherwise the node and its ancestors are marked as changed.
    /// Writing [`Key::Length`] on an array truncates or extends it.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Slot>) -> Result<(), DraftError> {
        let key = key.into();
        let slot = value.into();
        let addr = {
            let s = self.live()?;
            key.resolve(s.kind())?
        };
        match addr {
            Addr::Length => return self.set_len(length_of(&slot)?),
            Addr::Index(i) if i >= MAX_LENGTH => {
                return Err(DraftError::InvalidIndex(i.to_string()));
            }
            _ => {}
        }

        {
            let mut s = self.live()?;
            s.ensure_drafts();
            if !s.modified {
                if s.base.get(&addr).is_some_and(|b| slot.same_as(&b)) {
                    return Ok(());
                }
                s.stage(addr.clone(), slot.clone());
            }
        }
        mark(&self.state);

        let mut s = self.state.borrow_mut();
        if let Some(copy) = s.copy.as_mut() {
            copy.insert(addr, slot);
        }
        Ok(())
    }

    fn set_len(&self, len: usize) -> Result<(), DraftError> {
        {
            let s = self.live()?;
            if !s.modified && s.base.len() == len {
                return Ok(());
            }
        }
        mark(&self.state);

        let mut s = self.state.borrow_mut();
        if let Some(copy) = s.copy.as_mut() {
            copy.set_len(len);
        }
        Ok(())
    }

    /// Removes the entry at `key`.
    ///
    /// Removing a key present on the base marks the node as changed. Removing
    /// an array element leaves a `null` hole; use [`Draft::pop`] or write
    /// [`Key::Length`] to shrink an array. The length of an array cannot be
    /// removed.
    pub fn delete(&self, key: impl Into<Key>) -> Result<(), DraftError> {
        let key = key.into();
        let (addr, present) = {
            let s = self.live()?;
            let addr = key.resolve(s.kind())?;
            if addr == Addr::Length {
                return Err(DraftError::LengthNotConfigurable);
            }
            let present = s.base.contains(&addr);
            (addr, present)
        };
        if present {
            mark(&self.state);
        }

        let mut s = self.state.borrow_mut();
        if let Some(copy) = s.copy.as_mut() {
            copy.remove(&addr);
        }
        Ok(())
    }

    /// Describes the entry at `key` without drafting it.
    ///
    /// Every entry is writable. The length of an array is neither enumerable
    /// nor configurable.
    pub fn describe(&self, key: impl Into<Key>) -> Result<Option<PropertyDescriptor>, DraftError> {
        let key = key.into();
        let s = self.live()?;
        let addr = key.resolve(s.kind())?;
        let structural = addr == Addr::Length;
        Ok(s.source_get(&addr).map(|value| PropertyDescriptor {
            value,
            writable: true,
            enumerable: !structural,
            configurable: !structural,
        }))
    }

    /// Whether the draft stands for an array or a record.
    pub fn kind(&self) -> Kind {
        self.state.borrow().kind()
    }

    /// Number of elements of an array, or of fields of a record.
    pub fn len(&self) -> Result<usize, DraftError> {
        Ok(self.live()?.source_len())
    }

    /// `true` if the draft has no elements or fields.
    pub fn is_empty(&self) -> Result<bool, DraftError> {
        Ok(self.len()? == 0)
    }

    /// `true` if `key` is present; keys that do not fit the kind are absent.
    pub fn contains_key(&self, key: impl Into<Key>) -> Result<bool, DraftError> {
        let key = key.into();
        let s = self.live()?;
        match key.resolve(s.kind()) {
            Ok(addr) => Ok(s.source_contains(&addr)),
            Err(DraftError::InvalidIndex(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Current keys: indices of an array, fields of a record in order.
    pub fn keys(&self) -> Result<Vec<Key>, DraftError> {
        Ok(self.live()?.source_keys())
    }

    /// The original value this draft was taken from.
    pub fn original(&self) -> Value {
        self.state.borrow().base.to_value()
    }

    /// Returns `true` once this node has been changed.
    pub fn is_modified(&self) -> bool {
        self.state.borrow().modified
    }

    /// Plain snapshot of the draft as it stands, without ending the session.
    ///
    /// Fails with [`DraftError::Revoked`] once the session is revoked.
    pub fn current(&self) -> Result<Value, DraftError> {
        drop(self.live()?);
        Ok(finalize::snapshot(&self.state))
    }

    /// The child draft at `key`.
    ///
    /// # Errors
    ///
    /// [`DraftError::NotDraftable`] if the entry is missing or is not a
    /// draftable container.
    pub fn at(&self, key: impl Into<Key>) -> Result<Draft, DraftError> {
        let key = key.into();
        match self.get(&key)? {
            Some(Slot::Draft(draft)) => Ok(draft),
            Some(Slot::Value(value)) => Err(DraftError::NotDraftable(value.type_name().to_string())),
            None => Err(DraftError::NotDraftable("undefined".to_string())),
        }
    }

    /// Reads `key` as a plain value; child drafts are snapshotted.
    pub fn get_value(&self, key: impl Into<Key>) -> Result<Option<Value>, DraftError> {
        match self.get(key)? {
            Some(Slot::Draft(draft)) => draft.current().map(Some),
            Some(Slot::Value(value)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    /// Appends to an array.
    pub fn push(&self, value: impl Into<Slot>) -> Result<(), DraftError> {
        if self.kind() != Kind::Array {
            return Err(DraftError::NotASequence);
        }
        let len = self.len()?;
        self.set(Key::Index(len), value)
    }

    /// Removes and returns the last element of an array.
    ///
    /// Goes through the same reads, delete and length write a native array
    /// pop issues against an intercepted array.
    pub fn pop(&self) -> Result<Option<Slot>, DraftError> {
        if self.kind() != Kind::Array {
            return Err(DraftError::NotASequence);
        }
        let len = self
            .get(Key::Length)?
            .and_then(|slot| slot.as_value().and_then(Value::as_f64))
            .map_or(0, |len| len as usize);
        if len == 0 {
            self.set(Key::Length, 0)?;
            return Ok(None);
        }
        let last = self.get(len - 1)?;
        self.delete(len - 1)?;
        self.set(Key::Length, len - 1)?;
        Ok(last)
    }
}

/// Longest array a draft accepts.
const MAX_LENGTH: usize = u32::MAX as usize;

fn length_of(slot: &Slot) -> Result<usize, DraftError> {
    let invalid = || {
        DraftError::InvalidLength(match slot {
            Slot::Draft(_) => "draft".to_string(),
            Slot::Value(value) => value.to_string(),
        })
    };
    let Slot::Value(Value::Number(n)) = slot else {
        return Err(invalid());
    };
    if let Some(len) = n.as_u64() {
        return usize::try_from(len)
            .ok()
            .filter(|&len| len <= MAX_LENGTH)
            .ok_or_else(invalid);
    }
    match n.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= MAX_LENGTH as f64 => Ok(f as usize),
        _ => Err(invalid()),
    }
}

impl fmt::Debug for Draft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_borrow() {
            Ok(s) => f
                .debug_struct("Draft")
                .field("kind", &s.kind())
                .field("modified", &s.modified)
                .field("revoked", &s.revoked)
                .finish(),
            Err(_) => f.write_str("Draft { <borrowed> }"),
        }
    }
}
