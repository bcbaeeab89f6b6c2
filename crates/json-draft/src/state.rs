//! Per-node bookkeeping of a draft session.

use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::classify::Options;
use crate::draft::Draft;
use crate::key::{Addr, Key};
use crate::value::{Record, Value};

pub(crate) type StateRef = Rc<RefCell<DraftState>>;

/// Container kind of a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Array,
    Object,
}

/// An entry of a draft: a child draft, or a value held as-is.
#[derive(Debug, Clone)]
pub enum Slot {
    Draft(Draft),
    Value(Value),
}

impl Slot {
    /// The child draft, if the slot holds one.
    pub fn as_draft(&self) -> Option<&Draft> {
        match self {
            Slot::Draft(draft) => Some(draft),
            Slot::Value(_) => None,
        }
    }

    /// The plain value, if the slot holds one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Slot::Draft(_) => None,
            Slot::Value(value) => Some(value),
        }
    }

    /// Consumes the slot and returns its child draft, if any.
    pub fn into_draft(self) -> Option<Draft> {
        match self {
            Slot::Draft(draft) => Some(draft),
            Slot::Value(_) => None,
        }
    }

    /// Identity against a base value. A draft is never identical to a value.
    pub(crate) fn same_as(&self, value: &Value) -> bool {
        match self {
            Slot::Draft(_) => false,
            Slot::Value(v) => v.same(value),
        }
    }

    pub(crate) fn is_truthy(&self) -> bool {
        match self {
            Slot::Draft(_) => true,
            Slot::Value(v) => v.is_truthy(),
        }
    }
}

impl From<Value> for Slot {
    fn from(value: Value) -> Self {
        Slot::Value(value)
    }
}

impl From<Draft> for Slot {
    fn from(draft: Draft) -> Self {
        Slot::Draft(draft)
    }
}

impl From<&Draft> for Slot {
    fn from(draft: &Draft) -> Self {
        Slot::Draft(draft.clone())
    }
}

impl From<serde_json::Value> for Slot {
    fn from(value: serde_json::Value) -> Self {
        Slot::Value(value.into())
    }
}

macro_rules! slot_from_primitive {
    ($($t:ty),*) => {
        $(impl From<$t> for Slot {
            fn from(v: $t) -> Self {
                Slot::Value(Value::from(v))
            }
        })*
    };
}

slot_from_primitive!(bool, i32, i64, u64, usize, f64, &str, String);

/// The original container of a draft.
#[derive(Debug, Clone)]
pub(crate) enum Base {
    Array(Rc<Vec<Value>>),
    Object(Rc<Record>),
}

impl Base {
    pub(crate) fn from_value(value: &Value) -> Option<Base> {
        match value {
            Value::Array(items) => Some(Base::Array(Rc::clone(items))),
            Value::Object(map) => Some(Base::Object(Rc::clone(map))),
            _ => None,
        }
    }

    pub(crate) fn kind(&self) -> Kind {
        match self {
            Base::Array(_) => Kind::Array,
            Base::Object(_) => Kind::Object,
        }
    }

    pub(crate) fn to_value(&self) -> Value {
        match self {
            Base::Array(items) => Value::Array(Rc::clone(items)),
            Base::Object(map) => Value::Object(Rc::clone(map)),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Base::Array(items) => items.len(),
            Base::Object(map) => map.len(),
        }
    }

    pub(crate) fn get(&self, addr: &Addr) -> Option<Value> {
        match (self, addr) {
            (Base::Array(items), Addr::Index(i)) => items.get(*i).cloned(),
            (Base::Array(items), Addr::Length) => Some(Value::from(items.len())),
            (Base::Object(map), Addr::Field(name)) => map.get(name).cloned(),
            _ => None,
        }
    }

    pub(crate) fn contains(&self, addr: &Addr) -> bool {
        match (self, addr) {
            (Base::Array(items), Addr::Index(i)) => *i < items.len(),
            (Base::Array(_), Addr::Length) => true,
            (Base::Object(map), Addr::Field(name)) => map.contains_key(name),
            _ => false,
        }
    }
}

/// The materialized copy of a changed draft.
#[derive(Debug, Clone)]
pub(crate) enum Container {
    Array(Vec<Slot>),
    Object(IndexMap<String, Slot>),
}

impl Container {
    /// Shallow duplicate: a new top-level container sharing every entry.
    pub(crate) fn duplicate(base: &Base) -> Container {
        match base {
            Base::Array(items) => Container::Array(items.iter().cloned().map(Slot::Value).collect()),
            Base::Object(map) => Container::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Slot::Value(v.clone())))
                    .collect(),
            ),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Container::Array(items) => items.len(),
            Container::Object(map) => map.len(),
        }
    }

    pub(crate) fn get(&self, addr: &Addr) -> Option<Slot> {
        match (self, addr) {
            (Container::Array(items), Addr::Index(i)) => items.get(*i).cloned(),
            (Container::Array(items), Addr::Length) => Some(Slot::Value(Value::from(items.len()))),
            (Container::Object(map), Addr::Field(name)) => map.get(name).cloned(),
            _ => None,
        }
    }

    pub(crate) fn contains(&self, addr: &Addr) -> bool {
        match (self, addr) {
            (Container::Array(items), Addr::Index(i)) => *i < items.len(),
            (Container::Array(_), Addr::Length) => true,
            (Container::Object(map), Addr::Field(name)) => map.contains_key(name),
            _ => false,
        }
    }

    /// Writes an entry. Arrays grow as needed, holes are `null`.
    pub(crate) fn insert(&mut self, addr: Addr, slot: Slot) {
        match (self, addr) {
            (Container::Array(items), Addr::Index(i)) => {
                if i >= items.len() {
                    items.resize(i, Slot::Value(Value::Null));
                    items.push(slot);
                } else {
                    items[i] = slot;
                }
            }
            (Container::Object(map), Addr::Field(name)) => {
                map.insert(name, slot);
            }
            _ => {}
        }
    }

    /// Removes an entry. Array elements leave a hole, keeping the length.
    pub(crate) fn remove(&mut self, addr: &Addr) {
        match (self, addr) {
            (Container::Array(items), Addr::Index(i)) => {
                if let Some(item) = items.get_mut(*i) {
                    *item = Slot::Value(Value::Null);
                }
            }
            (Container::Object(map), Addr::Field(name)) => {
                map.shift_remove(name);
            }
            _ => {}
        }
    }

    pub(crate) fn set_len(&mut self, len: usize) {
        if let Container::Array(items) = self {
            items.resize(len, Slot::Value(Value::Null));
        }
    }

    /// Writes every staged entry over this container.
    pub(crate) fn overlay(&mut self, staged: IndexMap<Addr, Slot>) {
        for (addr, slot) in staged {
            self.insert(addr, slot);
        }
    }

    pub(crate) fn slots(&self) -> Vec<Slot> {
        match self {
            Container::Array(items) => items.clone(),
            Container::Object(map) => map.values().cloned().collect(),
        }
    }
}

/// Bookkeeping record behind one [`Draft`].
#[derive(Debug)]
pub(crate) struct DraftState {
    pub(crate) base: Base,
    pub(crate) parent: Option<Weak<RefCell<DraftState>>>,
    pub(crate) drafts: Option<IndexMap<Addr, Slot>>,
    pub(crate) copy: Option<Container>,
    pub(crate) modified: bool,
    pub(crate) finalized: bool,
    pub(crate) revoked: bool,
    pub(crate) options: Options,
}

impl DraftState {
    pub(crate) fn new(base: Base, parent: Option<&StateRef>, options: Options) -> DraftState {
        DraftState {
            base,
            parent: parent.map(Rc::downgrade),
            drafts: None,
            copy: None,
            modified: false,
            finalized: false,
            revoked: false,
            options,
        }
    }

    pub(crate) fn kind(&self) -> Kind {
        self.base.kind()
    }

    /// Entry at `addr` in the copy, or in the base while unchanged.
    pub(crate) fn source_get(&self, addr: &Addr) -> Option<Slot> {
        match &self.copy {
            Some(copy) => copy.get(addr),
            None => self.base.get(addr).map(Slot::Value),
        }
    }

    pub(crate) fn source_contains(&self, addr: &Addr) -> bool {
        match &self.copy {
            Some(copy) => copy.contains(addr),
            None => self.base.contains(addr),
        }
    }

    pub(crate) fn source_len(&self) -> usize {
        match &self.copy {
            Some(copy) => copy.len(),
            None => self.base.len(),
        }
    }

    pub(crate) fn source_keys(&self) -> Vec<Key> {
        match (&self.copy, &self.base) {
            (Some(Container::Object(map)), _) => map.keys().cloned().map(Key::Field).collect(),
            (None, Base::Object(map)) => map.keys().cloned().map(Key::Field).collect(),
            _ => (0..self.source_len()).map(Key::Index).collect(),
        }
    }

    pub(crate) fn ensure_drafts(&mut self) {
        if self.drafts.is_none() {
            self.drafts = Some(IndexMap::new());
        }
    }

    /// Records a derived child: into the live copy once changed, into the
    /// scratch mapping before.
    pub(crate) fn stage(&mut self, addr: Addr, slot: Slot) {
        if let Some(copy) = self.copy.as_mut() {
            copy.insert(addr, slot);
        } else {
            self.drafts.get_or_insert_with(IndexMap::new).insert(addr, slot);
        }
    }

    /// Every child draft reachable from this node's scratch mapping and copy.
    pub(crate) fn child_drafts(&self) -> Vec<Draft> {
        let staged = self.drafts.iter().flat_map(|d| d.values().cloned());
        let copied = self.copy.iter().flat_map(Container::slots);
        staged.chain(copied).filter_map(Slot::into_draft).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base(v: serde_json::Value) -> Base {
        Base::from_value(&Value::from(v)).unwrap()
    }

    fn values(container: &Container) -> Vec<Value> {
        container
            .slots()
            .into_iter()
            .map(|s| s.as_value().cloned().unwrap())
            .collect()
    }

    #[test]
    fn base_rejects_non_containers() {
        assert!(Base::from_value(&Value::from(1)).is_none());
        assert_eq!(base(json!([1])).kind(), Kind::Array);
        assert_eq!(base(json!({})).kind(), Kind::Object);
    }

    #[test]
    fn duplicate_shares_entries() {
        let b = base(json!([{"x": 1}, 2]));
        let copy = Container::duplicate(&b);
        let first = b.get(&Addr::Index(0)).unwrap();
        assert!(copy.get(&Addr::Index(0)).unwrap().same_as(&first));
    }

    #[test]
    fn insert_past_end_pads_with_null() {
        let mut copy = Container::duplicate(&base(json!([1])));
        copy.insert(Addr::Index(3), Slot::from(4));
        assert_eq!(values(&copy), vec![Value::from(1), Value::Null, Value::Null, Value::from(4)]);
    }

    #[test]
    fn remove_leaves_hole_in_arrays() {
        let mut copy = Container::duplicate(&base(json!([1, 2, 3])));
        copy.remove(&Addr::Index(1));
        assert_eq!(values(&copy), vec![Value::from(1), Value::Null, Value::from(3)]);
    }

    #[test]
    fn remove_keeps_record_order() {
        let mut copy = Container::duplicate(&base(json!({"a": 1, "b": 2, "c": 3})));
        copy.remove(&Addr::Field("b".into()));
        copy.insert(Addr::Field("d".into()), Slot::from(4));
        match copy {
            Container::Object(map) => {
                assert_eq!(map.keys().collect::<Vec<_>>(), ["a", "c", "d"]);
            }
            Container::Array(_) => panic!("expected object"),
        }
    }

    #[test]
    fn set_len_truncates_and_extends() {
        let mut copy = Container::duplicate(&base(json!([1, 2, 3])));
        copy.set_len(1);
        assert_eq!(copy.len(), 1);
        copy.set_len(2);
        assert_eq!(values(&copy), vec![Value::from(1), Value::Null]);
    }

    #[test]
    fn overlay_is_order_independent() {
        let b = base(json!([0]));
        let mut forward = IndexMap::new();
        forward.insert(Addr::Index(2), Slot::from(2));
        forward.insert(Addr::Index(1), Slot::from(1));
        let mut backward = IndexMap::new();
        backward.insert(Addr::Index(1), Slot::from(1));
        backward.insert(Addr::Index(2), Slot::from(2));

        let mut a = Container::duplicate(&b);
        a.overlay(forward);
        let mut c = Container::duplicate(&b);
        c.overlay(backward);
        assert_eq!(values(&a), values(&c));
        assert_eq!(values(&a), vec![Value::from(0), Value::from(1), Value::from(2)]);
    }
}
