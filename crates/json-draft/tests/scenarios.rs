use json_draft::{create_draft, finish_draft, produce, DraftError, Key, Opaque, Record, Value};
use serde_json::json;

fn value(v: serde_json::Value) -> Value {
    Value::from(v)
}

#[derive(Debug)]
struct Instance {
    name: String,
}

impl Opaque for Instance {
    fn type_name(&self) -> &str {
        "Instance"
    }

    fn to_json(&self) -> Option<serde_json::Value> {
        Some(json!({ "name": self.name }))
    }
}

#[test]
fn nested_write_rebuilds_only_the_written_path() {
    let base = value(json!({"a": {"b": {"c": 1}, "side": {"s": 1}}, "other": {"o": 1}}));
    let next = produce(&base, |data| {
        data.set("y", 1)?;
        data.at("a")?.at("b")?.set("c", 3)?;
        Ok::<_, DraftError>(())
    })
    .unwrap();

    assert_eq!(
        next,
        value(json!({"a": {"b": {"c": 3}, "side": {"s": 1}}, "other": {"o": 1}, "y": 1}))
    );
    let a = next.get("a").unwrap();
    let base_a = base.get("a").unwrap();
    assert!(!a.same(base_a));
    assert!(!a.get("b").unwrap().same(base_a.get("b").unwrap()));
    assert!(a.get("side").unwrap().same(base_a.get("side").unwrap()));
    assert!(next.get("other").unwrap().same(base.get("other").unwrap()));
}

#[test]
fn nested_write_matches_reference_output() {
    let base = value(json!({"a": {"b": {"c": 1}}}));
    let next = produce(&base, |data| {
        data.set("y", 1)?;
        data.at("a")?.at("b")?.set("c", 3)?;
        Ok::<_, DraftError>(())
    })
    .unwrap();
    assert_eq!(next.to_json(), Some(json!({"a": {"b": {"c": 3}}, "y": 1})));
    assert_eq!(base.to_json(), Some(json!({"a": {"b": {"c": 1}}})));
}

#[test]
fn array_set_pop_set() {
    let base = value(json!([{"x": 1}, 2, 3]));
    let next = produce(&base, |array| {
        array.set(0, 1)?;
        array.pop()?;
        array.set(1, 66)?;
        Ok::<_, DraftError>(())
    })
    .unwrap();
    assert_eq!(next, value(json!([1, 66])));
    assert_eq!(base, value(json!([{"x": 1}, 2, 3])));
}

#[test]
fn writing_the_same_value_returns_the_input() {
    let base = value(json!({"a": 1}));
    let next = produce(&base, |data| data.set("a", 1)).unwrap();
    assert!(next.same(&base));
}

#[test]
fn opaque_values_pass_through_by_reference() {
    let mut map = Record::new();
    map.insert(
        "special".to_string(),
        Value::opaque(Instance {
            name: "widget".to_string(),
        }),
    );
    map.insert("n".to_string(), Value::from(1));
    let base = Value::from(map);

    let next = produce(&base, |data| {
        let special = data.get("special")?;
        assert!(special.is_some_and(|slot| slot.as_draft().is_none()));
        data.set("n", 2)
    })
    .unwrap();

    assert!(next.get("special").unwrap().same(base.get("special").unwrap()));
    assert_eq!(next.get("n"), Some(&Value::from(2)));
}

#[test]
fn failing_recipe_leaves_input_unchanged() {
    let base = value(json!({"a": {"b": 1}, "list": [1, 2]}));
    let snapshot = base.to_json();
    let result = produce(&base, |data| {
        data.at("a")?.set("b", 2)?;
        data.at("list")?.push(3)?;
        data.delete("a")?;
        Err(DraftError::NotDraftable("boom".into()))
    });
    assert_eq!(result.unwrap_err(), DraftError::NotDraftable("boom".into()));
    assert_eq!(base.to_json(), snapshot);
}

#[test]
fn unserializable_record_passes_through_by_reference() {
    #[derive(Debug)]
    struct Callback;
    impl Opaque for Callback {
        fn type_name(&self) -> &str {
            "Callback"
        }
    }

    let mut handlers = Record::new();
    handlers.insert("cb".to_string(), Value::opaque(Callback));
    let mut holder = Record::new();
    holder.insert("handlers".to_string(), Value::from(handlers));
    let base = Value::from(vec![Value::from(holder), value(json!({"count": 0}))]);

    let next = produce(&base, |list| {
        assert_eq!(list.at(0).unwrap_err(), DraftError::NotDraftable("object".into()));
        list.at(1)?.set("count", 1)
    })
    .unwrap();

    assert_eq!(next.at(1), Some(&value(json!({"count": 1}))));
    assert!(next.at(0).unwrap().same(base.at(0).unwrap()));
}

#[test]
fn moved_draft_is_finalized_in_its_new_place() {
    let base = value(json!({"from": {"v": 1}, "to": null}));
    let next = produce(&base, |data| {
        let from = data.at("from")?;
        from.set("v", 2)?;
        data.set("to", &from)?;
        data.delete("from")
    })
    .unwrap();
    assert_eq!(next, value(json!({"to": {"v": 2}})));
}

#[test]
fn moved_untouched_draft_keeps_sharing() {
    let base = value(json!({"from": {"v": 1}}));
    let next = produce(&base, |data| {
        let from = data.at("from")?;
        data.set("to", from)
    })
    .unwrap();
    assert!(next.get("to").unwrap().same(base.get("from").unwrap()));
    assert!(next.get("from").unwrap().same(base.get("from").unwrap()));
}

#[test]
fn manual_session_lifecycle() {
    let base = value(json!({"rows": [[1, 2], [3, 4]]}));
    let root = create_draft(&base).unwrap();
    let rows = root.at("rows").unwrap();
    rows.at(1).unwrap().set(Key::Length, 1).unwrap();

    assert!(root.is_modified());
    assert!(rows.is_modified());
    assert!(!rows.at(0).unwrap().is_modified());

    let next = finish_draft(&root).unwrap();
    assert_eq!(next, value(json!({"rows": [[1, 2], [3]]})));
    let next_rows = next.get("rows").unwrap();
    let base_rows = base.get("rows").unwrap();
    assert!(next_rows.at(0).unwrap().same(base_rows.at(0).unwrap()));
}

#[test]
fn rejected_writes_leave_the_tree_unchanged() {
    let base = value(json!({"rows": [[1, 2], [3, 4]]}));
    let root = create_draft(&base).unwrap();
    let rows = root.at("rows").unwrap();
    let row = rows.at(0).unwrap();

    assert!(matches!(row.set(Key::Length, -1), Err(DraftError::InvalidLength(_))));
    assert!(matches!(row.set(Key::Length, u64::MAX), Err(DraftError::InvalidLength(_))));
    assert!(matches!(row.set(usize::MAX, 5), Err(DraftError::InvalidIndex(_))));
    assert!(matches!(rows.set("x", 5), Err(DraftError::InvalidIndex(_))));

    assert!(!row.is_modified());
    assert!(!rows.is_modified());
    assert!(!root.is_modified());
    assert_eq!(row.len(), Ok(2));
    assert!(finish_draft(&root).unwrap().same(&base));
}

#[test]
fn write_past_end_pads_with_null() {
    let base = value(json!([1]));
    let next = produce(&base, |list| list.set(3, 4)).unwrap();
    assert_eq!(next, value(json!([1, null, null, 4])));
}

#[test]
fn record_key_order_is_preserved() {
    let base = value(json!({"z": 1, "a": 2, "m": 3}));
    let next = produce(&base, |data| {
        data.set("a", 20)?;
        data.delete("z")?;
        data.set("z", 10)
    })
    .unwrap();
    let keys: Vec<&String> = next.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["a", "m", "z"]);
}
