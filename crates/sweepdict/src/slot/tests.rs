use crate::{
    error::{CollisionError, ExpandError},
    slot::{Combiner, Draft, DraftPolicy, Slot, combine_items, combine_slots},
    value::Value,
};
use std::{cell::Cell, rc::Rc};

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn dot_combiner() -> Combiner {
    Combiner::new(|x, y| match (x, y) {
        (Value::Text(a), Value::Text(b)) => Value::Text(format!("{a}.{b}")),
        _ => Value::Null,
    })
}

#[test]
fn plain_collision_errors_with_key() {
    let err = combine_slots(Some("a"), Slot::plain(5), Slot::plain(6)).unwrap_err();
    assert!(matches!(
        err,
        ExpandError::Collision(CollisionError::NoProtocol { ref key, .. }) if key.as_deref() == Some("a")
    ));
    assert!(err.to_string().contains("key `a`"));
}

#[test]
fn overridable_always_loses() {
    let merged = combine_slots(Some("a"), Slot::overridable(5), Slot::plain(6)).unwrap();
    assert_eq!(merged.resolve().unwrap(), Value::Int(6));

    // overridable on the incoming side grants nothing
    assert!(combine_slots(Some("a"), Slot::plain(5), Slot::overridable(6)).is_err());
}

#[test]
fn override_wins_from_either_side() {
    let merged = combine_slots(Some("a"), Slot::plain(5), Slot::overriding(6)).unwrap();
    assert_eq!(merged.resolve().unwrap(), Value::Int(6));

    let merged = combine_slots(Some("a"), Slot::overriding(5), Slot::plain(6)).unwrap();
    assert_eq!(merged.resolve().unwrap(), Value::Int(5));
}

#[test]
fn combiner_accumulates_and_stays_combinable() {
    let c = dot_combiner();
    let merged = combine_items(c.wrap(text("a")), Slot::plain(text("b"))).unwrap();
    let merged = combine_items(merged, Slot::plain(text("c"))).unwrap();
    assert_eq!(merged.resolve().unwrap(), text("a.b.c"));
}

#[test]
fn once_combiner_collapses_after_first_use() {
    let c = Combiner::once(|x, y| match (x, y) {
        (Value::Int(a), Value::Int(b)) => Value::Int(a + b),
        _ => Value::Null,
    });
    let merged = combine_items(c.wrap(1), Slot::plain(2)).unwrap();
    assert_eq!(merged.resolve().unwrap(), Value::Int(3));

    // collapsed to a plain value: the next collision has no protocol
    assert!(combine_items(merged, Slot::plain(3)).is_err());
}

#[test]
fn joining_combiner_concatenates_renderings() {
    let c = Combiner::joining(".");
    let merged = combine_items(c.wrap(text("run")), Slot::plain(7)).unwrap();
    let merged = combine_items(merged, Slot::plain(text("hot"))).unwrap();
    assert_eq!(merged.resolve().unwrap(), text("run.7.hot"));
}

#[test]
fn combinable_resolves_incoming_wrappers() {
    let c = dot_combiner();
    let merged = combine_items(c.wrap(text("a")), Slot::lazy(|| text("b"))).unwrap();
    assert_eq!(merged.resolve().unwrap(), text("a.b"));
}

#[test]
fn nested_combinable_drafts_merge_recursively() {
    let left = Draft::combinable([("x", Slot::plain(1))]);
    let right = Draft::combinable([("y", Slot::plain(2))]);
    let merged = combine_slots(Some("sub"), Slot::Nested(left), Slot::Nested(right)).unwrap();
    assert_eq!(
        merged.resolve().unwrap(),
        Value::Record(record! { x: 1, y: 2 })
    );
}

#[test]
fn raw_record_literal_is_combinable_once() {
    let left = Draft::combinable([("x", Slot::plain(1))]);
    let literal = Slot::plain(Value::Record(record! { y: 2 }));
    let merged = combine_slots(Some("sub"), Slot::Nested(left), literal).unwrap();

    // the merge result inherited the literal's plain policy: a second
    // collision on it fails
    let again = Draft::combinable([("z", Slot::plain(3))]);
    assert!(combine_slots(Some("sub"), merged, Slot::Nested(again)).is_err());
}

#[test]
fn finalized_draft_rejects_combine() {
    let left = Draft::finalized([("x", Slot::plain(1))]);
    let right = Draft::combinable([("y", Slot::plain(2))]);
    let err = combine_slots(Some("sub"), Slot::Nested(left), Slot::Nested(right)).unwrap_err();
    assert!(matches!(
        err,
        ExpandError::Collision(CollisionError::Finalized { .. })
    ));
}

#[test]
fn merging_non_record_into_draft_errors() {
    let left = Draft::combinable([("x", Slot::plain(1))]);
    let err = combine_slots(Some("sub"), Slot::Nested(left), Slot::plain(2)).unwrap_err();
    assert!(matches!(
        err,
        ExpandError::Collision(CollisionError::NotARecord { .. })
    ));
}

#[test]
fn item_level_collision_reports_no_key() {
    let err = combine_items(Slot::plain(1), Slot::plain(2)).unwrap_err();
    assert!(matches!(
        err,
        ExpandError::Collision(CollisionError::NoProtocol { key: None, .. })
    ));
    assert!(!err.to_string().contains("key `"));
}

#[test]
fn lazy_runs_only_at_materialization() {
    let runs = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&runs);
    let slot = Slot::lazy(move || {
        counter.set(counter.get() + 1);
        Value::Int(42)
    });

    assert_eq!(runs.get(), 0);
    assert_eq!(slot.resolve().unwrap(), Value::Int(42));
    assert_eq!(runs.get(), 1);
}

#[test]
fn draft_resolution_discharges_all_wrappers() {
    let draft = Draft::combinable([
        ("a", Slot::overridable(1)),
        ("b", Slot::overriding(2)),
        ("c", Slot::lazy(|| Value::Int(3))),
    ]);
    assert_eq!(draft.resolve().unwrap(), record! { a: 1, b: 2, c: 3 });
    assert_eq!(draft.policy(), DraftPolicy::Combinable);
}
