//! End-to-end sweeps through the public builder surface.

use sweepdict::{
    build, cdefaultdict, cdict, cfinaldict, clist,
    error::{CollisionError, ExpandError},
    prelude::*,
    record,
};

fn sweep(node: &Node) -> Vec<Record> {
    node.items()
        .map(|item| match item {
            Ok(Value::Record(r)) => r,
            Ok(v) => panic!("expected a record, got {v}"),
            Err(e) => panic!("enumeration failed: {e}"),
        })
        .collect()
}

#[test]
fn leaf_dict_sweeps_list_fields() {
    let node = cdict! { a: 5, b: clist![3, 30] };
    assert_eq!(
        sweep(&node),
        vec![record! { a: 5, b: 3 }, record! { a: 5, b: 30 }]
    );
}

#[test]
fn product_merges_disjoint_records() {
    let node = cdict! { a: clist![1, 2] } * cdict! { b: "x" };
    assert_eq!(
        sweep(&node),
        vec![record! { a: 1, b: "x" }, record! { a: 2, b: "x" }]
    );
}

#[test]
fn product_collision_needs_an_override() {
    let colliding = cdict! { a: 5, b: 3 } * cdict! { a: 6, c: 4 };
    let err = colliding.items().next().unwrap().unwrap_err();
    assert!(matches!(
        err,
        ExpandError::Collision(CollisionError::NoProtocol { ref key, .. }) if key.as_deref() == Some("a")
    ));

    let resolved = cdict! { a: 5, b: 3 } * cdict! { a: Slot::overriding(6), c: 4 };
    assert_eq!(sweep(&resolved), vec![record! { a: 6, b: 3, c: 4 }]);
}

#[test]
fn combiner_accumulates_across_a_product() {
    let dot = Combiner::new(|x, y| match (x, y) {
        (Value::Text(a), Value::Text(b)) => Value::Text(format!("{a}.{b}")),
        _ => Value::Null,
    });

    let left = build::sum(["a1", "a2"].map(|s| build::dict([("name", dot.wrap(s))])));
    let right = build::sum(["b1", "b2"].map(|s| build::dict([("name", dot.wrap(s))])));
    let names: Vec<String> = sweep(&(left * right))
        .into_iter()
        .map(|r| r.get("name").unwrap().as_text().unwrap().to_string())
        .collect();

    assert_eq!(names, vec!["a1.b1", "a1.b2", "a2.b1", "a2.b2"]);
}

#[test]
fn nested_dicts_merge_recursively() {
    let node = cdict! { m: cdict! { x: 1 } } * cdict! { m: cdict! { y: clist![2, 3] } };
    assert_eq!(
        sweep(&node),
        vec![
            record! { m: record! { x: 1, y: 2 } },
            record! { m: record! { x: 1, y: 3 } },
        ]
    );
}

#[test]
fn raw_nested_record_does_not_combine_twice() {
    // a record literal merges once, then the merged value is plain
    let node =
        cdict! { m: cdict! { x: 1 } } * cdict! { m: record! { y: 2 } } * cdict! { m: cdict! { z: 3 } };
    assert!(node.items().next().unwrap().is_err());
}

#[test]
fn finaldict_rejects_combination_even_on_disjoint_keys() {
    let node = cfinaldict! { a: 1 } * cdict! { b: 2 };
    let err = node.items().next().unwrap().unwrap_err();
    assert!(matches!(
        err,
        ExpandError::Collision(CollisionError::Finalized { .. })
    ));

    // combining into the final record from the left works, and the result
    // stays final
    let node = cdict! { a: 1 } * cfinaldict! { b: 2 };
    assert_eq!(sweep(&node), vec![record! { a: 1, b: 2 }]);
    assert!((node * cdict! { c: 3 }).items().next().unwrap().is_err());
}

#[test]
fn defaultdict_supplies_overridable_defaults() {
    let defaults = cdefaultdict! { lr: 1, seed: 0 };
    let node = defaults * cdict! { lr: clist![10, 100] };
    assert_eq!(
        sweep(&node),
        vec![record! { lr: 10, seed: 0 }, record! { lr: 100, seed: 0 }]
    );
}

#[test]
fn zip_pairs_children_positionally() {
    let node = cdict! { a: clist![1, 2, 3] } | cdict! { b: clist![4, 5, 6] };
    assert_eq!(
        sweep(&node),
        vec![
            record! { a: 1, b: 4 },
            record! { a: 2, b: 5 },
            record! { a: 3, b: 6 },
        ]
    );
}

#[test]
fn zip_length_mismatch_fails_lazily() {
    let node = cdict! { a: clist![1, 2, 3] } | cdict! { b: clist![4, 5] };
    let outcomes: Vec<_> = node.items().collect();

    // the two aligned rows are yielded before the mismatch surfaces
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_ok());
    assert!(outcomes[1].is_ok());
    assert_eq!(
        outcomes[2].clone().unwrap_err(),
        ExpandError::LengthMismatch { position: 2 }
    );
}

#[test]
fn sum_concatenates_generated_sweeps() {
    let node = build::sum((1..=3).map(|i| build::dict([("run", i)])));
    assert_eq!(
        sweep(&node),
        vec![record! { run: 1 }, record! { run: 2 }, record! { run: 3 }]
    );
}

#[test]
fn one_shot_sweeps_restart_identically() {
    let node = build::iter((0..4).map(|i| build::dict([("i", i)]))) * cdict! { tag: "x" };
    let first = sweep(&node);
    let second = sweep(&node);
    assert_eq!(first, second);
    assert_eq!(node.count().unwrap(), 4);
}

#[test]
fn transforms_compose_over_sweeps() {
    let node = (cdict! { n: clist![1, 2, 3, 4] })
        .filter(|v| {
            matches!(
                v,
                Value::Record(r) if matches!(r.get("n"), Some(Value::Int(n)) if n % 2 == 1)
            )
        })
        .map(|v| match v {
            Value::Record(r) => {
                let doubled = match r.get("n") {
                    Some(Value::Int(n)) => Value::Int(n * 2),
                    _ => Value::Null,
                };
                Value::Record(r.with("n2", doubled))
            }
            v => v,
        });

    assert_eq!(
        sweep(&node),
        vec![record! { n: 1, n2: 2 }, record! { n: 3, n2: 6 }]
    );
}

#[test]
fn lazy_fields_materialize_per_record() {
    use std::{cell::Cell, rc::Rc};

    let runs = Rc::new(Cell::new(0));
    let counter = Rc::clone(&runs);
    let node = cdict! {
        a: clist![1, 2],
        stamp: Slot::lazy(move || {
            counter.set(counter.get() + 1);
            Value::Int(counter.get())
        })
    };

    assert_eq!(
        sweep(&node),
        vec![record! { a: 1, stamp: 1 }, record! { a: 2, stamp: 2 }]
    );
    assert_eq!(runs.get(), 2);
}

#[test]
fn records_serialize_to_json() {
    let node = cdict! { a: 5, b: clist!["x", "y"] };
    let lines: Vec<String> = sweep(&node)
        .iter()
        .map(|r| serde_json::to_string(r).unwrap())
        .collect();

    assert_eq!(lines, vec![r#"{"a":5,"b":"x"}"#, r#"{"a":5,"b":"y"}"#]);
}
