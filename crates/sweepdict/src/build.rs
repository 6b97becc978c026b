//! Factory surface for assembling builder trees.
//!
//! These free functions plus the `+` / `*` / `|` operators on [`Node`] are
//! the whole construction API; the `cdict!` / `clist!` macros are literal
//! sugar over them.

use crate::{
    node::{DictKind, Node},
    slot::Slot,
};

/// Leaf-dict whose records merge recursively under later combines.
pub fn dict<K, S, I>(fields: I) -> Node
where
    I: IntoIterator<Item = (K, S)>,
    K: Into<String>,
    S: Into<Slot>,
{
    Node::leaf(fields, DictKind::Standard)
}

/// Leaf-dict whose records reject any further combine.
pub fn finaldict<K, S, I>(fields: I) -> Node
where
    I: IntoIterator<Item = (K, S)>,
    K: Into<String>,
    S: Into<Slot>,
{
    Node::leaf(fields, DictKind::Final)
}

/// Leaf-dict whose produced values individually lose every collision.
pub fn defaultdict<K, S, I>(fields: I) -> Node
where
    I: IntoIterator<Item = (K, S)>,
    K: Into<String>,
    S: Into<Slot>,
{
    Node::leaf(fields, DictKind::Default)
}

/// Concatenation over an arbitrary (possibly one-shot) source.
///
/// The source is consumed at most once: items are snapshotted as they are
/// first pulled, so the node can be iterated any number of times.
pub fn iter<I>(source: I) -> Node
where
    I: IntoIterator,
    I::IntoIter: 'static,
    I::Item: Into<Slot> + 'static,
{
    Node::concat_one_shot(Box::new(source.into_iter().map(Into::into)))
}

/// Concatenation over a known item list.
pub fn list<I>(items: I) -> Node
where
    I: IntoIterator,
    I::Item: Into<Slot>,
{
    Node::concat_literal(items.into_iter().map(Into::into).collect())
}

/// Fold concatenation over nodes; identity is the empty list.
pub fn sum<I>(nodes: I) -> Node
where
    I: IntoIterator<Item = Node>,
{
    nodes
        .into_iter()
        .fold(list(Vec::<Slot>::new()), Node::concat)
}

/// Singleton concatenation wrapping one non-node value.
pub fn item<S>(value: S) -> Node
where
    S: Into<Slot>,
{
    Node::concat_literal(vec![value.into()])
}
