mod dict;
mod source;
mod transform;


use crate::{
    error::ExpandError,
    obs::{ExpandTraceEvent, ExpandTraceSink, NodeKind, Traced},
    slot::{Slot, combine_items},
    value::Value,
};
use std::{
    fmt,
    ops::{Add, BitOr, Mul},
    rc::Rc,
};

pub(crate) use dict::{DictExtension, DictKind, DictNode};
pub(crate) use source::Source;
pub(crate) use transform::{TransformNode, TransformOp};

pub(crate) type BoxIter = Box<dyn Iterator<Item = Result<Slot, ExpandError>>>;

///
/// Node
///
/// An immutable builder-tree element denoting a set of possible records
/// (its extension). Nodes are assembled by the `build` factories and the
/// `+` / `*` / `|` operators, and enumerated with [`items`](Self::items).
///
/// Iterating is restartable: every pass re-derives the extension from the
/// tree, and one-shot input sources are snapshotted on first consumption.
///

#[derive(Clone)]
pub struct Node(NodeRepr);

#[derive(Clone)]
enum NodeRepr {
    Dict(Rc<DictNode>),
    Concat(Rc<ConcatNode>),
    Product(Rc<ProductNode>),
    Zip(Rc<ZipNode>),
    Transform(Rc<TransformNode>),
}

///
/// ConcatNode
/// Ordered union of its items; nested nodes flatten one level.
///

#[derive(Debug)]
struct ConcatNode {
    source: Source,
}

///
/// ProductNode
/// Every combine of a left item with a right item, right varying fastest.
///

struct ProductNode {
    left: Node,
    right: Node,
}

///
/// ZipNode
/// Position-wise combine of equal-length children.
///

struct ZipNode {
    children: Vec<Node>,
}

impl Node {
    //
    // construction (crate-internal; the public surface is `build`)
    //

    pub(crate) fn leaf<K, S, I>(fields: I, kind: DictKind) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<Slot>,
    {
        Self(NodeRepr::Dict(Rc::new(DictNode::new(fields, kind))))
    }

    pub(crate) fn concat_literal(items: Vec<Slot>) -> Self {
        Self(NodeRepr::Concat(Rc::new(ConcatNode {
            source: Source::literal(items),
        })))
    }

    pub(crate) fn concat_one_shot(iter: Box<dyn Iterator<Item = Slot>>) -> Self {
        Self(NodeRepr::Concat(Rc::new(ConcatNode {
            source: Source::one_shot(iter),
        })))
    }

    //
    // algebra (named operations; `+`, `*`, `|` are sugar)
    //

    /// Ordered union of the two extensions.
    #[must_use]
    pub fn concat(self, other: Self) -> Self {
        Self::concat_literal(vec![Slot::Node(self), Slot::Node(other)])
    }

    /// Cartesian product: combines every left item with every right item,
    /// the right operand varying fastest.
    #[must_use]
    pub fn product(self, other: Self) -> Self {
        Self(NodeRepr::Product(Rc::new(ProductNode {
            left: self,
            right: other,
        })))
    }

    /// Position-wise combine; enumerating fails on a length mismatch.
    #[must_use]
    pub fn zip(self, other: Self) -> Self {
        Self(NodeRepr::Zip(Rc::new(ZipNode {
            children: vec![self, other],
        })))
    }

    //
    // transforms
    //

    /// One output record per input record.
    #[must_use]
    pub fn map(self, f: impl Fn(Value) -> Value + 'static) -> Self {
        self.transform(TransformOp::Map(Rc::new(f)))
    }

    /// Keep only records the predicate accepts.
    #[must_use]
    pub fn filter(self, f: impl Fn(&Value) -> bool + 'static) -> Self {
        self.transform(TransformOp::Filter(Rc::new(f)))
    }

    /// Zero or more output records per input record.
    #[must_use]
    pub fn apply(self, f: impl Fn(Value) -> Vec<Value> + 'static) -> Self {
        self.transform(TransformOp::Apply(Rc::new(f)))
    }

    /// Like [`apply`](Self::apply), but the function sees protocol slots
    /// instead of resolved values, so its outputs can still combine under
    /// later products and zips.
    #[must_use]
    pub fn apply_raw(self, f: impl Fn(Slot) -> Vec<Slot> + 'static) -> Self {
        self.transform(TransformOp::ApplyRaw(Rc::new(f)))
    }

    fn transform(self, op: TransformOp) -> Self {
        Self(NodeRepr::Transform(Rc::new(TransformNode {
            inner: self,
            op,
        })))
    }

    //
    // enumeration
    //

    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match &self.0 {
            NodeRepr::Dict(_) => NodeKind::Dict,
            NodeRepr::Concat(_) => NodeKind::Concat,
            NodeRepr::Product(_) => NodeKind::Product,
            NodeRepr::Zip(_) => NodeKind::Zip,
            NodeRepr::Transform(_) => NodeKind::Transform,
        }
    }

    /// Lazy sequence of protocol-level items (no wrapper resolution).
    #[must_use]
    pub fn extension(&self) -> Extension {
        Extension(self.extension_boxed())
    }

    /// Lazy sequence of fully materialized values.
    #[must_use]
    pub fn items(&self) -> Items {
        Items(self.extension_boxed())
    }

    /// Like [`items`](Self::items), reporting enumeration progress to the
    /// given sink. Tracing never affects what is yielded.
    pub fn items_traced<'a>(&self, sink: &'a dyn ExpandTraceSink) -> Traced<'a> {
        sink.on_event(ExpandTraceEvent::Start { node: self.kind() });

        Traced::new(self.items(), sink, self.kind())
    }

    /// Number of records in the extension; forces a full (unresolved) pass.
    pub fn count(&self) -> Result<usize, ExpandError> {
        let mut n = 0;
        for item in self.extension() {
            item?;
            n += 1;
        }

        Ok(n)
    }

    pub(crate) fn extension_boxed(&self) -> BoxIter {
        let inner: BoxIter = match &self.0 {
            NodeRepr::Dict(d) => Box::new(DictExtension::new(Rc::clone(d))),
            NodeRepr::Concat(c) => Box::new(c.source.iter().flat_map(|slot| -> BoxIter {
                match slot {
                    Slot::Node(n) => n.extension_boxed(),
                    slot => Box::new(std::iter::once(Ok(slot))),
                }
            })),
            NodeRepr::Product(p) => Box::new(ProductExtension::new(Rc::clone(p))),
            NodeRepr::Zip(z) => Box::new(ZipExtension::new(z)),
            NodeRepr::Transform(t) => {
                let op = t.op.clone();
                Box::new(
                    t.inner
                        .extension_boxed()
                        .flat_map(move |item| op.expand(item)),
                )
            }
        };

        Box::new(FuseOnError {
            inner,
            failed: false,
        })
    }
}

impl Add for Node {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.concat(rhs)
    }
}

impl Mul for Node {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.product(rhs)
    }
}

impl BitOr for Node {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.zip(rhs)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            NodeRepr::Dict(d) => {
                let prefix = match d.kind() {
                    DictKind::Standard => "cdict",
                    DictKind::Default => "cdefaultdict",
                    DictKind::Final => "cfinaldict",
                };
                write!(f, "{prefix}(")?;
                for (i, (k, slot)) in d.fields().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}={slot}")?;
                }
                write!(f, ")")
            }
            NodeRepr::Concat(c) => match c.source.literal_items() {
                Some(items) => {
                    write!(f, "clist(")?;
                    for (i, slot) in items.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{slot}")?;
                    }
                    write!(f, ")")
                }
                None => write!(f, "citer(..)"),
            },
            NodeRepr::Product(p) => write!(f, "{} * {}", p.left, p.right),
            NodeRepr::Zip(z) => {
                for (i, child) in z.children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
            NodeRepr::Transform(t) => write!(f, "{}.{}(..)", t.inner, t.op.label()),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

///
/// Extension
/// Protocol-level enumeration of a node.
///

pub struct Extension(BoxIter);

impl Iterator for Extension {
    type Item = Result<Slot, ExpandError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

///
/// Items
/// Materialized enumeration of a node.
///

pub struct Items(BoxIter);

impl Iterator for Items {
    type Item = Result<Value, ExpandError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0
            .next()
            .map(|res| res.and_then(|slot| slot.resolve()))
    }
}

///
/// FuseOnError
/// Enumeration ends at the first error; nothing is retried or resumed.
///

struct FuseOnError {
    inner: BoxIter,
    failed: bool,
}

impl Iterator for FuseOnError {
    type Item = Result<Slot, ExpandError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let item = self.inner.next();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }

        item
    }
}

///
/// ProductExtension
///
/// Outer loop over the left extension; the right child is restarted for
/// each left item, so the right operand varies fastest (row-major order).
///

struct ProductExtension {
    node: Rc<ProductNode>,
    left: BoxIter,
    active: Option<(Slot, BoxIter)>,
    done: bool,
}

impl ProductExtension {
    fn new(node: Rc<ProductNode>) -> Self {
        let left = node.left.extension_boxed();

        Self {
            node,
            left,
            active: None,
            done: false,
        }
    }
}

impl Iterator for ProductExtension {
    type Item = Result<Slot, ExpandError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            match self.active.as_mut() {
                Some((l, right)) => match right.next() {
                    Some(Ok(r)) => {
                        let combined = combine_items(l.clone(), r);
                        if combined.is_err() {
                            self.done = true;
                        }
                        return Some(combined);
                    }
                    Some(Err(e)) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                    None => self.active = None,
                },
                None => match self.left.next() {
                    Some(Ok(l)) => {
                        let right = self.node.right.extension_boxed();
                        self.active = Some((l, right));
                    }
                    Some(Err(e)) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                    None => {
                        self.done = true;
                        return None;
                    }
                },
            }
        }
    }
}

///
/// ZipExtension
///
/// Lockstep walk over all children; fails the moment one child is
/// exhausted while another still has items.
///

struct ZipExtension {
    iters: Vec<BoxIter>,
    position: usize,
    done: bool,
}

impl ZipExtension {
    fn new(node: &ZipNode) -> Self {
        Self {
            iters: node.children.iter().map(Node::extension_boxed).collect(),
            position: 0,
            done: false,
        }
    }
}

impl Iterator for ZipExtension {
    type Item = Result<Slot, ExpandError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut row = Vec::with_capacity(self.iters.len());
        let mut exhausted = 0;
        for it in &mut self.iters {
            match it.next() {
                Some(Ok(slot)) => row.push(slot),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => exhausted += 1,
            }
        }

        if exhausted == self.iters.len() {
            self.done = true;
            return None;
        }
        if exhausted > 0 {
            self.done = true;
            return Some(Err(ExpandError::LengthMismatch {
                position: self.position,
            }));
        }

        let mut items = row.into_iter();
        let mut acc = items.next()?;
        for slot in items {
            match combine_items(acc, slot) {
                Ok(merged) => acc = merged,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        self.position += 1;

        Some(Ok(acc))
    }
}
