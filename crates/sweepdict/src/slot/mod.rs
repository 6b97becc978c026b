mod combine;

#[cfg(test)]
mod tests;

use crate::{
    error::{ExpandError, ShapeError},
    node::Node,
    record::Record,
    value::{Float64, Value},
};
use std::{collections::BTreeMap, fmt, rc::Rc};

pub(crate) use combine::{combine_items, combine_slots};

///
/// Slot
///
/// The combine protocol, as an explicit sum type: every value that can sit
/// on either side of a key collision is one of these. Enumeration yields
/// slots; materialization resolves them into plain [`Value`]s.
///
/// `Node` is only legal at construction time (a leaf-dict field or a
/// concatenation item); the extension engine expands it and never yields it.
///

#[derive(Clone)]
pub enum Slot {
    /// Plain value: collision is an error unless the other side combines.
    Plain(Value),
    /// In-flight record with its own combinability policy.
    Nested(Draft),
    /// Silently discarded on collision; the incoming side always wins.
    Overridable(Box<Slot>),
    /// Always wins over whatever was already present, from either side.
    Override(Box<Slot>),
    /// Accumulates collisions through a user-supplied merge function.
    Combinable(Combinable),
    /// Producer run once per enumerated record, at materialization.
    Lazy(LazyValue),
    /// Unexpanded builder-tree reference.
    Node(Node),
}

impl Slot {
    #[must_use]
    pub fn plain(value: impl Into<Value>) -> Self {
        Self::Plain(value.into())
    }

    /// Wrap a value so it loses every collision.
    #[must_use]
    pub fn overridable(inner: impl Into<Self>) -> Self {
        Self::Overridable(Box::new(inner.into()))
    }

    /// Wrap a value so it wins every collision, whichever side it is on.
    #[must_use]
    pub fn overriding(inner: impl Into<Self>) -> Self {
        Self::Override(Box::new(inner.into()))
    }

    /// Defer a value until the enclosing record is actually enumerated.
    ///
    /// The producer runs at most once per distinct enumerated record and
    /// never runs for records the consumer does not reach.
    #[must_use]
    pub fn lazy(producer: impl Fn() -> Value + 'static) -> Self {
        Self::Lazy(LazyValue {
            producer: Rc::new(producer),
        })
    }

    /// Resolve to a plain value, recursively discharging protocol wrappers.
    pub fn resolve(&self) -> Result<Value, ExpandError> {
        match self {
            Self::Plain(v) => Ok(v.clone()),
            Self::Nested(d) => d.resolve().map(Value::Record),
            Self::Overridable(inner) | Self::Override(inner) => inner.resolve(),
            Self::Combinable(c) => Ok(c.value.clone()),
            Self::Lazy(l) => Ok((l.producer)()),
            Self::Node(_) => Err(ShapeError::UnexpandedNode.into()),
        }
    }

    /// True if an unexpanded node hides anywhere inside this slot.
    pub(crate) fn contains_node(&self) -> bool {
        match self {
            Self::Node(_) => true,
            Self::Plain(_) | Self::Combinable(_) | Self::Lazy(_) => false,
            Self::Nested(d) => d.fields.values().any(Self::contains_node),
            Self::Overridable(inner) | Self::Override(inner) => inner.contains_node(),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(v) => write!(f, "{v}"),
            Self::Nested(d) => write!(f, "{d}"),
            Self::Overridable(inner) => write!(f, "overridable({inner})"),
            Self::Override(inner) => write!(f, "override({inner})"),
            Self::Combinable(c) => write!(f, "combinable({})", c.value),
            Self::Lazy(_) => write!(f, "lazy(..)"),
            Self::Node(n) => write!(f, "{n}"),
        }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

///
/// Combinable
///
/// A value plus the associative merge function applied on collision.
/// `multi` keeps the result combinable for further collisions; otherwise it
/// collapses to a plain value after first use.
///

#[derive(Clone)]
pub struct Combinable {
    value: Value,
    merge: Rc<dyn Fn(Value, Value) -> Value>,
    multi: bool,
}

impl Combinable {
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    pub(crate) fn step(&self, incoming: Value) -> Slot {
        let merged = (self.merge)(self.value.clone(), incoming);
        if self.multi {
            Slot::Combinable(Self {
                value: merged,
                merge: Rc::clone(&self.merge),
                multi: true,
            })
        } else {
            Slot::Plain(merged)
        }
    }
}

///
/// Combiner
///
/// Factory for [`Combinable`] slots sharing one merge function; the usual
/// way to express "collisions on this key accumulate".
///

#[derive(Clone)]
pub struct Combiner {
    merge: Rc<dyn Fn(Value, Value) -> Value>,
    multi: bool,
}

impl Combiner {
    /// Merge function applied as `(existing, incoming)`; the result stays
    /// combinable for further collisions.
    #[must_use]
    pub fn new(merge: impl Fn(Value, Value) -> Value + 'static) -> Self {
        Self {
            merge: Rc::new(merge),
            multi: true,
        }
    }

    /// Like [`new`](Self::new) but the result collapses to a plain value
    /// after the first collision.
    #[must_use]
    pub fn once(merge: impl Fn(Value, Value) -> Value + 'static) -> Self {
        Self {
            merge: Rc::new(merge),
            multi: false,
        }
    }

    /// Text-joining combiner: colliding values render and concatenate
    /// with `sep`. The usual way to build composite run names.
    #[must_use]
    pub fn joining(sep: impl Into<String>) -> Self {
        let sep = sep.into();
        Self::new(move |x, y| {
            let render = |v: &Value| match v {
                Value::Text(s) => s.clone(),
                v => v.to_string(),
            };

            Value::Text(format!("{}{sep}{}", render(&x), render(&y)))
        })
    }

    #[must_use]
    pub fn wrap(&self, value: impl Into<Value>) -> Slot {
        Slot::Combinable(Combinable {
            value: value.into(),
            merge: Rc::clone(&self.merge),
            multi: self.multi,
        })
    }
}

///
/// LazyValue
///

#[derive(Clone)]
pub struct LazyValue {
    producer: Rc<dyn Fn() -> Value>,
}

///
/// DraftPolicy
///
/// How an in-flight record behaves when something merges into it.
///
/// - `Plain`: a raw nested record literal; any collision on it errors.
/// - `Combinable`: produced by a standard leaf-dict; merges recursively.
/// - `Final`: produced by a finalized leaf-dict; any combine into it errors.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DraftPolicy {
    Plain,
    Combinable,
    Final,
}

///
/// Draft
///
/// A record mid-enumeration: fields are still protocol slots and the
/// policy governs how the whole record combines. Resolving a draft gives
/// the plain [`Record`] handed to consumers.
///

#[derive(Clone)]
pub struct Draft {
    fields: BTreeMap<String, Slot>,
    policy: DraftPolicy,
}

impl Draft {
    pub(crate) const fn new(fields: BTreeMap<String, Slot>, policy: DraftPolicy) -> Self {
        Self { fields, policy }
    }

    /// Build a recursively combinable draft, as a standard leaf-dict would.
    pub fn combinable<K, S, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<Slot>,
    {
        Self::collect(fields, DraftPolicy::Combinable)
    }

    /// Build a combine-rejecting draft, as a finalized leaf-dict would.
    pub fn finalized<K, S, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<Slot>,
    {
        Self::collect(fields, DraftPolicy::Final)
    }

    fn collect<K, S, I>(fields: I, policy: DraftPolicy) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<Slot>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, s)| (k.into(), s.into()))
                .collect(),
            policy,
        }
    }

    pub(crate) fn from_record(record: Record, policy: DraftPolicy) -> Self {
        Self {
            fields: record
                .into_inner()
                .into_iter()
                .map(|(k, v)| (k, Slot::Plain(v)))
                .collect(),
            policy,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> DraftPolicy {
        self.policy
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Slot> {
        self.fields.get(key)
    }

    pub(crate) const fn fields(&self) -> &BTreeMap<String, Slot> {
        &self.fields
    }

    /// Materialize into a plain record, resolving every field slot.
    pub fn resolve(&self) -> Result<Record, ExpandError> {
        let mut out = BTreeMap::new();
        for (k, slot) in &self.fields {
            out.insert(k.clone(), slot.resolve()?);
        }

        Ok(Record::from(out))
    }
}

impl fmt::Display for Draft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, slot)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {slot}")?;
        }
        write!(f, "}}")
    }
}

impl fmt::Debug for Draft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl From<Record> for Draft {
    fn from(record: Record) -> Self {
        Self::from_record(record, DraftPolicy::Plain)
    }
}

// From impls so builder macros and field lists accept bare values.
macro_rules! impl_slot_from {
    ( $( $type:ty ),* $(,)? ) => {
        $(
            impl From<$type> for Slot {
                fn from(v: $type) -> Self {
                    Self::Plain(Value::from(v))
                }
            }
        )*
    };
}

impl_slot_from! {
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    Float64,
    &str,
    String,
    Record,
    (),
}

impl From<Value> for Slot {
    fn from(v: Value) -> Self {
        Self::Plain(v)
    }
}

impl From<Vec<Value>> for Slot {
    fn from(vec: Vec<Value>) -> Self {
        Self::Plain(Value::List(vec))
    }
}

impl From<Node> for Slot {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<Draft> for Slot {
    fn from(draft: Draft) -> Self {
        Self::Nested(draft)
    }
}

impl From<Combinable> for Slot {
    fn from(c: Combinable) -> Self {
        Self::Combinable(c)
    }
}
