use crate::{
    error::{ExpandError, ShapeError},
    node::Node,
    slot::Slot,
    value::Value,
};
use std::{fmt, rc::Rc};

///
/// TransformNode
///
/// Wraps one inner node and a per-item function producing zero or more
/// outputs. Resolved-mode ops see plain values; the raw op sees protocol
/// slots and may recombine them with protocol semantics intact.
///

#[derive(Clone, Debug)]
pub(crate) struct TransformNode {
    pub(crate) inner: Node,
    pub(crate) op: TransformOp,
}

///
/// TransformOp
///

#[derive(Clone)]
pub(crate) enum TransformOp {
    /// Exactly one output per input.
    Map(Rc<dyn Fn(Value) -> Value>),
    /// Zero-or-one output per input.
    Filter(Rc<dyn Fn(&Value) -> bool>),
    /// Arbitrarily many outputs per input.
    Apply(Rc<dyn Fn(Value) -> Vec<Value>>),
    /// Arbitrarily many protocol-bearing outputs per protocol input.
    ApplyRaw(Rc<dyn Fn(Slot) -> Vec<Slot>>),
}

impl TransformOp {
    pub(crate) const fn label(&self) -> &'static str {
        match self {
            Self::Map(_) => "map",
            Self::Filter(_) => "filter",
            Self::Apply(_) => "apply",
            Self::ApplyRaw(_) => "apply_raw",
        }
    }

    pub(crate) fn expand(&self, input: Result<Slot, ExpandError>) -> Vec<Result<Slot, ExpandError>> {
        let slot = match input {
            Ok(slot) => slot,
            Err(e) => return vec![Err(e)],
        };

        match self {
            Self::Map(f) => match slot.resolve() {
                Ok(v) => vec![Ok(Slot::Plain(f(v)))],
                Err(e) => vec![Err(e)],
            },
            Self::Filter(f) => match slot.resolve() {
                Ok(v) => {
                    if f(&v) {
                        vec![Ok(Slot::Plain(v))]
                    } else {
                        Vec::new()
                    }
                }
                Err(e) => vec![Err(e)],
            },
            Self::Apply(f) => match slot.resolve() {
                Ok(v) => f(v).into_iter().map(|v| Ok(Slot::Plain(v))).collect(),
                Err(e) => vec![Err(e)],
            },
            Self::ApplyRaw(f) => f(slot)
                .into_iter()
                .map(|s| {
                    if s.contains_node() {
                        Err(ShapeError::RawTransformNode.into())
                    } else {
                        Ok(s)
                    }
                })
                .collect(),
        }
    }
}

impl fmt::Debug for TransformOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(..)", self.label())
    }
}
