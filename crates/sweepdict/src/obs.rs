//! Enumeration tracing boundary.
//!
//! Tracing is optional, injected by the caller, and must not affect what a
//! node enumerates.

use crate::{error::ExpandError, node::Items, value::Value};
use std::fmt;

///
/// ExpandTraceSink
///

pub trait ExpandTraceSink {
    fn on_event(&self, event: ExpandTraceEvent);
}

///
/// NodeKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeKind {
    Dict,
    Concat,
    Product,
    Zip,
    Transform,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Dict => "dict",
            Self::Concat => "concat",
            Self::Product => "product",
            Self::Zip => "zip",
            Self::Transform => "transform",
        };
        write!(f, "{label}")
    }
}

///
/// ExpandTraceEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExpandTraceEvent {
    Start { node: NodeKind },
    Item { node: NodeKind, index: u64 },
    Error { node: NodeKind, index: u64 },
    Finish { node: NodeKind, yielded: u64 },
}

///
/// Traced
///
/// Materialized enumeration reporting progress to a sink.
///

pub struct Traced<'a> {
    items: Items,
    sink: &'a dyn ExpandTraceSink,
    node: NodeKind,
    index: u64,
    finished: bool,
}

impl<'a> Traced<'a> {
    pub(crate) fn new(items: Items, sink: &'a dyn ExpandTraceSink, node: NodeKind) -> Self {
        Self {
            items,
            sink,
            node,
            index: 0,
            finished: false,
        }
    }
}

impl Iterator for Traced<'_> {
    type Item = Result<Value, ExpandError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.items.next() {
            Some(Ok(value)) => {
                self.sink.on_event(ExpandTraceEvent::Item {
                    node: self.node,
                    index: self.index,
                });
                self.index += 1;

                Some(Ok(value))
            }
            Some(Err(e)) => {
                self.finished = true;
                self.sink.on_event(ExpandTraceEvent::Error {
                    node: self.node,
                    index: self.index,
                });

                Some(Err(e))
            }
            None => {
                self.finished = true;
                self.sink.on_event(ExpandTraceEvent::Finish {
                    node: self.node,
                    yielded: self.index,
                });

                None
            }
        }
    }
}
