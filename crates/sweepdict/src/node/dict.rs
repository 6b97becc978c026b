use crate::{
    error::ExpandError,
    node::{BoxIter, Node},
    slot::{Draft, DraftPolicy, Slot},
};
use std::{collections::BTreeMap, rc::Rc};

///
/// DictKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum DictKind {
    /// Produces recursively combinable records.
    Standard,
    /// Every produced value is individually overridable.
    Default,
    /// Produces combine-rejecting records.
    Final,
}

///
/// DictNode
///
/// Leaf of the builder tree: an ordered field list whose values are
/// protocol slots or child nodes. Its extension is the cross product of
/// the per-field sequences, rightmost field varying fastest.
///

#[derive(Clone, Debug)]
pub(crate) struct DictNode {
    fields: Vec<(String, Slot)>,
    kind: DictKind,
}

impl DictNode {
    /// Collect fields preserving first-seen key order; a repeated key
    /// replaces the earlier value in place.
    pub(crate) fn new<K, S, I>(fields: I, kind: DictKind) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<Slot>,
    {
        let mut collected: Vec<(String, Slot)> = Vec::new();
        for (key, slot) in fields {
            let key = key.into();
            let slot = slot.into();
            match collected.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = slot,
                None => collected.push((key, slot)),
            }
        }

        Self {
            fields: collected,
            kind,
        }
    }

    pub(crate) const fn kind(&self) -> DictKind {
        self.kind
    }

    pub(crate) fn fields(&self) -> &[(String, Slot)] {
        &self.fields
    }
}

///
/// DictExtension
///
/// Odometer over the per-field streams. Field streams are restartable
/// (child extensions re-derive; plain slots are singletons), so no pool
/// of combinations is ever materialized.
///

pub(crate) struct DictExtension {
    node: Rc<DictNode>,
    iters: Vec<BoxIter>,
    current: Vec<Slot>,
    state: State,
}

enum State {
    Fresh,
    Running,
    Done,
}

impl DictExtension {
    pub(crate) const fn new(node: Rc<DictNode>) -> Self {
        Self {
            node,
            iters: Vec::new(),
            current: Vec::new(),
            state: State::Fresh,
        }
    }

    fn field_stream(&self, index: usize) -> BoxIter {
        let default = self.node.kind == DictKind::Default;
        match self.node.fields[index].1.clone() {
            Slot::Node(n) => {
                let it = n.extension_boxed();
                if default {
                    Box::new(it.map(|res| res.map(|s| Slot::Overridable(Box::new(s)))))
                } else {
                    it
                }
            }
            slot => {
                let slot = if default {
                    Slot::Overridable(Box::new(slot))
                } else {
                    slot
                };
                Box::new(std::iter::once(Ok(slot)))
            }
        }
    }

    fn draft(&self) -> Slot {
        let fields: BTreeMap<String, Slot> = self
            .node
            .fields
            .iter()
            .map(|(k, _)| k.clone())
            .zip(self.current.iter().cloned())
            .collect();
        let policy = if self.node.kind == DictKind::Final {
            DraftPolicy::Final
        } else {
            DraftPolicy::Combinable
        };

        Slot::Nested(Draft::new(fields, policy))
    }

    /// Re-prime field `index` with a fresh stream and its first item.
    /// `None` means the stream is empty and the whole extension ends.
    fn prime(&mut self, index: usize) -> Option<Result<(), ExpandError>> {
        let mut it = self.field_stream(index);
        match it.next() {
            Some(Ok(slot)) => {
                if index < self.iters.len() {
                    self.iters[index] = it;
                    self.current[index] = slot;
                } else {
                    self.iters.push(it);
                    self.current.push(slot);
                }
                Some(Ok(()))
            }
            Some(Err(e)) => Some(Err(e)),
            None => None,
        }
    }
}

impl Iterator for DictExtension {
    type Item = Result<Slot, ExpandError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            State::Done => None,
            State::Fresh => {
                self.state = State::Running;
                for i in 0..self.node.fields.len() {
                    match self.prime(i) {
                        Some(Ok(())) => {}
                        Some(Err(e)) => {
                            self.state = State::Done;
                            return Some(Err(e));
                        }
                        None => {
                            // one empty field stream empties the product
                            self.state = State::Done;
                            return None;
                        }
                    }
                }

                // zero fields still yield exactly one empty record: the
                // product identity
                Some(Ok(self.draft()))
            }
            State::Running => {
                let mut i = self.node.fields.len();
                loop {
                    if i == 0 {
                        self.state = State::Done;
                        return None;
                    }
                    i -= 1;

                    match self.iters[i].next() {
                        Some(Ok(slot)) => {
                            self.current[i] = slot;
                            for j in i + 1..self.node.fields.len() {
                                match self.prime(j) {
                                    Some(Ok(())) => {}
                                    Some(Err(e)) => {
                                        self.state = State::Done;
                                        return Some(Err(e));
                                    }
                                    None => {
                                        self.state = State::Done;
                                        return None;
                                    }
                                }
                            }
                            return Some(Ok(self.draft()));
                        }
                        Some(Err(e)) => {
                            self.state = State::Done;
                            return Some(Err(e));
                        }
                        // exhausted: carry into the field to the left
                        None => {}
                    }
                }
            }
        }
    }
}
