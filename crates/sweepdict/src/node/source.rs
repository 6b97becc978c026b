use crate::slot::Slot;
use std::{cell::RefCell, fmt, rc::Rc};

///
/// Source
///
/// Replayable item sequence backing a concatenation. A literal source is
/// fully known at construction; a one-shot source wraps an exhaustible
/// iterator and memoizes each pulled item, so every iteration pass over
/// the node observes the same sequence and the underlying iterator is
/// consumed exactly once.
///

#[derive(Clone)]
pub(crate) struct Source {
    inner: Rc<SourceInner>,
}

struct SourceInner {
    buffer: RefCell<Vec<Slot>>,
    rest: RefCell<Option<Box<dyn Iterator<Item = Slot>>>>,
    literal: bool,
}

impl Source {
    pub(crate) fn literal(items: Vec<Slot>) -> Self {
        Self {
            inner: Rc::new(SourceInner {
                buffer: RefCell::new(items),
                rest: RefCell::new(None),
                literal: true,
            }),
        }
    }

    pub(crate) fn one_shot(iter: Box<dyn Iterator<Item = Slot>>) -> Self {
        Self {
            inner: Rc::new(SourceInner {
                buffer: RefCell::new(Vec::new()),
                rest: RefCell::new(Some(iter)),
                literal: false,
            }),
        }
    }

    /// Item at `index`, pulling and memoizing from the one-shot tail as
    /// needed. `None` once the sequence is exhausted.
    pub(crate) fn get(&self, index: usize) -> Option<Slot> {
        loop {
            if let Some(slot) = self.inner.buffer.borrow().get(index) {
                return Some(slot.clone());
            }

            let mut rest = self.inner.rest.borrow_mut();
            match rest.as_mut().and_then(Iterator::next) {
                Some(slot) => self.inner.buffer.borrow_mut().push(slot),
                None => {
                    *rest = None;
                    return None;
                }
            }
        }
    }

    pub(crate) fn iter(&self) -> SourceIter {
        SourceIter {
            source: self.clone(),
            index: 0,
        }
    }

    /// Items of a literal source, for display without forcing anything.
    pub(crate) fn literal_items(&self) -> Option<Vec<Slot>> {
        self.inner
            .literal
            .then(|| self.inner.buffer.borrow().clone())
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.literal_items() {
            Some(items) => f.debug_list().entries(items).finish(),
            None => write!(f, "Source(..)"),
        }
    }
}

///
/// SourceIter
///

pub(crate) struct SourceIter {
    source: Source,
    index: usize,
}

impl Iterator for SourceIter {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        let slot = self.source.get(self.index)?;
        self.index += 1;

        Some(slot)
    }
}
