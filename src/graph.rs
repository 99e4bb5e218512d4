//! The graph of indirect objects and their numbering.
//!
//! Every indirect object is stored in an arena owned by the [`ObjectGraph`] and
//! identified by an [`ObjRef`]. Object identity is the arena slot, so two
//! structurally equal objects are still two different indirect objects.
//! Once an object has been written, its slot is replaced by a tombstone: the
//! object itself is gone, but references to it stay valid because the
//! [`ObjectNumbering`] still knows its number.

use crate::error::{FolioError, FolioResult};
use crate::primitive::Object;
use std::collections::HashMap;

/// The largest object number PDF readers are required to handle.
pub const MAX_OBJECT_NUMBER: u32 = (1 << 23) - 1;

/// A reference to an indirect object in an [`ObjectGraph`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjRef(u32);

impl ObjRef {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
enum Slot {
    Live(Object),
    /// Allocated, but the content is not known yet.
    Reserved,
    Written,
}

/// The arena of all indirect objects of a document.
#[derive(Debug, Default)]
pub struct ObjectGraph {
    slots: Vec<Slot>,
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new indirect object to the graph.
    pub fn alloc(&mut self, object: impl Into<Object>) -> ObjRef {
        let r = ObjRef(self.slots.len() as u32);
        self.slots.push(Slot::Live(object.into()));
        r
    }

    /// Reserve a slot whose content is only known later, for example a font
    /// whose glyph set is still growing.
    ///
    /// A reserved object can be referenced and numbered, but it is only
    /// written once it has been filled with [`ObjectGraph::set`].
    pub fn reserve(&mut self) -> ObjRef {
        let r = ObjRef(self.slots.len() as u32);
        self.slots.push(Slot::Reserved);
        r
    }

    /// Fill a reserved object or replace the content of a live one.
    pub fn set(&mut self, r: ObjRef, object: impl Into<Object>) -> FolioResult<()> {
        match self.slots.get_mut(r.index()) {
            Some(slot @ (Slot::Live(_) | Slot::Reserved)) => {
                *slot = Slot::Live(object.into());
                Ok(())
            }
            _ => Err(FolioError::ObjectDropped(r)),
        }
    }

    pub fn get(&self, r: ObjRef) -> FolioResult<&Object> {
        match self.slots.get(r.index()) {
            Some(Slot::Live(object)) => Ok(object),
            Some(Slot::Reserved) => Err(FolioError::UnresolvedObject(r)),
            _ => Err(FolioError::ObjectDropped(r)),
        }
    }

    pub fn get_mut(&mut self, r: ObjRef) -> FolioResult<&mut Object> {
        match self.slots.get_mut(r.index()) {
            Some(Slot::Live(object)) => Ok(object),
            Some(Slot::Reserved) => Err(FolioError::UnresolvedObject(r)),
            _ => Err(FolioError::ObjectDropped(r)),
        }
    }

    pub fn is_written(&self, r: ObjRef) -> bool {
        matches!(self.slots.get(r.index()), Some(Slot::Written))
    }

    pub fn is_reserved(&self, r: ObjRef) -> bool {
        matches!(self.slots.get(r.index()), Some(Slot::Reserved))
    }

    /// The references an object contains. A reserved object has none yet.
    pub(crate) fn refs(&self, r: ObjRef) -> FolioResult<Vec<ObjRef>> {
        let mut refs = vec![];
        match self.slots.get(r.index()) {
            Some(Slot::Live(object)) => object.for_each_ref(&mut |child| refs.push(child)),
            Some(Slot::Reserved) => {}
            _ => return Err(FolioError::ObjectDropped(r)),
        }
        Ok(refs)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Take an object out of the graph, leaving a tombstone behind.
    pub(crate) fn take(&mut self, r: ObjRef) -> FolioResult<Object> {
        let slot = self
            .slots
            .get_mut(r.index())
            .ok_or(FolioError::ObjectDropped(r))?;

        match std::mem::replace(slot, Slot::Written) {
            Slot::Live(object) => Ok(object),
            Slot::Reserved => {
                *slot = Slot::Reserved;
                Err(FolioError::UnresolvedObject(r))
            }
            Slot::Written => Err(FolioError::ObjectDropped(r)),
        }
    }
}

/// Assigns object numbers in discovery order.
#[derive(Debug, Default)]
pub struct ObjectNumbering {
    numbers: HashMap<ObjRef, u32>,
    order: Vec<ObjRef>,
    footer_started: bool,
}

impl ObjectNumbering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number `root` and every object transitively reachable from it that
    /// has no number yet.
    ///
    /// Objects are numbered in depth-first preorder, visiting the references
    /// of an object in the order in which they appear in it. Objects that
    /// already have a number are not descended into again, which makes
    /// cycles harmless.
    pub fn add_recursively(&mut self, graph: &ObjectGraph, root: ObjRef) -> FolioResult<()> {
        let mut stack = vec![root];

        while let Some(r) = stack.pop() {
            if self.numbers.contains_key(&r) {
                continue;
            }

            if self.footer_started {
                return Err(FolioError::LateObject);
            }

            let number = self.order.len() as u32 + 1;
            if number > MAX_OBJECT_NUMBER {
                return Err(FolioError::TooManyObjects(MAX_OBJECT_NUMBER));
            }

            self.numbers.insert(r, number);
            self.order.push(r);

            let children = graph.refs(r)?;
            stack.extend(children.into_iter().rev());
        }

        Ok(())
    }

    pub fn number(&self, r: ObjRef) -> Option<u32> {
        self.numbers.get(&r).copied()
    }

    /// All numbered objects, in the order of their numbers.
    pub fn order(&self) -> &[ObjRef] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// From now on, discovering a new object is an error.
    pub(crate) fn start_footer(&mut self) {
        self.footer_started = true;
    }
}
