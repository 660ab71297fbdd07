//! Abstract memory objects
//!
//! A memory object stands for the region belonging to exactly one
//! allocation-like node. It records, per byte offset, which pointers have
//! been stored there. An `UNKNOWN_OFFSET` write lands everywhere: reads at a
//! concrete offset consult that offset plus the unknown slot, and reads at
//! `UNKNOWN_OFFSET` consult everything.
//!
//! Objects live in a [`MemoryObjects`] arena so analyses can create and
//! share them by handle without borrowing the pointer graph.

use crate::features::pointer_graph::domain::node::PsNodeId;
use crate::features::pointer_graph::domain::offset::Offset;
use crate::features::pointer_graph::domain::pointer::{Pointer, PointsToSet};
use rustc_hash::FxHashMap;

/// Handle of a memory object in the arena
pub type MemoryObjectId = u32;

/// The abstract memory region of one allocation-like node
#[derive(Debug, Clone, Default)]
pub struct MemoryObject {
    /// The allocation-like node this region belongs to
    node: PsNodeId,

    /// Stored pointers per offset
    pointers: FxHashMap<Offset, PointsToSet>,
}

impl MemoryObject {
    pub fn new(node: PsNodeId) -> Self {
        Self {
            node,
            pointers: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn node(&self) -> PsNodeId {
        self.node
    }

    /// Record one stored pointer; true iff the object changed
    pub fn add_pointer(&mut self, offset: Offset, pointer: Pointer) -> bool {
        self.pointers.entry(offset).or_default().insert(pointer)
    }

    /// Record many stored pointers at one offset; true iff the object changed
    pub fn add_pointers(
        &mut self,
        offset: Offset,
        pointers: impl IntoIterator<Item = Pointer>,
    ) -> bool {
        let slot = self.pointers.entry(offset).or_default();
        let before = slot.len();
        slot.extend(pointers);
        slot.len() > before
    }

    /// All pointers a read at `offset` may observe
    pub fn pointers_at(&self, offset: Offset) -> Vec<Pointer> {
        let mut out = Vec::new();
        if offset.is_unknown() {
            for set in self.pointers.values() {
                out.extend(set.iter().copied());
            }
        } else {
            if let Some(set) = self.pointers.get(&offset) {
                out.extend(set.iter().copied());
            }
            if let Some(set) = self.pointers.get(&Offset::UNKNOWN) {
                out.extend(set.iter().copied());
            }
        }
        out
    }

    /// Offsets that have at least one recorded write
    pub fn offsets(&self) -> impl Iterator<Item = Offset> + '_ {
        self.pointers.keys().copied()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }
}

/// Arena owning every memory object of one solver run
#[derive(Debug, Clone, Default)]
pub struct MemoryObjects {
    objects: Vec<MemoryObject>,
}

impl MemoryObjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an object for `node` and return its handle
    pub fn alloc(&mut self, node: PsNodeId) -> MemoryObjectId {
        let id = self.objects.len() as MemoryObjectId;
        self.objects.push(MemoryObject::new(node));
        id
    }

    #[inline]
    pub fn get(&self, id: MemoryObjectId) -> &MemoryObject {
        &self.objects[id as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: MemoryObjectId) -> &mut MemoryObject {
        &mut self.objects[id as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemoryObject> {
        self.objects.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_offset_read() {
        let mut mo = MemoryObject::new(3);
        assert!(mo.add_pointer(Offset(0), Pointer::new(7, Offset(0))));
        assert!(!mo.add_pointer(Offset(0), Pointer::new(7, Offset(0))));
        assert!(mo.add_pointer(Offset(8), Pointer::new(9, Offset(0))));

        let at0 = mo.pointers_at(Offset(0));
        assert_eq!(at0, vec![Pointer::new(7, Offset(0))]);
    }

    #[test]
    fn test_unknown_write_observed_everywhere() {
        let mut mo = MemoryObject::new(3);
        mo.add_pointer(Offset::UNKNOWN, Pointer::new(7, Offset(0)));

        assert_eq!(mo.pointers_at(Offset(16)).len(), 1);
        assert_eq!(mo.pointers_at(Offset::UNKNOWN).len(), 1);
    }

    #[test]
    fn test_unknown_read_observes_everything() {
        let mut mo = MemoryObject::new(3);
        mo.add_pointer(Offset(0), Pointer::new(7, Offset(0)));
        mo.add_pointer(Offset(8), Pointer::new(9, Offset(0)));

        let mut all = mo.pointers_at(Offset::UNKNOWN);
        all.sort_by_key(|p| p.target);
        assert_eq!(
            all,
            vec![Pointer::new(7, Offset(0)), Pointer::new(9, Offset(0))]
        );
    }

    #[test]
    fn test_arena_handles() {
        let mut objects = MemoryObjects::new();
        let a = objects.alloc(5);
        let b = objects.alloc(6);
        assert_ne!(a, b);
        assert_eq!(objects.get(a).node(), 5);
        assert_eq!(objects.get(b).node(), 6);
        assert_eq!(objects.len(), 2);
    }
}
