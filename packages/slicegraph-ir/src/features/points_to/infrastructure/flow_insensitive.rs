//! Flow-insensitive memory-object resolution
//!
//! The simplest concrete analysis: memory has one state for the whole
//! program, so every pointed-to node owns exactly one memory object,
//! created the first time a load or store reaches it. The null target has
//! no memory behind it and yields no objects.

use crate::features::pointer_graph::domain::graph::PointerSubgraph;
use crate::features::pointer_graph::domain::node::{PsNodeId, PsNodeKind};
use crate::features::pointer_graph::domain::pointer::Pointer;
use crate::features::points_to::domain::memory_object::{MemoryObjectId, MemoryObjects};
use crate::features::points_to::ports::PointerAnalysis;
use rustc_hash::FxHashMap;

/// One memory object per pointed-to node
#[derive(Debug, Clone, Default)]
pub struct FlowInsensitivePointsTo {
    object_of: FxHashMap<PsNodeId, MemoryObjectId>,
}

impl FlowInsensitivePointsTo {
    pub fn new() -> Self {
        Self::default()
    }

    /// The memory object created for `node`, if any load or store reached it
    #[inline]
    pub fn memory_object_of(&self, node: PsNodeId) -> Option<MemoryObjectId> {
        self.object_of.get(&node).copied()
    }
}

impl PointerAnalysis for FlowInsensitivePointsTo {
    fn get_memory_objects(
        &mut self,
        objects: &mut MemoryObjects,
        ps: &PointerSubgraph,
        _at: PsNodeId,
        pointer: Pointer,
        out: &mut Vec<MemoryObjectId>,
    ) {
        if ps.node(pointer.target).kind() == PsNodeKind::NullPtr {
            return;
        }
        let id = *self
            .object_of
            .entry(pointer.target)
            .or_insert_with(|| objects.alloc(pointer.target));
        out.push(id);
    }
}
