//! Reaching-definitions nodes and their owning graph
//!
//! One `RdNode` per reaching-defs-relevant program point, stored in a single
//! arena. The reaching-defs solver later fills per-node in/out sets; here we
//! only model the CFG shape and the def-sites the builder attaches.

use crate::features::pointer_graph::domain::offset::Offset;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Arena slot of a reaching-defs node
pub type RdNodeId = u32;

/// What a reaching-defs node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RdNodeKind {
    /// Allocation site (alloca, allocating call, opaque call)
    Alloc,

    /// Module-level global variable
    Global,

    /// A write with resolved def-sites
    Store,

    /// Function return instruction
    Ret,

    /// Call-site dispatch marker
    Call,

    /// Call-site join marker
    CallReturn,

    /// Function entry marker
    Entry,

    /// Unified function exit marker
    Exit,
}

/// One potential write: which allocation, where, how far, and whether the
/// write may kill prior definitions (strong) or only add to them (weak)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefSite {
    /// The node representing the written allocation
    pub target: RdNodeId,

    /// Byte offset of the write within the allocation
    pub offset: Offset,

    /// Extent of the write; `UNKNOWN_OFFSET` for unsized values
    pub size: Offset,

    /// True iff the store's target points-to set was a singleton
    pub strong: bool,
}

/// One program point in the reaching-definitions CFG
#[derive(Debug, Clone)]
pub struct RdNode {
    kind: RdNodeKind,
    pub(crate) successors: Vec<RdNodeId>,
    pub(crate) defs: Vec<DefSite>,
    name: Option<String>,
}

impl RdNode {
    pub(crate) fn new(kind: RdNodeKind) -> Self {
        Self {
            kind,
            successors: Vec::new(),
            defs: Vec::new(),
            name: None,
        }
    }

    #[inline]
    pub fn kind(&self) -> RdNodeKind {
        self.kind
    }

    #[inline]
    pub fn successors(&self) -> &[RdNodeId] {
        &self.successors
    }

    #[inline]
    pub fn defs(&self) -> &[DefSite] {
        &self.defs
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }
}

/// Entry/exit pair of one built function body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FnSubgraph {
    pub root: RdNodeId,
    pub ret: RdNodeId,
}

/// Arena owning every reaching-defs node of one build
#[derive(Debug, Clone, Default)]
pub struct ReachingDefsGraph {
    nodes: Vec<RdNode>,
    root: Option<RdNodeId>,
}

impl ReachingDefsGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, kind: RdNodeKind) -> RdNodeId {
        let id = self.nodes.len() as RdNodeId;
        self.nodes.push(RdNode::new(kind));
        id
    }

    #[inline]
    pub fn node(&self, id: RdNodeId) -> &RdNode {
        &self.nodes[id as usize]
    }

    #[inline]
    pub fn node_mut(&mut self, id: RdNodeId) -> &mut RdNode {
        &mut self.nodes[id as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all arena slots in creation order
    pub fn ids(&self) -> impl Iterator<Item = RdNodeId> {
        0..self.nodes.len() as RdNodeId
    }

    #[inline]
    pub fn root(&self) -> Option<RdNodeId> {
        self.root
    }

    pub(crate) fn set_root(&mut self, root: RdNodeId) {
        self.root = Some(root);
    }

    pub fn add_successor(&mut self, from: RdNodeId, to: RdNodeId) {
        self.nodes[from as usize].successors.push(to);
    }

    pub fn add_def(&mut self, node: RdNodeId, def: DefSite) {
        self.nodes[node as usize].defs.push(def);
    }

    /// All nodes reachable from `start` over successor edges, in BFS order
    pub fn reachable_nodes(&self, start: RdNodeId) -> Vec<RdNodeId> {
        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        let mut queue = VecDeque::new();

        visited[start as usize] = true;
        queue.push_back(start);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for &succ in &self.nodes[id as usize].successors {
                if !visited[succ as usize] {
                    visited[succ as usize] = true;
                    queue.push_back(succ);
                }
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wiring_and_defs() {
        let mut graph = ReachingDefsGraph::new();
        let alloc = graph.add_node(RdNodeKind::Alloc);
        let store = graph.add_node(RdNodeKind::Store);
        graph.add_successor(alloc, store);
        graph.add_def(
            store,
            DefSite {
                target: alloc,
                offset: Offset(0),
                size: Offset(8),
                strong: true,
            },
        );

        assert_eq!(graph.node(alloc).successors(), &[store]);
        assert_eq!(graph.node(store).defs().len(), 1);
        assert_eq!(graph.node(store).defs()[0].target, alloc);
    }

    #[test]
    fn test_reachable_nodes_handles_cycles() {
        let mut graph = ReachingDefsGraph::new();
        let a = graph.add_node(RdNodeKind::Entry);
        let b = graph.add_node(RdNodeKind::Store);
        let c = graph.add_node(RdNodeKind::Exit);
        graph.add_successor(a, b);
        graph.add_successor(b, a);
        graph.add_successor(b, c);

        assert_eq!(graph.reachable_nodes(a), vec![a, b, c]);
    }
}
