//! The pointer-state subgraph arena
//!
//! Owns every `PsNode`. Slots 0 and 1 are the NULLPTR and UNKNOWN_MEMORY
//! sentinels, created eagerly with their fixed points-to sets so they are
//! stable for the whole life of the analysis.
//!
//! Enumeration walks *current* successor edges, so nodes wired in later
//! (e.g. by function-pointer resolution mid-solve) are discovered by the
//! next traversal.

use super::node::{PsNode, PsNodeId, PsNodeKind};
use super::offset::Offset;
use super::pointer::{Pointer, NULLPTR_ID, UNKNOWN_MEMORY_ID};
use std::collections::VecDeque;

/// Program-point graph for pointer analysis
#[derive(Debug, Clone, Default)]
pub struct PointerSubgraph {
    nodes: Vec<PsNode>,
    root: Option<PsNodeId>,
}

impl PointerSubgraph {
    /// Create a graph holding only the two sentinels
    pub fn new() -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            root: None,
        };
        let null = graph.add_node(PsNodeKind::NullPtr);
        let unknown = graph.add_node(PsNodeKind::UnknownMem);
        debug_assert_eq!(null, NULLPTR_ID);
        debug_assert_eq!(unknown, UNKNOWN_MEMORY_ID);
        graph
    }

    #[inline]
    pub fn nullptr(&self) -> PsNodeId {
        NULLPTR_ID
    }

    #[inline]
    pub fn unknown_memory(&self) -> PsNodeId {
        UNKNOWN_MEMORY_ID
    }

    /// Append a node to the arena and return its slot
    ///
    /// Null-pointer and unknown-memory nodes are seeded with their fixed
    /// points-to value so the solver never has to touch them.
    pub fn add_node(&mut self, kind: PsNodeKind) -> PsNodeId {
        let id = self.nodes.len() as PsNodeId;
        let mut node = PsNode::new(kind);
        match kind {
            PsNodeKind::NullPtr => {
                node.points_to.insert(Pointer::null());
            }
            PsNodeKind::UnknownMem => {
                node.points_to.insert(Pointer::unknown());
            }
            _ => {}
        }
        self.nodes.push(node);
        id
    }

    /// Append a node with operands already wired
    pub fn add_node_with(&mut self, kind: PsNodeKind, operands: &[PsNodeId]) -> PsNodeId {
        let id = self.add_node(kind);
        for &op in operands {
            self.add_operand(id, op);
        }
        id
    }

    /// Append a GEP node over `base` with the given byte offset
    pub fn add_gep(&mut self, base: PsNodeId, offset: Offset) -> PsNodeId {
        let id = self.add_node_with(PsNodeKind::Gep, &[base]);
        self.node_mut(id).set_offset(offset);
        id
    }

    #[inline]
    pub fn root(&self) -> Option<PsNodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: PsNodeId) {
        self.root = Some(root);
    }

    #[inline]
    pub fn node(&self, id: PsNodeId) -> &PsNode {
        &self.nodes[id as usize]
    }

    #[inline]
    pub fn node_mut(&mut self, id: PsNodeId) -> &mut PsNode {
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
    pub fn ids(&self) -> impl Iterator<Item = PsNodeId> {
        0..self.nodes.len() as PsNodeId
    }

    pub fn add_operand(&mut self, node: PsNodeId, operand: PsNodeId) {
        self.nodes[node as usize].operands.push(operand);
    }

    /// Wire a control edge, keeping predecessor lists in sync
    pub fn add_successor(&mut self, from: PsNodeId, to: PsNodeId) {
        self.nodes[from as usize].successors.push(to);
        self.nodes[to as usize].predecessors.push(from);
    }

    // ═══════════════════════════════════════════════════════════════════
    // Enumeration
    // ═══════════════════════════════════════════════════════════════════

    /// All nodes reachable from `start` (or the root) over successor edges,
    /// in BFS order. The order is stable across calls with the same input.
    pub fn reachable_nodes(&self, start: Option<PsNodeId>) -> Vec<PsNodeId> {
        let start = match start.or(self.root) {
            Some(s) => s,
            None => return Vec::new(),
        };
        self.bfs(std::iter::once(start), self.nodes.len())
    }

    /// All nodes reachable from any seed, deduplicated, in an order
    /// consistent with [`Self::reachable_nodes`]. `expected_hint` sizes the
    /// result buffer.
    pub fn reachable_from_seeds(&self, seeds: &[PsNodeId], expected_hint: usize) -> Vec<PsNodeId> {
        self.bfs(seeds.iter().copied(), expected_hint)
    }

    fn bfs(&self, seeds: impl Iterator<Item = PsNodeId>, hint: usize) -> Vec<PsNodeId> {
        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(hint);
        let mut queue = VecDeque::new();

        for seed in seeds {
            if !visited[seed as usize] {
                visited[seed as usize] = true;
                queue.push_back(seed);
            }
        }

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

    // ═══════════════════════════════════════════════════════════════════
    // Alias queries over solved points-to sets
    // ═══════════════════════════════════════════════════════════════════

    /// May `a` and `b` point to the same memory? Sound over-approximation:
    /// true iff their points-to targets intersect.
    pub fn may_alias(&self, a: PsNodeId, b: PsNodeId) -> bool {
        let pts_a = &self.node(a).points_to;
        let pts_b = &self.node(b).points_to;
        let (small, large) = if pts_a.len() <= pts_b.len() {
            (pts_a, pts_b)
        } else {
            (pts_b, pts_a)
        };
        small
            .iter()
            .any(|p| large.iter().any(|q| q.target == p.target))
    }

    /// Must `a` and `b` point to the same memory? True only for equal
    /// singleton sets with a concrete offset.
    pub fn must_alias(&self, a: PsNodeId, b: PsNodeId) -> bool {
        let pts_a = &self.node(a).points_to;
        let pts_b = &self.node(b).points_to;
        if pts_a.len() != 1 || pts_b.len() != 1 {
            return false;
        }
        let pa = pts_a.iter().next().unwrap();
        let pb = pts_b.iter().next().unwrap();
        pa == pb && !pa.offset.is_unknown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_created_eagerly() {
        let ps = PointerSubgraph::new();
        assert_eq!(ps.len(), 2);
        assert_eq!(ps.node(ps.nullptr()).kind(), PsNodeKind::NullPtr);
        assert_eq!(ps.node(ps.unknown_memory()).kind(), PsNodeKind::UnknownMem);
        assert!(ps.node(ps.nullptr()).points_to.contains(&Pointer::null()));
        assert!(ps
            .node(ps.unknown_memory())
            .points_to
            .contains(&Pointer::unknown()));
    }

    #[test]
    fn test_reachable_nodes_order_stable() {
        let mut ps = PointerSubgraph::new();
        let a = ps.add_node(PsNodeKind::Alloc);
        let b = ps.add_node(PsNodeKind::Noop);
        let c = ps.add_node(PsNodeKind::Noop);
        ps.add_successor(a, b);
        ps.add_successor(a, c);
        ps.add_successor(c, b);
        ps.set_root(a);

        let first = ps.reachable_nodes(None);
        let second = ps.reachable_nodes(None);
        assert_eq!(first, vec![a, b, c]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_reachable_from_seeds_dedups() {
        let mut ps = PointerSubgraph::new();
        let a = ps.add_node(PsNodeKind::Alloc);
        let b = ps.add_node(PsNodeKind::Noop);
        ps.add_successor(a, b);

        let nodes = ps.reachable_from_seeds(&[a, b, a], 4);
        assert_eq!(nodes, vec![a, b]);
    }

    #[test]
    fn test_enumeration_sees_new_edges() {
        let mut ps = PointerSubgraph::new();
        let a = ps.add_node(PsNodeKind::Alloc);
        let b = ps.add_node(PsNodeKind::Noop);
        ps.set_root(a);
        assert_eq!(ps.reachable_nodes(None), vec![a]);

        ps.add_successor(a, b);
        assert_eq!(ps.reachable_nodes(None), vec![a, b]);
    }

    #[test]
    fn test_cycle_terminates() {
        let mut ps = PointerSubgraph::new();
        let a = ps.add_node(PsNodeKind::Noop);
        let b = ps.add_node(PsNodeKind::Noop);
        ps.add_successor(a, b);
        ps.add_successor(b, a);
        ps.set_root(a);

        assert_eq!(ps.reachable_nodes(None), vec![a, b]);
    }

    #[test]
    fn test_alias_queries() {
        let mut ps = PointerSubgraph::new();
        let target = ps.add_node(PsNodeKind::Alloc);
        let other = ps.add_node(PsNodeKind::Alloc);
        let p = ps.add_node(PsNodeKind::Phi);
        let q = ps.add_node(PsNodeKind::Phi);
        let r = ps.add_node(PsNodeKind::Phi);

        ps.node_mut(p).add_pointer(Pointer::new(target, Offset(0)));
        ps.node_mut(q).add_pointer(Pointer::new(target, Offset(0)));
        ps.node_mut(r).add_pointer(Pointer::new(other, Offset(0)));

        assert!(ps.may_alias(p, q));
        assert!(ps.must_alias(p, q));
        assert!(!ps.may_alias(p, r));

        // Widening q kills must-alias but not may-alias
        ps.node_mut(q).add_pointer(Pointer::new(other, Offset(8)));
        assert!(ps.may_alias(p, q));
        assert!(!ps.must_alias(p, q));
    }
}
