//! Strongly Connected Component Detection
//!
//! Tarjan's algorithm over the pointer-state subgraph's successor edges,
//! starting from the root. Used by the solver's GEP preprocessing: every
//! GEP inside a component of size > 1 is widened up front, which saves the
//! fixpoint dozens of iterations on pointer arithmetic in loops.
//!
//! # References
//! - Tarjan, R. "Depth-First Search and Linear Graph Algorithms" (1972)

use crate::features::pointer_graph::domain::graph::PointerSubgraph;
use crate::features::pointer_graph::domain::node::PsNodeId;
use std::cmp::min;

/// Compute the SCCs of the subgraph reachable from the root
///
/// Every reachable node appears in exactly one component; singletons are
/// included. Components come out in reverse topological order, which the
/// caller does not rely on.
///
/// Time: O(V + E), Space: O(V)
pub fn tarjan_scc(ps: &PointerSubgraph) -> Vec<Vec<PsNodeId>> {
    let mut state = TarjanState::new(ps.len());

    if let Some(root) = ps.root() {
        tarjan_dfs(ps, root, &mut state);
    }

    state.sccs
}

const UNVISITED: usize = usize::MAX;

struct TarjanState {
    index: Vec<usize>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<PsNodeId>,
    current_index: usize,
    sccs: Vec<Vec<PsNodeId>>,
}

impl TarjanState {
    fn new(node_count: usize) -> Self {
        Self {
            index: vec![UNVISITED; node_count],
            lowlink: vec![UNVISITED; node_count],
            on_stack: vec![false; node_count],
            stack: Vec::new(),
            current_index: 0,
            sccs: Vec::new(),
        }
    }
}

fn tarjan_dfs(ps: &PointerSubgraph, v: PsNodeId, state: &mut TarjanState) {
    let vi = v as usize;
    state.index[vi] = state.current_index;
    state.lowlink[vi] = state.current_index;
    state.current_index += 1;
    state.stack.push(v);
    state.on_stack[vi] = true;

    for &w in ps.node(v).successors() {
        let wi = w as usize;
        if state.index[wi] == UNVISITED {
            tarjan_dfs(ps, w, state);
            state.lowlink[vi] = min(state.lowlink[vi], state.lowlink[wi]);
        } else if state.on_stack[wi] {
            state.lowlink[vi] = min(state.lowlink[vi], state.index[wi]);
        }
    }

    // v roots a component: pop it off the stack
    if state.lowlink[vi] == state.index[vi] {
        let mut scc = Vec::new();
        loop {
            let w = state.stack.pop().unwrap();
            state.on_stack[w as usize] = false;
            scc.push(w);
            if w == v {
                break;
            }
        }
        state.sccs.push(scc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::pointer_graph::domain::node::PsNodeKind;

    fn chain_graph(edges: &[(u32, u32)], node_count: u32) -> (PointerSubgraph, Vec<PsNodeId>) {
        let mut ps = PointerSubgraph::new();
        let nodes: Vec<PsNodeId> = (0..node_count)
            .map(|_| ps.add_node(PsNodeKind::Noop))
            .collect();
        for &(a, b) in edges {
            ps.add_successor(nodes[a as usize], nodes[b as usize]);
        }
        ps.set_root(nodes[0]);
        (ps, nodes)
    }

    #[test]
    fn test_simple_cycle() {
        // 0 → 1 → 2 → 0
        let (ps, nodes) = chain_graph(&[(0, 1), (1, 2), (2, 0)], 3);
        let sccs = tarjan_scc(&ps);

        assert_eq!(sccs.len(), 1);
        let mut scc = sccs[0].clone();
        scc.sort_unstable();
        let mut expected = nodes.clone();
        expected.sort_unstable();
        assert_eq!(scc, expected);
    }

    #[test]
    fn test_no_cycle() {
        // 0 → 1 → 2 (chain)
        let (ps, _) = chain_graph(&[(0, 1), (1, 2)], 3);
        let sccs = tarjan_scc(&ps);

        assert_eq!(sccs.len(), 3);
        assert!(sccs.iter().all(|scc| scc.len() == 1));
    }

    #[test]
    fn test_multiple_sccs() {
        // Two cycles joined by a bridge: (0,1) → (2,3)
        let (ps, nodes) = chain_graph(&[(0, 1), (1, 0), (1, 2), (2, 3), (3, 2)], 4);
        let sccs = tarjan_scc(&ps);

        let big: Vec<_> = sccs.iter().filter(|s| s.len() > 1).collect();
        assert_eq!(big.len(), 2);
        assert!(big
            .iter()
            .any(|s| s.contains(&nodes[0]) && s.contains(&nodes[1])));
        assert!(big
            .iter()
            .any(|s| s.contains(&nodes[2]) && s.contains(&nodes[3])));
    }

    #[test]
    fn test_self_loop_is_singleton_component() {
        let (ps, nodes) = chain_graph(&[(0, 0)], 1);
        let sccs = tarjan_scc(&ps);

        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0], vec![nodes[0]]);
    }

    #[test]
    fn test_only_reachable_nodes_visited() {
        let mut ps = PointerSubgraph::new();
        let a = ps.add_node(PsNodeKind::Noop);
        let _orphan = ps.add_node(PsNodeKind::Noop);
        ps.set_root(a);

        let sccs = tarjan_scc(&ps);
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0], vec![a]);
    }

    #[test]
    fn test_rootless_graph_is_empty() {
        let ps = PointerSubgraph::new();
        assert!(tarjan_scc(&ps).is_empty());
    }
}
