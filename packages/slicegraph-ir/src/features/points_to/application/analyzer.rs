//! High-level flow-insensitive analysis facade
//!
//! Bundles the solver with the flow-insensitive memory model and hands back
//! the solved memory state plus run statistics. Points-to sets themselves
//! live on the subgraph's nodes after `run`.

use crate::errors::Result;
use crate::features::pointer_graph::domain::graph::PointerSubgraph;
use crate::features::pointer_graph::domain::node::PsNodeId;
use crate::features::points_to::domain::memory_object::{MemoryObject, MemoryObjects};
use crate::features::points_to::infrastructure::flow_insensitive::FlowInsensitivePointsTo;
use crate::features::points_to::infrastructure::solver::{
    PointsToConfig, PointsToSolver, SolverStats,
};

/// What a finished flow-insensitive run leaves behind
#[derive(Debug)]
pub struct PointsToReport {
    pub stats: SolverStats,
    objects: MemoryObjects,
    analysis: FlowInsensitivePointsTo,
}

impl PointsToReport {
    /// The solved memory object of an allocation-like node, if any access
    /// ever reached it
    pub fn memory_object(&self, node: PsNodeId) -> Option<&MemoryObject> {
        self.analysis
            .memory_object_of(node)
            .map(|id| self.objects.get(id))
    }

    #[inline]
    pub fn memory_objects(&self) -> &MemoryObjects {
        &self.objects
    }
}

/// Config-in, report-out wrapper around [`PointsToSolver`]
#[derive(Debug, Clone, Default)]
pub struct FlowInsensitiveAnalysis {
    config: PointsToConfig,
}

impl FlowInsensitiveAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PointsToConfig) -> Self {
        Self { config }
    }

    /// Solve `ps` to quiescence and return the memory state
    pub fn run(&self, ps: &mut PointerSubgraph) -> Result<PointsToReport> {
        let mut solver =
            PointsToSolver::with_config(FlowInsensitivePointsTo::new(), self.config.clone());
        solver.run(ps)?;
        let (analysis, objects, stats) = solver.into_parts();
        Ok(PointsToReport {
            stats,
            objects,
            analysis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::pointer_graph::domain::node::PsNodeKind;
    use crate::features::pointer_graph::domain::offset::Offset;
    use crate::features::pointer_graph::domain::pointer::Pointer;

    #[test]
    fn test_report_exposes_memory_objects() {
        let mut ps = PointerSubgraph::new();
        let a = ps.add_node(PsNodeKind::Alloc);
        let b = ps.add_node(PsNodeKind::Alloc);
        let store = ps.add_node_with(PsNodeKind::Store, &[b, a]);
        ps.add_successor(a, b);
        ps.add_successor(b, store);
        ps.set_root(a);

        let report = FlowInsensitiveAnalysis::new().run(&mut ps).unwrap();

        let mo = report.memory_object(a).expect("store must materialize a's object");
        assert_eq!(mo.pointers_at(Offset(0)), vec![Pointer::new(b, Offset(0))]);
        assert!(report.memory_object(b).is_none());
        assert!(report.stats.rounds >= 1);
    }
}
