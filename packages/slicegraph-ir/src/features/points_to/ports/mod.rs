//! Ports (Interfaces) for Points-to Analysis
//!
//! The solver is parameterized over one capability trait. A concrete
//! analysis must resolve memory objects; everything else is an optional
//! hook with a conservative default. Optional object queries that an
//! implementation does not support fail loudly — invoking them is a bug in
//! the calling analysis, not a recoverable condition.

use crate::errors::{AnalysisError, Result};
use crate::features::pointer_graph::domain::graph::PointerSubgraph;
use crate::features::pointer_graph::domain::node::PsNodeId;
use crate::features::pointer_graph::domain::pointer::Pointer;
use crate::features::points_to::domain::memory_object::{MemoryObjectId, MemoryObjects};

/// Capability interface of a concrete points-to analysis
///
/// The solver drives the fixpoint; the implementation decides what memory
/// means. Hooks return `true` iff they grew some points-to set, so the
/// solver can keep the node on the worklist.
pub trait PointerAnalysis {
    /// Fill `out` with the objects relevant at `at` for `pointer`
    ///
    /// Called by the LOAD and STORE transfer functions. Implementations may
    /// create objects in the arena on demand.
    fn get_memory_objects(
        &mut self,
        objects: &mut MemoryObjects,
        ps: &PointerSubgraph,
        at: PsNodeId,
        pointer: Pointer,
        out: &mut Vec<MemoryObjectId>,
    );

    /// Objects at `at` whose contents point to `pointer`
    ///
    /// Only some analyses need this; the default reports misuse.
    fn get_memory_objects_pointing_to(
        &mut self,
        _objects: &mut MemoryObjects,
        _ps: &PointerSubgraph,
        _at: PsNodeId,
        _pointer: Pointer,
        _out: &mut Vec<MemoryObjectId>,
    ) -> Result<()> {
        Err(AnalysisError::UnsupportedOperation(
            "get_memory_objects_pointing_to",
        ))
    }

    /// Stack-local objects live at `at`
    ///
    /// Only some analyses need this; the default reports misuse.
    fn get_local_memory_objects(
        &mut self,
        _objects: &mut MemoryObjects,
        _ps: &PointerSubgraph,
        _at: PsNodeId,
        _out: &mut Vec<MemoryObjectId>,
    ) -> Result<()> {
        Err(AnalysisError::UnsupportedOperation("get_local_memory_objects"))
    }

    /// Runs before the node's transfer function
    fn before_processed(&mut self, _ps: &mut PointerSubgraph, _node: PsNodeId) -> bool {
        false
    }

    /// Runs after the node's transfer function
    fn after_processed(&mut self, _ps: &mut PointerSubgraph, _node: PsNodeId) -> bool {
        false
    }

    /// Generic analysis advisory at `at`
    ///
    /// Flow-insensitive analyses treat this as benign; flow-sensitive ones
    /// may escalate or patch up state and report growth.
    fn error(&mut self, _at: PsNodeId, _msg: &str) -> bool {
        false
    }

    /// A use site read an operand with an empty points-to set
    fn error_empty_points_to(&mut self, _from: PsNodeId, _to: PsNodeId) -> bool {
        false
    }

    /// A call site's points-to set resolved to the function `what`
    ///
    /// Implementations may wire new edges into the subgraph; the solver's
    /// re-enumeration picks them up in the next round.
    fn function_pointer_call(
        &mut self,
        _ps: &mut PointerSubgraph,
        _where_: PsNodeId,
        _what: PsNodeId,
    ) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Minimal;

    impl PointerAnalysis for Minimal {
        fn get_memory_objects(
            &mut self,
            _objects: &mut MemoryObjects,
            _ps: &PointerSubgraph,
            _at: PsNodeId,
            _pointer: Pointer,
            _out: &mut Vec<MemoryObjectId>,
        ) {
        }
    }

    #[test]
    fn test_optional_queries_fail_loudly() {
        let mut analysis = Minimal;
        let mut objects = MemoryObjects::new();
        let ps = PointerSubgraph::new();
        let mut out = Vec::new();

        let err = analysis
            .get_memory_objects_pointing_to(&mut objects, &ps, 0, Pointer::null(), &mut out)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedOperation(_)));

        let err = analysis
            .get_local_memory_objects(&mut objects, &ps, 0, &mut out)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedOperation(_)));
    }

    #[test]
    fn test_hooks_default_false() {
        let mut analysis = Minimal;
        let mut ps = PointerSubgraph::new();
        assert!(!analysis.before_processed(&mut ps, 0));
        assert!(!analysis.after_processed(&mut ps, 0));
        assert!(!analysis.error(0, "advisory"));
        assert!(!analysis.error_empty_points_to(0, 1));
        assert!(!analysis.function_pointer_call(&mut ps, 0, 1));
    }
}
