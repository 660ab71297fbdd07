/*
 * Slicegraph IR - pointer & reaching-definitions analysis engine
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : IR interface-boundary models (Module, DataLayout)
 * - features/    : Vertical slices (pointer_graph → points_to → reaching_defs)
 *
 * The engine answers two coupled questions about a program expressed as a
 * control-flow graph of instructions: which memory objects may each
 * pointer-valued node refer to (points-to), and which prior writes may reach
 * each program point for each memory location (reaching definitions). Both
 * results feed slicing and dependency tooling.
 */

/// Error types
pub mod errors;

/// Feature modules
pub mod features;

/// Shared models and utilities
pub mod shared;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use errors::{AnalysisError, Result};
pub use features::pointer_graph::{
    Offset, Pointer, PointerSubgraph, PointsToSet, PsNode, PsNodeId, PsNodeKind, UNKNOWN_OFFSET,
};
pub use features::points_to::{
    FlowInsensitiveAnalysis, FlowInsensitivePointsTo, MemoryObject, MemoryObjectId, MemoryObjects,
    PointerAnalysis, PointsToConfig, PointsToReport, PointsToSolver, SolverStats,
};
pub use features::reaching_defs::{
    BuiltReachingDefs, DefSite, FnSubgraph, PointsToMap, PointsToOracle, RdBuilder, RdNode,
    RdNodeId, RdNodeKind, ReachingDefsGraph,
};
pub use shared::models::{
    BasicBlock, BlockId, Callee, DataLayout, Function, FunctionId, GlobalVariable, Instruction,
    Module, Opcode, Ty, ValueId,
};
