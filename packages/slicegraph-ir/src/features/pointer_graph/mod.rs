//! # Pointer-State Subgraph (PSS)
//!
//! The program-point graph the points-to solver runs over. One node per
//! pointer-relevant program point, wired with both data edges (operands) and
//! control edges (successors). Node storage is a single owning arena; all
//! cross-node references are plain indices, which keeps the densely cyclic
//! graph (loops, recursion) free of ownership knots.

pub mod domain;
pub mod infrastructure;

pub use domain::graph::PointerSubgraph;
pub use domain::node::{PsNode, PsNodeId, PsNodeKind};
pub use domain::offset::{Offset, UNKNOWN_OFFSET};
pub use domain::pointer::{Pointer, PointsToSet, NULLPTR_ID, UNKNOWN_MEMORY_ID};
pub use infrastructure::scc_detector::tarjan_scc;
