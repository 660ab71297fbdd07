//! # Reaching-Definitions Graph
//!
//! Translates an IR module into a CFG of `RdNode`s whose store-like nodes
//! carry def-sites resolved through the points-to results: for every write,
//! which abstract memory object, at which offset, over which extent, and
//! whether the write is strong (singleton target) or weak.
//!
//! Function bodies are built once and shared between call sites, including
//! mutually-recursive ones; indirect calls fan out to every function the
//! callee expression may point to.

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::node::{DefSite, FnSubgraph, RdNode, RdNodeId, RdNodeKind, ReachingDefsGraph};
pub use infrastructure::builder::{BuiltReachingDefs, RdBuilder, RdBuilderStats};
pub use ports::{PointsToMap, PointsToOracle};
