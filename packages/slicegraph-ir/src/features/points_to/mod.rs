//! # Points-to Analysis
//!
//! Fixpoint worklist solver over the pointer-state subgraph. Transfer
//! functions only ever add pointers, so the fixpoint over the finite
//! universe of (node, offset) pairs terminates; GEP offsets inside cycles
//! are widened up front to skip the slow march to `UNKNOWN_OFFSET`.
//!
//! Concrete analyses plug in through the [`PointerAnalysis`] capability
//! trait; the provided [`FlowInsensitivePointsTo`] keeps one memory object
//! per allocation site.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::analyzer::{FlowInsensitiveAnalysis, PointsToReport};
pub use domain::memory_object::{MemoryObject, MemoryObjectId, MemoryObjects};
pub use infrastructure::flow_insensitive::FlowInsensitivePointsTo;
pub use infrastructure::solver::{PointsToConfig, PointsToSolver, SolverStats};
pub use ports::PointerAnalysis;
