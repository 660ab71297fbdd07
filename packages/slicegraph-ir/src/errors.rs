//! Error types for slicegraph-ir
//!
//! Provides unified error handling across the crate. Transfer functions in
//! the points-to solver never return errors (they report growth booleans);
//! everything structural or unsupported funnels through [`AnalysisError`].

use crate::shared::models::ValueId;
use thiserror::Error;

/// Main error type for slicegraph-ir operations
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The pointer subgraph has no designated root
    #[error("pointer subgraph has no root")]
    MissingRoot,

    /// The module has no entry function of the given name
    #[error("module has no '{0}' function")]
    MissingEntry(String),

    /// The points-to oracle has no node for an IR value that needs one
    #[error("no points-to information for value v{0}")]
    MissingPointsTo(ValueId),

    /// A call through a function pointer whose points-to set is empty
    #[error("empty points-to set for called value v{0}")]
    EmptyCalleePointsTo(ValueId),

    /// An indirect call site whose single target is not a function
    #[error("called value v{0} does not resolve to a function")]
    UnresolvedCallee(ValueId),

    /// A function whose body violates builder assumptions
    #[error("malformed function '{function}': {reason}")]
    MalformedFunction { function: String, reason: String },

    /// Unsupported input construct (intrinsics, realloc)
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// An optional analysis capability was invoked on an implementation
    /// that does not provide it; the calling analysis is buggy
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
}

impl AnalysisError {
    /// Create a malformed-function error
    pub fn malformed(function: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalysisError::MalformedFunction {
            function: function.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported-construct error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        AnalysisError::Unsupported(msg.into())
    }
}

/// Result type alias for slicegraph operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
