//! Ports for the reaching-defs builder
//!
//! The builder never runs the pointer analysis itself; it reads solved
//! results through [`PointsToOracle`], the boundary to whatever front end
//! lowered the IR into the pointer subgraph.

use crate::features::pointer_graph::domain::node::PsNodeId;
use crate::shared::models::ValueId;
use rustc_hash::FxHashMap;

/// Maps IR values to their solved pointer-state nodes
pub trait PointsToOracle {
    /// The pointer-state node carrying `value`'s points-to set
    fn points_to_node(&self, value: ValueId) -> Option<PsNodeId>;
}

/// Map-backed oracle, filled by the front end during lowering
#[derive(Debug, Clone, Default)]
pub struct PointsToMap {
    map: FxHashMap<ValueId, PsNodeId>,
}

impl PointsToMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: ValueId, node: PsNodeId) {
        self.map.insert(value, node);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl PointsToOracle for PointsToMap {
    fn points_to_node(&self, value: ValueId) -> Option<PsNodeId> {
        self.map.get(&value).copied()
    }
}
