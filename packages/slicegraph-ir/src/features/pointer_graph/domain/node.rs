//! Pointer-state nodes
//!
//! One `PsNode` per pointer-relevant program point. Nodes are identified by
//! their arena slot; the front end creates them, the solver is the only
//! mutator of their points-to sets.

use super::offset::Offset;
use super::pointer::{Pointer, PointsToSet};
use crate::shared::models::ValueId;
use serde::{Deserialize, Serialize};

/// Arena slot of a pointer-state node
pub type PsNodeId = u32;

/// Closed set of pointer-state node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PsNodeKind {
    /// Memory allocation; the node is its own abstract memory object
    Alloc,

    /// Read through operand 0
    Load,

    /// Write of operand 0 through operand 1
    Store,

    /// Pointer arithmetic on operand 0 by the node's offset
    Gep,

    /// Join of all operands
    Phi,

    /// Value-preserving conversion of operand 0
    Cast,

    /// Call site; operands carry values passed across the call edge
    Call,

    /// Function return; operands carry the returned values
    Return,

    /// A function as a value; points to itself
    Function,

    /// The null pointer
    NullPtr,

    /// Unknown memory
    UnknownMem,

    /// Constant pointer value set up by the front end
    Constant,

    /// No pointer effect; forwards operand 0 when one exists
    Noop,
}

impl PsNodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PsNodeKind::Alloc => "ALLOC",
            PsNodeKind::Load => "LOAD",
            PsNodeKind::Store => "STORE",
            PsNodeKind::Gep => "GEP",
            PsNodeKind::Phi => "PHI",
            PsNodeKind::Cast => "CAST",
            PsNodeKind::Call => "CALL",
            PsNodeKind::Return => "RETURN",
            PsNodeKind::Function => "FUNCTION",
            PsNodeKind::NullPtr => "NULLPTR",
            PsNodeKind::UnknownMem => "UNKNOWN_MEM",
            PsNodeKind::Constant => "CONSTANT",
            PsNodeKind::Noop => "NOOP",
        }
    }
}

/// One program point in the pointer-state subgraph
#[derive(Debug, Clone)]
pub struct PsNode {
    kind: PsNodeKind,

    /// Data edges: the values this node computes from
    pub(crate) operands: Vec<PsNodeId>,

    /// Control edges
    pub(crate) successors: Vec<PsNodeId>,
    pub(crate) predecessors: Vec<PsNodeId>,

    /// Per-node offset; meaningful for GEP and constant-offset pointers
    offset: Offset,

    /// Monotonically growing result of the solver
    pub points_to: PointsToSet,

    /// Back-pointer to the IR value this node was lowered from
    user_data: Option<ValueId>,

    /// Debug label
    name: Option<String>,
}

impl PsNode {
    pub(crate) fn new(kind: PsNodeKind) -> Self {
        Self {
            kind,
            operands: Vec::new(),
            successors: Vec::new(),
            predecessors: Vec::new(),
            offset: Offset::ZERO,
            points_to: PointsToSet::default(),
            user_data: None,
            name: None,
        }
    }

    #[inline]
    pub fn kind(&self) -> PsNodeKind {
        self.kind
    }

    #[inline]
    pub fn operands(&self) -> &[PsNodeId] {
        &self.operands
    }

    #[inline]
    pub fn operand(&self, index: usize) -> Option<PsNodeId> {
        self.operands.get(index).copied()
    }

    #[inline]
    pub fn successors(&self) -> &[PsNodeId] {
        &self.successors
    }

    #[inline]
    pub fn predecessors(&self) -> &[PsNodeId] {
        &self.predecessors
    }

    #[inline]
    pub fn offset(&self) -> Offset {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Offset) {
        self.offset = offset;
    }

    #[inline]
    pub fn user_data(&self) -> Option<ValueId> {
        self.user_data
    }

    pub fn set_user_data(&mut self, value: ValueId) {
        self.user_data = Some(value);
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Insert one pointer; true iff the set grew
    #[inline]
    pub fn add_pointer(&mut self, pointer: Pointer) -> bool {
        self.points_to.insert(pointer)
    }

    /// Insert many pointers; true iff the set grew
    pub fn add_pointers(&mut self, pointers: impl IntoIterator<Item = Pointer>) -> bool {
        let before = self.points_to.len();
        self.points_to.extend(pointers);
        self.points_to.len() > before
    }
}
