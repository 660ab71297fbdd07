//! Compiler-style IR consumed by the analyses
//!
//! This is the interface boundary to the front end: a module of functions
//! made of basic blocks of instructions, plus module-level globals. Every
//! function, global and instruction occupies one slot in a single `ValueId`
//! space so analyses can hand back-pointers around without caring what kind
//! of value they refer to.
//!
//! Only the opcodes the reaching-definitions builder distinguishes are
//! modeled; everything else is `Opcode::Other` and flows through unchanged.

use super::layout::Ty;
use serde::{Deserialize, Serialize};

/// Identifier of any IR value (function, global or instruction)
pub type ValueId = u32;

/// Index of a function within its module
pub type FunctionId = u32;

/// Index of a basic block within its function
pub type BlockId = u32;

/// Call target of a call instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Callee {
    /// Call of a known function
    Direct(FunctionId),

    /// Call through a pointer-valued expression
    Indirect(ValueId),
}

/// Instruction opcodes the analyses care about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Opcode {
    /// Stack allocation; target of def-sites
    Alloca,

    /// Write of a value of type `value_ty` through the address `dest`
    Store { value_ty: Ty, dest: ValueId },

    /// Function return
    Ret,

    /// Function call
    Call(Callee),

    /// Any opcode with no points-to or reaching-defs relevance
    Other,
}

/// One IR instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// The value this instruction defines
    pub value: ValueId,

    pub opcode: Opcode,
}

impl Instruction {
    pub fn new(value: ValueId, opcode: Opcode) -> Self {
        Self { value, opcode }
    }
}

/// A basic block: straight-line instructions plus CFG successor blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub instructions: Vec<Instruction>,
    pub successors: Vec<BlockId>,
}

impl BasicBlock {
    pub fn new(instructions: Vec<Instruction>, successors: Vec<BlockId>) -> Self {
        Self {
            instructions,
            successors,
        }
    }
}

/// One function of the module
///
/// A function with no blocks is a declaration; its body is unknown to the
/// analyses and call sites treat it as an opaque allocation-like effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    /// The function's own slot in the value space
    pub value: ValueId,

    pub name: String,

    pub blocks: Vec<BasicBlock>,

    /// Compiler intrinsic (not a user-defined function)
    pub is_intrinsic: bool,
}

impl Function {
    pub fn new(value: ValueId, name: impl Into<String>, blocks: Vec<BasicBlock>) -> Self {
        Self {
            value,
            name: name.into(),
            blocks,
            is_intrinsic: false,
        }
    }

    /// Declaration without a body
    pub fn declaration(value: ValueId, name: impl Into<String>) -> Self {
        Self::new(value, name, Vec::new())
    }

    /// Mark as compiler intrinsic
    pub fn intrinsic(mut self) -> Self {
        self.is_intrinsic = true;
        self
    }

    #[inline]
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Debug-metadata pseudo-function; calls to it carry no data flow
    #[inline]
    pub fn is_debug_intrinsic(&self) -> bool {
        self.is_intrinsic && self.name.starts_with("dbg.")
    }
}

/// A module-level global variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalVariable {
    pub value: ValueId,
    pub name: String,
}

impl GlobalVariable {
    pub fn new(value: ValueId, name: impl Into<String>) -> Self {
        Self {
            value,
            name: name.into(),
        }
    }
}

/// An IR module: globals in declaration order plus functions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub globals: Vec<GlobalVariable>,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn new(globals: Vec<GlobalVariable>, functions: Vec<Function>) -> Self {
        Self { globals, functions }
    }

    #[inline]
    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id as usize]
    }

    /// Look a function up by name
    pub fn function_named(&self, name: &str) -> Option<FunctionId> {
        self.functions
            .iter()
            .position(|f| f.name == name)
            .map(|i| i as FunctionId)
    }

    /// Look a function up by its slot in the value space
    pub fn function_by_value(&self, value: ValueId) -> Option<FunctionId> {
        self.functions
            .iter()
            .position(|f| f.value == value)
            .map(|i| i as FunctionId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_lookup() {
        let module = Module::new(
            vec![],
            vec![
                Function::declaration(0, "malloc"),
                Function::new(1, "main", vec![BasicBlock::default()]),
            ],
        );

        assert_eq!(module.function_named("main"), Some(1));
        assert_eq!(module.function_named("missing"), None);
        assert_eq!(module.function_by_value(0), Some(0));
        assert!(module.function(0).is_declaration());
        assert!(!module.function(1).is_declaration());
    }

    #[test]
    fn test_debug_intrinsic() {
        let dbg = Function::declaration(3, "dbg.value").intrinsic();
        let memcpy = Function::declaration(4, "memcpy.inline").intrinsic();

        assert!(dbg.is_debug_intrinsic());
        assert!(!memcpy.is_debug_intrinsic());
    }
}
