//! Shared models

mod ir;
mod layout;

pub use ir::{
    BasicBlock, BlockId, Callee, Function, FunctionId, GlobalVariable, Instruction, Module, Opcode,
    ValueId,
};
pub use layout::{DataLayout, Ty};
