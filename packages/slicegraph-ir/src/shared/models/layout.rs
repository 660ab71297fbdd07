//! Type shapes and data-layout queries
//!
//! The reaching-defs builder only needs one thing from the type system: the
//! allocated size of a stored value. Unsized types report 0 and the builder
//! widens the def-site to an unknown extent.

use serde::{Deserialize, Serialize};

/// Shape of an IR type, as far as sizing is concerned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ty {
    /// Integer of the given bit width
    Int(u32),

    /// Pointer to anything
    Ptr,

    /// Fixed-length array
    Array { elem: Box<Ty>, len: u64 },

    /// Aggregate of consecutive fields
    Struct(Vec<Ty>),

    /// Opaque or otherwise unsized type
    Opaque,
}

/// Target data layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLayout {
    /// Size of a pointer in bytes
    pub pointer_size: u64,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self { pointer_size: 8 }
    }
}

impl DataLayout {
    pub fn new(pointer_size: u64) -> Self {
        Self { pointer_size }
    }

    /// Number of bytes allocated for a value of this type; 0 when unsized.
    ///
    /// Aggregates are sized as the sum of their parts; an unsized member
    /// makes the whole aggregate unsized.
    pub fn type_alloc_size(&self, ty: &Ty) -> u64 {
        match ty {
            Ty::Int(bits) => u64::from((bits + 7) / 8),
            Ty::Ptr => self.pointer_size,
            Ty::Array { elem, len } => {
                let elem_size = self.type_alloc_size(elem);
                if elem_size == 0 {
                    0
                } else {
                    elem_size * len
                }
            }
            Ty::Struct(fields) => {
                let mut total = 0;
                for field in fields {
                    let size = self.type_alloc_size(field);
                    if size == 0 {
                        return 0;
                    }
                    total += size;
                }
                total
            }
            Ty::Opaque => 0,
        }
    }
}
