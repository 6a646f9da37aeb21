//! Type identifiers for LarchDB data types.

use serde::{Deserialize, Serialize};

/// Identifier for all key types a LarchDB index can store.
///
/// Type IDs identify the variant of a [`crate::value::Value`] without its
/// payload; the catalog layer records one per indexed column, and the value
/// codec needs one to decode a raw payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TypeId {
    // Null type
    Null = 0,

    // Boolean
    Boolean = 1,

    // Integer types
    Int8 = 10,
    Int16 = 11,
    Int32 = 12,
    Int64 = 13,

    // Floating point types
    Float32 = 30,
    Float64 = 31,

    // Character types
    Char = 50,
    Varchar = 51,

    // Composite/Struct (field types stored separately)
    Composite = 110,
}

impl TypeId {
    /// Returns the encoded byte size for this type, or None for
    /// variable-length types.
    ///
    /// Booleans encode as a 4-byte integer and characters as a single
    /// UTF-16 code unit, matching the value codec.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            TypeId::Null => Some(0),
            TypeId::Boolean => Some(4),

            TypeId::Int8 => Some(1),
            TypeId::Int16 => Some(2),
            TypeId::Int32 | TypeId::Float32 => Some(4),
            TypeId::Int64 | TypeId::Float64 => Some(8),

            TypeId::Char => Some(2),

            // Variable-length types
            TypeId::Varchar | TypeId::Composite => None,
        }
    }

    /// Returns true if this type has a fixed encoded size.
    pub fn is_fixed_size(&self) -> bool {
        self.fixed_size().is_some()
    }

    /// Returns true if this type is a numeric type.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TypeId::Int8
                | TypeId::Int16
                | TypeId::Int32
                | TypeId::Int64
                | TypeId::Float32
                | TypeId::Float64
        )
    }

    /// Returns true if this type is an integer type.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            TypeId::Int8 | TypeId::Int16 | TypeId::Int32 | TypeId::Int64
        )
    }

    /// Returns true if this type is a floating-point type.
    pub fn is_floating_point(&self) -> bool {
        matches!(self, TypeId::Float32 | TypeId::Float64)
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TypeId::Null => "NULL",
            TypeId::Boolean => "BOOLEAN",
            TypeId::Int8 => "INT8",
            TypeId::Int16 => "INT16",
            TypeId::Int32 => "INT32",
            TypeId::Int64 => "INT64",
            TypeId::Float32 => "FLOAT32",
            TypeId::Float64 => "FLOAT64",
            TypeId::Char => "CHAR",
            TypeId::Varchar => "VARCHAR",
            TypeId::Composite => "COMPOSITE",
        };
        write!(f, "{}", name)
    }
}
