//! Declared storage/value types as they appear on the IR, mirroring the
//! `{Elementary, UserDefined(Struct | Contract | Enum), Array(fixed|dynamic), Mapping}`
//! discriminant every value on the graph carries.

use serde::{Deserialize, Serialize};

/// An elementary Solidity-style scalar type: a name plus its storage width in bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementaryType {
    pub name: String,
    pub size_bytes: u16,
}

impl ElementaryType {
    pub fn new(name: impl Into<String>, size_bytes: u16) -> Self {
        Self { name: name.into(), size_bytes }
    }

    pub fn uint256() -> Self {
        Self::new("uint256", 32)
    }

    pub fn address() -> Self {
        Self::new("address", 20)
    }

    pub fn bool_() -> Self {
        Self::new("bool", 1)
    }

    pub fn size_bits(&self) -> u16 {
        self.size_bytes * 8
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    pub ty: DeclaredType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<StructField>,
}

/// The declared type of an IR value, as produced by the (out-of-scope) front-end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DeclaredType {
    Elementary(ElementaryType),
    Struct(StructDef),
    Contract { name: String },
    Enum { name: String },
    FixedArray { length: u64, element: Box<DeclaredType> },
    DynamicArray { element: Box<DeclaredType> },
    Mapping { key: Box<DeclaredType>, value: Box<DeclaredType> },
}

impl DeclaredType {
    pub fn as_struct(&self) -> Option<&StructDef> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_elementary(&self) -> Option<&ElementaryType> {
        match self {
            Self::Elementary(e) => Some(e),
            _ => None,
        }
    }

    /// Reference types start a fresh storage slot when packed as a struct field.
    pub fn is_reference_type(&self) -> bool {
        matches!(
            self,
            Self::Struct(_) | Self::FixedArray { .. } | Self::DynamicArray { .. } | Self::Mapping { .. }
        )
    }

    /// Size in bits, only meaningful for elementary types (packable types).
    pub fn packed_size_bits(&self) -> Option<u16> {
        self.as_elementary().map(ElementaryType::size_bits)
    }
}
