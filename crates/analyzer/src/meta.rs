//! The serializable output document (§6): one entry per contract, keyed by
//! name, carrying recovered storage entities, the constants table, the
//! pure/view utilities list and the per-function storage write table.

use alloy_primitives::U256;
use contract_abstract_ir::DeclaredType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MetaDocument {
    #[serde(flatten)]
    pub contracts: IndexMap<String, ContractMeta>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContractMeta {
    pub address: Option<String>,
    pub entities: IndexMap<String, EntityMeta>,
    pub constants: IndexMap<String, Vec<ConstantEntry>>,
    pub utilities: Vec<UtilityEntry>,
    pub function_write_storage: IndexMap<String, FunctionWrites>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct StorageInfo {
    pub slot: U256,
    pub offset: u32,
}

/// A top-level storage entity: its declared type shape plus where it lives,
/// and (once the layout recognizer has run) the packed sub-field layout
/// hidden inside its word.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityMeta {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    pub storage_info: Option<StorageInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitmap: Option<TypeMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
}

/// Recursive JSON-like type-shape tree (§3 "Storage meta").
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMeta {
    pub data_type: String,
    pub data_meta: DataMeta,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataMeta {
    Elementary { size: u16 },
    Mapping { key: Box<TypeMeta>, value: Box<TypeMeta> },
    StaticArray { length: u64, element_type: Box<TypeMeta> },
    DynamicArray { element_type: Box<TypeMeta> },
    Struct { name: String, fields: Vec<FieldMeta> },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeMeta,
    /// Set on a bitmap sub-field (§4.D layout recognizer): its bit offset
    /// within the enclosing storage word. Absent on a plain struct field,
    /// whose position instead comes from §4.B slot packing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl FieldMeta {
    pub fn plain(name: impl Into<String>, ty: TypeMeta) -> Self {
        Self { name: name.into(), ty, offset: None }
    }

    pub fn at_offset(name: impl Into<String>, ty: TypeMeta, offset_bits: u32) -> Self {
        Self { name: name.into(), ty, offset: Some(offset_bits) }
    }
}

impl TypeMeta {
    pub fn elementary(data_type: impl Into<String>, size: u16) -> Self {
        Self { data_type: data_type.into(), data_meta: DataMeta::Elementary { size } }
    }

    pub fn mapping(key: TypeMeta, value: TypeMeta) -> Self {
        Self { data_type: "mapping".to_string(), data_meta: DataMeta::Mapping { key: Box::new(key), value: Box::new(value) } }
    }

    pub fn static_array(length: u64, element_type: TypeMeta) -> Self {
        Self { data_type: "staticArray".to_string(), data_meta: DataMeta::StaticArray { length, element_type: Box::new(element_type) } }
    }

    pub fn dynamic_array(element_type: TypeMeta) -> Self {
        Self { data_type: "dynamicArray".to_string(), data_meta: DataMeta::DynamicArray { element_type: Box::new(element_type) } }
    }

    pub fn struct_(name: impl Into<String>, fields: Vec<FieldMeta>) -> Self {
        Self { data_type: "struct".to_string(), data_meta: DataMeta::Struct { name: name.into(), fields } }
    }

    /// Converts an IR-declared type into its meta-document shape.
    pub fn from_declared(ty: &DeclaredType) -> Self {
        match ty {
            DeclaredType::Elementary(e) => Self::elementary(e.name.clone(), e.size_bytes),
            DeclaredType::Struct(s) => Self::struct_(
                s.name.clone(),
                s.fields.iter().map(|f| FieldMeta::plain(f.name.clone(), Self::from_declared(&f.ty))).collect(),
            ),
            // A contract reference occupies one address-sized word in storage.
            DeclaredType::Contract { .. } => Self::elementary("address", 20),
            DeclaredType::Enum { .. } => Self::elementary("uint8", 1),
            DeclaredType::FixedArray { length, element } => Self::static_array(*length, Self::from_declared(element)),
            DeclaredType::DynamicArray { element } => Self::dynamic_array(Self::from_declared(element)),
            DeclaredType::Mapping { key, value } => Self::mapping(Self::from_declared(key), Self::from_declared(value)),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConstantEntry {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub ty: TypeMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<Vec<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UtilityEntry {
    pub function: String,
    pub parameters: IndexMap<String, TypeMeta>,
    pub returns: Vec<ReturnEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReturnEntry {
    pub value: String,
    #[serde(rename = "type")]
    pub ty: TypeMeta,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FunctionWrites {
    pub parameters: Vec<String>,
    pub write_storages: Vec<String>,
}
