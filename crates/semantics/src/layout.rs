//! Component B: turns a canonical storage expression into a concrete
//! `(slot, offset)` using the contract storage-layout rules (§4.B).

use alloy_primitives::{keccak256, U256};
use contract_abstract_ir::{DeclaredType, ElementaryType};
use indexmap::IndexMap;

use crate::error::{LayoutError, LayoutErrorKind};
use crate::expr::{self, Base, ExprNode};

/// A concrete slot address plus a bit offset within that 32-byte word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotInfo {
    pub slot: U256,
    pub offset_bits: u32,
}

impl SlotInfo {
    pub fn new(slot: U256, offset_bits: u32) -> Self {
        Self { slot, offset_bits }
    }
}

/// Base slot for a fixed/dynamic array: `keccak256(be_bytes(parent_slot))`.
pub fn array_base_slot(parent_slot: U256) -> U256 {
    U256::from_be_bytes(keccak256(parent_slot.to_be_bytes::<32>()).0)
}

/// Mapping element slot: `keccak256(left_pad(key) ++ be_bytes(parent_slot))`.
pub fn mapping_slot(key_bytes: &[u8], parent_slot: U256) -> U256 {
    let mut buf = [0u8; 64];
    let key_len = key_bytes.len().min(32);
    buf[32 - key_len..32].copy_from_slice(&key_bytes[key_bytes.len() - key_len..]);
    buf[32..].copy_from_slice(&parent_slot.to_be_bytes::<32>());
    U256::from_be_bytes(keccak256(buf).0)
}

fn encode_elementary_literal(ty: &ElementaryType, literal: &str) -> Result<[u8; 32], LayoutError> {
    let encode_err = || LayoutErrorKind::MappingKeyEncoding { literal: literal.to_string(), type_name: ty.name.clone() }.into();

    if ty.name == "bool" {
        return match literal {
            "true" => Ok(U256::from(1u8).to_be_bytes::<32>()),
            "false" => Ok(U256::ZERO.to_be_bytes::<32>()),
            _ => Err(encode_err()),
        };
    }

    let parsed = if let Some(hex) = literal.strip_prefix("0x").or_else(|| literal.strip_prefix("0X")) {
        U256::from_str_radix(hex, 16)
    } else {
        U256::from_str_radix(literal, 10)
    };
    parsed.map(|v| v.to_be_bytes::<32>()).map_err(|_| encode_err())
}

/// Packs struct fields in declaration order, returning each field's
/// (slot-count-relative-to-base, offset_bits).
fn struct_field_offsets(fields: &[contract_abstract_ir::StructField]) -> Vec<(u64, u32)> {
    let mut slot_count: u64 = 0;
    let mut offset_bits: u32 = 0;
    let mut out = Vec::with_capacity(fields.len());
    for f in fields {
        if f.ty.is_reference_type() {
            if offset_bits != 0 {
                slot_count += 1;
                offset_bits = 0;
            }
            out.push((slot_count, 0));
            slot_count += 1;
            offset_bits = 0;
        } else {
            let width = f.ty.packed_size_bits().unwrap_or(256) as u32;
            if offset_bits + width > 256 {
                slot_count += 1;
                offset_bits = 0;
            }
            out.push((slot_count, offset_bits));
            offset_bits += width;
        }
    }
    out
}

/// Resolves canonical storage expressions against a contract's declared
/// top-level entities (name -> declared type, base slot/offset).
pub struct EntityLayout {
    entities: IndexMap<String, (DeclaredType, SlotInfo)>,
}

impl EntityLayout {
    pub fn new(entities: IndexMap<String, (DeclaredType, SlotInfo)>) -> Self {
        Self { entities }
    }

    pub fn entity(&self, name: &str) -> Option<&(DeclaredType, SlotInfo)> {
        self.entities.get(name)
    }

    pub fn entities(&self) -> impl Iterator<Item = (&str, &DeclaredType, &SlotInfo)> {
        self.entities.iter().map(|(name, (ty, slot))| (name.as_str(), ty, slot))
    }

    /// `layout_of(expr) -> (SlotInfo, TypeMeta)` (§4.B). Requires any
    /// array/mapping index along the path to be a literal.
    pub fn layout_of(&self, expression: &str) -> Result<(SlotInfo, DeclaredType), LayoutError> {
        let node = expr::parse(expression)?;
        self.resolve(&node)
    }

    /// `find_meta` (§4.B): pure type navigation, never requires literal keys.
    pub fn find_meta(&self, expression: &str) -> Result<DeclaredType, LayoutError> {
        let node = expr::parse(expression)?;
        self.type_of(&node)
    }

    fn resolve(&self, node: &ExprNode) -> Result<(SlotInfo, DeclaredType), LayoutError> {
        let (base_slot, base_ty) = match &node.name {
            Base::Ident(name) => self
                .entities
                .get(name)
                .cloned()
                .ok_or_else(|| LayoutErrorKind::UnknownIdentifier(name.clone()).into())?,
            Base::Nested(inner) => self.resolve(inner)?,
        };

        if let Some(field) = &node.field {
            self.struct_field_layout(&base_slot, &base_ty, field)
        } else if let Some(index) = &node.index {
            self.index_layout(&base_slot, &base_ty, index)
        } else {
            Ok((base_slot, base_ty))
        }
    }

    fn struct_field_layout(
        &self,
        base: &SlotInfo,
        base_ty: &DeclaredType,
        field_name: &str,
    ) -> Result<(SlotInfo, DeclaredType), LayoutError> {
        let struct_def = base_ty.as_struct().ok_or_else(|| LayoutErrorKind::NotAStruct(field_name.to_string()))?;
        let offsets = struct_field_offsets(&struct_def.fields);
        for (field, (slot_count, offset_bits)) in struct_def.fields.iter().zip(offsets) {
            if field.name == field_name {
                return Ok((SlotInfo::new(base.slot + U256::from(slot_count), offset_bits), field.ty.clone()));
            }
        }
        Err(LayoutErrorKind::UnknownField(field_name.to_string(), struct_def.name.clone()).into())
    }

    fn index_layout(
        &self,
        base: &SlotInfo,
        base_ty: &DeclaredType,
        index_node: &ExprNode,
    ) -> Result<(SlotInfo, DeclaredType), LayoutError> {
        match base_ty {
            DeclaredType::FixedArray { length, element } => {
                if *length == 0 {
                    return Err(LayoutErrorKind::EmptyFixedArray.into());
                }
                let idx = literal_u64(index_node).ok_or_else(|| LayoutErrorKind::SymbolicIndex(index_node.format()))?;
                if idx >= *length {
                    return Err(LayoutErrorKind::IndexOutOfRange { index: idx, length: *length }.into());
                }
                let slots_per_element = slot_width(element);
                let base_array_slot = array_base_slot(base.slot);
                let slot = base_array_slot + U256::from(idx) * U256::from(slots_per_element);
                Ok((SlotInfo::new(slot, 0), (**element).clone()))
            }
            DeclaredType::DynamicArray { element } => {
                let idx = literal_u64(index_node).ok_or_else(|| LayoutErrorKind::SymbolicIndex(index_node.format()))?;
                let slots_per_element = slot_width(element);
                let base_array_slot = array_base_slot(base.slot);
                let slot = base_array_slot + U256::from(idx) * U256::from(slots_per_element);
                Ok((SlotInfo::new(slot, 0), (**element).clone()))
            }
            DeclaredType::Mapping { key, value } => {
                let key_ty = key.as_elementary().ok_or_else(|| LayoutErrorKind::NonElementaryMappingKey((**key).clone()))?;
                let literal = literal_text(index_node).ok_or_else(|| LayoutErrorKind::SymbolicIndex(index_node.format()))?;
                let key_bytes = encode_elementary_literal(key_ty, &literal)?;
                let slot = mapping_slot(&key_bytes, base.slot);
                Ok((SlotInfo::new(slot, 0), (**value).clone()))
            }
            _ => Err(LayoutErrorKind::NotIndexable.into()),
        }
    }

    fn type_of(&self, node: &ExprNode) -> Result<DeclaredType, LayoutError> {
        let base_ty = match &node.name {
            Base::Ident(name) => self
                .entities
                .get(name)
                .map(|(ty, _)| ty.clone())
                .ok_or_else(|| LayoutErrorKind::UnknownIdentifier(name.clone()))?,
            Base::Nested(inner) => self.type_of(inner)?,
        };

        if let Some(field) = &node.field {
            let struct_def = base_ty.as_struct().ok_or_else(|| LayoutErrorKind::NotAStruct(field.clone()))?;
            struct_def
                .fields
                .iter()
                .find(|f| &f.name == field)
                .map(|f| f.ty.clone())
                .ok_or_else(|| LayoutErrorKind::UnknownField(field.clone(), struct_def.name.clone()).into())
        } else if node.index.is_some() {
            match base_ty {
                DeclaredType::FixedArray { element, .. } | DeclaredType::DynamicArray { element } => Ok(*element),
                DeclaredType::Mapping { value, .. } => Ok(*value),
                _ => Err(LayoutErrorKind::NotIndexable.into()),
            }
        } else {
            Ok(base_ty)
        }
    }
}

/// One elementary slot per fixed-size element; nested containers/structs
/// that span multiple slots are out of scope (§1 non-goals: nested containers).
fn slot_width(element: &DeclaredType) -> u64 {
    match element {
        DeclaredType::Struct(def) => {
            let offsets = struct_field_offsets(&def.fields);
            offsets.last().map(|(slot, _)| slot + 1).unwrap_or(1)
        }
        _ => 1,
    }
}

fn literal_u64(node: &ExprNode) -> Option<u64> {
    if node.index.is_some() || node.field.is_some() {
        return None;
    }
    match &node.name {
        Base::Ident(name) => name.parse::<u64>().ok(),
        Base::Nested(_) => None,
    }
}

fn literal_text(node: &ExprNode) -> Option<String> {
    if node.index.is_some() || node.field.is_some() {
        return None;
    }
    match &node.name {
        Base::Ident(name) => Some(name.clone()),
        Base::Nested(_) => None,
    }
}

/// Decodes a right-aligned, size-truncated, offset-shifted field out of a
/// raw 32-byte storage word (§4.B `read_value`).
pub fn read_value(word: &[u8; 32], slot: &SlotInfo, ty: &DeclaredType) -> Result<contract_abstract_ir::ConstantValue, LayoutError> {
    use contract_abstract_ir::ConstantValue;

    let elem = ty.as_elementary().ok_or_else(|| LayoutErrorKind::NotAStruct("<read_value>".to_string()))?;
    let full = U256::from_be_bytes(*word);
    let shifted = full >> slot.offset_bits;
    let size_bits = elem.size_bits() as usize;
    let mask = if size_bits >= 256 { U256::MAX } else { (U256::from(1u8) << size_bits) - U256::from(1u8) };
    let truncated = shifted & mask;

    Ok(match elem.name.as_str() {
        "bool" => ConstantValue::Bool(truncated != U256::ZERO),
        "address" => {
            let bytes = truncated.to_be_bytes::<32>();
            ConstantValue::Address(alloy_primitives::Address::from_slice(&bytes[12..32]))
        }
        _ => ConstantValue::Uint(truncated),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contract_abstract_ir::{DeclaredType, ElementaryType, StructDef, StructField};

    fn uint(size_bytes: u16) -> DeclaredType {
        DeclaredType::Elementary(ElementaryType::new("uint256", size_bytes))
    }

    #[test]
    fn packed_struct_field_starts_at_expected_bit_offset() {
        let fields = vec![
            StructField { name: "a".into(), ty: uint(1) },
            StructField { name: "b".into(), ty: uint(1) },
            StructField { name: "c".into(), ty: uint(2) },
        ];
        let struct_ty = DeclaredType::Struct(StructDef { name: "S".into(), fields });
        let mut entities = IndexMap::new();
        entities.insert("s".to_string(), (struct_ty, SlotInfo::new(U256::from(0u8), 0)));
        let layout = EntityLayout::new(entities);

        let (slot, _) = layout.layout_of("s.c").unwrap();
        assert_eq!(slot.slot, U256::from(0u8));
        assert_eq!(slot.offset_bits, 16);
    }

    #[test]
    fn field_exactly_filling_slot_packs_in_place_next_overflows() {
        let fields = vec![
            StructField { name: "a".into(), ty: uint(31) },
            StructField { name: "b".into(), ty: uint(1) },
            StructField { name: "c".into(), ty: uint(1) },
        ];
        let offsets = struct_field_offsets(&fields);
        assert_eq!(offsets[0], (0, 0));
        assert_eq!(offsets[1], (0, 248));
        assert_eq!(offsets[2], (1, 0));
    }

    #[test]
    fn fixed_array_length_one_is_keccak_of_base_slot() {
        let mut entities = IndexMap::new();
        let arr_ty = DeclaredType::FixedArray { length: 1, element: Box::new(uint(32)) };
        entities.insert("arr".to_string(), (arr_ty, SlotInfo::new(U256::from(5u8), 0)));
        let layout = EntityLayout::new(entities);
        let (slot, _) = layout.layout_of("arr[0]").unwrap();
        assert_eq!(slot.slot, array_base_slot(U256::from(5u8)));
    }

    #[test]
    fn fixed_array_length_zero_errors() {
        let mut entities = IndexMap::new();
        let arr_ty = DeclaredType::FixedArray { length: 0, element: Box::new(uint(32)) };
        entities.insert("arr".to_string(), (arr_ty, SlotInfo::new(U256::from(5u8), 0)));
        let layout = EntityLayout::new(entities);
        assert!(layout.layout_of("arr[0]").is_err());
    }

    #[test]
    fn mapping_key_not_elementary_is_a_layout_error() {
        let mut entities = IndexMap::new();
        let struct_key = DeclaredType::Struct(StructDef { name: "K".into(), fields: vec![] });
        let map_ty = DeclaredType::Mapping { key: Box::new(struct_key), value: Box::new(uint(32)) };
        entities.insert("m".to_string(), (map_ty, SlotInfo::new(U256::from(1u8), 0)));
        let layout = EntityLayout::new(entities);
        assert!(layout.layout_of("m[1]").is_err());
    }

    #[test]
    fn mapping_slot_is_deterministic_and_key_sensitive() {
        let key_a = alloy_primitives::Address::repeat_byte(0xAB);
        let key_b = alloy_primitives::Address::repeat_byte(0xCD);
        let parent = U256::from(3u8);

        let slot_a1 = mapping_slot(key_a.as_slice(), parent);
        let slot_a2 = mapping_slot(key_a.as_slice(), parent);
        assert_eq!(slot_a1, slot_a2);

        let slot_b = mapping_slot(key_b.as_slice(), parent);
        assert_ne!(slot_a1, slot_b);

        let mut buf = [0u8; 64];
        buf[12..32].copy_from_slice(key_a.as_slice());
        buf[32..].copy_from_slice(&parent.to_be_bytes::<32>());
        let expected = U256::from_be_bytes(alloy_primitives::keccak256(buf).0);
        assert_eq!(slot_a1, expected);
    }

    #[test]
    fn scenario_two_packed_reserve_struct_locates_field_c_at_bit_128() {
        let fields = vec![
            StructField { name: "a".into(), ty: uint(8) },
            StructField { name: "b".into(), ty: uint(8) },
            StructField { name: "c".into(), ty: DeclaredType::Elementary(ElementaryType::new("uint128", 16)) },
        ];
        let struct_ty = DeclaredType::Struct(StructDef { name: "Reserve".into(), fields });
        let mut entities = IndexMap::new();
        entities.insert("s".to_string(), (struct_ty, SlotInfo::new(U256::from(0u8), 0)));
        let layout = EntityLayout::new(entities);

        let (slot, _) = layout.layout_of("s.c").unwrap();
        assert_eq!(slot.slot, U256::from(0u8));
        assert_eq!(slot.offset_bits, 128);
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(500))]

            #[test]
            fn proptest_packed_struct_fields_never_overflow_a_slot(widths in proptest::collection::vec(1u16..=32u16, 1..24)) {
                let fields: Vec<StructField> = widths
                    .iter()
                    .enumerate()
                    .map(|(i, &w)| StructField { name: format!("f{i}"), ty: uint(w) })
                    .collect();
                let offsets = struct_field_offsets(&fields);
                for (&w, &(_, offset_bits)) in widths.iter().zip(offsets.iter()) {
                    let width_bits = u32::from(w) * 8;
                    prop_assert!(offset_bits + width_bits <= 256);
                }
            }

            #[test]
            fn proptest_packed_struct_fields_never_collide_within_a_slot(widths in proptest::collection::vec(1u16..=32u16, 1..24)) {
                let fields: Vec<StructField> = widths
                    .iter()
                    .enumerate()
                    .map(|(i, &w)| StructField { name: format!("f{i}"), ty: uint(w) })
                    .collect();
                let offsets = struct_field_offsets(&fields);
                for pair in offsets.windows(2) {
                    let (slot_a, off_a) = pair[0];
                    let (slot_b, off_b) = pair[1];
                    prop_assert!(slot_a < slot_b || off_a <= off_b);
                }
            }
        }
    }
}
