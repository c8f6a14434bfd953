//! The side table that replaces the source system's per-value open context
//! map (§3, §9): every IR value's `abstract`/`bitmap`/`points_to` annotation
//! lives here, keyed by [`ValueId`], rather than mutably on the IR itself.

use std::collections::HashMap;

use contract_abstract_ir::ValueId;
use contract_abstract_semantics::AbstractValue;
use z3::ast::BV;

/// One value's worth of analysis-local state.
#[derive(Clone, Debug)]
pub struct Annotation {
    pub abstract_value: AbstractValue,
    pub bitmap: Option<BV>,
    /// Set on a reference value that targets one field of its referent
    /// (§4.E `Member`): the field index within the referent's struct type.
    pub points_to: Option<usize>,
    /// Set alongside `points_to`: the `ValueId` of the reference's referent,
    /// so a later write through this reference can be propagated back onto
    /// the referent's own annotation (§4.E `Assignment`, scenario 6).
    pub referent: Option<ValueId>,
}

impl Annotation {
    pub fn unknown() -> Self {
        Self { abstract_value: AbstractValue::unknown(), bitmap: None, points_to: None, referent: None }
    }

    pub fn of(abstract_value: AbstractValue) -> Self {
        Self { abstract_value, bitmap: None, points_to: None, referent: None }
    }
}

/// Owns every value's annotation for the duration of one path walk.
///
/// Cleared in bulk between paths (§4.F): `clear_except` resets every entry
/// save the ones named, so state-variable owners keep their canonical
/// symbolic identity across path walks while locals/temporaries start fresh.
#[derive(Clone, Default)]
pub struct AnnotationStore {
    entries: HashMap<ValueId, Annotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ValueId) -> Option<&Annotation> {
        self.entries.get(&id)
    }

    pub fn abstract_of(&self, id: ValueId) -> AbstractValue {
        self.entries.get(&id).map(|a| a.abstract_value.clone()).unwrap_or_else(AbstractValue::unknown)
    }

    pub fn set(&mut self, id: ValueId, annotation: Annotation) {
        self.entries.insert(id, annotation);
    }

    pub fn set_abstract(&mut self, id: ValueId, value: AbstractValue) {
        self.entries.entry(id).or_insert_with(Annotation::unknown).abstract_value = value;
    }

    pub fn set_bitmap(&mut self, id: ValueId, bitmap: BV) {
        self.entries.entry(id).or_insert_with(Annotation::unknown).bitmap = Some(bitmap);
    }

    pub fn bitmap_of(&self, id: ValueId) -> Option<BV> {
        self.entries.get(&id).and_then(|a| a.bitmap.clone())
    }

    pub fn set_reference(&mut self, id: ValueId, referent: ValueId, points_to: Option<usize>) {
        let entry = self.entries.entry(id).or_insert_with(Annotation::unknown);
        entry.referent = Some(referent);
        entry.points_to = points_to;
    }

    /// §4.F: clears every annotation except those in `keep` (the canonical
    /// state-variable identities that must survive into the next path).
    pub fn clear_except(&mut self, keep: &[ValueId]) {
        let keep_set: std::collections::HashSet<ValueId> = keep.iter().copied().collect();
        self.entries.retain(|id, _| keep_set.contains(id));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_value_reads_as_unknown() {
        let store = AnnotationStore::new();
        let v = store.abstract_of(ValueId(7));
        assert_eq!(v.as_scalar().unwrap().value, contract_abstract_semantics::UNKNOWN);
    }

    #[test]
    fn clear_except_preserves_named_ids_only() {
        let mut store = AnnotationStore::new();
        store.set_abstract(ValueId(1), AbstractValue::from_storage("bal"));
        store.set_abstract(ValueId(2), AbstractValue::literal("tmp"));
        store.clear_except(&[ValueId(1)]);
        assert!(store.get(ValueId(1)).is_some());
        assert!(store.get(ValueId(2)).is_none());
    }
}
