//! Component A: the five-field semantic lattice element propagated through
//! every IR operation (§3, §4.A).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Placeholder used for `value` when no better expression is known.
pub const UNKNOWN: &str = "$unknown$";

pub type TaintSet = BTreeSet<String>;

/// The scalar record: exactly the five fields from §3.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarValue {
    pub input: Option<String>,
    pub storage: Option<String>,
    pub input_taints: TaintSet,
    pub storage_taints: TaintSet,
    pub value: String,
}

impl ScalarValue {
    pub fn unknown() -> Self {
        Self { input: None, storage: None, input_taints: TaintSet::new(), storage_taints: TaintSet::new(), value: UNKNOWN.to_string() }
    }

    /// A value rooted in an entry-function parameter.
    pub fn from_input(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut input_taints = TaintSet::new();
        input_taints.insert(name.clone());
        Self { input: Some(name.clone()), storage: None, input_taints, storage_taints: TaintSet::new(), value: name }
    }

    /// A value rooted in a storage variable.
    pub fn from_storage(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut storage_taints = TaintSet::new();
        storage_taints.insert(name.clone());
        Self { input: None, storage: Some(name.clone()), input_taints: TaintSet::new(), storage_taints, value: name }
    }

    /// A plain opaque literal/printable value with no origin.
    pub fn literal(value: impl Into<String>) -> Self {
        Self { input: None, storage: None, input_taints: TaintSet::new(), storage_taints: TaintSet::new(), value: value.into() }
    }

    /// Never both non-null simultaneously (§3 invariant).
    pub fn is_origin_consistent(&self) -> bool {
        !(self.input.is_some() && self.storage.is_some())
    }

    pub fn union_taints(&mut self, other: &ScalarValue) {
        self.input_taints.extend(other.input_taints.iter().cloned());
        self.storage_taints.extend(other.storage_taints.iter().cloned());
    }

    /// `Index` transfer (§4.E): append `[idx]` to whichever origin is set,
    /// propagate input taints unchanged, append `[idx]` to each existing
    /// storage taint, then union in the index's own taints.
    pub fn append_index(&self, idx_text: &str, idx_taints: &ScalarValue) -> Self {
        let mut out = self.clone();
        if let Some(input) = &mut out.input {
            input.push('[');
            input.push_str(idx_text);
            input.push(']');
        }
        if let Some(storage) = &mut out.storage {
            storage.push('[');
            storage.push_str(idx_text);
            storage.push(']');
        }
        out.storage_taints = out.storage_taints.iter().map(|t| format!("{t}[{idx_text}]")).collect();
        out.union_taints(idx_taints);
        out.value = format!("{}[{idx_text}]", out.value);
        out
    }

    /// `Member`/field-append transfer: append `.field` to whichever origin is set.
    pub fn append_field(&self, field: &str) -> Self {
        let mut out = self.clone();
        if let Some(input) = &mut out.input {
            input.push('.');
            input.push_str(field);
        }
        if let Some(storage) = &mut out.storage {
            storage.push('.');
            storage.push_str(field);
        }
        out.value = format!("{}.{field}", out.value);
        out
    }
}

/// The full lattice element: a scalar, or (once exploded, §4.A) a list with
/// one entry per struct field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AbstractValue {
    Scalar(ScalarValue),
    List(Vec<AbstractValue>),
}

impl AbstractValue {
    pub fn unknown() -> Self {
        Self::Scalar(ScalarValue::unknown())
    }

    pub fn from_input(name: impl Into<String>) -> Self {
        Self::Scalar(ScalarValue::from_input(name))
    }

    pub fn from_storage(name: impl Into<String>) -> Self {
        Self::Scalar(ScalarValue::from_storage(name))
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self::Scalar(ScalarValue::literal(value))
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::List(_) => None,
        }
    }

    pub fn is_origin_consistent(&self) -> bool {
        match self {
            Self::Scalar(s) => s.is_origin_consistent(),
            Self::List(items) => items.iter().all(AbstractValue::is_origin_consistent),
        }
    }

    /// Element-wise field write (§4.A): explode a scalar into a list of
    /// `field_names.len()` entries, each either the new value (at `index`)
    /// or the original name suffixed by `.field_name`.
    pub fn explode(&self, field_names: &[String], index: usize, new_value: AbstractValue) -> Self {
        if let Self::List(items) = self {
            let mut items = items.clone();
            if index < items.len() {
                items[index] = new_value;
            }
            return Self::List(items);
        }
        let base = self.as_scalar().cloned().unwrap_or_else(ScalarValue::unknown);
        let items = field_names
            .iter()
            .enumerate()
            .map(|(i, name)| if i == index { new_value.clone() } else { AbstractValue::Scalar(base.append_field(name)) })
            .collect();
        Self::List(items)
    }

    pub fn list_get(&self, index: usize) -> Option<&AbstractValue> {
        match self {
            Self::List(items) => items.get(index),
            Self::Scalar(_) => None,
        }
    }

    /// Project the i-th component out of each field, for `Unpack` (§4.E).
    pub fn unpack(&self, index: usize) -> AbstractValue {
        match self {
            Self::List(items) => items.get(index).cloned().unwrap_or_else(AbstractValue::unknown),
            Self::Scalar(_) => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_and_storage_never_both_set() {
        let v = ScalarValue::from_input("amount");
        assert!(v.is_origin_consistent());
        let mut bad = v.clone();
        bad.storage = Some("bal".to_string());
        assert!(!bad.is_origin_consistent());
    }

    #[test]
    fn append_index_suffixes_origin_and_storage_taints() {
        let base = ScalarValue::from_storage("bal");
        let idx = ScalarValue::from_input("to");
        let appended = base.append_index("to", &idx);
        assert_eq!(appended.storage.as_deref(), Some("bal[to]"));
        assert!(appended.storage_taints.contains("bal[to]"));
        assert!(appended.input_taints.contains("to"));
    }

    #[test]
    fn explode_preserves_sibling_field_names() {
        let base = AbstractValue::from_storage("reserves[k]");
        let fields = vec!["data".to_string(), "extra".to_string()];
        let exploded = base.explode(&fields, 0, AbstractValue::literal("newval"));
        let Some(sibling) = exploded.list_get(1) else { panic!("expected list") };
        assert_eq!(sibling.as_scalar().unwrap().storage.as_deref(), Some("reserves[k].extra"));
    }

    #[test]
    fn unknown_defaults_value_field() {
        assert_eq!(ScalarValue::unknown().value, UNKNOWN);
    }
}
