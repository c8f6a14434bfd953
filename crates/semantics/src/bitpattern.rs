//! Component D: recovers the bit-packed layout hidden inside a single
//! storage word by building a symbolic bitvector for the value a function
//! returns and reading the shape of its simplified form (§4.D).

use std::collections::{BTreeSet, HashSet};

use alloy_primitives::U256;
use z3::ast::{Ast, BV};

use crate::error::{BitPatternError, BitPatternErrorKind};
use crate::sexpr;

/// One field recovered from a bitmap return value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitField {
    pub name: String,
    pub offset_bits: u32,
    pub size_bits: u32,
}

/// The shape a recognized bitmap expression was classified into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BitmapLayout {
    /// A single `[hi:lo]` slice of one root storage word, named after the
    /// accessor that returned it.
    Field(BitField),
    /// A slice whose position depends linearly on a second free variable
    /// (an array/record index): bit range
    /// `[base + stride*index, base + stride*index + size)`. Two of these at
    /// the same `stride` one bit apart (e.g. `getActive(id)` / `getFrozen(id)`,
    /// §4.D) are later merged by the caller into a packed-pair record.
    IndexedField { name: String, base_offset_bits: u32, stride_bits: u32, size_bits: u32 },
}

/// Builds and simplifies bitvector expressions that model how a function's
/// return value is assembled out of its storage-rooted inputs.
pub struct BitPatternEngine {
    symbol_names: HashSet<String>,
    counter: usize,
    max_term_nodes: usize,
}

impl Default for BitPatternEngine {
    fn default() -> Self {
        Self { symbol_names: HashSet::new(), counter: 0, max_term_nodes: usize::MAX }
    }
}

impl BitPatternEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same as `new`, but rejects a simplified bitmap term once its printed
    /// s-expression grows past `max_term_nodes` (§7 `ResourceBudget`).
    pub fn with_term_budget(max_term_nodes: usize) -> Self {
        Self { max_term_nodes, ..Self::default() }
    }

    /// A fresh named 256-bit symbolic variable, one per storage-rooted
    /// elementary scalar entering the function under analysis.
    pub fn fresh_symbol(&mut self, hint: &str) -> BV {
        let name = format!("v{}_{}", self.counter, sanitize(hint));
        self.counter += 1;
        self.symbol_names.insert(name.clone());
        BV::new_const(name.as_str(), 256)
    }

    /// A concrete 256-bit literal, built from four 64-bit limbs so we never
    /// need a big-integer numeral parser.
    pub fn literal(&self, value: U256) -> BV {
        let limbs = value.into_limbs();
        limbs
            .iter()
            .rev()
            .map(|&limb| BV::from_u64(limb, 64))
            .reduce(|hi, lo| hi.concat(&lo))
            .expect("four limbs always yield a concat chain")
    }

    pub fn bit_and(&self, lhs: &BV, rhs: &BV) -> BV {
        lhs.bvand(rhs)
    }

    pub fn bit_or(&self, lhs: &BV, rhs: &BV) -> BV {
        lhs.bvor(rhs)
    }

    pub fn shift_left(&self, lhs: &BV, rhs: &BV) -> BV {
        lhs.bvshl(rhs)
    }

    pub fn shift_right(&self, lhs: &BV, rhs: &BV) -> BV {
        lhs.bvlshr(rhs)
    }

    pub fn add(&self, lhs: &BV, rhs: &BV) -> BV {
        lhs.bvadd(rhs)
    }

    pub fn not(&self, value: &BV) -> BV {
        value.bvnot()
    }

    /// `==` / `!=` feed into a bitmap context as a 0/1-valued bitvector.
    pub fn equal(&self, lhs: &BV, rhs: &BV, negate: bool) -> BV {
        let cmp = lhs._eq(rhs);
        let (then, otherwise) = if negate {
            (U256::ZERO, U256::from(1u8))
        } else {
            (U256::from(1u8), U256::ZERO)
        };
        cmp.ite(&self.literal(then), &self.literal(otherwise))
    }

    pub fn simplify(&self, value: &BV) -> BV {
        value.simplify()
    }

    fn known_symbols(&self) -> &HashSet<String> {
        &self.symbol_names
    }

    fn free_vars(&self, value: &BV) -> BTreeSet<String> {
        let tree = sexpr::parse(&value.to_string());
        let mut out = BTreeSet::new();
        tree.collect_known_atoms(self.known_symbols(), &mut out);
        out
    }

    /// Substitutes every occurrence of `var` (by symbol name) with `with`.
    fn substitute(&self, expr: &BV, var: &BV, with: &BV) -> BV {
        expr.substitute(&[(var, with)])
    }

    /// Classifies a simplified bitmap return expression into a recognized
    /// layout, per the one- and two-free-variable rules in §4.D.
    pub fn recognize(&self, value_for_var: impl Fn(&str) -> BV, raw: &BV, accessor_name: &str) -> Result<BitmapLayout, BitPatternError> {
        let simplified = self.simplify(raw);
        let nodes = sexpr::parse(&simplified.to_string()).node_count();
        if nodes > self.max_term_nodes {
            return Err(BitPatternErrorKind::TermBudgetExceeded { nodes, limit: self.max_term_nodes }.into());
        }
        let vars = self.free_vars(&simplified);

        match vars.len() {
            1 => self.recognize_single_variable(&simplified, &vars, accessor_name),
            2 => self.recognize_two_variables(value_for_var, &simplified, &vars, accessor_name),
            n => Err(BitPatternErrorKind::TooManyFreeVariables(n).into()),
        }
    }

    fn recognize_single_variable(&self, simplified: &BV, vars: &BTreeSet<String>, accessor_name: &str) -> Result<BitmapLayout, BitPatternError> {
        let tree = sexpr::parse(&simplified.to_string());
        let (hi, lo, var) = tree.match_extract_of_symbol(vars).ok_or(BitPatternErrorKind::NotAnExtract)?;
        debug_assert!(vars.contains(&var));
        Ok(BitmapLayout::Field(BitField {
            name: normalize_accessor_name(accessor_name),
            offset_bits: lo,
            size_bits: hi - lo + 1,
        }))
    }

    /// Substitutes the candidate index variable with concrete literals
    /// `0, 1, 2` in turn; z3's simplifier folds `extract` of a
    /// constant-shifted expression back into a plain `extract` on the
    /// remaining root variable, so if the bit range it collapses to moves
    /// by a constant stride across those three probes, the index variable's
    /// position is exactly that stride (§4.D).
    fn recognize_two_variables(&self, value_for_var: impl Fn(&str) -> BV, simplified: &BV, vars: &BTreeSet<String>, accessor_name: &str) -> Result<BitmapLayout, BitPatternError> {
        let names: Vec<&String> = vars.iter().collect();
        for (index_idx, root_idx) in [(0, 1), (1, 0)] {
            let root_name = names[root_idx].clone();
            let root_only: HashSet<String> = std::iter::once(root_name).collect();
            if let Some((base, stride, size)) = self.try_index_hypothesis(&value_for_var, simplified, names[index_idx], &root_only) {
                return Ok(BitmapLayout::IndexedField {
                    name: normalize_accessor_name(accessor_name),
                    base_offset_bits: base,
                    stride_bits: stride,
                    size_bits: size,
                });
            }
        }
        Err(BitPatternErrorKind::UnrecognizedTwoVariablePattern.into())
    }

    fn try_index_hypothesis(&self, value_for_var: &impl Fn(&str) -> BV, simplified: &BV, index_name: &str, root_only: &HashSet<String>) -> Option<(u32, u32, u32)> {
        let index_var = value_for_var(index_name);
        let mut los = Vec::with_capacity(3);
        let mut width = None;
        for k in 0u64..3 {
            let probe = self.substitute(simplified, &index_var, &BV::from_u64(k, 256));
            let ground = self.simplify(&probe);
            let tree = sexpr::parse(&ground.to_string());
            let (hi, lo, _) = tree.match_extract_of_symbol(root_only)?;
            let w = hi - lo + 1;
            match width {
                None => width = Some(w),
                Some(existing) if existing == w => {}
                Some(_) => return None,
            }
            los.push(lo);
        }
        let stride = los[1].checked_sub(los[0])?;
        if los[2].checked_sub(los[1])? != stride {
            return None;
        }
        let size = width.unwrap();
        // §4.D only recognizes the packed-boolean-pair shape here; a general
        // stride/width array is a different (unsupported) pattern and must
        // fall through to `UnrecognizedTwoVariablePattern`.
        if stride != 2 || size != 1 {
            return None;
        }
        Some((los[0], stride, size))
    }
}

fn sanitize(hint: &str) -> String {
    hint.chars().map(|c| if c.is_alphanumeric() { c } else { '_' }).collect()
}

/// `setLtv` -> `ltv`; `FOO_BAR_` -> `fooBar` (§4.D accessor normalization).
pub fn normalize_accessor_name(function_name: &str) -> String {
    if let Some(rest) = function_name.strip_prefix("set") {
        if !rest.is_empty() {
            return decapitalize(rest);
        }
    }
    if function_name.ends_with('_') && function_name.contains('_') {
        let trimmed = function_name.trim_end_matches('_');
        let parts: Vec<&str> = trimmed.split('_').filter(|s| !s.is_empty()).collect();
        if !parts.is_empty() {
            return parts
                .iter()
                .enumerate()
                .map(|(i, part)| {
                    let lower = part.to_lowercase();
                    if i == 0 { lower } else { capitalize(&lower) }
                })
                .collect();
        }
    }
    function_name.to_string()
}

fn decapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_set_prefix_and_decapitalizes() {
        assert_eq!(normalize_accessor_name("setLtv"), "ltv");
        assert_eq!(normalize_accessor_name("setLiquidationThreshold"), "liquidationThreshold");
    }

    #[test]
    fn normalizes_trailing_underscore_constant_style() {
        assert_eq!(normalize_accessor_name("LIQUIDATION_THRESHOLD_"), "liquidationThreshold");
    }

    #[test]
    fn leaves_plain_accessor_names_alone() {
        assert_eq!(normalize_accessor_name("ltv"), "ltv");
    }

    #[test]
    fn recognizes_single_variable_extract() {
        let mut engine = BitPatternEngine::new();
        let root = engine.fresh_symbol("data");
        let sliced = root.extract(31, 16).zero_ext(240);
        let layout = engine.recognize(|_| root.clone(), &sliced, "setLtv").unwrap();
        match layout {
            BitmapLayout::Field(field) => {
                assert_eq!(field.name, "ltv");
                assert_eq!(field.size_bits, 16);
            }
            other => panic!("expected a single field, got {other:?}"),
        }
    }

    #[test]
    fn rejects_a_simplified_term_past_the_node_budget() {
        let mut engine = BitPatternEngine::with_term_budget(4);
        let root = engine.fresh_symbol("data");
        let sliced = root.extract(31, 16).zero_ext(240);
        let err = engine.recognize(|_| root.clone(), &sliced, "setLtv").unwrap_err();
        assert!(matches!(err.kind(), BitPatternErrorKind::TermBudgetExceeded { limit: 4, .. }));
    }

    #[test]
    fn rejects_three_or_more_free_variables() {
        let mut engine = BitPatternEngine::new();
        let a = engine.fresh_symbol("a");
        let b = engine.fresh_symbol("b");
        let c = engine.fresh_symbol("c");
        let combined = a.bvand(&b).bvor(&c);
        let err = engine.recognize(|_| a.clone(), &combined, "whatever").unwrap_err();
        assert!(matches!(err.kind(), BitPatternErrorKind::TooManyFreeVariables(3)));
    }

    fn indexed_field(engine: &BitPatternEngine, root: &BV, index: &BV, stride: u64, size: u32) -> BV {
        let shift_amount = index.bvmul(&BV::from_u64(stride, 256));
        let shifted = root.bvlshr(&shift_amount);
        shifted.extract(size - 1, 0).zero_ext(256 - size)
    }

    #[test]
    fn recognizes_packed_boolean_pair_indexed_field() {
        let mut engine = BitPatternEngine::new();
        let root = engine.fresh_symbol("data");
        let index = engine.fresh_symbol("id");
        let sliced = indexed_field(&engine, &root, &index, 2, 1);
        let layout = engine.recognize(|name| if name.contains("id") { index.clone() } else { root.clone() }, &sliced, "getActive").unwrap();
        match layout {
            BitmapLayout::IndexedField { stride_bits, size_bits, .. } => {
                assert_eq!(stride_bits, 2);
                assert_eq!(size_bits, 1);
            }
            other => panic!("expected an indexed field, got {other:?}"),
        }
    }

    #[test]
    fn rejects_general_stride_width_array_as_unrecognized() {
        let mut engine = BitPatternEngine::new();
        let root = engine.fresh_symbol("data");
        let index = engine.fresh_symbol("id");
        // stride=8, width=8: a general bit-packed array, not the
        // packed-boolean-pair shape this engine recognizes (§4.D).
        let sliced = indexed_field(&engine, &root, &index, 8, 8);
        let err = engine
            .recognize(|name| if name.contains("id") { index.clone() } else { root.clone() }, &sliced, "getSlot")
            .unwrap_err();
        assert!(matches!(err.kind(), BitPatternErrorKind::UnrecognizedTwoVariablePattern));
    }
}
