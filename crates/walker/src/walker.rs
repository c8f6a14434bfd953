//! Component F: the inter-procedural path walker (§4.F).
//!
//! Each top-level CFG path of the function under analysis is walked with its
//! own forked [`AnnotationStore`] (so sibling branches never see each
//! other's temporaries), while the [`BitPatternEngine`] and its storage ->
//! symbol cache live on the walker itself and persist for the whole contract
//! analysis, so `setLtv` and `getLtv` reason about the same symbolic root.
//!
//! Internal/library calls are inlined in place rather than modeled as a
//! literal worklist splice: walking a call means forking the caller's
//! annotations once per callee path, walking the callee's ops into that
//! fork, binding the call's lvalue from what the callee returned, then
//! continuing the rest of the caller's path from that same fork. A call
//! site is only expanded through every one of its callee's paths the first
//! time it is encountered anywhere in the contract; recursive or
//! repeatedly-hit call sites after that reuse just the first path, which
//! bounds what would otherwise be exponential blowup on recursive helpers.

use std::collections::{HashMap, HashSet};

use alloy_primitives::U256;
use contract_abstract_evaluator::{Annotation, AnnotationStore, Effect, Evaluator};
use contract_abstract_ir::{
    ConstantValue, DeclaredType, ElementaryType, FunctionId, IrGraph, Operation, OperationId, OperationKind, ValueId, ValueKind,
};
use contract_abstract_semantics::{AbstractValue, BitPatternEngine, EntityLayout, UNKNOWN};
use z3::ast::{Ast, BV};

use crate::config::WalkerLimits;
use crate::paths::enumerate_paths;
use crate::report::FunctionWalkReport;

pub struct PathWalker {
    limits: WalkerLimits,
    bitpattern: BitPatternEngine,
    /// Canonical storage expression -> the one symbolic root variable
    /// standing for it, shared across every function walked.
    storage_symbols: HashMap<String, BV>,
    /// Call-site `OperationId`s already expanded at least once; later visits
    /// only inline their first callee path.
    seen_calls: HashSet<OperationId>,
    /// `(name, simplified bitmap expression)` pairs recorded for the layout
    /// recognizer (§4.D), accumulated across every function walked.
    bitmap_pairs: Vec<(String, BV)>,
    /// `(name, printed simplified expression)` keys already pushed into
    /// `bitmap_pairs`, so a function with more than one path reaching the
    /// same bitmask read doesn't record the same pair once per path.
    seen_bitmap_pairs: HashSet<(String, String)>,
    current_function: Option<String>,
}

impl PathWalker {
    pub fn new(limits: WalkerLimits) -> Self {
        Self {
            limits,
            bitpattern: BitPatternEngine::with_term_budget(limits.max_bitvector_term_nodes),
            storage_symbols: HashMap::new(),
            seen_calls: HashSet::new(),
            bitmap_pairs: Vec::new(),
            seen_bitmap_pairs: HashSet::new(),
            current_function: None,
        }
    }

    /// Pushes `(name, bv)` into `bitmap_pairs` unless an occurrence with the
    /// same name and the same printed simplified form was already recorded
    /// (e.g. a second path through the same function reaching the same
    /// bitmask read).
    fn push_bitmap_pair(&mut self, name: String, bv: BV) {
        let key = (name.clone(), bv.to_string());
        if self.seen_bitmap_pairs.insert(key) {
            self.bitmap_pairs.push((name, bv));
        }
    }

    pub fn bitmap_pairs(&self) -> &[(String, BV)] {
        &self.bitmap_pairs
    }

    pub fn bitpattern_mut(&mut self) -> &mut BitPatternEngine {
        &mut self.bitpattern
    }

    pub fn bitpattern(&self) -> &BitPatternEngine {
        &self.bitpattern
    }

    /// Resolves a free variable's printed z3 name back to the BV it was
    /// minted for, so `BitPatternEngine::recognize` can substitute concrete
    /// literals for it (§4.D two-variable case). Synthesizes a same-named
    /// const as a fallback for a symbol this walker never minted itself.
    pub fn bv_for_symbol_name(&self, symbol_name: &str) -> BV {
        self.storage_symbols.values().find(|bv| bv.to_string() == symbol_name).cloned().unwrap_or_else(|| BV::new_const(symbol_name, 256))
    }

    /// Best-effort reverse lookup from a recorded bitmap expression back to
    /// the one canonical storage name it was seeded from, by checking which
    /// known symbol's printed name occurs in the simplified expression's
    /// text (§4.D "the storage entity referenced by the variable's name").
    pub fn owning_storage_name(&self, bv: &BV) -> Option<String> {
        let text = self.bitpattern.simplify(bv).to_string();
        self.storage_symbols.iter().find(|(_, sym)| text.contains(&sym.to_string())).map(|(name, _)| name.clone())
    }

    /// Walks every CFG path of `function`, inlining internal/library calls,
    /// seeding state-variable and parameter identities fresh for each path.
    pub fn walk_function(&mut self, graph: &IrGraph, entities: &EntityLayout, function: FunctionId) -> FunctionWalkReport {
        let mut report = FunctionWalkReport::default();
        let f = graph.function(function);
        self.current_function = Some(f.full_name.clone());

        let Ok(entry) = graph.try_entry_point(function) else {
            report.effects.push(Effect::Diagnostic {
                kind: "MalformedIR",
                message: format!("function `{}` has no entry point", f.full_name),
            });
            self.current_function = None;
            return report;
        };

        let mut base = AnnotationStore::new();
        let contract = graph.contract(f.contract);
        for &sv in &contract.storage_variables_ordered {
            if let ValueKind::StateVariable { name, .. } = &graph.value(sv).kind {
                base.set_abstract(sv, AbstractValue::from_storage(name.clone()));
            }
        }
        for &p in &f.parameters {
            if let ValueKind::Parameter { name } = &graph.value(p).kind {
                base.set_abstract(p, AbstractValue::from_input(name.clone()));
            }
        }

        let node_paths = enumerate_paths(graph, entry);
        for node_path in &node_paths {
            if report.path_count >= self.limits.max_paths_per_function {
                report.effects.push(Effect::Diagnostic {
                    kind: "ResourceBudget",
                    message: format!("max_paths_per_function ({}) exceeded for `{}`", self.limits.max_paths_per_function, f.full_name),
                });
                report.aborted = true;
                break;
            }
            report.path_count += 1;
            let mut annotations = base.clone();
            let flat: Vec<OperationId> = node_path.iter().flat_map(|n| graph.node(*n).irs.clone()).collect();
            self.walk_ops(graph, entities, &flat, &mut annotations, &mut report, 0);
        }

        self.current_function = None;
        report
    }

    fn walk_ops(
        &mut self,
        graph: &IrGraph,
        entities: &EntityLayout,
        ops: &[OperationId],
        annotations: &mut AnnotationStore,
        report: &mut FunctionWalkReport,
        depth: usize,
    ) {
        let warn_entries = self.limits.resident_set_warn_bytes / std::mem::size_of::<Annotation>().max(1);
        for (i, op_id) in ops.iter().enumerate() {
            let op = graph.operation(*op_id).clone();
            observe_constants(graph, &op, report);
            if annotations.len() > warn_entries {
                tracing::warn!(function = ?self.current_function, entries = annotations.len(), "annotation store growing past resident-set heuristic");
            }

            match &op.kind {
                OperationKind::InternalCall { function, arguments } | OperationKind::LibraryCall { function, arguments } => {
                    self.handle_call(graph, entities, &op, *function, arguments, &ops[i + 1..], annotations, report, depth);
                    return;
                }
                _ => {
                    for operand in op.kind.operands() {
                        ensure_seeded(graph, operand, annotations);
                        self.seed_bitmap_if_needed(graph, entities, operand, annotations);
                    }
                    let mut ev = Evaluator::new(graph, &mut self.bitpattern, annotations);
                    let outcome = ev.eval(&op);
                    match outcome {
                        Ok(effects) => {
                            self.record_bitmap_pair(&op, annotations);
                            self.record_mask_returns(&effects, annotations);
                            report.effects.extend(effects);
                        }
                        Err(e) if e.is_unsupported() => {
                            report.effects.push(Effect::Diagnostic { kind: "UnsupportedConstruct", message: e.to_string() });
                        }
                        Err(e) => {
                            report.effects.push(Effect::Diagnostic { kind: "MalformedIR", message: e.to_string() });
                            report.aborted = true;
                            return;
                        }
                    }
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_call(
        &mut self,
        graph: &IrGraph,
        entities: &EntityLayout,
        call_op: &Operation,
        function: FunctionId,
        arguments: &[ValueId],
        remainder: &[OperationId],
        annotations: &mut AnnotationStore,
        report: &mut FunctionWalkReport,
        depth: usize,
    ) {
        for &a in arguments {
            ensure_seeded(graph, a, annotations);
        }
        let arg_values: Vec<AbstractValue> = arguments.iter().map(|a| annotations.abstract_of(*a)).collect();

        let Ok(entry) = graph.try_entry_point(function) else {
            report.effects.push(Effect::Diagnostic {
                kind: "UnsupportedConstruct",
                message: format!("call to `{}` has no IR body; treated as opaque", graph.function(function).full_name),
            });
            self.walk_ops(graph, entities, remainder, annotations, report, depth);
            return;
        };

        if depth + 1 > self.limits.max_inline_depth {
            report.effects.push(Effect::Diagnostic { kind: "ResourceBudget", message: "max inline depth exceeded at a call site".to_string() });
            return;
        }

        let first_time = self.seen_calls.insert(call_op.id);
        let mut callee_paths = enumerate_paths(graph, entry);
        if !first_time {
            callee_paths.truncate(1);
        }

        let params = graph.function(function).parameters.clone();

        for callee_node_path in &callee_paths {
            let mut branch = annotations.clone();
            for (p, v) in params.iter().zip(arg_values.iter()) {
                branch.set_abstract(*p, v.clone());
            }
            let callee_ops: Vec<OperationId> = callee_node_path.iter().flat_map(|n| graph.node(*n).irs.clone()).collect();

            let before = report.effects.len();
            self.walk_ops(graph, entities, &callee_ops, &mut branch, report, depth + 1);

            if let Some(lv) = call_op.lvalue {
                if let Some(returned) = last_returned(&report.effects[before..], &branch) {
                    branch.set_abstract(lv, returned);
                }
            }

            self.walk_ops(graph, entities, remainder, &mut branch, report, depth);
        }
    }

    /// Seeds a fresh (or cached) symbolic root for a storage-rooted
    /// elementary scalar, or a concrete literal for a plain constant, the
    /// first time it is used as an operand (§4.D seeding), so the evaluator
    /// can find a bitmap on both sides of a masking expression going in.
    fn seed_bitmap_if_needed(&mut self, graph: &IrGraph, entities: &EntityLayout, id: ValueId, annotations: &mut AnnotationStore) {
        if annotations.bitmap_of(id).is_some() {
            return;
        }
        if let ValueKind::Constant(c) = &graph.value(id).kind {
            if let Some(u) = constant_as_u256(c) {
                let bv = self.bitpattern.literal(u);
                annotations.set_bitmap(id, bv);
            }
            return;
        }
        let Some(scalar) = annotations.abstract_of(id).as_scalar().cloned() else { return };
        let Some(name) = &scalar.storage else { return };
        let Ok(ty) = entities.find_meta(name) else { return };
        if ty.as_elementary().is_none() {
            return;
        }
        let bv = self.symbol_for(name);
        annotations.set_bitmap(id, bv);
    }

    fn symbol_for(&mut self, name: &str) -> BV {
        if let Some(existing) = self.storage_symbols.get(name) {
            return existing.clone();
        }
        let fresh = self.bitpattern.fresh_symbol(name);
        self.storage_symbols.insert(name.to_string(), fresh.clone());
        fresh
    }

    /// General rule (§4.D): any result with both a storage origin and a
    /// bitmap annotation pairs the enclosing function with that bitmap.
    fn record_bitmap_pair(&mut self, op: &Operation, annotations: &AnnotationStore) {
        let Some(lv) = op.lvalue else { return };
        let Some(scalar) = annotations.abstract_of(lv).as_scalar().cloned() else { return };
        if scalar.storage.is_none() {
            return;
        }
        let Some(bv) = annotations.bitmap_of(lv) else { return };
        if let Some(name) = self.current_function.clone() {
            let simplified = self.bitpattern.simplify(&bv);
            self.push_bitmap_pair(name, simplified);
        }
    }

    /// Special case (§4.D): a `Return`ed value whose printed form contains
    /// the literal substring `MASK` has its semantic field name extracted
    /// straight from `MASK<NAME>` instead of from the function's own name.
    fn record_mask_returns(&mut self, effects: &[Effect], annotations: &AnnotationStore) {
        for effect in effects {
            let Effect::Returned { raw_values, .. } = effect else { continue };
            for &rv in raw_values {
                let Some(scalar) = annotations.abstract_of(rv).as_scalar().cloned() else { continue };
                let Some(pos) = scalar.value.find("MASK") else { continue };
                let name: String = scalar.value[pos + 4..].chars().take_while(|c| c.is_alphanumeric() || *c == '_').collect();
                if name.is_empty() {
                    continue;
                }
                if let Some(bv) = annotations.bitmap_of(rv) {
                    let simplified = self.bitpattern.simplify(&bv);
                    self.push_bitmap_pair(name, simplified);
                }
            }
        }
    }
}

/// Lazily gives an operand some seeded abstract value the first time it is
/// read, for the kinds that `walk_function`'s base seeding never reaches
/// (bare constants, `msg.sender`-style Solidity pseudo-values, state
/// variables of a struct another contract declared, parameters of an
/// inlined callee before its own call site seeds them).
fn ensure_seeded(graph: &IrGraph, id: ValueId, annotations: &mut AnnotationStore) {
    if annotations.get(id).is_some() {
        return;
    }
    let value = graph.value(id);
    match &value.kind {
        ValueKind::Constant(c) => annotations.set_abstract(id, AbstractValue::literal(c.display())),
        ValueKind::SolidityVariable { name } => annotations.set_abstract(id, AbstractValue::literal(name.clone())),
        ValueKind::StateVariable { name, .. } => annotations.set_abstract(id, AbstractValue::from_storage(name.clone())),
        ValueKind::Parameter { name } => annotations.set_abstract(id, AbstractValue::from_input(name.clone())),
        _ => {}
    }
}

fn constant_as_u256(c: &ConstantValue) -> Option<U256> {
    match c {
        ConstantValue::Uint(v) => Some(*v),
        ConstantValue::Bool(v) => Some(if *v { U256::from(1u8) } else { U256::ZERO }),
        ConstantValue::Address(v) => Some(U256::from_be_slice(v.as_slice())),
        ConstantValue::Str(_) => None,
    }
}

fn last_returned(effects: &[Effect], annotations: &AnnotationStore) -> Option<AbstractValue> {
    effects.iter().rev().find_map(|e| match e {
        Effect::Returned { raw_values, .. } => {
            let values: Vec<AbstractValue> = raw_values.iter().map(|v| annotations.abstract_of(*v)).collect();
            Some(match values.len() {
                0 => AbstractValue::unknown(),
                1 => values.into_iter().next().expect("length checked above"),
                _ => AbstractValue::List(values),
            })
        }
        _ => None,
    })
}

/// Constant/immutable bookkeeping (§4.E): the first time a path reads a
/// constant or immutable state variable whose name isn't a bitmap helper
/// (`MASK*`/`BIT_POSITION*`), it is recorded once for this function.
fn observe_constants(graph: &IrGraph, op: &Operation, report: &mut FunctionWalkReport) {
    for operand in op.kind.operands() {
        let value = graph.value(operand);
        let ValueKind::StateVariable { name, is_constant, is_immutable, initializer, .. } = &value.kind else { continue };
        if !(*is_constant || *is_immutable) {
            continue;
        }
        if name.contains("MASK") || name.contains("BIT_POSITION") {
            continue;
        }
        if !report.seen_constants.insert(operand) {
            continue;
        }
        let ty = value.declared_type.clone().unwrap_or(DeclaredType::Elementary(ElementaryType::uint256()));
        // Contract-typed constants don't carry their interface's signature
        // list anywhere in this IR; leave it unset rather than faking an
        // empty-but-present one.
        let interface = None;
        let rendered = initializer.and_then(|init| constant_literal(graph, init)).unwrap_or_else(|| UNKNOWN.to_string());
        report.effects.push(Effect::ConstantRead { name: name.clone(), value: rendered, ty, interface });
    }
}

fn constant_literal(graph: &IrGraph, initializer: OperationId) -> Option<String> {
    let op = graph.operation(initializer);
    let rvalue = match &op.kind {
        OperationKind::Assignment { rvalue } => *rvalue,
        OperationKind::NewElementaryType { value } => *value,
        _ => return None,
    };
    match &graph.value(rvalue).kind {
        ValueKind::Constant(c) => Some(c.display()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contract_abstract_ir::{BinaryOp, ConstantValue, IrGraphBuilder};
    use indexmap::IndexMap;

    fn setup_simple_getter() -> (IrGraph, FunctionId, EntityLayout) {
        let mut b = IrGraphBuilder::new();
        let contract = b.push_contract("C", None);
        let balances = b.push_value(
            ValueKind::StateVariable { name: "balance".into(), slot: 0, offset_bits: 0, is_constant: false, is_immutable: false, initializer: None },
            Some(DeclaredType::Elementary(ElementaryType::uint256())),
        );
        b.push_storage_variable(contract, balances);
        let function = b.push_function(contract, "getBalance()", "getBalance()", vec![], vec![DeclaredType::Elementary(ElementaryType::uint256())], true, true, true);
        let ret_op = b.push_operation(function, OperationKind::Return { values: vec![balances] }, None);
        let node = b.push_node(vec![ret_op], vec![]);
        b.set_entry_point(function, node);
        let graph = b.build();

        let mut entities = IndexMap::new();
        entities.insert(
            "balance".to_string(),
            (DeclaredType::Elementary(ElementaryType::uint256()), contract_abstract_semantics::SlotInfo::new(alloy_primitives::U256::ZERO, 0)),
        );
        (graph, function, EntityLayout::new(entities))
    }

    #[test]
    fn walking_a_getter_records_a_single_path_and_a_return_effect() {
        let (graph, function, entities) = setup_simple_getter();
        let mut walker = PathWalker::new(WalkerLimits::default());
        let report = walker.walk_function(&graph, &entities, function);
        assert_eq!(report.path_count, 1);
        assert!(report.effects.iter().any(|e| matches!(e, Effect::Returned { storages, .. } if storages == &vec!["balance".to_string()])));
    }

    #[test]
    fn constant_state_variable_is_reported_once_per_function() {
        let mut b = IrGraphBuilder::new();
        let contract = b.push_contract("C", None);
        let cap = b.push_value(
            ValueKind::StateVariable { name: "CAP".into(), slot: 0, offset_bits: 0, is_constant: true, is_immutable: false, initializer: None },
            Some(DeclaredType::Elementary(ElementaryType::uint256())),
        );
        let lv1 = b.push_value(ValueKind::Temporary, Some(DeclaredType::Elementary(ElementaryType::uint256())));
        let lv2 = b.push_value(ValueKind::Temporary, Some(DeclaredType::Elementary(ElementaryType::uint256())));
        let function = b.push_function(contract, "f()", "f()", vec![], vec![], false, false, true);
        let op1 = b.push_operation(function, OperationKind::Unary { op: contract_abstract_ir::UnaryOp::BitwiseNot, operand: cap }, Some(lv1));
        let op2 = b.push_operation(function, OperationKind::Unary { op: contract_abstract_ir::UnaryOp::BitwiseNot, operand: cap }, Some(lv2));
        let node = b.push_node(vec![op1, op2], vec![]);
        b.set_entry_point(function, node);
        let graph = b.build();
        let entities = EntityLayout::new(IndexMap::new());

        let mut walker = PathWalker::new(WalkerLimits::default());
        let report = walker.walk_function(&graph, &entities, function);
        let constant_reads = report.effects.iter().filter(|e| matches!(e, Effect::ConstantRead { name, .. } if name == "CAP")).count();
        assert_eq!(constant_reads, 1);
    }

    #[test]
    fn internal_call_is_inlined_and_binds_the_caller_lvalue() {
        let mut b = IrGraphBuilder::new();
        let contract = b.push_contract("C", None);
        let bal = b.push_value(
            ValueKind::StateVariable { name: "balance".into(), slot: 0, offset_bits: 0, is_constant: false, is_immutable: false, initializer: None },
            Some(DeclaredType::Elementary(ElementaryType::uint256())),
        );
        b.push_storage_variable(contract, bal);

        let callee = b.push_function(contract, "_get()", "_get()", vec![], vec![DeclaredType::Elementary(ElementaryType::uint256())], true, true, false);
        let callee_ret = b.push_operation(callee, OperationKind::Return { values: vec![bal] }, None);
        let callee_node = b.push_node(vec![callee_ret], vec![]);
        b.set_entry_point(callee, callee_node);

        let caller = b.push_function(contract, "getBalance()", "getBalance()", vec![], vec![DeclaredType::Elementary(ElementaryType::uint256())], true, true, true);
        let call_lv = b.push_value(ValueKind::Temporary, Some(DeclaredType::Elementary(ElementaryType::uint256())));
        let call_op = b.push_operation(caller, OperationKind::InternalCall { function: callee, arguments: vec![] }, Some(call_lv));
        let caller_ret = b.push_operation(caller, OperationKind::Return { values: vec![call_lv] }, None);
        let caller_node = b.push_node(vec![call_op, caller_ret], vec![]);
        b.set_entry_point(caller, caller_node);

        let graph = b.build();
        let entities = EntityLayout::new(IndexMap::new());
        let mut walker = PathWalker::new(WalkerLimits::default());
        let report = walker.walk_function(&graph, &entities, caller);

        assert!(report.effects.iter().any(|e| matches!(e, Effect::Returned { storages, .. } if storages == &vec!["balance".to_string()])));
    }

    #[test]
    fn bitmap_pair_is_recorded_for_a_storage_rooted_binary_result() {
        let mut b = IrGraphBuilder::new();
        let contract = b.push_contract("C", None);
        let data = b.push_value(
            ValueKind::StateVariable { name: "data".into(), slot: 0, offset_bits: 0, is_constant: false, is_immutable: false, initializer: None },
            Some(DeclaredType::Elementary(ElementaryType::uint256())),
        );
        b.push_storage_variable(contract, data);
        let mask = b.push_value(ValueKind::Constant(ConstantValue::Uint(alloy_primitives::U256::from(0xffu16))), Some(DeclaredType::Elementary(ElementaryType::uint256())));
        let lv = b.push_value(ValueKind::Temporary, Some(DeclaredType::Elementary(ElementaryType::uint256())));
        let function = b.push_function(contract, "ltv()", "ltv()", vec![], vec![DeclaredType::Elementary(ElementaryType::uint256())], true, true, true);
        let op = b.push_operation(function, OperationKind::Binary { op: BinaryOp::And, left: data, right: mask }, Some(lv));
        let ret = b.push_operation(function, OperationKind::Return { values: vec![lv] }, None);
        let node = b.push_node(vec![op, ret], vec![]);
        b.set_entry_point(function, node);
        let graph = b.build();

        let mut entities = IndexMap::new();
        entities.insert(
            "data".to_string(),
            (DeclaredType::Elementary(ElementaryType::uint256()), contract_abstract_semantics::SlotInfo::new(alloy_primitives::U256::ZERO, 0)),
        );
        let entities = EntityLayout::new(entities);

        let mut walker = PathWalker::new(WalkerLimits::default());
        let _ = walker.walk_function(&graph, &entities, function);
        assert!(walker.bitmap_pairs().iter().any(|(name, _)| name == "ltv"));
    }

    #[test]
    fn bitmap_pair_is_recorded_once_even_when_two_paths_reach_it() {
        let mut b = IrGraphBuilder::new();
        let contract = b.push_contract("C", None);
        let data = b.push_value(
            ValueKind::StateVariable { name: "data".into(), slot: 0, offset_bits: 0, is_constant: false, is_immutable: false, initializer: None },
            Some(DeclaredType::Elementary(ElementaryType::uint256())),
        );
        b.push_storage_variable(contract, data);
        let mask = b.push_value(ValueKind::Constant(ConstantValue::Uint(alloy_primitives::U256::from(0xffu16))), Some(DeclaredType::Elementary(ElementaryType::uint256())));
        let lv = b.push_value(ValueKind::Temporary, Some(DeclaredType::Elementary(ElementaryType::uint256())));
        let function = b.push_function(contract, "ltv()", "ltv()", vec![], vec![DeclaredType::Elementary(ElementaryType::uint256())], true, true, true);
        let op = b.push_operation(function, OperationKind::Binary { op: BinaryOp::And, left: data, right: mask }, Some(lv));
        let ret = b.push_operation(function, OperationKind::Return { values: vec![lv] }, None);
        let tail = b.push_node(vec![op, ret], vec![]);
        let then_n = b.push_node(vec![], vec![tail]);
        let else_n = b.push_node(vec![], vec![tail]);
        let head = b.reserve_node();
        b.fill_node(head, vec![], vec![then_n, else_n]);
        b.set_entry_point(function, head);
        let graph = b.build();

        let mut entities = IndexMap::new();
        entities.insert(
            "data".to_string(),
            (DeclaredType::Elementary(ElementaryType::uint256()), contract_abstract_semantics::SlotInfo::new(alloy_primitives::U256::ZERO, 0)),
        );
        let entities = EntityLayout::new(entities);

        let mut walker = PathWalker::new(WalkerLimits::default());
        let report = walker.walk_function(&graph, &entities, function);
        assert_eq!(report.path_count, 2);
        assert_eq!(walker.bitmap_pairs().iter().filter(|(name, _)| name == "ltv").count(), 1);
    }
}
