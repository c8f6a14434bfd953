//! Component E: the per-IR-kind transfer function (§4.E). One `Evaluator`
//! borrows everything it needs for the duration of a single operation:
//! the read-only IR graph, the slot-layout resolver, the bitvector engine,
//! and the mutable annotation side table.

use contract_abstract_ir::{DeclaredType, IrGraph, Operation, OperationKind, UnaryOp, ValueId, ValueKind};
use contract_abstract_semantics::{AbstractValue, BitPatternEngine, ScalarValue, UNKNOWN};

use crate::annotation::AnnotationStore;
use crate::error::{EvaluatorError, EvaluatorErrorKind};
use crate::effect::Effect;

pub struct Evaluator<'a> {
    pub graph: &'a IrGraph,
    pub bitpattern: &'a mut BitPatternEngine,
    pub annotations: &'a mut AnnotationStore,
}

impl<'a> Evaluator<'a> {
    pub fn new(graph: &'a IrGraph, bitpattern: &'a mut BitPatternEngine, annotations: &'a mut AnnotationStore) -> Self {
        Self { graph, bitpattern, annotations }
    }

    /// Evaluates one IR operation, updating the lvalue's annotation (if any)
    /// and returning the bookkeeping effects it observed.
    pub fn eval(&mut self, op: &Operation) -> Result<Vec<Effect>, EvaluatorError> {
        match &op.kind {
            OperationKind::Index { base, index } => self.eval_index(op, *base, *index),
            OperationKind::Member { base, field } => self.eval_member(op, *base, field),
            OperationKind::Assignment { rvalue } => self.eval_assignment(op, *rvalue),
            OperationKind::Binary { op: bop, left, right } => self.eval_binary(op, *bop, *left, *right),
            OperationKind::Unary { op: uop, operand } => self.eval_unary(op, *uop, *operand),
            OperationKind::TypeConversion { operand } => self.eval_identity(op, *operand),
            OperationKind::NewElementaryType { value } => self.eval_identity(op, *value),
            OperationKind::InternalCall { .. } | OperationKind::LibraryCall { .. } => Ok(Vec::new()),
            OperationKind::HighLevelCall { destination, function_name, arguments } => {
                self.eval_high_level_call(op, *destination, function_name, arguments)
            }
            OperationKind::LowLevelCall { destination, arguments } => self.eval_low_level_call(op, *destination, arguments),
            OperationKind::SolidityCall { name, arguments } => self.eval_solidity_call(op, name, arguments),
            OperationKind::Return { values } => self.eval_return(values),
            OperationKind::Condition { value } => self.eval_condition(*value),
            OperationKind::NewStructure { arguments } | OperationKind::InitArray { arguments } | OperationKind::NewArray { arguments } => {
                self.eval_aggregate(op, arguments)
            }
            OperationKind::NewContract { arguments } => self.eval_new_contract(op, arguments),
            OperationKind::Unpack { tuple, index } => self.eval_unpack(op, *tuple, *index),
            OperationKind::EventCall { arguments, .. } => self.eval_event_call(arguments),
            OperationKind::Length { base } => self.eval_length(op, *base),
            OperationKind::CodeSize { base } => self.eval_codesize(op, *base),
            OperationKind::Delete { target } => self.eval_delete(*target),
        }
    }

    fn eval_index(&mut self, op: &Operation, base: ValueId, index: ValueId) -> Result<Vec<Effect>, EvaluatorError> {
        let base_abs = self.annotations.abstract_of(base);
        let idx_abs = self.annotations.abstract_of(index);
        let idx_scalar = idx_abs.as_scalar().cloned().unwrap_or_else(ScalarValue::unknown);
        let base_scalar = base_abs
            .as_scalar()
            .cloned()
            .ok_or_else(|| EvaluatorErrorKind::malformed(&op.kind, "Index base is list-shaped; indexing an exploded aggregate is unsupported"))?;

        let appended = base_scalar.append_index(&idx_scalar.value, &idx_scalar);
        let mut effects = Vec::new();
        if let Some(name) = &appended.storage {
            effects.push(Effect::ReadStorage(name.clone()));
        }
        if let Some(lv) = op.lvalue {
            self.annotations.set_abstract(lv, AbstractValue::Scalar(appended));
        }
        Ok(effects)
    }

    fn eval_member(&mut self, op: &Operation, base: ValueId, field: &str) -> Result<Vec<Effect>, EvaluatorError> {
        let base_val = self.graph.value(base);
        let base_abs = self.annotations.abstract_of(base);

        // Contract interface dispatch / enum member access: no field-index
        // lookup, just append the name (§4.E Member, contract case).
        if matches!(base_val.declared_type, Some(DeclaredType::Contract { .. }) | Some(DeclaredType::Enum { .. })) {
            let scalar = base_abs.as_scalar().cloned().unwrap_or_else(ScalarValue::unknown);
            let appended = scalar.append_field(field);
            if let Some(lv) = op.lvalue {
                self.annotations.set_abstract(lv, AbstractValue::Scalar(appended));
            }
            return Ok(Vec::new());
        }

        let struct_def = base_val
            .declared_type
            .as_ref()
            .and_then(DeclaredType::as_struct)
            .ok_or_else(|| EvaluatorErrorKind::malformed(&op.kind, format!("Member base for `.{field}` has no struct declared type")))?;
        let field_index = struct_def
            .fields
            .iter()
            .position(|f| f.name == field)
            .ok_or_else(|| EvaluatorErrorKind::malformed(&op.kind, format!("unknown field `{field}` on struct `{}`", struct_def.name)))?;

        let field_abs = match &base_abs {
            AbstractValue::List(items) => items.get(field_index).cloned().unwrap_or_else(AbstractValue::unknown),
            AbstractValue::Scalar(s) => AbstractValue::Scalar(s.append_field(field)),
        };

        let mut effects = Vec::new();
        if let Some(name) = field_abs.as_scalar().and_then(|s| s.storage.clone()) {
            effects.push(Effect::ReadStorage(name));
        }

        let Some(lv) = op.lvalue else {
            return Ok(effects);
        };
        self.annotations.set_abstract(lv, field_abs);

        if matches!(self.graph.value(lv).kind, ValueKind::Reference { .. }) {
            if self.annotations.get(base).and_then(|a| a.referent).is_some() {
                return Err(EvaluatorErrorKind::unsupported(&op.kind, "multi-layer reference chains (>=2 deep) are not supported").into());
            }
            self.annotations.set_reference(lv, base, Some(field_index));
        }

        Ok(effects)
    }

    fn eval_assignment(&mut self, op: &Operation, rvalue: ValueId) -> Result<Vec<Effect>, EvaluatorError> {
        let Some(lv) = op.lvalue else {
            return Err(EvaluatorErrorKind::malformed(&op.kind, "Assignment without an lvalue").into());
        };

        let mut rv_abs = self.annotations.abstract_of(rvalue);
        let existing = self.annotations.get(lv).map(|a| a.abstract_value.clone());
        if let (AbstractValue::Scalar(rv_scalar), Some(AbstractValue::Scalar(existing_scalar))) = (&mut rv_abs, &existing) {
            if let Some(storage_name) = &existing_scalar.storage {
                rv_scalar.storage = Some(storage_name.clone());
            }
        }

        let mut effects = Vec::new();
        if let Some(name) = rv_abs.as_scalar().and_then(|s| s.storage.clone()) {
            effects.push(Effect::WroteStorage(name));
        }

        self.annotations.set_abstract(lv, rv_abs.clone());

        let reference = self.annotations.get(lv).and_then(|a| a.referent.map(|r| (r, a.points_to)));
        if let Some((referent, points_to)) = reference {
            let referent_abs = self.annotations.abstract_of(referent);
            let new_referent_abs = if let Some(idx) = points_to {
                let referent_val = self.graph.value(referent);
                let struct_def = referent_val
                    .declared_type
                    .as_ref()
                    .and_then(DeclaredType::as_struct)
                    .ok_or_else(|| EvaluatorErrorKind::malformed(&op.kind, "referent of a field write is not a struct"))?;
                let field_names: Vec<String> = struct_def.fields.iter().map(|f| f.name.clone()).collect();
                if let Some(base_name) = referent_abs.as_scalar().and_then(|s| s.storage.clone()) {
                    if let Some(field_name) = field_names.get(idx) {
                        effects.push(Effect::WroteStorage(format!("{base_name}.{field_name}")));
                    }
                }
                referent_abs.explode(&field_names, idx, rv_abs)
            } else {
                rv_abs
            };
            self.annotations.set_abstract(referent, new_referent_abs);
        }

        Ok(effects)
    }

    fn eval_binary(
        &mut self,
        op: &Operation,
        bop: contract_abstract_ir::BinaryOp,
        left: ValueId,
        right: ValueId,
    ) -> Result<Vec<Effect>, EvaluatorError> {
        let l = self.annotations.abstract_of(left);
        let r = self.annotations.abstract_of(right);
        let l_scalar = l.as_scalar().cloned().unwrap_or_else(ScalarValue::unknown);
        let r_scalar = r.as_scalar().cloned().unwrap_or_else(ScalarValue::unknown);

        let mut combined = ScalarValue::unknown();
        combined.union_taints(&l_scalar);
        combined.union_taints(&r_scalar);
        combined.value = format!("({}) {} ({})", l_scalar.value, bop.symbol(), r_scalar.value);

        // Self-update pattern (§4.E Binary): exactly one operand carries a
        // clean origin, preserve it so the masked-in-place result still
        // traces back to its storage/input root.
        if l_scalar.storage.is_some() != r_scalar.storage.is_some() {
            combined.storage = l_scalar.storage.clone().or_else(|| r_scalar.storage.clone());
        } else if l_scalar.input.is_some() != r_scalar.input.is_some() {
            combined.input = l_scalar.input.clone().or_else(|| r_scalar.input.clone());
        }

        if let Some(lv) = op.lvalue {
            if let (Some(lbv), Some(rbv)) = (self.annotations.bitmap_of(left), self.annotations.bitmap_of(right)) {
                use contract_abstract_ir::BinaryOp;
                let result_bv = match bop {
                    BinaryOp::And => Some(self.bitpattern.bit_and(&lbv, &rbv)),
                    BinaryOp::Or => Some(self.bitpattern.bit_or(&lbv, &rbv)),
                    BinaryOp::Shl => Some(self.bitpattern.shift_left(&lbv, &rbv)),
                    BinaryOp::Shr => Some(self.bitpattern.shift_right(&lbv, &rbv)),
                    BinaryOp::Add => Some(self.bitpattern.add(&lbv, &rbv)),
                    BinaryOp::Equal => Some(self.bitpattern.equal(&lbv, &rbv, false)),
                    BinaryOp::NotEqual => Some(self.bitpattern.equal(&lbv, &rbv, true)),
                    _ => None,
                };
                if let Some(bv) = result_bv {
                    self.annotations.set_bitmap(lv, bv);
                }
            }
            self.annotations.set_abstract(lv, AbstractValue::Scalar(combined));
        }

        Ok(Vec::new())
    }

    fn eval_unary(&mut self, op: &Operation, uop: UnaryOp, operand: ValueId) -> Result<Vec<Effect>, EvaluatorError> {
        let o = self.annotations.abstract_of(operand);
        let o_scalar = o.as_scalar().cloned().unwrap_or_else(ScalarValue::unknown);
        let symbol = match uop {
            UnaryOp::Not => "!",
            UnaryOp::BitwiseNot => "~",
        };
        let mut result = o_scalar;
        result.value = format!("{symbol}({})", result.value);

        if let Some(lv) = op.lvalue {
            if matches!(uop, UnaryOp::BitwiseNot) {
                if let Some(bv) = self.annotations.bitmap_of(operand) {
                    self.annotations.set_bitmap(lv, self.bitpattern.not(&bv));
                }
            }
            self.annotations.set_abstract(lv, AbstractValue::Scalar(result));
        }
        Ok(Vec::new())
    }

    fn eval_identity(&mut self, op: &Operation, operand: ValueId) -> Result<Vec<Effect>, EvaluatorError> {
        let v = self.annotations.abstract_of(operand);
        if let Some(lv) = op.lvalue {
            if let Some(bv) = self.annotations.bitmap_of(operand) {
                self.annotations.set_bitmap(lv, bv);
            }
            self.annotations.set_abstract(lv, v);
        }
        Ok(Vec::new())
    }

    fn eval_high_level_call(
        &mut self,
        op: &Operation,
        destination: ValueId,
        function_name: &str,
        arguments: &[ValueId],
    ) -> Result<Vec<Effect>, EvaluatorError> {
        let dest_abs = self.annotations.abstract_of(destination);
        let dest_scalar = dest_abs.as_scalar().cloned().unwrap_or_else(ScalarValue::unknown);
        let dest_name = dest_scalar.storage.clone().or_else(|| dest_scalar.input.clone()).unwrap_or_else(|| dest_scalar.value.clone());

        let mut taints = dest_scalar.clone();
        for arg in arguments {
            let arg_abs = self.annotations.abstract_of(*arg);
            if let Some(s) = arg_abs.as_scalar() {
                taints.union_taints(s);
            }
        }

        let opaque = ScalarValue {
            input: None,
            storage: None,
            input_taints: taints.input_taints,
            storage_taints: taints.storage_taints,
            value: format!("{}.{function_name}()", dest_scalar.value),
        };

        let effects = vec![Effect::CrossContractCall { destination: dest_name, function_name: function_name.to_string() }];
        if let Some(lv) = op.lvalue {
            self.annotations.set_abstract(lv, AbstractValue::Scalar(opaque));
        }
        Ok(effects)
    }

    fn eval_low_level_call(&mut self, op: &Operation, destination: ValueId, arguments: &[ValueId]) -> Result<Vec<Effect>, EvaluatorError> {
        let mut taints = ScalarValue::unknown();
        for arg in arguments {
            if let Some(s) = self.annotations.abstract_of(*arg).as_scalar() {
                taints.union_taints(s);
            }
        }
        let dest_name = self.annotations.abstract_of(destination).as_scalar().map(|s| s.value.clone()).unwrap_or_else(|| UNKNOWN.to_string());
        let opaque = ScalarValue {
            input: None,
            storage: None,
            input_taints: taints.input_taints,
            storage_taints: taints.storage_taints,
            value: format!("{dest_name}.call()"),
        };
        if let Some(lv) = op.lvalue {
            self.annotations.set_abstract(lv, AbstractValue::Scalar(opaque));
        }
        Ok(Vec::new())
    }

    fn eval_solidity_call(&mut self, op: &Operation, name: &str, arguments: &[ValueId]) -> Result<Vec<Effect>, EvaluatorError> {
        let rendered_args: Vec<String> =
            arguments.iter().map(|a| self.annotations.abstract_of(*a).as_scalar().map(|s| s.value.clone()).unwrap_or_else(|| UNKNOWN.to_string())).collect();
        let printable = format!("{name}({})", rendered_args.join(", "));
        if let Some(lv) = op.lvalue {
            self.annotations.set_abstract(lv, AbstractValue::literal(printable));
        }
        Ok(Vec::new())
    }

    fn eval_return(&mut self, values: &[ValueId]) -> Result<Vec<Effect>, EvaluatorError> {
        let mut storages = Vec::new();
        for v in values {
            flatten_storage_names(&self.annotations.abstract_of(*v), &mut storages);
        }
        Ok(vec![Effect::Returned { storages, raw_values: values.to_vec() }])
    }

    fn eval_condition(&mut self, value: ValueId) -> Result<Vec<Effect>, EvaluatorError> {
        let abs = self.annotations.abstract_of(value);
        let mut effects = Vec::new();
        if let Some(name) = abs.as_scalar().and_then(|s| s.storage.clone()) {
            effects.push(Effect::ReadStorage(name));
        }
        Ok(effects)
    }

    fn eval_aggregate(&mut self, op: &Operation, arguments: &[ValueId]) -> Result<Vec<Effect>, EvaluatorError> {
        let items: Vec<AbstractValue> = arguments.iter().map(|a| self.annotations.abstract_of(*a)).collect();
        if let Some(lv) = op.lvalue {
            self.annotations.set_abstract(lv, AbstractValue::List(items));
        }
        Ok(Vec::new())
    }

    fn eval_new_contract(&mut self, op: &Operation, arguments: &[ValueId]) -> Result<Vec<Effect>, EvaluatorError> {
        let mut taints = ScalarValue::unknown();
        for arg in arguments {
            if let Some(s) = self.annotations.abstract_of(*arg).as_scalar() {
                taints.union_taints(s);
            }
        }
        let opaque = ScalarValue { input: None, storage: None, input_taints: taints.input_taints, storage_taints: taints.storage_taints, value: "new(...)".to_string() };
        if let Some(lv) = op.lvalue {
            self.annotations.set_abstract(lv, AbstractValue::Scalar(opaque));
        }
        Ok(Vec::new())
    }

    fn eval_unpack(&mut self, op: &Operation, tuple: ValueId, index: usize) -> Result<Vec<Effect>, EvaluatorError> {
        let projected = self.annotations.abstract_of(tuple).unpack(index);
        if let Some(lv) = op.lvalue {
            self.annotations.set_abstract(lv, projected);
        }
        Ok(Vec::new())
    }

    fn eval_event_call(&mut self, arguments: &[ValueId]) -> Result<Vec<Effect>, EvaluatorError> {
        let mut effects = Vec::new();
        for arg in arguments {
            if let Some(name) = self.annotations.abstract_of(*arg).as_scalar().and_then(|s| s.storage.clone()) {
                effects.push(Effect::ReadStorage(name));
            }
        }
        Ok(effects)
    }

    fn eval_length(&mut self, op: &Operation, base: ValueId) -> Result<Vec<Effect>, EvaluatorError> {
        let scalar = self.annotations.abstract_of(base).as_scalar().cloned().unwrap_or_else(ScalarValue::unknown);
        let appended = scalar.append_field("length");
        let mut effects = Vec::new();
        if let Some(name) = &appended.storage {
            effects.push(Effect::ReadStorage(name.clone()));
        }
        if let Some(lv) = op.lvalue {
            self.annotations.set_abstract(lv, AbstractValue::Scalar(appended));
        }
        Ok(effects)
    }

    fn eval_codesize(&mut self, op: &Operation, base: ValueId) -> Result<Vec<Effect>, EvaluatorError> {
        let scalar = self.annotations.abstract_of(base).as_scalar().cloned().unwrap_or_else(ScalarValue::unknown);
        let appended = scalar.append_field("codesize");
        if let Some(lv) = op.lvalue {
            self.annotations.set_abstract(lv, AbstractValue::Scalar(appended));
        }
        Ok(Vec::new())
    }

    fn eval_delete(&mut self, target: ValueId) -> Result<Vec<Effect>, EvaluatorError> {
        let abs = self.annotations.abstract_of(target);
        let mut effects = Vec::new();
        if let Some(name) = abs.as_scalar().and_then(|s| s.storage.clone()) {
            effects.push(Effect::WroteStorage(name));
        }
        Ok(effects)
    }
}

/// Flattens a (possibly list-shaped) AbstractValue's storage-rooted names,
/// used both for `Return` bookkeeping and function write-set aggregation.
pub fn flatten_storage_names(abs: &AbstractValue, out: &mut Vec<String>) {
    match abs {
        AbstractValue::Scalar(s) => {
            if let Some(name) = &s.storage {
                out.push(name.clone());
            }
        }
        AbstractValue::List(items) => {
            for item in items {
                flatten_storage_names(item, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contract_abstract_ir::{
        BinaryOp, ConstantValue, DeclaredType, ElementaryType, IrGraphBuilder, Location, StructDef, StructField, ValueKind,
    };
    use test_case::test_case;

    fn reserve_struct() -> DeclaredType {
        DeclaredType::Struct(StructDef {
            name: "Reserve".into(),
            fields: vec![
                StructField { name: "data".into(), ty: DeclaredType::Elementary(ElementaryType::uint256()) },
                StructField { name: "extra".into(), ty: DeclaredType::Elementary(ElementaryType::uint256()) },
            ],
        })
    }

    /// `MyStruct storage s = m[k]; s.x = 1;` records the write as `m[k].x`,
    /// not `s.x` (§4.E Assignment, scenario 6).
    #[test]
    fn reference_field_write_propagates_to_referent_canonical_name() {
        let mut b = IrGraphBuilder::new();
        let contract = b.push_contract("C", None);
        let function = b.push_function(contract, "f()", "f()", vec![], vec![], false, false, true);

        let mapping_base = b.push_value(ValueKind::Local { name: "m".into(), location: Location::Storage }, None);
        let key = b.push_value(ValueKind::Parameter { name: "k".into() }, Some(DeclaredType::Elementary(ElementaryType::uint256())));
        let s = b.push_value(ValueKind::Reference { location: Location::Storage }, Some(reserve_struct()));
        let field_ref = b.push_value(ValueKind::Reference { location: Location::Storage }, Some(DeclaredType::Elementary(ElementaryType::uint256())));
        let one = b.push_value(ValueKind::Constant(ConstantValue::Uint(alloy_primitives::U256::from(1u8))), Some(DeclaredType::Elementary(ElementaryType::uint256())));

        let index_op = b.push_operation(function, contract_abstract_ir::OperationKind::Index { base: mapping_base, index: key }, Some(s));
        let member_op = b.push_operation(function, contract_abstract_ir::OperationKind::Member { base: s, field: "data".into() }, Some(field_ref));
        let assign_op = b.push_operation(function, contract_abstract_ir::OperationKind::Assignment { rvalue: one }, Some(field_ref));
        let _ = (index_op, member_op, assign_op);

        let graph = b.build();
        let mut bitpattern = BitPatternEngine::new();
        let mut annotations = AnnotationStore::new();
        annotations.set_abstract(mapping_base, AbstractValue::from_storage("m"));
        annotations.set_abstract(key, AbstractValue::from_input("k"));
        annotations.set_abstract(one, AbstractValue::literal("1"));

        let mut eval = Evaluator::new(&graph, &mut bitpattern, &mut annotations);
        eval.eval(graph.operation(index_op)).unwrap();
        eval.eval(graph.operation(member_op)).unwrap();
        let effects = eval.eval(graph.operation(assign_op)).unwrap();

        assert!(effects.contains(&Effect::WroteStorage("m[k].data".to_string())));
        let s_abs = annotations.abstract_of(s);
        let sibling = s_abs.list_get(1).unwrap();
        assert_eq!(sibling.as_scalar().unwrap().storage.as_deref(), Some("m[k].extra"));
    }

    #[test]
    fn binary_self_update_preserves_the_single_clean_origin() {
        let mut b = IrGraphBuilder::new();
        let contract = b.push_contract("C", None);
        let function = b.push_function(contract, "f()", "f()", vec![], vec![], false, false, true);
        let storage_val = b.push_value(ValueKind::StateVariable {
            name: "flags".into(),
            slot: 0,
            offset_bits: 0,
            is_constant: false,
            is_immutable: false,
            initializer: None,
        }, Some(DeclaredType::Elementary(ElementaryType::uint256())));
        let mask = b.push_value(ValueKind::Constant(ConstantValue::Uint(alloy_primitives::U256::from(0xffu16))), Some(DeclaredType::Elementary(ElementaryType::uint256())));
        let lv = b.push_value(ValueKind::Temporary, Some(DeclaredType::Elementary(ElementaryType::uint256())));
        let op = b.push_operation(function, contract_abstract_ir::OperationKind::Binary { op: BinaryOp::And, left: storage_val, right: mask }, Some(lv));
        let graph = b.build();

        let mut bitpattern = BitPatternEngine::new();
        let mut annotations = AnnotationStore::new();
        annotations.set_abstract(storage_val, AbstractValue::from_storage("flags"));
        annotations.set_abstract(mask, AbstractValue::literal("0xff"));

        let mut eval = Evaluator::new(&graph, &mut bitpattern, &mut annotations);
        eval.eval(graph.operation(op)).unwrap();

        assert_eq!(annotations.abstract_of(lv).as_scalar().unwrap().storage.as_deref(), Some("flags"));
    }

    #[test]
    fn length_appends_dot_length_to_storage_origin() {
        let mut b = IrGraphBuilder::new();
        let contract = b.push_contract("C", None);
        let function = b.push_function(contract, "f()", "f()", vec![], vec![], false, false, true);
        let arr = b.push_value(ValueKind::StateVariable { name: "items".into(), slot: 2, offset_bits: 0, is_constant: false, is_immutable: false, initializer: None }, None);
        let lv = b.push_value(ValueKind::Temporary, Some(DeclaredType::Elementary(ElementaryType::uint256())));
        let op = b.push_operation(function, contract_abstract_ir::OperationKind::Length { base: arr }, Some(lv));
        let graph = b.build();

        let mut bitpattern = BitPatternEngine::new();
        let mut annotations = AnnotationStore::new();
        annotations.set_abstract(arr, AbstractValue::from_storage("items"));

        let mut eval = Evaluator::new(&graph, &mut bitpattern, &mut annotations);
        let effects = eval.eval(graph.operation(op)).unwrap();

        assert!(effects.contains(&Effect::ReadStorage("items.length".to_string())));
        assert_eq!(annotations.abstract_of(lv).as_scalar().unwrap().storage.as_deref(), Some("items.length"));
    }

    #[test_case(UnaryOp::Not, "!", false; "logical not renders its symbol and does not propagate a bitmap")]
    #[test_case(UnaryOp::BitwiseNot, "~", true; "bitwise not renders its symbol and propagates a bitmap")]
    fn unary_dispatch_table(uop: UnaryOp, symbol: &str, propagates_bitmap: bool) {
        let mut b = IrGraphBuilder::new();
        let contract = b.push_contract("C", None);
        let function = b.push_function(contract, "f()", "f()", vec![], vec![], false, false, true);
        let operand = b.push_value(ValueKind::Temporary, Some(DeclaredType::Elementary(ElementaryType::uint256())));
        let lv = b.push_value(ValueKind::Temporary, Some(DeclaredType::Elementary(ElementaryType::uint256())));
        let op = b.push_operation(function, contract_abstract_ir::OperationKind::Unary { op: uop, operand }, Some(lv));
        let graph = b.build();

        let mut bitpattern = BitPatternEngine::new();
        let mut annotations = AnnotationStore::new();
        annotations.set_abstract(operand, AbstractValue::literal("x"));
        annotations.set_bitmap(operand, bitpattern.fresh_symbol("x"));

        let mut eval = Evaluator::new(&graph, &mut bitpattern, &mut annotations);
        eval.eval(graph.operation(op)).unwrap();

        let rendered = annotations.abstract_of(lv).as_scalar().unwrap().value.clone();
        assert_eq!(rendered, format!("{symbol}(x)"));
        assert_eq!(annotations.bitmap_of(lv).is_some(), propagates_bitmap);
    }

    #[test_case(|operand| contract_abstract_ir::OperationKind::TypeConversion { operand }; "type conversion is an identity transfer")]
    #[test_case(|value| contract_abstract_ir::OperationKind::NewElementaryType { value }; "new elementary type is an identity transfer")]
    fn identity_dispatch_table(make_kind: impl FnOnce(ValueId) -> contract_abstract_ir::OperationKind) {
        let mut b = IrGraphBuilder::new();
        let contract = b.push_contract("C", None);
        let function = b.push_function(contract, "f()", "f()", vec![], vec![], false, false, true);
        let operand = b.push_value(ValueKind::Temporary, Some(DeclaredType::Elementary(ElementaryType::uint256())));
        let lv = b.push_value(ValueKind::Temporary, Some(DeclaredType::Elementary(ElementaryType::uint256())));
        let op = b.push_operation(function, make_kind(operand), Some(lv));
        let graph = b.build();

        let mut bitpattern = BitPatternEngine::new();
        let mut annotations = AnnotationStore::new();
        annotations.set_abstract(operand, AbstractValue::literal("x"));

        let mut eval = Evaluator::new(&graph, &mut bitpattern, &mut annotations);
        eval.eval(graph.operation(op)).unwrap();

        assert_eq!(annotations.abstract_of(lv).as_scalar().unwrap().value, "x");
    }
}
