//! Component G: drives the path walker across a whole contract and reduces
//! its effects into the final meta document (§4.G).

use std::collections::BTreeSet;

use alloy_primitives::U256;
use contract_abstract_evaluator::Effect;
use contract_abstract_ir::{Contract, DeclaredType, ElementaryType, Function, IrGraph, ValueId, ValueKind};
use contract_abstract_semantics::{parse_expression, BitPatternErrorKind, BitmapLayout, EntityLayout, SlotInfo};
use contract_abstract_walker::PathWalker;
use indexmap::IndexMap;

use crate::config::AnalyzerConfig;
use crate::error::{AnalyzerError, Diagnostic};
use crate::meta::{ConstantEntry, ContractMeta, EntityMeta, FieldMeta, FunctionWrites, ReturnEntry, StorageInfo, TypeMeta, UtilityEntry};
use crate::report::AnalyzerReport;

pub struct ContractAnalyzer {
    config: AnalyzerConfig,
}

impl ContractAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Runs the whole contract, building one `ContractMeta` per declared
    /// contract and collecting every recoverable diagnostic along the way.
    pub fn analyze(&self, graph: &IrGraph) -> Result<AnalyzerReport, AnalyzerError> {
        let mut report = AnalyzerReport::default();
        for contract in &graph.contracts {
            let (meta, diagnostics) = self.analyze_contract(graph, contract);
            report.diagnostics.extend(diagnostics);
            report.document.contracts.insert(contract.name.clone(), meta);
        }
        Ok(report)
    }

    fn analyze_contract(&self, graph: &IrGraph, contract: &Contract) -> (ContractMeta, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let entities_input = build_entities(graph, contract);
        let entity_layout = EntityLayout::new(entities_input.clone());
        let mut walker = PathWalker::new(self.config.walker_limits());

        let mut write_storage: IndexMap<String, FunctionWrites> = IndexMap::new();
        let mut read_roots: BTreeSet<String> = BTreeSet::new();
        let mut constants: IndexMap<String, Vec<ConstantEntry>> = IndexMap::new();
        let mut utilities: Vec<UtilityEntry> = Vec::new();

        for &fid in &contract.functions {
            let function = graph.function(fid);

            if function.entry_point.is_none() {
                if function.pure || function.view {
                    match synthesize_getter_utility(graph, contract, function) {
                        Some(utility) => utilities.push(utility),
                        None => diagnostics.push(Diagnostic::new(
                            "UnsupportedConstruct",
                            format!("function `{}` has no IR body and is not a recognizable public-getter", function.full_name),
                            Some(function.full_name.clone()),
                        )),
                    }
                }
                continue;
            }

            let fn_report = walker.walk_function(graph, &entity_layout, fid);
            if fn_report.aborted {
                diagnostics.push(Diagnostic::new(
                    "ResourceBudget",
                    format!("analysis of `{}` was truncated by a resource bound", function.full_name),
                    Some(function.full_name.clone()),
                ));
            }

            let mut writes: BTreeSet<String> = BTreeSet::new();
            let mut returns: Vec<ReturnEntry> = Vec::new();

            for effect in &fn_report.effects {
                match effect {
                    Effect::WroteStorage(name) => {
                        writes.insert(name.clone());
                    }
                    Effect::ReadStorage(name) => {
                        if let Ok(node) = parse_expression(name) {
                            read_roots.insert(node.root_name().to_string());
                        }
                    }
                    Effect::ConstantRead { name, value, ty, interface } => {
                        constants.entry(function.full_name.clone()).or_default().push(ConstantEntry {
                            name: name.clone(),
                            value: value.clone(),
                            ty: TypeMeta::from_declared(ty),
                            interface: interface.clone(),
                        });
                    }
                    Effect::Returned { storages, raw_values } if function.pure || function.view => {
                        returns.extend(return_entries(graph, &entity_layout, storages, raw_values));
                    }
                    Effect::Diagnostic { kind, message } => {
                        diagnostics.push(Diagnostic::new(*kind, message.clone(), Some(function.full_name.clone())));
                    }
                    Effect::Returned { .. } | Effect::CrossContractCall { .. } => {}
                }
            }

            if !writes.is_empty() {
                let parameters = parameter_names(graph, function);
                write_storage.insert(function.signature.clone(), FunctionWrites { parameters, write_storages: writes.into_iter().collect() });
            }

            if (function.pure || function.view) && !returns.is_empty() {
                utilities.push(UtilityEntry { function: function.full_name.clone(), parameters: parameter_types(graph, function), returns });
            }
        }

        let mut entities = build_entity_metas(&entities_input, &read_roots);
        apply_bitmap_layouts(&walker, &mut entities, &mut diagnostics);

        let meta = ContractMeta { address: contract.address.clone(), entities, constants, utilities, function_write_storage: write_storage };
        (meta, diagnostics)
    }
}

fn build_entities(graph: &IrGraph, contract: &Contract) -> IndexMap<String, (DeclaredType, SlotInfo)> {
    let mut out = IndexMap::new();
    for &id in &contract.storage_variables_ordered {
        let value = graph.value(id);
        let ValueKind::StateVariable { name, slot, offset_bits, is_constant, is_immutable, .. } = &value.kind else { continue };
        if *is_constant || *is_immutable {
            continue;
        }
        let ty = value.declared_type.clone().unwrap_or_else(default_uint);
        out.insert(name.clone(), (ty, SlotInfo::new(U256::from(*slot), *offset_bits)));
    }
    out
}

fn build_entity_metas(entities: &IndexMap<String, (DeclaredType, SlotInfo)>, read_roots: &BTreeSet<String>) -> IndexMap<String, EntityMeta> {
    entities
        .iter()
        .map(|(name, (ty, slot))| {
            let read = ty.as_elementary().is_some() && read_roots.contains(name);
            let meta = EntityMeta {
                type_meta: TypeMeta::from_declared(ty),
                storage_info: Some(StorageInfo { slot: slot.slot, offset: slot.offset_bits }),
                bitmap: None,
                read: read.then_some(true),
            };
            (name.clone(), meta)
        })
        .collect()
}

/// §4.D layout recognizer, run once all of a contract's paths have been
/// walked: classifies each recorded `(name, bitvector)` pair and attaches
/// the recovered sub-field layout to the storage entity its free variable
/// is rooted in. Single-variable recognitions accumulate into that entity's
/// `Struct` bitmap; two-variable recognitions accumulate into a 128-element
/// `StaticArray` of such structs (packed boolean pairs, §4.D).
fn apply_bitmap_layouts(walker: &PathWalker, entities: &mut IndexMap<String, EntityMeta>, diagnostics: &mut Vec<Diagnostic>) {
    let mut single_fields: IndexMap<String, Vec<FieldMeta>> = IndexMap::new();
    let mut indexed_fields: IndexMap<String, Vec<(u32, FieldMeta)>> = IndexMap::new();

    for (name, bv) in walker.bitmap_pairs() {
        let value_for_var = |var: &str| walker.bv_for_symbol_name(var);
        match walker.bitpattern().recognize(value_for_var, bv, name) {
            Ok(BitmapLayout::Field(field)) => {
                let Some(owner) = owning_entity(walker, bv, entities) else { continue };
                single_fields.entry(owner).or_default().push(FieldMeta::at_offset(field.name, field_type_meta(field.size_bits), field.offset_bits));
            }
            Ok(BitmapLayout::IndexedField { name: field_name, base_offset_bits, size_bits, .. }) => {
                let Some(owner) = owning_entity(walker, bv, entities) else { continue };
                indexed_fields.entry(owner).or_default().push((base_offset_bits, FieldMeta::at_offset(field_name, field_type_meta(size_bits), base_offset_bits)));
            }
            Err(e) => {
                let kind = match e.kind() {
                    BitPatternErrorKind::TermBudgetExceeded { .. } => "ResourceBudget",
                    _ => "UnsupportedConstruct",
                };
                diagnostics.push(Diagnostic::new(kind, e.to_string(), Some(name.clone())));
            }
        }
    }

    for (owner, fields) in single_fields {
        if let Some(entity) = entities.get_mut(&owner) {
            entity.bitmap = Some(TypeMeta::struct_(format!("{owner}Bitmap"), fields));
        }
    }
    for (owner, mut fields) in indexed_fields {
        fields.sort_by_key(|(offset, _)| *offset);
        let fields: Vec<FieldMeta> = fields.into_iter().map(|(_, f)| f).collect();
        if let Some(entity) = entities.get_mut(&owner) {
            entity.bitmap = Some(TypeMeta::static_array(128, TypeMeta::struct_(format!("{owner}Entry"), fields)));
        }
    }
}

fn owning_entity(walker: &PathWalker, bv: &z3::ast::BV, entities: &IndexMap<String, EntityMeta>) -> Option<String> {
    let storage_expr = walker.owning_storage_name(bv)?;
    let root = parse_expression(&storage_expr).ok()?.root_name().to_string();
    entities.contains_key(&root).then_some(root)
}

fn field_type_meta(size_bits: u32) -> TypeMeta {
    let bytes = size_bits.div_ceil(8).max(1) as u16;
    TypeMeta::elementary(if bytes == 1 && size_bits == 1 { "bool".to_string() } else { format!("uint{}", bytes * 8) }, bytes)
}

fn return_entries(graph: &IrGraph, entities: &EntityLayout, storages: &[String], raw_values: &[ValueId]) -> Vec<ReturnEntry> {
    if storages.len() == raw_values.len() {
        return raw_values
            .iter()
            .zip(storages.iter())
            .map(|(&rv, storage_name)| {
                let ty = entities.find_meta(storage_name).ok().or_else(|| graph.value(rv).declared_type.clone()).unwrap_or_else(default_uint);
                ReturnEntry { value: storage_name.clone(), ty: TypeMeta::from_declared(&ty) }
            })
            .collect();
    }
    raw_values.iter().map(|&rv| return_entry_from_ir(graph, entities, rv)).collect()
}

fn return_entry_from_ir(graph: &IrGraph, entities: &EntityLayout, id: ValueId) -> ReturnEntry {
    let value = graph.value(id);
    match &value.kind {
        ValueKind::Constant(c) => ReturnEntry { value: c.display(), ty: TypeMeta::from_declared(&value.declared_type.clone().unwrap_or_else(default_uint)) },
        ValueKind::StateVariable { name, .. } => {
            let ty = entities.find_meta(name).ok().or_else(|| value.declared_type.clone()).unwrap_or_else(default_uint);
            ReturnEntry { value: name.clone(), ty: TypeMeta::from_declared(&ty) }
        }
        _ => {
            let name = value.canonical_name().map(str::to_string).unwrap_or_else(|| contract_abstract_semantics::UNKNOWN.to_string());
            ReturnEntry { value: name, ty: TypeMeta::from_declared(&value.declared_type.clone().unwrap_or_else(default_uint)) }
        }
    }
}

fn parameter_names(graph: &IrGraph, function: &Function) -> Vec<String> {
    function
        .parameters
        .iter()
        .filter_map(|&p| match &graph.value(p).kind {
            ValueKind::Parameter { name } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

fn parameter_types(graph: &IrGraph, function: &Function) -> IndexMap<String, TypeMeta> {
    function
        .parameters
        .iter()
        .filter_map(|&p| {
            let value = graph.value(p);
            match &value.kind {
                ValueKind::Parameter { name } => Some((name.clone(), TypeMeta::from_declared(&value.declared_type.clone().unwrap_or_else(default_uint)))),
                _ => None,
            }
        })
        .collect()
}

/// Auto-generated public getters for a state variable carry no IR body
/// (§4.E Return): synthesize the pseudo-return `$<name>$<type>` directly
/// from the matching storage variable instead of walking a CFG that does
/// not exist.
fn synthesize_getter_utility(graph: &IrGraph, contract: &Contract, function: &Function) -> Option<UtilityEntry> {
    if !function.parameters.is_empty() {
        return None;
    }
    let base_name = function.full_name.split('(').next().unwrap_or(&function.full_name);
    let (name, ty) = contract.storage_variables_ordered.iter().find_map(|&id| {
        let value = graph.value(id);
        match &value.kind {
            ValueKind::StateVariable { name, .. } if name == base_name => Some((name.clone(), value.declared_type.clone().unwrap_or_else(default_uint))),
            _ => None,
        }
    })?;
    let type_name = ty.as_elementary().map(|e| e.name.clone()).unwrap_or_else(|| "uint256".to_string());
    Some(UtilityEntry {
        function: function.full_name.clone(),
        parameters: IndexMap::new(),
        returns: vec![ReturnEntry { value: format!("${name}${type_name}"), ty: TypeMeta::from_declared(&ty) }],
    })
}

fn default_uint() -> DeclaredType {
    DeclaredType::Elementary(ElementaryType::uint256())
}

#[cfg(test)]
mod tests {
    use contract_abstract_ir::{IrGraphBuilder, OperationKind};

    use super::*;

    #[test]
    fn getter_without_entry_point_is_synthesized_as_a_utility() {
        let mut b = IrGraphBuilder::new();
        let contract = b.push_contract("C", None);
        let treasury = b.push_value(
            ValueKind::StateVariable { name: "treasury".into(), slot: 0, offset_bits: 0, is_constant: false, is_immutable: false, initializer: None },
            Some(DeclaredType::Elementary(ElementaryType::address())),
        );
        b.push_storage_variable(contract, treasury);
        b.push_function(contract, "treasury()", "treasury()", vec![], vec![DeclaredType::Elementary(ElementaryType::address())], true, true, true);
        let graph = b.build();

        let analyzer = ContractAnalyzer::new(AnalyzerConfig::default());
        let report = analyzer.analyze(&graph).unwrap();
        let contract_meta = &report.document.contracts["C"];
        assert_eq!(contract_meta.utilities.len(), 1);
        assert_eq!(contract_meta.utilities[0].function, "treasury()");
    }

    #[test]
    fn write_effects_populate_function_write_storage() {
        let mut b = IrGraphBuilder::new();
        let contract = b.push_contract("C", None);
        let bal = b.push_value(
            ValueKind::StateVariable { name: "bal".into(), slot: 0, offset_bits: 0, is_constant: false, is_immutable: false, initializer: None },
            Some(DeclaredType::Elementary(ElementaryType::uint256())),
        );
        b.push_storage_variable(contract, bal);
        let amount = b.push_value(ValueKind::Parameter { name: "amount".into() }, Some(DeclaredType::Elementary(ElementaryType::uint256())));
        let function = b.push_function(contract, "setBal(uint256)", "setBal(uint256)", vec![amount], vec![], false, false, true);
        let assign = b.push_operation(function, OperationKind::Assignment { rvalue: amount }, Some(bal));
        let node = b.push_node(vec![assign], vec![]);
        b.set_entry_point(function, node);
        let graph = b.build();

        let analyzer = ContractAnalyzer::new(AnalyzerConfig::default());
        let report = analyzer.analyze(&graph).unwrap();
        let contract_meta = &report.document.contracts["C"];
        let writes = &contract_meta.function_write_storage["setBal(uint256)"];
        assert_eq!(writes.write_storages, vec!["bal".to_string()]);
        assert_eq!(writes.parameters, vec!["amount".to_string()]);
    }
}
