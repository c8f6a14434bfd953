//! Concrete, arena-indexed in-memory IR graph.
//!
//! The source system attaches an open, per-value context map directly onto
//! IR values and lets callers hold shared, mutable references into the graph.
//! Here the graph is a plain, immutable arena addressed by small integer ids;
//! any analysis-local mutable state (the annotation store) lives in the
//! crate that needs it, never on these types themselves.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrErrorKind};
use crate::op::OperationKind;
use crate::types::DeclaredType;

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(ContractId);
arena_id!(FunctionId);
arena_id!(NodeId);
arena_id!(OperationId);
arena_id!(ValueId);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ConstantValue {
    Uint(U256),
    Bool(bool),
    Address(Address),
    Str(String),
}

impl ConstantValue {
    pub fn display(&self) -> String {
        match self {
            Self::Uint(v) => v.to_string(),
            Self::Bool(v) => v.to_string(),
            Self::Address(v) => v.to_string(),
            Self::Str(v) => v.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    Storage,
    Memory,
    Default,
}

/// What an IR value *is*: a parameter, a local, a reference into storage or
/// memory, a state variable, a literal, or one of the Solidity pseudo-values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ValueKind {
    Parameter { name: String },
    Local { name: String, location: Location },
    Temporary,
    /// A reference-typed local (`storage`/`memory` pointer variable).
    Reference { location: Location },
    StateVariable {
        name: String,
        slot: u64,
        offset_bits: u32,
        is_constant: bool,
        is_immutable: bool,
        initializer: Option<OperationId>,
    },
    Constant(ConstantValue),
    SolidityVariable { name: String },
    Contract { name: String },
    EnumMember { enum_name: String, member: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub id: ValueId,
    pub kind: ValueKind,
    pub declared_type: Option<DeclaredType>,
}

impl Value {
    pub fn canonical_name(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::Parameter { name }
            | ValueKind::Local { name, .. }
            | ValueKind::StateVariable { name, .. }
            | ValueKind::SolidityVariable { name }
            | ValueKind::Contract { name } => Some(name),
            _ => None,
        }
    }

    pub fn is_storage_located(&self) -> bool {
        matches!(
            &self.kind,
            ValueKind::StateVariable { .. }
                | ValueKind::Local { location: Location::Storage, .. }
                | ValueKind::Reference { location: Location::Storage }
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub function: FunctionId,
    pub kind: OperationKind,
    pub lvalue: Option<ValueId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub irs: Vec<OperationId>,
    /// Successors, in CFG order; index 1 (if present) is the false edge.
    pub sons: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub id: FunctionId,
    pub contract: ContractId,
    pub full_name: String,
    pub signature: String,
    pub parameters: Vec<ValueId>,
    pub return_type: Vec<DeclaredType>,
    pub pure: bool,
    pub view: bool,
    pub entry_point: Option<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub name: String,
    pub address: Option<String>,
    pub storage_variables_ordered: Vec<ValueId>,
    pub functions: Vec<FunctionId>,
    pub functions_entry_points: Vec<FunctionId>,
}

/// The whole IR graph, addressed by the small arena ids above.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IrGraph {
    pub contracts: Vec<Contract>,
    pub functions: Vec<Function>,
    pub nodes: Vec<Node>,
    pub operations: Vec<Operation>,
    pub values: Vec<Value>,
}

impl IrGraph {
    pub fn contract(&self, id: ContractId) -> &Contract {
        &self.contracts[id.index()]
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.index()]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn operation(&self, id: OperationId) -> &Operation {
        &self.operations[id.index()]
    }

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.index()]
    }

    pub fn try_entry_point(&self, function: FunctionId) -> Result<NodeId, IrError> {
        self.function(function)
            .entry_point
            .ok_or_else(|| IrErrorKind::NoEntryPoint(self.function(function).full_name.clone()).into())
    }
}

/// Incrementally builds an [`IrGraph`], handing back stable ids as values are
/// pushed. Used by fixtures and tests; a real front-end adapter would instead
/// translate its own graph into this shape once, up front.
#[derive(Default)]
pub struct IrGraphBuilder {
    graph: IrGraph,
}

impl IrGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_contract(&mut self, name: impl Into<String>, address: Option<String>) -> ContractId {
        let id = ContractId(self.graph.contracts.len());
        self.graph.contracts.push(Contract {
            id,
            name: name.into(),
            address,
            storage_variables_ordered: Vec::new(),
            functions: Vec::new(),
            functions_entry_points: Vec::new(),
        });
        id
    }

    pub fn push_value(&mut self, kind: ValueKind, declared_type: Option<DeclaredType>) -> ValueId {
        let id = ValueId(self.graph.values.len());
        self.graph.values.push(Value { id, kind, declared_type });
        id
    }

    pub fn push_storage_variable(&mut self, contract: ContractId, value: ValueId) {
        self.graph.contracts[contract.index()].storage_variables_ordered.push(value);
    }

    pub fn push_function(
        &mut self,
        contract: ContractId,
        full_name: impl Into<String>,
        signature: impl Into<String>,
        parameters: Vec<ValueId>,
        return_type: Vec<DeclaredType>,
        pure: bool,
        view: bool,
        is_entry_point: bool,
    ) -> FunctionId {
        let id = FunctionId(self.graph.functions.len());
        self.graph.functions.push(Function {
            id,
            contract,
            full_name: full_name.into(),
            signature: signature.into(),
            parameters,
            return_type,
            pure,
            view,
            entry_point: None,
        });
        self.graph.contracts[contract.index()].functions.push(id);
        if is_entry_point {
            self.graph.contracts[contract.index()].functions_entry_points.push(id);
        }
        id
    }

    pub fn set_entry_point(&mut self, function: FunctionId, node: NodeId) {
        self.graph.functions[function.index()].entry_point = Some(node);
    }

    pub fn push_node(&mut self, irs: Vec<OperationId>, sons: Vec<NodeId>) -> NodeId {
        let id = NodeId(self.graph.nodes.len());
        self.graph.nodes.push(Node { id, irs, sons });
        id
    }

    pub fn reserve_node(&mut self) -> NodeId {
        self.push_node(Vec::new(), Vec::new())
    }

    pub fn fill_node(&mut self, id: NodeId, irs: Vec<OperationId>, sons: Vec<NodeId>) {
        let node = &mut self.graph.nodes[id.index()];
        node.irs = irs;
        node.sons = sons;
    }

    pub fn push_operation(&mut self, function: FunctionId, kind: OperationKind, lvalue: Option<ValueId>) -> OperationId {
        let id = OperationId(self.graph.operations.len());
        self.graph.operations.push(Operation { id, function, kind, lvalue });
        id
    }

    pub fn build(self) -> IrGraph {
        self.graph
    }
}
