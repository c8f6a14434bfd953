//! In-memory intermediate-representation graph consumed by the analyzer.
//!
//! This crate owns the data model only: an arena-indexed CFG graph
//! (contracts, functions, nodes, operations, values) plus the declared-type
//! tree attached to values. It never runs analysis itself.

pub mod error;
pub mod model;
pub mod op;
pub mod types;

pub use error::{IrError, IrErrorKind};
pub use model::{
    ConstantValue, Contract, ContractId, Function, FunctionId, IrGraph, IrGraphBuilder, Location, Node, NodeId,
    Operation, OperationId, Value, ValueId, ValueKind,
};
pub use op::{BinaryOp, OperationKind, UnaryOp};
pub use types::{DeclaredType, ElementaryType, StructDef, StructField};
