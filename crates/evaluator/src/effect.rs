//! Bookkeeping the evaluator hands back to its caller after each operation.
//!
//! The evaluator itself owns no per-function state (read-set, write-set,
//! constants table, return set): those are accumulated by the walker across
//! an entire path, so each `eval_operation` call returns the small number of
//! facts it observed as a list of effects instead of mutating shared state
//! directly.

use contract_abstract_ir::{DeclaredType, ValueId};

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// A storage-rooted location was written (§4.E read/write bookkeeping).
    WroteStorage(String),
    /// A storage-rooted location was read.
    ReadStorage(String),
    /// A constant/immutable state variable was read (§4.E constant
    /// bookkeeping), excluding `MASK`/`BIT_POSITION` names. Emitted by the
    /// walker when it seeds a state variable's annotation, not by the
    /// per-operation dispatch.
    ConstantRead { name: String, value: String, ty: DeclaredType, interface: Option<Vec<String>> },
    /// A `Return` op's values: their storage-rooted names (flattened across
    /// list-shaped/tuple AbstractValues) plus the raw value ids, so the
    /// walker can additionally inspect each one's bitmap annotation.
    Returned { storages: Vec<String>, raw_values: Vec<ValueId> },
    /// A `HighLevelCall`'s destination/function pair (§4.E `HighLevelCall`).
    CrossContractCall { destination: String, function_name: String },
    /// A recoverable diagnostic (§7 `UnsupportedConstruct`/`MalformedIR`).
    Diagnostic { kind: &'static str, message: String },
}
