//! Component G: orchestrates the path walker across a whole contract and
//! reduces its effects into the storage/utility meta document (§4.G).

mod analyzer;
mod config;
mod error;
mod meta;
mod report;

pub use analyzer::ContractAnalyzer;
pub use config::AnalyzerConfig;
pub use error::{AnalyzerError, AnalyzerErrorKind, Diagnostic};
pub use meta::{
    ConstantEntry, ContractMeta, DataMeta, EntityMeta, FieldMeta, FunctionWrites, MetaDocument, ReturnEntry, StorageInfo, TypeMeta, UtilityEntry,
};
pub use report::AnalyzerReport;
