//! The five error kinds from §7, each a `thiserror` variant of
//! `AnalyzerErrorKind`, wrapped in a public transparent `AnalyzerError` the
//! same way the component-local errors in `contract-abstract-semantics` are.

use thiserror::Error;

use contract_abstract_semantics::{BitPatternError, ExpressionError, LayoutError};

#[derive(Debug, Error)]
#[error(transparent)]
pub struct AnalyzerError(AnalyzerErrorKind);

impl From<AnalyzerErrorKind> for AnalyzerError {
    fn from(value: AnalyzerErrorKind) -> Self {
        Self(value)
    }
}

impl AnalyzerError {
    pub fn kind(&self) -> &AnalyzerErrorKind {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum AnalyzerErrorKind {
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),
    #[error("malformed IR: {0}")]
    MalformedIr(String),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Expression(#[from] ExpressionError),
    #[error(transparent)]
    BitPattern(#[from] BitPatternError),
    #[error("resource budget exceeded: {0}")]
    ResourceBudget(String),
}

/// A recoverable event folded into the running report instead of aborting
/// the whole analysis (§7: `UnsupportedConstruct`/`MalformedIR`/`LayoutError`
/// never unwind past the function or entity they occurred in).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub kind: &'static str,
    pub message: String,
    /// What the diagnostic is about: a function's full name, a contract
    /// name, or a storage entity name, depending on `kind`.
    pub site: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: &'static str, message: impl Into<String>, site: Option<String>) -> Self {
        Self { kind, message: message.into(), site }
    }
}
