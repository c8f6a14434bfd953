//! Evaluator-local errors. `Unsupported` and `Malformed` map onto the
//! `UnsupportedConstruct`/`MalformedIR` kinds from §7; the walker decides
//! what "skip" vs "abort this function" means operationally.

use thiserror::Error;

use contract_abstract_ir::OperationKind;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct EvaluatorError(EvaluatorErrorKind);

impl From<EvaluatorErrorKind> for EvaluatorError {
    fn from(value: EvaluatorErrorKind) -> Self {
        Self(value)
    }
}

impl EvaluatorError {
    pub fn kind(&self) -> &EvaluatorErrorKind {
        &self.0
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self.0, EvaluatorErrorKind::Unsupported { .. })
    }
}

#[derive(Debug, Error)]
pub enum EvaluatorErrorKind {
    #[error("unsupported construct in {op}: {detail}")]
    Unsupported { op: &'static str, detail: String },
    #[error("malformed IR in {op}: {detail}")]
    Malformed { op: &'static str, detail: String },
    #[error(transparent)]
    Layout(#[from] contract_abstract_semantics::LayoutError),
    #[error(transparent)]
    Expression(#[from] contract_abstract_semantics::ExpressionError),
    #[error(transparent)]
    BitPattern(#[from] contract_abstract_semantics::BitPatternError),
}

impl EvaluatorErrorKind {
    pub fn unsupported(kind: &OperationKind, detail: impl Into<String>) -> Self {
        Self::Unsupported { op: kind.name(), detail: detail.into() }
    }

    pub fn malformed(kind: &OperationKind, detail: impl Into<String>) -> Self {
        Self::Malformed { op: kind.name(), detail: detail.into() }
    }
}
