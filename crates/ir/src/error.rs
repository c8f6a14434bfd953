//! Errors raised while building or navigating an [`crate::model::IrGraph`].

use thiserror::Error;

/// Public error type returned by this crate.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct IrError(IrErrorKind);

impl From<IrErrorKind> for IrError {
    fn from(value: IrErrorKind) -> Self {
        Self(value)
    }
}

impl IrError {
    pub fn kind(&self) -> &IrErrorKind {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum IrErrorKind {
    #[error("dangling reference to {kind} id {id}")]
    DanglingId { kind: &'static str, id: usize },
    #[error("function `{0}` has no entry point")]
    NoEntryPoint(String),
    #[error("operand of operation `{0:?}` has no declared type")]
    MissingDeclaredType(crate::op::OperationKind),
}
