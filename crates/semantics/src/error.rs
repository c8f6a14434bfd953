//! Component-local error types. Each converts into the matching
//! `AnalyzerErrorKind` variant upstream in `contract-abstract-analyzer`.

use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct ExpressionError(ExpressionErrorKind);

impl From<ExpressionErrorKind> for ExpressionError {
    fn from(value: ExpressionErrorKind) -> Self {
        Self(value)
    }
}

impl ExpressionError {
    pub fn kind(&self) -> &ExpressionErrorKind {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum ExpressionErrorKind {
    #[error("expression `{0}` is empty")]
    Empty(String),
    #[error("expression `{0}` may not start with `.` or `[`")]
    LeadingDotOrBracket(String),
    #[error("expression `{0}` has an unmatched `[`")]
    UnmatchedBracket(String),
    #[error("expression `{0}` has trailing characters after its final token")]
    TrailingCharacters(String),
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct LayoutError(LayoutErrorKind);

impl From<LayoutErrorKind> for LayoutError {
    fn from(value: LayoutErrorKind) -> Self {
        Self(value)
    }
}

impl LayoutError {
    pub fn kind(&self) -> &LayoutErrorKind {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum LayoutErrorKind {
    #[error("unknown top-level storage identifier `{0}`")]
    UnknownIdentifier(String),
    #[error("array index {index} out of range for fixed array of length {length}")]
    IndexOutOfRange { index: u64, length: u64 },
    #[error("mapping key type must be elementary, found {0:?}")]
    NonElementaryMappingKey(contract_abstract_ir::DeclaredType),
    #[error("unsupported nested container: dynamic arrays of arrays/mappings are not supported")]
    UnsupportedNestedContainer,
    #[error("fixed array must have length >= 1")]
    EmptyFixedArray,
    #[error("field `{0}` not found on struct `{1}`")]
    UnknownField(String, String),
    #[error("`.{0}` applied to a non-struct type")]
    NotAStruct(String),
    #[error("`[...]` applied to a type that is not an array or mapping")]
    NotIndexable,
    #[error("index `{0}` is not a literal; concrete slot resolution requires a literal key")]
    SymbolicIndex(String),
    #[error("could not encode literal `{literal}` as a {type_name} mapping key")]
    MappingKeyEncoding { literal: String, type_name: String },
    #[error(transparent)]
    Expression(#[from] ExpressionError),
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct BitPatternError(BitPatternErrorKind);

impl From<BitPatternErrorKind> for BitPatternError {
    fn from(value: BitPatternErrorKind) -> Self {
        Self(value)
    }
}

impl BitPatternError {
    pub fn kind(&self) -> &BitPatternErrorKind {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum BitPatternErrorKind {
    #[error("bitmap expression has {0} free variables; only 1 or 2 are supported")]
    TooManyFreeVariables(usize),
    #[error("single-variable bitmap did not simplify to an extract of its root variable")]
    NotAnExtract,
    #[error("two-variable bitmap did not match a recognized packing pattern")]
    UnrecognizedTwoVariablePattern,
    #[error("simplified bitvector term has {nodes} nodes, exceeding the {limit}-node budget")]
    TermBudgetExceeded { nodes: usize, limit: usize },
}
