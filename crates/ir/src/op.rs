//! IR operation kinds (§3: the discriminant every operation carries) and the
//! small enums they close over.

use serde::{Deserialize, Serialize};

use crate::model::{FunctionId, ValueId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AndAnd,
    OrOr,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    BitwiseNot,
}

/// Discriminant kind of an IR operation, per the set enumerated in §3.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Index { base: ValueId, index: ValueId },
    Member { base: ValueId, field: String },
    Assignment { rvalue: ValueId },
    Binary { op: BinaryOp, left: ValueId, right: ValueId },
    Unary { op: UnaryOp, operand: ValueId },
    TypeConversion { operand: ValueId },
    InternalCall { function: FunctionId, arguments: Vec<ValueId> },
    LibraryCall { function: FunctionId, arguments: Vec<ValueId> },
    HighLevelCall { destination: ValueId, function_name: String, arguments: Vec<ValueId> },
    LowLevelCall { destination: ValueId, arguments: Vec<ValueId> },
    SolidityCall { name: String, arguments: Vec<ValueId> },
    Return { values: Vec<ValueId> },
    Condition { value: ValueId },
    NewStructure { arguments: Vec<ValueId> },
    NewArray { arguments: Vec<ValueId> },
    NewContract { arguments: Vec<ValueId> },
    NewElementaryType { value: ValueId },
    InitArray { arguments: Vec<ValueId> },
    Unpack { tuple: ValueId, index: usize },
    EventCall { name: String, arguments: Vec<ValueId> },
    Length { base: ValueId },
    CodeSize { base: ValueId },
    Delete { target: ValueId },
}

impl OperationKind {
    /// Every `ValueId` this operation reads from, excluding the lvalue.
    /// Used by the walker to spot constant/immutable state-variable reads
    /// without re-deriving the match arms for every op kind.
    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            Self::Index { base, index } => vec![*base, *index],
            Self::Member { base, .. } => vec![*base],
            Self::Assignment { rvalue } => vec![*rvalue],
            Self::Binary { left, right, .. } => vec![*left, *right],
            Self::Unary { operand, .. } => vec![*operand],
            Self::TypeConversion { operand } => vec![*operand],
            Self::NewElementaryType { value } => vec![*value],
            Self::InternalCall { arguments, .. } | Self::LibraryCall { arguments, .. } => arguments.clone(),
            Self::HighLevelCall { destination, arguments, .. } => {
                let mut v = vec![*destination];
                v.extend(arguments.iter().copied());
                v
            }
            Self::LowLevelCall { destination, arguments } => {
                let mut v = vec![*destination];
                v.extend(arguments.iter().copied());
                v
            }
            Self::SolidityCall { arguments, .. } => arguments.clone(),
            Self::Return { values } => values.clone(),
            Self::Condition { value } => vec![*value],
            Self::NewStructure { arguments } | Self::NewArray { arguments } | Self::InitArray { arguments } => arguments.clone(),
            Self::NewContract { arguments } => arguments.clone(),
            Self::Unpack { tuple, .. } => vec![*tuple],
            Self::EventCall { arguments, .. } => arguments.clone(),
            Self::Length { base } => vec![*base],
            Self::CodeSize { base } => vec![*base],
            Self::Delete { target } => vec![*target],
        }
    }

    /// Name used in diagnostics; stable regardless of enum field contents.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Index { .. } => "Index",
            Self::Member { .. } => "Member",
            Self::Assignment { .. } => "Assignment",
            Self::Binary { .. } => "Binary",
            Self::Unary { .. } => "Unary",
            Self::TypeConversion { .. } => "TypeConversion",
            Self::InternalCall { .. } => "InternalCall",
            Self::LibraryCall { .. } => "LibraryCall",
            Self::HighLevelCall { .. } => "HighLevelCall",
            Self::LowLevelCall { .. } => "LowLevelCall",
            Self::SolidityCall { .. } => "SolidityCall",
            Self::Return { .. } => "Return",
            Self::Condition { .. } => "Condition",
            Self::NewStructure { .. } => "NewStructure",
            Self::NewArray { .. } => "NewArray",
            Self::NewContract { .. } => "NewContract",
            Self::NewElementaryType { .. } => "NewElementaryType",
            Self::InitArray { .. } => "InitArray",
            Self::Unpack { .. } => "Unpack",
            Self::EventCall { .. } => "EventCall",
            Self::Length { .. } => "Length",
            Self::CodeSize { .. } => "CodeSize",
            Self::Delete { .. } => "Delete",
        }
    }
}
