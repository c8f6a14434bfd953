//! Storage-layout and bit-pattern reconstruction semantics: the parts of the
//! analysis that reason about *where* a value lives rather than *how* the
//! control flow graph reaches it.

mod abstract_value;
mod bitpattern;
mod error;
mod expr;
mod layout;
mod sexpr;

pub use abstract_value::{AbstractValue, ScalarValue, TaintSet, UNKNOWN};
pub use bitpattern::{normalize_accessor_name, BitField, BitPatternEngine, BitmapLayout};
pub use error::{
    BitPatternError, BitPatternErrorKind, ExpressionError, ExpressionErrorKind, LayoutError, LayoutErrorKind,
};
pub use expr::{parse as parse_expression, Base, ExprNode};
pub use layout::{array_base_slot, mapping_slot, read_value, EntityLayout, SlotInfo};
