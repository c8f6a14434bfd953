//! Component C: parses canonical storage-access expressions
//! (`ident ('.' ident | '[' expr ']')*`) into a tree, and formats them back.

use crate::error::{ExpressionError, ExpressionErrorKind};

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Either a plain identifier, or the already-parsed expression it chains off of.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Base {
    Ident(String),
    Nested(Box<ExprNode>),
}

/// One node of the parsed expression tree (§4.C).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExprNode {
    pub name: Base,
    pub index: Option<Box<ExprNode>>,
    pub field: Option<String>,
}

impl ExprNode {
    pub fn ident(name: impl Into<String>) -> Self {
        Self { name: Base::Ident(name.into()), index: None, field: None }
    }

    /// The root identifier this whole chain is ultimately rooted in.
    pub fn root_name(&self) -> &str {
        match &self.name {
            Base::Ident(name) => name,
            Base::Nested(inner) => inner.root_name(),
        }
    }

    /// Canonical string form; `format(parse(s)) == s` for any canonical `s`.
    pub fn format(&self) -> String {
        let base = match &self.name {
            Base::Ident(name) => name.clone(),
            Base::Nested(inner) => inner.format(),
        };
        if let Some(field) = &self.field {
            format!("{base}.{field}")
        } else if let Some(index) = &self.index {
            format!("{base}[{}]", index.format())
        } else {
            base
        }
    }
}

fn parse_ident_at(expr: &str, pos: usize) -> Result<(String, usize), ExpressionError> {
    let rest = &expr[pos..];
    let end = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
    if end == 0 {
        return Err(ExpressionErrorKind::TrailingCharacters(expr.to_string()).into());
    }
    Ok((rest[..end].to_string(), pos + end))
}

/// Finds the `]` matching the `[` at `expr[open_pos]`, tracking bracket depth,
/// and returns (inner expression slice, index just past the matching `]`).
fn extract_bracket(expr: &str, open_pos: usize) -> Result<(&str, usize), ExpressionError> {
    debug_assert_eq!(expr.as_bytes()[open_pos], b'[');
    let mut depth = 0i32;
    let bytes = expr.as_bytes();
    let mut i = open_pos;
    while i < bytes.len() {
        match bytes[i] {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&expr[open_pos + 1..i], i + 1));
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(ExpressionErrorKind::UnmatchedBracket(expr.to_string()).into())
}

/// Parses a canonical storage-access expression into its tree form.
pub fn parse(expr: &str) -> Result<ExprNode, ExpressionError> {
    if expr.is_empty() {
        return Err(ExpressionErrorKind::Empty(expr.to_string()).into());
    }
    if expr.starts_with('.') || expr.starts_with('[') {
        return Err(ExpressionErrorKind::LeadingDotOrBracket(expr.to_string()).into());
    }

    let (root, mut pos) = parse_ident_at(expr, 0)?;
    let mut node = ExprNode::ident(root);

    loop {
        match expr[pos..].chars().next() {
            Some('.') => {
                let (field, next_pos) = parse_ident_at(expr, pos + 1)?;
                node = ExprNode { name: Base::Nested(Box::new(node)), index: None, field: Some(field) };
                pos = next_pos;
            }
            Some('[') => {
                let (inner, next_pos) = extract_bracket(expr, pos)?;
                let inner_node = parse(inner)?;
                node = ExprNode { name: Base::Nested(Box::new(node)), index: Some(Box::new(inner_node)), field: None };
                pos = next_pos;
            }
            Some(_) => return Err(ExpressionErrorKind::TrailingCharacters(expr.to_string()).into()),
            None => break,
        }
    }

    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_leading_dot_or_bracket() {
        assert!(parse(".foo").is_err());
        assert!(parse("[foo]").is_err());
    }

    #[test]
    fn rejects_unmatched_bracket() {
        assert!(parse("bal[msg.sender").is_err());
    }

    #[test]
    fn round_trips_dotted_and_indexed_chains() {
        for s in ["bal", "bal[to]", "s.c", "reserves[k].configuration", "m[a][b].x"] {
            let node = parse(s).expect("parses");
            assert_eq!(node.format(), s);
        }
    }

    #[test]
    fn root_name_descends_through_chain() {
        let node = parse("reserves[k].configuration").unwrap();
        assert_eq!(node.root_name(), "reserves");
    }

    #[test]
    fn nested_index_expression_parses_recursively() {
        let node = parse("m[k.sub]").unwrap();
        let index = node.index.as_ref().unwrap();
        assert_eq!(index.format(), "k.sub");
    }
}
