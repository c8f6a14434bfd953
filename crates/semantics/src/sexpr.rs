//! Minimal S-expression reader used to introspect z3's printed AST form.
//!
//! z3's bitvector ASTs implement `Display` by calling into Z3's own
//! pretty-printer, which is stable across bindings versions, so reading that
//! string back is a more robust way to ask "which named constants occur in
//! this expression" and "is this expression an `extract`" than depending on
//! the introspection surface of any one binding version.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sexpr {
    Atom(String),
    List(Vec<Sexpr>),
}

fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in input.chars() {
        match c {
            '(' | ')' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

pub fn parse(input: &str) -> Sexpr {
    let tokens = tokenize(input);
    let mut iter = tokens.into_iter().peekable();
    parse_one(&mut iter)
}

fn parse_one(iter: &mut std::iter::Peekable<std::vec::IntoIter<String>>) -> Sexpr {
    match iter.next() {
        Some(tok) if tok == "(" => {
            let mut items = Vec::new();
            while let Some(peek) = iter.peek() {
                if peek == ")" {
                    iter.next();
                    break;
                }
                items.push(parse_one(iter));
            }
            Sexpr::List(items)
        }
        Some(tok) => Sexpr::Atom(tok),
        None => Sexpr::List(Vec::new()),
    }
}

impl Sexpr {
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Self::Atom(a) => Some(a.as_str()),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Sexpr]> {
        match self {
            Self::List(items) => Some(items),
            Self::Atom(_) => None,
        }
    }

    /// Collects every atom token whose name is in `known`.
    pub fn collect_known_atoms(&self, known: &std::collections::HashSet<String>, out: &mut std::collections::BTreeSet<String>) {
        match self {
            Self::Atom(a) => {
                if known.contains(a) {
                    out.insert(a.clone());
                }
            }
            Self::List(items) => {
                for item in items {
                    item.collect_known_atoms(known, out);
                }
            }
        }
    }

    /// Strips an outer `((_ zero_extend N) inner)`/`((_ sign_extend N) inner)`
    /// wrapper, which z3's bit-vector simplifier adds whenever the result of
    /// an `extract` is widened back up to the ambient bit width.
    pub fn strip_extend(&self) -> &Sexpr {
        let Some(items) = self.as_list() else { return self };
        if items.len() != 2 {
            return self;
        }
        let Some(head) = items[0].as_list() else { return self };
        if head.len() != 3 {
            return self;
        }
        match (head[0].as_atom(), head[1].as_atom()) {
            (Some("_"), Some("zero_extend")) | (Some("_"), Some("sign_extend")) => &items[1],
            _ => self,
        }
    }

    /// Matches `((_ extract HI LO) VAR)` where `VAR` is a bare atom in `known`,
    /// looking through any enclosing zero/sign extension.
    pub fn match_extract_of_symbol(&self, known: &std::collections::HashSet<String>) -> Option<(u32, u32, String)> {
        let this = self.strip_extend();
        let items = this.as_list()?;
        if items.len() != 2 {
            return None;
        }
        let head = items[0].as_list()?;
        if head.len() != 4 {
            return None;
        }
        if head[0].as_atom()? != "_" || head[1].as_atom()? != "extract" {
            return None;
        }
        let hi: u32 = head[2].as_atom()?.parse().ok()?;
        let lo: u32 = head[3].as_atom()?.parse().ok()?;
        let var = items[1].as_atom()?;
        known.contains(var).then(|| (hi, lo, var.to_string()))
    }

    /// Total atom/list node count, used to bound a simplified bitvector
    /// term's size against a resource budget (§7 `ResourceBudget`).
    pub fn node_count(&self) -> usize {
        match self {
            Self::Atom(_) => 1,
            Self::List(items) => 1 + items.iter().map(Self::node_count).sum::<usize>(),
        }
    }
}

/// Parses z3's default bitvector literal printing: `#xHEX` or `#bBINARY`,
/// most-significant digit first.
pub fn parse_bv_literal(text: &str) -> Option<alloy_primitives::U256> {
    if let Some(hex) = text.strip_prefix("#x") {
        return alloy_primitives::U256::from_str_radix(hex, 16).ok();
    }
    if let Some(bin) = text.strip_prefix("#b") {
        return alloy_primitives::U256::from_str_radix(bin, 2).ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_lists() {
        let tree = parse("((_ extract 31 16) x)");
        let items = tree.as_list().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].as_atom(), Some("x"));
    }

    #[test]
    fn matches_extract_pattern() {
        let known: std::collections::HashSet<String> = ["x".to_string()].into_iter().collect();
        let tree = parse("((_ extract 31 16) x)");
        assert_eq!(tree.match_extract_of_symbol(&known), Some((31, 16, "x".to_string())));
    }

    #[test]
    fn matches_extract_wrapped_in_zero_extend() {
        let known: std::collections::HashSet<String> = ["x".to_string()].into_iter().collect();
        let tree = parse("((_ zero_extend 240) ((_ extract 31 16) x))");
        assert_eq!(tree.match_extract_of_symbol(&known), Some((31, 16, "x".to_string())));
    }

    #[test]
    fn parses_hex_and_binary_literals() {
        assert_eq!(parse_bv_literal("#x0f"), Some(alloy_primitives::U256::from(15u8)));
        assert_eq!(parse_bv_literal("#b1010"), Some(alloy_primitives::U256::from(10u8)));
    }
}
