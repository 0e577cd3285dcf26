//! Text rendering for internal nodes.

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::operation::Operation;

/// Render the text of an internal node from its operands' texts.
///
/// `+`/`-` join the operands bare, `*`/`/` always parenthesize both,
/// leaves and already-wrapped sub-expressions alike.
pub fn render(op: Operation, left: &str, right: &str) -> DomainResult<String> {
    let mut buf = [0u8; 4];
    let symbol: &str = op.symbol().encode_utf8(&mut buf);
    if op.wraps_operands() {
        concat(&["(", left, ")", symbol, "(", right, ")"])
    } else {
        concat(&[left, symbol, right])
    }
}

/// Fallible copy of a text representation.
pub fn copy_text(text: &str) -> DomainResult<String> {
    concat(&[text])
}

fn concat(parts: &[&str]) -> DomainResult<String> {
    let len: usize = parts.iter().map(|p| p.len()).sum();
    let mut out = String::new();
    out.try_reserve_exact(len)
        .map_err(|source| DomainError::Allocation {
            context: "rendering expression text",
            source,
        })?;
    for part in parts {
        out.push_str(part);
    }
    Ok(out)
}
