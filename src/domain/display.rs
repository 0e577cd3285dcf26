//! Diagnostic rendering of expression trees.
//!
//! Two styles: the flat pre-order dump listing text, cached value and parent
//! count of every node, and a box-drawing tree built with `termtree`.

use std::io::{self, Write};

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use termtree::Tree;
use tracing::{instrument, warn};

use crate::domain::arena::{ArenaKind, ExprArena};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::node::Node;

pub const DEFAULT_PRECISION: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DumpStyle {
    #[default]
    Flat,
    Tree,
}

/// How debug dumps are rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpOptions {
    pub style: DumpStyle,
    /// Significant digits for values
    pub precision: usize,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            style: DumpStyle::Flat,
            precision: DEFAULT_PRECISION,
        }
    }
}

/// Format a value the way C's `%g` does with the given precision.
///
/// Fixed notation unless the decimal exponent is below -4 or at least
/// `precision`; trailing zeros are dropped in both notations.
pub fn format_general(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

fn write_entry<W: Write>(
    out: &mut W,
    text: &str,
    value: f64,
    parents: u8,
    precision: usize,
) -> io::Result<()> {
    writeln!(out, " Node")?;
    writeln!(out, "    expr_string = {}", text)?;
    writeln!(out, "    value       = {}", format_general(value, precision))?;
    writeln!(out, "    num_parents = {}", parents)
}

fn label(text: &str, value: f64, precision: usize) -> String {
    format!("{} = {}", text, format_general(value, precision))
}

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for Node {
    fn to_tree_string(&self) -> Tree<String> {
        node_tree(self, DEFAULT_PRECISION)
    }
}

fn node_tree(node: &Node, precision: usize) -> Tree<String> {
    let root = Tree::new(label(node.text(), node.value(), precision));
    match node.children() {
        Some((left, right)) => {
            root.with_leaves([node_tree(left, precision), node_tree(right, precision)])
        }
        None => root,
    }
}

/// Arena tree addressed by its root handle.
#[derive(Debug, Clone, Copy)]
pub struct ArenaView<'a> {
    pub arena: &'a ExprArena,
    pub root: Index,
}

impl TreeNodeConvert for ArenaView<'_> {
    #[instrument(level = "trace", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        arena_tree(self.arena, self.root, DEFAULT_PRECISION)
            .unwrap_or_else(|_| Tree::new("Stale handle".to_string()))
    }
}

fn arena_tree(arena: &ExprArena, root: Index, precision: usize) -> DomainResult<Tree<String>> {
    let node = arena.get(root).ok_or(DomainError::StaleHandle(root))?;
    let mut tree = Tree::new(label(&node.text, node.value, precision));
    if let ArenaKind::Internal { left, right, .. } = node.kind {
        tree.push(arena_tree(arena, left, precision)?);
        tree.push(arena_tree(arena, right, precision)?);
    }
    Ok(tree)
}

/// Write a debug dump of `root` to `out`. An absent root writes nothing.
#[instrument(level = "trace", skip(root, out))]
pub fn write_dump<W: Write>(
    root: Option<&Node>,
    options: &DumpOptions,
    out: &mut W,
) -> io::Result<()> {
    let Some(root) = root else {
        return Ok(());
    };
    match options.style {
        DumpStyle::Flat => {
            for node in root.iter() {
                write_entry(
                    out,
                    node.text(),
                    node.value(),
                    node.attachment().count(),
                    options.precision,
                )?;
            }
            Ok(())
        }
        DumpStyle::Tree => write!(out, "{}", node_tree(root, options.precision)),
    }
}

/// Write a debug dump of the arena tree under `root` to `out`.
#[instrument(level = "trace", skip(arena, out))]
pub fn write_arena_dump<W: Write>(
    arena: &ExprArena,
    root: Option<Index>,
    options: &DumpOptions,
    out: &mut W,
) -> io::Result<()> {
    let Some(root) = root else {
        return Ok(());
    };
    match options.style {
        DumpStyle::Flat => {
            for (_, node) in arena.iter(root) {
                write_entry(
                    out,
                    &node.text,
                    node.value,
                    node.attachment.count(),
                    options.precision,
                )?;
            }
            Ok(())
        }
        DumpStyle::Tree => {
            let tree = arena_tree(arena, root, options.precision)
                .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e))?;
            write!(out, "{}", tree)
        }
    }
}

/// Print the flat debug dump of `root` to stdout.
pub fn print_tree(root: Option<&Node>) {
    let stdout = io::stdout();
    print_tree_to(root, &mut stdout.lock());
}

/// Like [`print_tree`], writing to `out`. Write errors are logged, not returned.
pub fn print_tree_to<W: Write>(root: Option<&Node>, out: &mut W) {
    if let Err(e) = write_dump(root, &DumpOptions::default(), out) {
        warn!(error = %e, "failed to print expression tree");
    }
}
