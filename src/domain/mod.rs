//! Domain layer: expression trees and their algorithms
//!
//! This layer is independent of external concerns (no config loading, no
//! subscriber setup). Debug dumps write to any `io::Write`.

pub mod arena;
pub mod display;
pub mod error;
pub mod node;
pub mod operation;
pub mod render;

pub use arena::{ArenaKind, ArenaNode, ExprArena};
pub use display::{
    format_general, print_tree, print_tree_to, write_arena_dump, write_dump, ArenaView,
    DumpOptions, DumpStyle, TreeNodeConvert,
};
pub use error::{DomainError, DomainResult, Side};
pub use node::{
    combine, create_leaf, destroy, duplicate, evaluate, evaluate_and_cache, Attachment, Node,
    NodeKind, Rejected,
};
pub use operation::Operation;
