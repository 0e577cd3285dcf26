//! In-memory binary expression trees.
//!
//! Trees are built bottom-up from numeric leaves with [`create_leaf`] and
//! [`combine`], evaluated with [`evaluate`], copied with [`duplicate`] and
//! released with [`destroy`]. Every internal node carries a rendered text form:
//!
//! ```
//! use exprtree::{combine, evaluate, Node, Operation};
//!
//! let sum = combine(Operation::Add, Node::leaf("2", 2.0), Node::leaf("3", 3.0)).unwrap();
//! let product = combine(Operation::Mul, sum, Node::leaf("4", 4.0)).unwrap();
//! assert_eq!(product.text(), "(2+3)*(4)");
//! assert_eq!(evaluate(Some(&product)), 20.0);
//! ```
//!
//! [`ExprArena`] offers the same operations over copyable handles.

pub mod config;
pub mod domain;
pub mod error;
pub mod util;

pub use config::Settings;
pub use domain::{
    combine, create_leaf, destroy, duplicate, evaluate, evaluate_and_cache, print_tree,
    print_tree_to, ArenaView, Attachment, DomainError, DomainResult, DumpOptions, DumpStyle,
    ExprArena, Node, NodeKind, Operation, Rejected, Side,
};
pub use error::{ExprError, ExprResult};
