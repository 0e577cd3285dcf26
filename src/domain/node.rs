//! Owned expression tree.
//!
//! Every internal node exclusively owns its two children. Combining two roots
//! moves them into the new node, so a consumed operand can no longer be used
//! as a root. The attachment flag is kept for diagnostics and for the
//! duplicate-of-a-child case, where it is the only guard left.

use std::fmt;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult, Side};
use crate::domain::operation::Operation;
use crate::domain::render::{copy_text, render};

/// Whether a node has been consumed as the child of an internal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Attachment {
    #[default]
    Detached,
    Attached,
}

impl Attachment {
    /// Number of parents, as shown in debug dumps.
    pub fn count(self) -> u8 {
        match self {
            Attachment::Detached => 0,
            Attachment::Attached => 1,
        }
    }
}

#[derive(Debug)]
pub enum NodeKind {
    Leaf,
    Internal {
        op: Operation,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Leaf constant or operator applied to two owned subtrees.
#[derive(Debug)]
pub struct Node {
    /// Caller-supplied literal for leaves, rendered expression for internal nodes
    text: String,
    /// Leaf value, or the cached result of the last `refresh` for internal nodes
    value: f64,
    attachment: Attachment,
    kind: NodeKind,
}

/// A refused combination. Both operands are handed back unchanged.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct Rejected {
    #[source]
    pub error: DomainError,
    pub left: Node,
    pub right: Node,
}

impl Rejected {
    pub fn into_operands(self) -> (Node, Node) {
        (self.left, self.right)
    }
}

impl Node {
    /// Create a leaf, taking ownership of the label.
    pub fn leaf(label: impl Into<String>, value: f64) -> Self {
        Self {
            text: label.into(),
            value,
            attachment: Attachment::Detached,
            kind: NodeKind::Leaf,
        }
    }

    pub(crate) fn from_parts(
        text: String,
        value: f64,
        attachment: Attachment,
        kind: NodeKind,
    ) -> Self {
        Self {
            text,
            value,
            attachment,
            kind,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Leaf value, or the value cached by the last [`Node::refresh`].
    ///
    /// Internal nodes report `0.0` until refreshed.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn operation(&self) -> Option<Operation> {
        match &self.kind {
            NodeKind::Leaf => None,
            NodeKind::Internal { op, .. } => Some(*op),
        }
    }

    pub fn left(&self) -> Option<&Node> {
        self.children().map(|(left, _)| left)
    }

    pub fn right(&self) -> Option<&Node> {
        self.children().map(|(_, right)| right)
    }

    pub fn children(&self) -> Option<(&Node, &Node)> {
        match &self.kind {
            NodeKind::Leaf => None,
            NodeKind::Internal { left, right, .. } => Some((left.as_ref(), right.as_ref())),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf)
    }

    pub fn attachment(&self) -> Attachment {
        self.attachment
    }

    pub fn is_attached(&self) -> bool {
        self.attachment == Attachment::Attached
    }

    /// Evaluate without touching cached values.
    pub fn evaluate(&self) -> f64 {
        match &self.kind {
            NodeKind::Leaf => self.value,
            NodeKind::Internal { op, left, right } => op.apply(left.evaluate(), right.evaluate()),
        }
    }

    /// Evaluate from scratch and store the result in every internal node.
    pub fn refresh(&mut self) -> f64 {
        if let NodeKind::Internal { op, left, right } = &mut self.kind {
            let (l, r) = (left.refresh(), right.refresh());
            self.value = op.apply(l, r);
        }
        self.value
    }

    /// Deep copy with freshly allocated texts.
    ///
    /// The attachment state is copied from the source, so duplicating a node
    /// reached through [`Node::left`] or [`Node::right`] yields an attached
    /// root that [`combine`] refuses.
    pub fn duplicate(&self) -> DomainResult<Node> {
        let kind = match &self.kind {
            NodeKind::Leaf => NodeKind::Leaf,
            NodeKind::Internal { op, left, right } => NodeKind::Internal {
                op: *op,
                left: Box::new(left.duplicate()?),
                right: Box::new(right.duplicate()?),
            },
        };
        Ok(Node {
            text: copy_text(&self.text)?,
            value: self.value,
            attachment: self.attachment,
            kind,
        })
    }

    /// Height of the tree; a single leaf has depth 1.
    pub fn depth(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf => 1,
            NodeKind::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Leaf labels, left to right.
    pub fn leaf_labels(&self) -> Vec<&str> {
        self.iter()
            .filter(|node| node.is_leaf())
            .map(|node| node.text())
            .collect()
    }

    /// Pre-order traversal: node, left subtree, right subtree.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    pub fn iter_postorder(&self) -> PostOrderIter<'_> {
        PostOrderIter {
            stack: vec![(self, false)],
        }
    }

    fn teardown(self) -> usize {
        let Node { text, kind, .. } = self;
        let released = match kind {
            NodeKind::Leaf => 0,
            NodeKind::Internal { left, right, .. } => (*left).teardown() + (*right).teardown(),
        };
        drop(text);
        released + 1
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Create a leaf from a borrowed label, copying it.
pub fn create_leaf(label: &str, value: f64) -> DomainResult<Node> {
    Ok(Node::leaf(copy_text(label)?, value))
}

/// Combine two detached roots under `op`.
///
/// On success both operands become attached children of the returned node,
/// whose cached value is `0.0` until refreshed. If either operand is already
/// attached (left is checked first) or the text cannot be allocated, neither
/// operand is modified and both come back inside [`Rejected`].
#[instrument(level = "debug", skip(left, right), fields(lhs = %left.text, rhs = %right.text))]
pub fn combine(op: Operation, mut left: Node, mut right: Node) -> Result<Node, Rejected> {
    let attached = [(Side::Left, &left), (Side::Right, &right)]
        .into_iter()
        .find(|(_, node)| node.is_attached())
        .map(|(side, node)| DomainError::AlreadyAttached {
            side,
            text: node.text.clone(),
        });
    if let Some(error) = attached {
        debug!(%error, "combination rejected");
        return Err(Rejected { error, left, right });
    }

    let text = match render(op, &left.text, &right.text) {
        Ok(text) => text,
        Err(error) => return Err(Rejected { error, left, right }),
    };

    left.attachment = Attachment::Attached;
    right.attachment = Attachment::Attached;
    Ok(Node {
        text,
        value: 0.0,
        attachment: Attachment::Detached,
        kind: NodeKind::Internal {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
    })
}

/// Evaluate a possibly absent tree; an absent tree evaluates to `0.0`.
pub fn evaluate(root: Option<&Node>) -> f64 {
    root.map_or(0.0, Node::evaluate)
}

/// Like [`evaluate`], but caches intermediate results in the tree.
pub fn evaluate_and_cache(root: Option<&mut Node>) -> f64 {
    root.map_or(0.0, Node::refresh)
}

pub fn duplicate(root: Option<&Node>) -> DomainResult<Option<Node>> {
    root.map(Node::duplicate).transpose()
}

/// Release every node of the tree, children before parents.
///
/// Returns the number of nodes released.
#[instrument(level = "trace", skip(root))]
pub fn destroy(root: Option<Node>) -> usize {
    root.map_or(0, Node::teardown)
}

pub struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        if let NodeKind::Internal { left, right, .. } = &node.kind {
            // Right first so the left subtree is visited first
            self.stack.push(right.as_ref());
            self.stack.push(left.as_ref());
        }
        Some(node)
    }
}

pub struct PostOrderIter<'a> {
    stack: Vec<(&'a Node, bool)>,
}

impl<'a> Iterator for PostOrderIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, visited)) = self.stack.pop() {
            match &node.kind {
                NodeKind::Internal { left, right, .. } if !visited => {
                    self.stack.push((node, true));
                    self.stack.push((right.as_ref(), false));
                    self.stack.push((left.as_ref(), false));
                }
                _ => return Some(node),
            }
        }
        None
    }
}
