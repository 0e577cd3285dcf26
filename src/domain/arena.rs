//! Handle-based expression forest.
//!
//! Nodes live in a generational arena and are addressed by [`Index`]. Unlike
//! the owned [`Node`] tree, handles stay copyable after a combination, so the
//! single-parent rule is enforced at runtime and a handle to a destroyed node
//! is reported as stale instead of dangling.

use std::fmt;

use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::domain::display::ArenaView;
use crate::domain::error::{DomainError, DomainResult, Side};
use crate::domain::node::{Attachment, Node, NodeKind};
use crate::domain::operation::Operation;
use crate::domain::render::{copy_text, render};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArenaKind {
    Leaf,
    Internal {
        op: Operation,
        left: Index,
        right: Index,
    },
}

/// Node stored in the arena.
#[derive(Debug, Clone)]
pub struct ArenaNode {
    /// Leaf literal or rendered expression
    pub text: String,
    /// Leaf value, or the cached result of the last evaluation
    pub value: f64,
    pub attachment: Attachment,
    pub kind: ArenaKind,
}

impl ArenaNode {
    pub fn is_leaf(&self) -> bool {
        self.kind == ArenaKind::Leaf
    }

    fn children(&self) -> Option<(Index, Index)> {
        match self.kind {
            ArenaKind::Leaf => None,
            ArenaKind::Internal { left, right, .. } => Some((left, right)),
        }
    }
}

impl fmt::Display for ArenaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Arena holding any number of expression trees.
#[derive(Debug)]
pub struct ExprArena {
    arena: Arena<ArenaNode>,
}

impl Default for ExprArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
        }
    }

    /// Number of live nodes across all trees.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, idx: Index) -> bool {
        self.arena.contains(idx)
    }

    #[instrument(level = "trace", skip(self, label))]
    pub fn create_leaf(&mut self, label: impl Into<String>, value: f64) -> Index {
        self.arena.insert(ArenaNode {
            text: label.into(),
            value,
            attachment: Attachment::Detached,
            kind: ArenaKind::Leaf,
        })
    }

    pub fn get(&self, idx: Index) -> Option<&ArenaNode> {
        self.arena.get(idx)
    }

    pub fn text(&self, idx: Index) -> DomainResult<&str> {
        Ok(&self.node(idx)?.text)
    }

    /// View of the tree under `root`; renders through
    /// [`TreeNodeConvert`](crate::domain::TreeNodeConvert).
    pub fn view(&self, root: Index) -> ArenaView<'_> {
        ArenaView { arena: self, root }
    }

    fn node(&self, idx: Index) -> DomainResult<&ArenaNode> {
        self.arena.get(idx).ok_or(DomainError::StaleHandle(idx))
    }

    fn node_mut(&mut self, idx: Index) -> DomainResult<&mut ArenaNode> {
        self.arena.get_mut(idx).ok_or(DomainError::StaleHandle(idx))
    }

    /// Combine two detached nodes under `op`.
    ///
    /// Fails without touching either operand when one of them already has a
    /// parent, or when both handles name the same node.
    #[instrument(level = "debug", skip(self))]
    pub fn combine(&mut self, op: Operation, left: Index, right: Index) -> DomainResult<Index> {
        let (l, r) = (self.node(left)?, self.node(right)?);
        let attached = if l.attachment == Attachment::Attached {
            Some((Side::Left, l))
        } else if r.attachment == Attachment::Attached || left == right {
            Some((Side::Right, r))
        } else {
            None
        };
        if let Some((side, node)) = attached {
            let error = DomainError::AlreadyAttached {
                side,
                text: node.text.clone(),
            };
            debug!(%error, "combination rejected");
            return Err(error);
        }

        let text = render(op, &l.text, &r.text)?;
        let idx = self.arena.insert(ArenaNode {
            text,
            value: 0.0,
            attachment: Attachment::Detached,
            kind: ArenaKind::Internal { op, left, right },
        });
        self.node_mut(left)?.attachment = Attachment::Attached;
        self.node_mut(right)?.attachment = Attachment::Attached;
        Ok(idx)
    }

    /// Evaluate the tree under `root`, caching results in internal nodes.
    ///
    /// An absent root evaluates to `0.0`.
    #[instrument(level = "debug", skip(self))]
    pub fn evaluate(&mut self, root: Option<Index>) -> DomainResult<f64> {
        match root {
            None => Ok(0.0),
            Some(idx) => self.refresh(idx),
        }
    }

    fn refresh(&mut self, idx: Index) -> DomainResult<f64> {
        let kind = self.node(idx)?.kind;
        if let ArenaKind::Internal { op, left, right } = kind {
            let (l, r) = (self.refresh(left)?, self.refresh(right)?);
            self.node_mut(idx)?.value = op.apply(l, r);
        }
        Ok(self.node(idx)?.value)
    }

    /// Deep copy of the tree under `root` into fresh nodes of this arena.
    ///
    /// Attachment states are copied from the source nodes.
    #[instrument(level = "debug", skip(self))]
    pub fn duplicate(&mut self, root: Option<Index>) -> DomainResult<Option<Index>> {
        root.map(|idx| self.duplicate_subtree(idx)).transpose()
    }

    fn duplicate_subtree(&mut self, idx: Index) -> DomainResult<Index> {
        let source = self.node(idx)?;
        let text = copy_text(&source.text)?;
        let (value, attachment, kind) = (source.value, source.attachment, source.kind);

        let kind = match kind {
            ArenaKind::Leaf => ArenaKind::Leaf,
            ArenaKind::Internal { op, left, right } => {
                let left = self.duplicate_subtree(left)?;
                let right = match self.duplicate_subtree(right) {
                    Ok(right) => right,
                    Err(e) => {
                        self.release(left);
                        return Err(e);
                    }
                };
                ArenaKind::Internal { op, left, right }
            }
        };
        Ok(self.arena.insert(ArenaNode {
            text,
            value,
            attachment,
            kind,
        }))
    }

    /// Remove the tree under `root` from the arena, children first.
    ///
    /// Returns the number of nodes released. A node held by a parent is
    /// refused; it is released together with that parent.
    #[instrument(level = "debug", skip(self))]
    pub fn destroy(&mut self, root: Option<Index>) -> DomainResult<usize> {
        match root {
            None => Ok(0),
            Some(idx) => {
                self.detached_root(idx)?;
                Ok(self.release(idx))
            }
        }
    }

    /// Fails if another node holds `idx` as a child. A duplicated child keeps
    /// its attached flag but has no parent, so the flag is not consulted.
    fn detached_root(&self, idx: Index) -> DomainResult<()> {
        let node = self.node(idx)?;
        let held = self.arena.iter().any(|(_, other)| match other.kind {
            ArenaKind::Internal { left, right, .. } => left == idx || right == idx,
            ArenaKind::Leaf => false,
        });
        if held {
            let error = DomainError::HasParent {
                text: node.text.clone(),
            };
            debug!(%error, "removal rejected");
            return Err(error);
        }
        Ok(())
    }

    fn release(&mut self, idx: Index) -> usize {
        let children = match self.arena.get(idx) {
            Some(node) => node.children(),
            None => return 0,
        };
        let released =
            children.map_or(0, |(left, right)| self.release(left) + self.release(right));
        self.arena.remove(idx);
        released + 1
    }

    /// Move the tree under `root` out of the arena into an owned [`Node`].
    ///
    /// `root` must not be held by a parent. Nothing is removed unless the
    /// whole subtree could be copied.
    #[instrument(level = "debug", skip(self))]
    pub fn extract(&mut self, root: Index) -> DomainResult<Node> {
        self.detached_root(root)?;
        let tree = self.to_owned_tree(root)?;
        self.release(root);
        Ok(tree)
    }

    fn to_owned_tree(&self, idx: Index) -> DomainResult<Node> {
        let node = self.node(idx)?;
        let kind = match node.kind {
            ArenaKind::Leaf => NodeKind::Leaf,
            ArenaKind::Internal { op, left, right } => NodeKind::Internal {
                op,
                left: Box::new(self.to_owned_tree(left)?),
                right: Box::new(self.to_owned_tree(right)?),
            },
        };
        Ok(Node::from_parts(
            copy_text(&node.text)?,
            node.value,
            node.attachment,
            kind,
        ))
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self, root: Index) -> TreeIterator<'_> {
        TreeIterator::new(self, root)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter_postorder(&self, root: Index) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self, root)
    }

    /// Height of the tree under `root`; 0 for a stale handle.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self, root: Index) -> usize {
        match self.get(root) {
            Some(node) => {
                1 + node
                    .children()
                    .map_or(0, |(left, right)| self.depth(left).max(self.depth(right)))
            }
            None => 0,
        }
    }

    /// Leaf labels under `root`, left to right.
    pub fn leaf_labels(&self, root: Index) -> Vec<&str> {
        self.iter(root)
            .filter(|(_, node)| node.is_leaf())
            .map(|(_, node)| node.text.as_str())
            .collect()
    }
}

pub struct TreeIterator<'a> {
    arena: &'a ExprArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a ExprArena, root: Index) -> Self {
        Self {
            arena,
            stack: vec![root],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a ArenaNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get(current_idx) {
                // Right first for left-to-right traversal
                if let Some((left, right)) = node.children() {
                    self.stack.push(right);
                    self.stack.push(left);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a ExprArena,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a ExprArena, root: Index) -> Self {
        Self {
            arena,
            stack: vec![(root, false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a ArenaNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get(current_idx) {
                match node.children() {
                    Some((left, right)) if !visited => {
                        self.stack.push((current_idx, true));
                        self.stack.push((right, false));
                        self.stack.push((left, false));
                    }
                    _ => return Some((current_idx, node)),
                }
            }
        }
        None
    }
}
