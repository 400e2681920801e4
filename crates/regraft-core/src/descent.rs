//! # Composite Descent
//!
//! Resumable depth-first enumeration of the leaves below a composite.
//!
//! The walk keeps one `Cursor` per nesting level. `next` picks up exactly
//! where the previous call stopped, so backtracking over a deep hierarchy
//! never rescans a subtree it has already passed.

use crate::graph::HierarchicalGraph;
use crate::{NodeId, NodeKind, RegraftError};

/// Position inside one composite's child list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub parent: NodeId,
    pub index: usize,
}

/// Stack of cursors, outermost first.
#[derive(Debug, Clone)]
pub struct Descent {
    stack: Vec<Cursor>,
    max_depth: usize,
}

impl Descent {
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            stack: Vec::new(),
            max_depth,
        }
    }

    /// Restart below `top` and return the first leaf not rejected by
    /// `excluded`.
    pub fn first<G, F>(
        &mut self,
        graph: &G,
        top: NodeId,
        excluded: F,
    ) -> Result<Option<NodeId>, RegraftError>
    where
        G: HierarchicalGraph + ?Sized,
        F: Fn(NodeId) -> bool,
    {
        self.stack.clear();
        self.stack.push(Cursor {
            parent: top,
            index: 0,
        });
        self.scan(graph, excluded)
    }

    /// Step past the leaf returned last and continue the walk.
    pub fn next<G, F>(&mut self, graph: &G, excluded: F) -> Result<Option<NodeId>, RegraftError>
    where
        G: HierarchicalGraph + ?Sized,
        F: Fn(NodeId) -> bool,
    {
        match self.stack.last_mut() {
            Some(cursor) => cursor.index += 1,
            None => return Ok(None),
        }
        self.scan(graph, excluded)
    }

    /// Current nesting depth (0 when exhausted).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn scan<G, F>(&mut self, graph: &G, excluded: F) -> Result<Option<NodeId>, RegraftError>
    where
        G: HierarchicalGraph + ?Sized,
        F: Fn(NodeId) -> bool,
    {
        while let Some(cursor) = self.stack.last().copied() {
            let child = graph.children(cursor.parent)?.get(cursor.index).copied();
            let Some(child) = child else {
                self.stack.pop();
                if let Some(outer) = self.stack.last_mut() {
                    outer.index += 1;
                }
                continue;
            };

            match graph.kind(child)? {
                NodeKind::Leaf if !excluded(child) => return Ok(Some(child)),
                NodeKind::Composite => {
                    if self.stack.len() >= self.max_depth {
                        return Err(RegraftError::SearchLimitExceeded {
                            limit: "max_depth",
                            value: self.max_depth as u64,
                        });
                    }
                    self.stack.push(Cursor {
                        parent: child,
                        index: 0,
                    });
                }
                _ => {
                    if let Some(top) = self.stack.last_mut() {
                        top.index += 1;
                    }
                }
            }
        }
        Ok(None)
    }
}

// =============================================================================
// TESTS
// =============================================================================
