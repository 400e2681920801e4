//! # Match State
//!
//! `MatchResult` is the partial (and, once reported, complete) embedding the
//! matcher grows and shrinks at its tail. `Frontier` is the lock-step list
//! of nodes awaiting extension.
//!
//! Both structures follow stack discipline: entries are only appended or
//! truncated back to an earlier checkpoint, so undoing a tentative step costs
//! one pop per removed entry.

use crate::NodeId;
use rustc_hash::FxHashMap;
use serde::Serialize;

// =============================================================================
// MATCH RESULT
// =============================================================================

/// Injective mapping from pattern nodes to host nodes, in insertion order.
///
/// Composite pattern nodes never appear here; they only scope where their
/// leaves may be found.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    host_root: NodeId,
    entries: Vec<(NodeId, NodeId)>,
    #[serde(skip)]
    forward: FxHashMap<NodeId, NodeId>,
    #[serde(skip)]
    reverse: FxHashMap<NodeId, NodeId>,
}

impl MatchResult {
    /// Empty mapping into the host graph rooted at `host_root`.
    #[must_use]
    pub fn new(host_root: NodeId) -> Self {
        Self {
            host_root,
            entries: Vec::new(),
            forward: FxHashMap::default(),
            reverse: FxHashMap::default(),
        }
    }

    /// Root of the host graph this mapping points into.
    #[must_use]
    pub fn host_root(&self) -> NodeId {
        self.host_root
    }

    /// Record `pattern -> host`.
    ///
    /// Returns `false` and leaves the mapping untouched when either side is
    /// already mapped.
    pub fn insert(&mut self, pattern: NodeId, host: NodeId) -> bool {
        if self.forward.contains_key(&pattern) || self.reverse.contains_key(&host) {
            return false;
        }
        self.entries.push((pattern, host));
        self.forward.insert(pattern, host);
        self.reverse.insert(host, pattern);
        true
    }

    /// Image of a pattern node.
    #[must_use]
    pub fn get(&self, pattern: NodeId) -> Option<NodeId> {
        self.forward.get(&pattern).copied()
    }

    /// Pattern node mapped onto a host node.
    #[must_use]
    pub fn pattern_of(&self, host: NodeId) -> Option<NodeId> {
        self.reverse.get(&host).copied()
    }

    #[must_use]
    pub fn contains_pattern(&self, pattern: NodeId) -> bool {
        self.forward.contains_key(&pattern)
    }

    #[must_use]
    pub fn contains_host(&self, host: NodeId) -> bool {
        self.reverse.contains_key(&host)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry added after the mapping had `len` entries.
    pub fn truncate(&mut self, len: usize) {
        while self.entries.len() > len {
            if let Some((pattern, host)) = self.entries.pop() {
                self.forward.remove(&pattern);
                self.reverse.remove(&host);
            }
        }
    }

    /// `(pattern, host)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.entries.iter().copied()
    }

    /// Host nodes in insertion order.
    pub fn host_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.iter().map(|(_, host)| *host)
    }
}

impl PartialEq for MatchResult {
    fn eq(&self, other: &Self) -> bool {
        self.host_root == other.host_root && self.entries == other.entries
    }
}

impl Eq for MatchResult {}

// =============================================================================
// FRONTIER
// =============================================================================

/// Append-only sequence with checkpoint/truncate undo.
#[derive(Debug, Clone)]
pub struct Frontier<T> {
    items: Vec<T>,
}

impl<T> Default for Frontier<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Frontier<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Current length, to be handed back to `truncate`.
    #[must_use]
    pub fn checkpoint(&self) -> usize {
        self.items.len()
    }

    pub fn truncate(&mut self, checkpoint: usize) {
        self.items.truncate(checkpoint);
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entries from `start` to the end.
    pub fn iter_from(&self, start: usize) -> impl Iterator<Item = &T> {
        self.items.iter().skip(start)
    }
}

/// Half-open range `[start, end)` of host frontier positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub end: usize,
}

/// A pattern frontier entry and the host frontier slice it mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternEntry {
    pub node: NodeId,
    pub window: Window,
}

// =============================================================================
// TESTS
// =============================================================================
