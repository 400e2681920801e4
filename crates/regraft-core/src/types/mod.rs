//! # Core Type Definitions
//!
//! This module contains the vocabulary shared by pattern and host graphs:
//! - Node handles (`NodeId`)
//! - The closed set of node kinds (`NodeKind`)
//! - Port directions (`Direction`)
//! - Error types (`RegraftError`)
//!
//! ## Determinism Guarantees
//!
//! All identifiers implement `Ord` so that every collection keyed by them
//! iterates in a stable order.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Handle of a node inside one graph arena.
///
/// Handles are only meaningful relative to the graph that issued them.
/// Pattern and host graphs use the same handle type but separate arenas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// NODE KINDS
// =============================================================================

/// The four node kinds of a hierarchical graph.
///
/// - `Composite`: container of child nodes, itself nestable
/// - `Leaf`: terminal node with ports and no children
/// - `Port`: owned by exactly one Composite or Leaf
/// - `Relation`: hyperedge joining any number of ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Composite,
    Leaf,
    Port,
    Relation,
}

impl NodeKind {
    /// Lowercase name used in documents and log output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Composite => "composite",
            Self::Leaf => "leaf",
            Self::Port => "port",
            Self::Relation => "relation",
        }
    }

    /// Whether nodes of this kind may own ports.
    #[must_use]
    pub const fn owns_ports(self) -> bool {
        matches!(self, Self::Composite | Self::Leaf)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// PORT DIRECTION
// =============================================================================

/// Direction of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Input,
    Output,
    #[default]
    Undirected,
}

impl Direction {
    /// Whether a pattern port with this direction may be mapped onto a host
    /// port with direction `host`.
    ///
    /// Input requires input, output requires output, undirected takes either.
    #[must_use]
    pub const fn admits(self, host: Direction) -> bool {
        match self {
            Self::Input => matches!(host, Self::Input),
            Self::Output => matches!(host, Self::Output),
            Self::Undirected => true,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the regraft engine.
///
/// Finding no match is not an error. A search that comes back empty
/// returns `Ok` with an empty outcome; only structural, configuration and
/// rewrite failures surface here.
#[derive(Debug, Error)]
pub enum RegraftError {
    /// A criterion or operation references something the pattern does not declare.
    #[error("Invalid pattern graph: {0}")]
    InvalidPatternGraph(String),

    /// The graph adapter cannot classify a node, port or relation.
    #[error("Unresolvable host node: {0}")]
    UnresolvableHostNode(NodeId),

    /// The replacement applier cannot realize an accepted match.
    #[error("Replacement conflict: {0}")]
    ReplacementConflict(String),

    /// The rule or engine configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The search was cancelled through its cancellation token.
    #[error("Search cancelled")]
    Cancelled,

    /// The search exceeded its recursion depth or node budget.
    #[error("Search limit exceeded: {limit} ({value})")]
    SearchLimitExceeded { limit: &'static str, value: u64 },

    /// A document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
