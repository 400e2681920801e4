//! # regraft-core
//!
//! Rule-based pattern matching and rewriting over hierarchical port graphs.
//!
//! A host graph is a tree of composites whose leaves carry ports; relations
//! are hyperedges joining ports across containment levels. A rule's pattern
//! is a small graph of the same shape, annotated with criteria (what a host
//! node must look like) and operations (what to do with it once matched).
//!
//! ## Pipeline
//!
//! ```text
//! RuleEngine -> Matcher(pattern, host) -> MatchResult* -> ReplacementApplier -> host'
//!      ^                                                                          |
//!      +------------------------------ repeat / fixpoint -------------------------+
//! ```
//!
//! ## Architectural Constraints
//!
//! - Pure Rust, synchronous, no I/O
//! - Deterministic enumeration order; randomness only through a seeded generator
//! - The caller's host graph is never mutated in place
//! - Every search is bounded by depth, budget and an optional cancellation token

// =============================================================================
// MODULES
// =============================================================================

pub mod descent;
pub mod graph;
pub mod match_result;
pub mod matcher;
pub mod pattern;
pub mod primitives;
pub mod replacement;
pub mod rule;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Direction, NodeId, NodeKind, RegraftError};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use descent::{Cursor, Descent};
pub use graph::{Graph, HierarchicalGraph, NodeBody, NodeData};
pub use match_result::{Frontier, MatchResult};
pub use matcher::{CancelToken, Matcher, SearchLimits};
pub use pattern::{Criterion, Operand, Operation, Pattern};
pub use replacement::{GraphRewriter, ReplacementApplier, ReplacementSpec};
pub use rule::{Activation, Mode, RuleConfig, RuleEngine, TransformationRule};
