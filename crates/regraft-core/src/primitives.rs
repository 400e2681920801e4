//! # Engine Primitives
//!
//! Compiled-in bounds and defaults for the regraft engine.
//!
//! Every search and every rule activation is computationally bounded; these
//! are the values used when a configuration does not say otherwise.

/// Maximum recursion depth of a single match search.
///
/// - Bounds the search call stack and the composite nesting a descent may enter.
/// - Adversarially deep hierarchies fail with `SearchLimitExceeded` instead of
///   overflowing the stack.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Maximum number of candidate attempts in a single match search.
pub const DEFAULT_NODE_BUDGET: u64 = 1_000_000;

/// Number of replacement passes a rule runs when no count is configured.
pub const DEFAULT_REPEAT_COUNT: u32 = 1;

/// Upper bound on passes of a fixpoint loop.
///
/// A rule whose rewrite never removes its own match would otherwise loop
/// forever.
pub const DEFAULT_MAX_PASSES: u32 = 10_000;

// =============================================================================
// DOCUMENT LIMITS
// =============================================================================

/// Maximum number of nodes a graph document may declare.
pub const MAX_DOCUMENT_NODES: usize = 100_000;

/// Maximum nesting of composites in a graph document.
pub const MAX_DOCUMENT_DEPTH: usize = 256;
