//! # Replacement
//!
//! The contract between the rule engine and whatever mutates the host graph,
//! plus `GraphRewriter`, the applier for the arena `Graph`.
//!
//! A replacement pass is atomic: every edit is planned and checked first,
//! then committed on a staged copy that replaces the host only when the whole
//! pass succeeded. A conflict leaves the host exactly as it was.

use crate::graph::{Graph, HierarchicalGraph};
use crate::match_result::MatchResult;
use crate::pattern::{Operation, Pattern};
use crate::{NodeId, NodeKind, RegraftError};
use std::collections::BTreeMap;
use tracing::debug;

// =============================================================================
// CONTRACT
// =============================================================================

/// Resolved operations per pattern node, in pattern-node order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementSpec {
    operations: BTreeMap<NodeId, Vec<Operation>>,
}

impl ReplacementSpec {
    /// Take the operations of an already resolved pattern.
    #[must_use]
    pub fn from_pattern(pattern: &Pattern) -> Self {
        Self {
            operations: pattern.all_operations().clone(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.values().all(Vec::is_empty)
    }

    /// `(pattern node, operations)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &[Operation])> {
        self.operations
            .iter()
            .map(|(node, ops)| (*node, ops.as_slice()))
    }
}

/// Performs host mutations for accepted matches.
pub trait ReplacementApplier {
    /// The host graph representation this applier rewrites.
    type Host: HierarchicalGraph + Clone;

    /// Apply the operations of one match.
    fn apply(
        &mut self,
        host: &mut Self::Host,
        result: &MatchResult,
        spec: &ReplacementSpec,
    ) -> Result<(), RegraftError>;

    /// Apply the operations of every match as one simultaneous pass.
    fn apply_all(
        &mut self,
        host: &mut Self::Host,
        results: &[MatchResult],
        spec: &ReplacementSpec,
    ) -> Result<(), RegraftError>;
}

// =============================================================================
// GRAPH REWRITER
// =============================================================================

/// One planned host mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Edit {
    Delete,
    SetAttribute(String, String),
    RemoveAttribute(String),
    SetClass(String),
    SetName(String),
}

/// Applier for the arena `Graph`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphRewriter;

impl GraphRewriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Translate one match into per-host-node edit lists.
    fn plan_match(
        host: &Graph,
        result: &MatchResult,
        spec: &ReplacementSpec,
    ) -> Result<BTreeMap<NodeId, Vec<Edit>>, RegraftError> {
        if result.host_root() != host.root() {
            return Err(RegraftError::ReplacementConflict(format!(
                "match was taken against host root {}, not {}",
                result.host_root(),
                host.root()
            )));
        }

        let mut plan: BTreeMap<NodeId, Vec<Edit>> = BTreeMap::new();
        for (pattern_node, operations) in spec.iter() {
            if operations.is_empty() {
                continue;
            }
            let target = result.get(pattern_node).ok_or_else(|| {
                RegraftError::ReplacementConflict(format!(
                    "pattern node {} has operations but no image",
                    pattern_node
                ))
            })?;
            if !host.contains(target) {
                return Err(RegraftError::ReplacementConflict(format!(
                    "host node {} no longer exists",
                    target
                )));
            }
            let kind = host.kind(target)?;
            let edits = plan.entry(target).or_default();
            for operation in operations {
                edits.push(Self::plan_operation(operation, target, kind)?);
            }
        }
        Ok(plan)
    }

    fn plan_operation(
        operation: &Operation,
        target: NodeId,
        kind: NodeKind,
    ) -> Result<Edit, RegraftError> {
        if !operation.applies_to(kind) {
            return Err(RegraftError::ReplacementConflict(format!(
                "{:?} cannot be applied to {} ({})",
                operation, target, kind
            )));
        }
        Ok(match operation {
            Operation::Delete => Edit::Delete,
            Operation::SetAttribute { key, value } => {
                Edit::SetAttribute(key.clone(), value.value()?.to_string())
            }
            Operation::RemoveAttribute(key) => Edit::RemoveAttribute(key.clone()),
            Operation::Retype(class) => Edit::SetClass(class.value()?.to_string()),
            Operation::Rename(name) => Edit::SetName(name.value()?.to_string()),
        })
    }

    /// Commit non-destructive edits first, then deletions.
    ///
    /// A node already removed together with a deleted ancestor is skipped.
    fn commit(host: &mut Graph, plan: &BTreeMap<NodeId, Vec<Edit>>) -> Result<(), RegraftError> {
        let mut doomed = Vec::new();
        for (node, edits) in plan {
            for edit in edits {
                match edit {
                    Edit::Delete => doomed.push(*node),
                    Edit::SetAttribute(key, value) => {
                        host.set_attribute(*node, key.clone(), value.clone())?;
                    }
                    Edit::RemoveAttribute(key) => {
                        host.remove_attribute(*node, key)?;
                    }
                    Edit::SetClass(class) => host.set_class(*node, class.clone())?,
                    Edit::SetName(name) => host.set_name(*node, name.clone())?,
                }
            }
        }
        for node in doomed {
            if host.contains(node) {
                host.remove_node(node)?;
            }
        }
        Ok(())
    }
}

impl ReplacementApplier for GraphRewriter {
    type Host = Graph;

    fn apply(
        &mut self,
        host: &mut Graph,
        result: &MatchResult,
        spec: &ReplacementSpec,
    ) -> Result<(), RegraftError> {
        self.apply_all(host, std::slice::from_ref(result), spec)
    }

    fn apply_all(
        &mut self,
        host: &mut Graph,
        results: &[MatchResult],
        spec: &ReplacementSpec,
    ) -> Result<(), RegraftError> {
        let mut merged: BTreeMap<NodeId, Vec<Edit>> = BTreeMap::new();
        for (index, result) in results.iter().enumerate() {
            for (node, edits) in Self::plan_match(host, result, spec)? {
                match merged.get(&node) {
                    None => {
                        merged.insert(node, edits);
                    }
                    Some(existing) if *existing == edits => {}
                    Some(_) => {
                        return Err(RegraftError::ReplacementConflict(format!(
                            "match {} edits host node {} differently from an earlier match",
                            index, node
                        )));
                    }
                }
            }
        }

        let mut staged = host.clone();
        Self::commit(&mut staged, &merged)?;
        *host = staged;

        debug!(
            matches = results.len(),
            edited_nodes = merged.len(),
            "replacement committed"
        );
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
