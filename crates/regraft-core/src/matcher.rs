//! # Matcher
//!
//! Backtracking subgraph-isomorphism search of a `Pattern` inside a host
//! `HierarchicalGraph`.
//!
//! ## Search Shape
//!
//! Pattern and host frontiers grow in lock-step. Each pattern frontier entry
//! carries the window of host frontier positions pushed in the same step; a
//! pattern node may only be mapped onto a host node from its window.
//!
//! - Leaf: candidates must be leaves; pushes its unmatched ports.
//! - Port: direction must be admitted; pushes its unmatched relations.
//! - Relation: pushes the containers of its unmatched linked ports.
//! - Composite: never mapped itself. It is opened onto a host composite and
//!   its leaves are found by resumable descent into the host composite.
//!
//! When the frontier runs dry the most recently opened composite that still
//! has an unmatched leaf is descended again, so disconnected pattern
//! components are found. An embedding is reported only when no open
//! composite has leaves left.
//!
//! Containment holds whatever order the pattern lists its children in: a
//! leaf or composite lands strictly inside the image of its nearest open
//! pattern ancestor, and a composite is only opened (or settled vacuously)
//! onto a host composite enclosing everything already matched below it.
//!
//! ## Bounds
//!
//! Every step checks the cancellation token, the recursion depth and the
//! attempt budget. Exceeding a bound is an error, not an empty result.

use crate::descent::Descent;
use crate::graph::HierarchicalGraph;
use crate::match_result::{Frontier, MatchResult, PatternEntry, Window};
use crate::pattern::Pattern;
use crate::primitives::{DEFAULT_MAX_DEPTH, DEFAULT_NODE_BUDGET};
use crate::{NodeId, NodeKind, RegraftError};
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

// =============================================================================
// LIMITS & CANCELLATION
// =============================================================================

/// Bounds applied to a single search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchLimits {
    /// Maximum recursion depth, also the deepest composite nesting a descent enters.
    pub max_depth: usize,
    /// Maximum number of candidate attempts.
    pub node_budget: u64,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            node_budget: DEFAULT_NODE_BUDGET,
        }
    }
}

/// Shared flag that stops a running search at its next step.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

// =============================================================================
// MATCHER
// =============================================================================

/// Entry point of the search.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    limits: SearchLimits,
    cancel: Option<CancelToken>,
}

impl Matcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    #[must_use]
    pub fn limits(&self) -> SearchLimits {
        self.limits
    }

    /// Enumerate embeddings of `pattern` in `host`.
    ///
    /// `on_match` is called once per embedding in discovery order; returning
    /// `false` stops the search. Returns the number of embeddings reported.
    pub fn match_with<H, F>(
        &self,
        pattern: &Pattern,
        host: &H,
        on_match: F,
    ) -> Result<usize, RegraftError>
    where
        H: HierarchicalGraph + ?Sized,
        F: FnMut(&MatchResult) -> bool,
    {
        let pattern_root = pattern.graph().root();
        if pattern.graph().kind(pattern_root)? != NodeKind::Composite {
            return Err(RegraftError::InvalidPatternGraph(
                "pattern root must be a composite".to_string(),
            ));
        }

        let host_root = host.root();
        debug!(
            pattern_nodes = pattern.graph().node_count(),
            host_root = %host_root,
            "match started"
        );

        let mut search = Search {
            pattern,
            host,
            limits: self.limits,
            cancel: self.cancel.as_ref(),
            result: MatchResult::new(host_root),
            pattern_frontier: Frontier::new(),
            host_frontier: Frontier::new(),
            open: Vec::new(),
            on_match,
            reported: 0,
            attempts: 0,
            depth: 0,
        };
        search.host_frontier.push(host_root);
        search.pattern_frontier.push(PatternEntry {
            node: pattern_root,
            window: Window { start: 0, end: 1 },
        });

        let _ = search.search(0)?;

        debug!(
            reported = search.reported,
            attempts = search.attempts,
            "match finished"
        );
        Ok(search.reported)
    }

    /// First embedding in discovery order.
    pub fn find_first<H>(
        &self,
        pattern: &Pattern,
        host: &H,
    ) -> Result<Option<MatchResult>, RegraftError>
    where
        H: HierarchicalGraph + ?Sized,
    {
        let mut found = None;
        self.match_with(pattern, host, |result| {
            found = Some(result.clone());
            false
        })?;
        Ok(found)
    }

    /// Every embedding, in discovery order.
    pub fn find_all<H>(&self, pattern: &Pattern, host: &H) -> Result<Vec<MatchResult>, RegraftError>
    where
        H: HierarchicalGraph + ?Sized,
    {
        let mut found = Vec::new();
        self.match_with(pattern, host, |result| {
            found.push(result.clone());
            true
        })?;
        Ok(found)
    }

    /// Whether at least one embedding exists.
    pub fn exists<H>(&self, pattern: &Pattern, host: &H) -> Result<bool, RegraftError>
    where
        H: HierarchicalGraph + ?Sized,
    {
        Ok(self.match_with(pattern, host, |_| false)? > 0)
    }
}

// =============================================================================
// SEARCH STATE
// =============================================================================

/// Per-call search state, discarded on return.
struct Search<'a, H: ?Sized, F> {
    pattern: &'a Pattern,
    host: &'a H,
    limits: SearchLimits,
    cancel: Option<&'a CancelToken>,
    result: MatchResult,
    pattern_frontier: Frontier<PatternEntry>,
    host_frontier: Frontier<NodeId>,
    /// Composites opened so far, `(pattern, host)`, innermost last.
    open: Vec<(NodeId, NodeId)>,
    on_match: F,
    reported: usize,
    attempts: u64,
    depth: usize,
}

type Flow = ControlFlow<()>;

impl<H, F> Search<'_, H, F>
where
    H: HierarchicalGraph + ?Sized,
    F: FnMut(&MatchResult) -> bool,
{
    fn search(&mut self, pos: usize) -> Result<Flow, RegraftError> {
        if self.cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(RegraftError::Cancelled);
        }
        if self.depth >= self.limits.max_depth {
            return Err(RegraftError::SearchLimitExceeded {
                limit: "max_depth",
                value: self.limits.max_depth as u64,
            });
        }
        self.depth += 1;
        let flow = self.step(pos);
        self.depth -= 1;
        flow
    }

    fn step(&mut self, pos: usize) -> Result<Flow, RegraftError> {
        let Some(entry) = self.pattern_frontier.get(pos).copied() else {
            return self.exhausted(pos);
        };
        let kind = self.pattern.graph().kind(entry.node)?;

        if kind == NodeKind::Composite {
            return self.step_composite(pos, entry);
        }

        if let Some(image) = self.result.get(entry.node) {
            if self.in_window(entry.window, image) {
                return self.search(pos + 1);
            }
            return Ok(ControlFlow::Continue(()));
        }

        for index in entry.window.start..entry.window.end {
            let Some(candidate) = self.host_frontier.get(index).copied() else {
                break;
            };
            if self.host.kind(candidate)? != kind {
                continue;
            }
            if self.attempt(pos + 1, entry.node, candidate, kind)?.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Frontier exhausted: descend into an open composite with leaves left,
    /// or report the embedding.
    fn exhausted(&mut self, pos: usize) -> Result<Flow, RegraftError> {
        for index in (0..self.open.len()).rev() {
            let (pattern_composite, host_composite) = self.open[index];
            if let Some(leaf) = self.first_unmatched_leaf(pattern_composite)? {
                return self.descend(pos, host_composite, leaf);
            }
        }

        self.reported += 1;
        trace!(
            index = self.reported,
            entries = self.result.len(),
            "embedding found"
        );
        if (self.on_match)(&self.result) {
            Ok(ControlFlow::Continue(()))
        } else {
            Ok(ControlFlow::Break(()))
        }
    }

    fn step_composite(&mut self, pos: usize, entry: PatternEntry) -> Result<Flow, RegraftError> {
        let node = entry.node;

        if let Some(image) = self.open_image(node) {
            if !self.in_window(entry.window, image) {
                return Ok(ControlFlow::Continue(()));
            }
            let (pattern_mark, host_mark) = self.checkpoint();
            self.push_ports(node, image)?;
            let flow = self.search(pos + 1)?;
            self.rollback(pattern_mark, host_mark);
            return Ok(flow);
        }

        let first_leaf = self.first_unmatched_leaf(node)?;

        for index in entry.window.start..entry.window.end {
            let Some(candidate) = self.host_frontier.get(index).copied() else {
                break;
            };
            if self.host.kind(candidate)? != NodeKind::Composite {
                continue;
            }
            self.spend()?;
            if self.open.iter().any(|(_, host)| *host == candidate)
                || !self.pattern.accepts(node, self.host, candidate)?
                || !self.contained(node, candidate, NodeKind::Composite)?
            {
                continue;
            }

            let Some(leaf) = first_leaf else {
                // Vacuous: settled by the first admissible candidate.
                return self.search(pos + 1);
            };

            self.open.push((node, candidate));
            let (pattern_mark, host_mark) = self.checkpoint();
            self.push_ports(node, candidate)?;
            let flow = self.descend(pos + 1, candidate, leaf)?;
            self.rollback(pattern_mark, host_mark);
            self.open.pop();

            if flow.is_break() {
                return Ok(flow);
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Try `leaf` against every unused host leaf below `host_composite`.
    fn descend(
        &mut self,
        next: usize,
        host_composite: NodeId,
        leaf: NodeId,
    ) -> Result<Flow, RegraftError> {
        let mut descent = Descent::new(self.limits.max_depth);
        let mut candidate =
            descent.first(self.host, host_composite, |n| self.result.contains_host(n))?;
        while let Some(host_leaf) = candidate {
            trace!(leaf = %host_leaf, depth = descent.depth(), "descent candidate");
            if self
                .attempt(next, leaf, host_leaf, NodeKind::Leaf)?
                .is_break()
            {
                return Ok(ControlFlow::Break(()));
            }
            candidate = descent.next(self.host, |n| self.result.contains_host(n))?;
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Tentatively map `node -> candidate`, extend the frontiers and recurse.
    fn attempt(
        &mut self,
        next: usize,
        node: NodeId,
        candidate: NodeId,
        kind: NodeKind,
    ) -> Result<Flow, RegraftError> {
        self.spend()?;
        if self.result.contains_host(candidate)
            || !self.pattern.accepts(node, self.host, candidate)?
            || !self.consistent(node, candidate, kind)?
            || !self.contained(node, candidate, kind)?
        {
            return Ok(ControlFlow::Continue(()));
        }

        let mark = self.result.len();
        self.result.insert(node, candidate);
        let (pattern_mark, host_mark) = self.checkpoint();
        self.push_neighbours(node, candidate, kind)?;

        let flow = self.search(next)?;

        self.rollback(pattern_mark, host_mark);
        self.result.truncate(mark);
        Ok(flow)
    }

    // -------------------------------------------------------------------------
    // Acceptance
    // -------------------------------------------------------------------------

    /// Already-mapped neighbours of `node` must map to neighbours of `candidate`.
    fn consistent(
        &self,
        node: NodeId,
        candidate: NodeId,
        kind: NodeKind,
    ) -> Result<bool, RegraftError> {
        let pattern = self.pattern.graph();
        match kind {
            NodeKind::Leaf => {
                for port in pattern.ports(node)? {
                    if let Some(image) = self.result.get(*port)
                        && self.host.container(image)? != Some(candidate)
                    {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            NodeKind::Port => {
                if !pattern
                    .direction(node)?
                    .admits(self.host.direction(candidate)?)
                {
                    return Ok(false);
                }
                if let Some(owner) = pattern.container(node)?
                    && let Some(image) = self.image(owner)
                    && self.host.container(candidate)? != Some(image)
                {
                    return Ok(false);
                }
                let host_relations = self.host.linked_relations(candidate)?;
                for relation in pattern.linked_relations(node)? {
                    if let Some(image) = self.result.get(*relation)
                        && !host_relations.contains(&image)
                    {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            NodeKind::Relation => {
                let host_ports = self.host.linked_ports(candidate)?;
                for port in pattern.linked_ports(node)? {
                    if let Some(image) = self.result.get(*port)
                        && !host_ports.contains(&image)
                    {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            NodeKind::Composite => Ok(true),
        }
    }

    /// Containment: a leaf or composite must lie strictly inside the host
    /// image of its nearest open pattern ancestor, and a composite must
    /// enclose the images of everything already matched or opened below it.
    fn contained(
        &self,
        node: NodeId,
        candidate: NodeId,
        kind: NodeKind,
    ) -> Result<bool, RegraftError> {
        if !matches!(kind, NodeKind::Leaf | NodeKind::Composite) {
            return Ok(true);
        }
        if let Some(outer) = self.enclosing_image(node)?
            && !self.host_below(candidate, outer)?
        {
            return Ok(false);
        }
        if kind == NodeKind::Leaf {
            return Ok(true);
        }

        let pattern = self.pattern.graph();
        for (inner, image) in self.result.iter() {
            if pattern.kind(inner)? == NodeKind::Leaf
                && self.pattern_below(inner, node)?
                && !self.host_below(image, candidate)?
            {
                return Ok(false);
            }
        }
        for &(inner, image) in &self.open {
            if self.pattern_below(inner, node)? && !self.host_below(image, candidate)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Host image of the nearest open composite above `node`.
    fn enclosing_image(&self, node: NodeId) -> Result<Option<NodeId>, RegraftError> {
        let pattern = self.pattern.graph();
        let mut current = pattern.container(node)?;
        while let Some(parent) = current {
            if let Some(image) = self.open_image(parent) {
                return Ok(Some(image));
            }
            current = pattern.container(parent)?;
        }
        Ok(None)
    }

    fn pattern_below(&self, node: NodeId, ancestor: NodeId) -> Result<bool, RegraftError> {
        below(self.pattern.graph(), node, ancestor)
    }

    fn host_below(&self, node: NodeId, ancestor: NodeId) -> Result<bool, RegraftError> {
        below(self.host, node, ancestor)
    }

    // -------------------------------------------------------------------------
    // Frontier growth
    // -------------------------------------------------------------------------

    fn push_neighbours(
        &mut self,
        node: NodeId,
        candidate: NodeId,
        kind: NodeKind,
    ) -> Result<(), RegraftError> {
        let pattern = self.pattern;
        let pattern = pattern.graph();
        let host = self.host;
        match kind {
            NodeKind::Leaf => self.push_ports(node, candidate),
            NodeKind::Port => self.push_batch(
                pattern.linked_relations(node)?.iter().copied(),
                host.linked_relations(candidate)?.iter().copied(),
            ),
            NodeKind::Relation => {
                let mut pattern_owners = Vec::new();
                for port in pattern.linked_ports(node)? {
                    if !self.result.contains_pattern(*port)
                        && let Some(owner) = pattern.container(*port)?
                    {
                        pattern_owners.push(owner);
                    }
                }
                let mut host_owners = Vec::new();
                for port in host.linked_ports(candidate)? {
                    if !self.result.contains_host(*port)
                        && let Some(owner) = host.container(*port)?
                    {
                        host_owners.push(owner);
                    }
                }
                self.push_batch(pattern_owners, host_owners)
            }
            NodeKind::Composite => Ok(()),
        }
    }

    fn push_ports(&mut self, node: NodeId, candidate: NodeId) -> Result<(), RegraftError> {
        let (pattern, host) = (self.pattern, self.host);
        let pattern_ports = pattern.graph().ports(node)?;
        let host_ports = host.ports(candidate)?;
        self.push_batch(pattern_ports.iter().copied(), host_ports.iter().copied())
    }

    /// Push unmatched pattern nodes and unused host nodes as one window.
    fn push_batch(
        &mut self,
        pattern_nodes: impl IntoIterator<Item = NodeId>,
        host_nodes: impl IntoIterator<Item = NodeId>,
    ) -> Result<(), RegraftError> {
        let start = self.host_frontier.len();
        for host in host_nodes {
            let fresh = !self.host_frontier.iter_from(start).any(|h| *h == host);
            if fresh && !self.result.contains_host(host) {
                self.host_frontier.push(host);
            }
        }
        let window = Window {
            start,
            end: self.host_frontier.len(),
        };

        let first_pushed = self.pattern_frontier.len();
        for node in pattern_nodes {
            let fresh = !self
                .pattern_frontier
                .iter_from(first_pushed)
                .any(|entry| entry.node == node);
            if fresh && !self.result.contains_pattern(node) {
                self.pattern_frontier.push(PatternEntry { node, window });
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn first_unmatched_leaf(&self, composite: NodeId) -> Result<Option<NodeId>, RegraftError> {
        Descent::new(self.limits.max_depth).first(self.pattern.graph(), composite, |n| {
            self.result.contains_pattern(n)
        })
    }

    fn open_image(&self, composite: NodeId) -> Option<NodeId> {
        self.open
            .iter()
            .find(|(pattern, _)| *pattern == composite)
            .map(|(_, host)| *host)
    }

    /// Image of a pattern node, looking through open composites.
    fn image(&self, node: NodeId) -> Option<NodeId> {
        self.result.get(node).or_else(|| self.open_image(node))
    }

    fn in_window(&self, window: Window, host: NodeId) -> bool {
        (window.start..window.end).any(|index| self.host_frontier.get(index) == Some(&host))
    }

    fn spend(&mut self) -> Result<(), RegraftError> {
        self.attempts += 1;
        if self.attempts > self.limits.node_budget {
            return Err(RegraftError::SearchLimitExceeded {
                limit: "node_budget",
                value: self.limits.node_budget,
            });
        }
        Ok(())
    }

    fn checkpoint(&self) -> (usize, usize) {
        (
            self.pattern_frontier.checkpoint(),
            self.host_frontier.checkpoint(),
        )
    }

    fn rollback(&mut self, pattern_mark: usize, host_mark: usize) {
        self.pattern_frontier.truncate(pattern_mark);
        self.host_frontier.truncate(host_mark);
    }
}

/// Whether `node` lies strictly inside `ancestor`.
fn below<G>(graph: &G, node: NodeId, ancestor: NodeId) -> Result<bool, RegraftError>
where
    G: HierarchicalGraph + ?Sized,
{
    let mut current = graph.container(node)?;
    while let Some(parent) = current {
        if parent == ancestor {
            return Ok(true);
        }
        current = graph.container(parent)?;
    }
    Ok(false)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::pattern::{Criterion, Operand};
    use crate::Direction;

    fn class(name: &str) -> Criterion {
        Criterion::Class(Operand::literal(name))
    }

    /// Host: top { A1 (A, out) -> r -> B1 (B, in) }
    fn producer_consumer() -> (Graph, NodeId, NodeId) {
        let mut host = Graph::new("top");
        let root = host.root();
        let a = host.add_leaf(root, "A1", "A").expect("leaf");
        let b = host.add_leaf(root, "B1", "B").expect("leaf");
        let out = host.add_port(a, "out", Direction::Output).expect("port");
        let inp = host.add_port(b, "in", Direction::Input).expect("port");
        let r = host.add_relation(root, "r").expect("relation");
        host.link(out, r).expect("link");
        host.link(inp, r).expect("link");
        (host, a, b)
    }

    #[test]
    fn single_leaf_matches_by_class() {
        let (host, a, _) = producer_consumer();
        let mut graph = Graph::new("p");
        let leaf = graph.add_leaf(graph.root(), "x", "").expect("leaf");
        let mut pattern = Pattern::new(graph);
        pattern.add_criterion(leaf, class("A"));

        let all = Matcher::new().find_all(&pattern, &host).expect("match");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get(leaf), Some(a));
    }

    #[test]
    fn direction_filters_ports() {
        let (host, a, _) = producer_consumer();
        let mut graph = Graph::new("p");
        let leaf = graph.add_leaf(graph.root(), "x", "").expect("leaf");
        graph.add_port(leaf, "p", Direction::Input).expect("port");
        let pattern = Pattern::new(graph);

        // Only B1 has an input port.
        let all = Matcher::new().find_all(&pattern, &host).expect("match");
        assert_eq!(all.len(), 1);
        assert_ne!(all[0].get(leaf), Some(a));
    }

    #[test]
    fn connected_pair_follows_relation() {
        let (host, a, b) = producer_consumer();
        let mut graph = Graph::new("p");
        let root = graph.root();
        let x = graph.add_leaf(root, "x", "").expect("leaf");
        let y = graph.add_leaf(root, "y", "").expect("leaf");
        let xo = graph.add_port(x, "o", Direction::Output).expect("port");
        let yi = graph.add_port(y, "i", Direction::Input).expect("port");
        let r = graph.add_relation(root, "r").expect("relation");
        graph.link(xo, r).expect("link");
        graph.link(yi, r).expect("link");
        let pattern = Pattern::new(graph);

        let all = Matcher::new().find_all(&pattern, &host).expect("match");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get(x), Some(a));
        assert_eq!(all[0].get(y), Some(b));
        assert_eq!(all[0].len(), 5);
    }

    #[test]
    fn disconnected_components_are_both_matched() {
        let (host, a, b) = producer_consumer();
        let mut graph = Graph::new("p");
        let root = graph.root();
        let x = graph.add_leaf(root, "x", "").expect("leaf");
        let y = graph.add_leaf(root, "y", "").expect("leaf");
        let mut pattern = Pattern::new(graph);
        pattern.add_criterion(x, class("B"));
        pattern.add_criterion(y, class("A"));

        let first = Matcher::new()
            .find_first(&pattern, &host)
            .expect("match")
            .expect("some match");
        assert_eq!(first.get(x), Some(b));
        assert_eq!(first.get(y), Some(a));
    }

    #[test]
    fn vacuous_pattern_matches_once_without_entries() {
        let (host, _, _) = producer_consumer();
        let pattern = Pattern::new(Graph::new("p"));
        let all = Matcher::new().find_all(&pattern, &host).expect("match");
        assert_eq!(all.len(), 1);
        assert!(all[0].is_empty());
    }

    #[test]
    fn callback_false_stops_enumeration() {
        let mut host = Graph::new("top");
        for i in 0..4 {
            host.add_leaf(host.root(), format!("L{i}"), "L").expect("leaf");
        }
        let mut graph = Graph::new("p");
        graph.add_leaf(graph.root(), "x", "L").expect("leaf");
        let pattern = Pattern::new(graph);

        let mut seen = 0;
        let reported = Matcher::new()
            .match_with(&pattern, &host, |_| {
                seen += 1;
                seen < 2
            })
            .expect("match");
        assert_eq!(reported, 2);
        assert_eq!(seen, 2);
    }

    #[test]
    fn leaves_in_nested_host_composites_are_found() {
        let mut host = Graph::new("top");
        let inner = host.add_composite(host.root(), "inner").expect("composite");
        let deep = host.add_leaf(inner, "A9", "A").expect("leaf");
        let mut graph = Graph::new("p");
        let leaf = graph.add_leaf(graph.root(), "x", "").expect("leaf");
        let mut pattern = Pattern::new(graph);
        pattern.add_criterion(leaf, class("A"));

        let found = Matcher::new()
            .find_first(&pattern, &host)
            .expect("match")
            .expect("some match");
        assert_eq!(found.get(leaf), Some(deep));
    }

    #[test]
    fn cancelled_token_aborts() {
        let (host, _, _) = producer_consumer();
        let token = CancelToken::new();
        token.cancel();
        let result = Matcher::new()
            .with_cancel_token(token)
            .exists(&Pattern::new(Graph::new("p")), &host);
        assert!(matches!(result, Err(RegraftError::Cancelled)));
    }

    #[test]
    fn budget_is_enforced() {
        let (host, _, _) = producer_consumer();
        let mut graph = Graph::new("p");
        graph.add_leaf(graph.root(), "x", "Z").expect("leaf");
        let limits = SearchLimits {
            node_budget: 1,
            ..SearchLimits::default()
        };
        let result = Matcher::new()
            .with_limits(limits)
            .exists(&Pattern::new(graph), &host);
        assert!(matches!(
            result,
            Err(RegraftError::SearchLimitExceeded { limit: "node_budget", .. })
        ));
    }
}
