//! # Validation Tier Tests (T0-T4)
//!
//! If ANY tier fails, the engine is INVALID.
//!
//! ## Tiers
//! - T0: Graph Model Integrity
//! - T1: Single-Node Matching
//! - T2: Topology Matching
//! - T3: Rule Modes
//! - T4: Bounds and Failures

use regraft_core::{
    Activation, Criterion, Direction, Graph, GraphRewriter, HierarchicalGraph, Matcher, Mode,
    NodeId, NodeKind, Operand, Operation, Pattern, RegraftError, RuleConfig, RuleEngine,
    TransformationRule,
};
use std::collections::BTreeMap;

// =============================================================================
// FIXTURES
// =============================================================================

fn class(name: &str) -> Criterion {
    Criterion::Class(Operand::literal(name))
}

/// top { A1 (A, out) --r-- B1 (B, in) }
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

/// `count` unconnected leaves of the given class.
fn isolated(count: usize, class_name: &str) -> (Graph, Vec<NodeId>) {
    let mut host = Graph::new("top");
    let leaves = (0..count)
        .map(|i| {
            let leaf = host
                .add_leaf(host.root(), format!("{class_name}{i}"), class_name)
                .expect("leaf");
            host.add_port(leaf, "p", Direction::Undirected).expect("port");
            leaf
        })
        .collect();
    (host, leaves)
}

/// One leaf of class `from`, retyped to `to`.
fn retype_rule(from: &str, to: &str, config: RuleConfig) -> TransformationRule {
    let mut graph = Graph::new("p");
    let leaf = graph.add_leaf(graph.root(), "x", "").expect("leaf");
    let mut pattern = Pattern::new(graph);
    pattern.add_criterion(leaf, class(from));
    pattern.add_operation(leaf, Operation::Retype(Operand::literal(to)));
    TransformationRule::new(format!("{from}->{to}"), pattern).with_config(config)
}

fn rewritten(outcome: Activation<Graph>) -> (Graph, usize) {
    match outcome {
        Activation::Rewritten {
            host, replacements, ..
        } => (host, replacements),
        other => unreachable!("expected a rewritten host, got {other:?}"),
    }
}

fn classes(host: &Graph, leaves: &[NodeId]) -> Vec<String> {
    leaves
        .iter()
        .map(|leaf| host.class(*leaf).expect("class").to_string())
        .collect()
}

// =============================================================================
// TIER T0: GRAPH MODEL INTEGRITY
// =============================================================================

mod t0_graph_model {
    use super::*;

    /// T0.1: Every node is classified into exactly one kind.
    #[test]
    fn kinds_are_closed() {
        let (host, a, _) = producer_consumer();
        let port = host.ports(a).expect("ports")[0];
        let relation = host.linked_relations(port).expect("relations")[0];

        assert_eq!(host.kind(host.root()).expect("kind"), NodeKind::Composite);
        assert_eq!(host.kind(a).expect("kind"), NodeKind::Leaf);
        assert_eq!(host.kind(port).expect("kind"), NodeKind::Port);
        assert_eq!(host.kind(relation).expect("kind"), NodeKind::Relation);
    }

    /// T0.2: Ports know their owner; relations see every linked port.
    #[test]
    fn containment_and_links_agree() {
        let (host, a, b) = producer_consumer();
        let out = host.ports(a).expect("ports")[0];
        let inp = host.ports(b).expect("ports")[0];
        let relation = host.linked_relations(out).expect("relations")[0];

        assert_eq!(host.container(out).expect("container"), Some(a));
        assert_eq!(host.linked_ports(relation).expect("ports"), &[out, inp]);
    }

    /// T0.3: An unknown id is a structural error, not an empty answer.
    #[test]
    fn unknown_node_is_unresolvable() {
        let (host, _, _) = producer_consumer();
        assert!(matches!(
            host.children(NodeId(404)),
            Err(RegraftError::UnresolvableHostNode(NodeId(404)))
        ));
    }
}

// =============================================================================
// TIER T1: SINGLE-NODE MATCHING
// =============================================================================

mod t1_single_node {
    use super::*;

    /// T1.1: A leaf of class A with an output port maps to A1, never B1.
    #[test]
    fn typed_leaf_with_output_port() {
        let (host, a, b) = producer_consumer();
        let mut graph = Graph::new("p");
        let leaf = graph.add_leaf(graph.root(), "x", "").expect("leaf");
        graph.add_port(leaf, "o", Direction::Output).expect("port");
        let mut pattern = Pattern::new(graph);
        pattern.add_criterion(leaf, class("A"));

        let all = Matcher::new().find_all(&pattern, &host).expect("match");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get(leaf), Some(a));
        assert!(!all[0].contains_host(b));
    }

    /// T1.2: A composite without leaves matches vacuously.
    #[test]
    fn empty_composite_is_vacuous() {
        let (host, _, _) = producer_consumer();
        let mut graph = Graph::new("p");
        graph.add_composite(graph.root(), "inner").expect("composite");
        let pattern = Pattern::new(graph);

        let all = Matcher::new().find_all(&pattern, &host).expect("match");
        assert_eq!(all.len(), 1);
        assert!(all[0].is_empty());
    }

    /// T1.3: No match is an empty outcome, not an error.
    #[test]
    fn absent_class_is_empty_outcome() {
        let (host, _, _) = producer_consumer();
        let mut graph = Graph::new("p");
        let leaf = graph.add_leaf(graph.root(), "x", "").expect("leaf");
        let mut pattern = Pattern::new(graph);
        pattern.add_criterion(leaf, class("Z"));

        assert!(!Matcher::new().exists(&pattern, &host).expect("match"));
        assert!(Matcher::new().find_all(&pattern, &host).expect("match").is_empty());
    }

    /// T1.4: Attribute criteria are checked against the host node.
    #[test]
    fn attribute_criteria_filter_candidates() {
        let (mut host, leaves) = isolated(3, "A");
        host.set_attribute(leaves[1], "rate", "2").expect("attr");
        let mut graph = Graph::new("p");
        let leaf = graph.add_leaf(graph.root(), "x", "").expect("leaf");
        let mut pattern = Pattern::new(graph);
        pattern.add_criterion(
            leaf,
            Criterion::AttributeEquals {
                key: "rate".to_string(),
                value: Operand::literal("2"),
            },
        );

        let all = Matcher::new().find_all(&pattern, &host).expect("match");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get(leaf), Some(leaves[1]));
    }
}

// =============================================================================
// TIER T2: TOPOLOGY MATCHING
// =============================================================================

mod t2_topology {
    use super::*;

    /// Pattern: two X leaves whose ports share one relation.
    fn linked_pair() -> (Pattern, NodeId, NodeId) {
        let mut graph = Graph::new("p");
        let root = graph.root();
        let x = graph.add_leaf(root, "x", "").expect("leaf");
        let y = graph.add_leaf(root, "y", "").expect("leaf");
        let xp = graph.add_port(x, "p", Direction::Undirected).expect("port");
        let yp = graph.add_port(y, "p", Direction::Undirected).expect("port");
        let r = graph.add_relation(root, "r").expect("relation");
        graph.link(xp, r).expect("link");
        graph.link(yp, r).expect("link");
        let mut pattern = Pattern::new(graph);
        pattern.add_criterion(x, class("X"));
        pattern.add_criterion(y, class("X"));
        (pattern, x, y)
    }

    /// Three interchangeable X leaves; `wired` picks which two share a relation.
    fn three_candidates(wired: (usize, usize)) -> (Graph, Vec<NodeId>) {
        let (mut host, leaves) = isolated(3, "X");
        let r = host.add_relation(host.root(), "r").expect("relation");
        for index in [wired.0, wired.1] {
            let port = host.ports(leaves[index]).expect("ports")[0];
            host.link(port, r).expect("link");
        }
        (host, leaves)
    }

    /// T2.1: A match exists iff the relation topology matches, whatever the
    /// candidate order.
    #[test]
    fn existence_is_order_independent() {
        let (pattern, x, y) = linked_pair();
        for wired in [(0, 1), (0, 2), (1, 2)] {
            let (host, leaves) = three_candidates(wired);
            let all = Matcher::new().find_all(&pattern, &host).expect("match");
            // Both orientations of the wired pair, nothing else.
            assert_eq!(all.len(), 2, "wired {wired:?}");
            for result in &all {
                let images = [result.get(x), result.get(y)];
                assert!(images.contains(&Some(leaves[wired.0])));
                assert!(images.contains(&Some(leaves[wired.1])));
            }
        }
    }

    /// T2.2: Without the shared relation there is no match.
    #[test]
    fn unwired_candidates_do_not_match() {
        let (pattern, _, _) = linked_pair();
        let (host, _) = isolated(3, "X");
        assert!(!Matcher::new().exists(&pattern, &host).expect("match"));
    }

    /// T2.3: Disconnected pattern components are matched independently.
    #[test]
    fn disconnected_components() {
        let (host, a, b) = producer_consumer();
        let mut graph = Graph::new("p");
        let root = graph.root();
        let x = graph.add_leaf(root, "x", "").expect("leaf");
        let y = graph.add_leaf(root, "y", "").expect("leaf");
        let mut pattern = Pattern::new(graph);
        pattern.add_criterion(x, class("B"));
        pattern.add_criterion(y, class("A"));

        let all = Matcher::new().find_all(&pattern, &host).expect("match");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get(x), Some(b));
        assert_eq!(all[0].get(y), Some(a));
    }

    /// T2.4: Pattern leaves nested in composites find host leaves at any depth.
    #[test]
    fn nested_pattern_composites() {
        let mut host = Graph::new("top");
        let outer = host.add_composite(host.root(), "outer").expect("composite");
        let inner = host.add_composite(outer, "inner").expect("composite");
        let deep = host.add_leaf(inner, "D", "D").expect("leaf");

        let mut graph = Graph::new("p");
        let group = graph.add_composite(graph.root(), "group").expect("composite");
        let leaf = graph.add_leaf(group, "x", "").expect("leaf");
        let mut pattern = Pattern::new(graph);
        pattern.add_criterion(leaf, class("D"));

        let found = Matcher::new()
            .find_first(&pattern, &host)
            .expect("match")
            .expect("some match");
        assert_eq!(found.get(leaf), Some(deep));
        assert!(!found.contains_pattern(group));
    }

    /// T2.5: Input pattern ports never land on output host ports.
    #[test]
    fn port_directions_are_respected() {
        let (host, _, b) = producer_consumer();
        let mut graph = Graph::new("p");
        let leaf = graph.add_leaf(graph.root(), "x", "").expect("leaf");
        let port = graph.add_port(leaf, "i", Direction::Input).expect("port");
        let pattern = Pattern::new(graph);

        let all = Matcher::new().find_all(&pattern, &host).expect("match");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get(leaf), Some(b));
        let host_port = all[0].get(port).expect("port image");
        assert_eq!(host.direction(host_port).expect("direction"), Direction::Input);
    }

    /// p { x (A, out) --r-- group.cp (in), group { z (Z) } }, children listed
    /// with `x` first or with `group` first.
    fn feeds_group(group_first: bool) -> (Pattern, NodeId, NodeId) {
        let mut graph = Graph::new("p");
        let root = graph.root();
        let (x, group) = if group_first {
            let group = graph.add_composite(root, "group").expect("composite");
            (graph.add_leaf(root, "x", "").expect("leaf"), group)
        } else {
            let x = graph.add_leaf(root, "x", "").expect("leaf");
            (x, graph.add_composite(root, "group").expect("composite"))
        };
        let z = graph.add_leaf(group, "z", "").expect("leaf");
        let out = graph.add_port(x, "out", Direction::Output).expect("port");
        let cp = graph.add_port(group, "cp", Direction::Input).expect("port");
        let r = graph.add_relation(root, "r").expect("relation");
        graph.link(out, r).expect("link");
        graph.link(cp, r).expect("link");
        let mut pattern = Pattern::new(graph);
        pattern.add_criterion(x, class("A"));
        pattern.add_criterion(z, class("Z"));
        (pattern, x, z)
    }

    /// top { A1 (A, out) --r-- D.dp (in), D { Z1? }, Z2 (Z) }
    fn feeds_box(z_inside: bool) -> (Graph, NodeId, Option<NodeId>) {
        let mut host = Graph::new("top");
        let root = host.root();
        let a = host.add_leaf(root, "A1", "A").expect("leaf");
        let out = host.add_port(a, "out", Direction::Output).expect("port");
        let boxed = host.add_composite(root, "D").expect("composite");
        let dp = host.add_port(boxed, "dp", Direction::Input).expect("port");
        let inside = if z_inside {
            Some(host.add_leaf(boxed, "Z1", "Z").expect("leaf"))
        } else {
            None
        };
        host.add_leaf(root, "Z2", "Z").expect("leaf");
        let r = host.add_relation(root, "r").expect("relation");
        host.link(out, r).expect("link");
        host.link(dp, r).expect("link");
        (host, a, inside)
    }

    /// T2.6: A leaf inside a pattern composite never lands outside the host
    /// composite that composite is matched to, in either child order.
    #[test]
    fn nested_leaf_must_stay_inside_composite_image() {
        let (host, _, _) = feeds_box(false);
        for group_first in [false, true] {
            let (pattern, _, _) = feeds_group(group_first);
            let all = Matcher::new().find_all(&pattern, &host).expect("match");
            assert!(all.is_empty(), "group_first {group_first}: {} matches", all.len());
        }
    }

    /// T2.7: With a candidate inside the composite, both child orders agree on
    /// the single embedding.
    #[test]
    fn nested_leaf_match_is_order_independent() {
        let (host, a, inside) = feeds_box(true);
        let inside = inside.expect("leaf inside D");
        for group_first in [false, true] {
            let (pattern, x, z) = feeds_group(group_first);
            let all = Matcher::new().find_all(&pattern, &host).expect("match");
            assert_eq!(all.len(), 1, "group_first {group_first}");
            assert_eq!(all[0].get(x), Some(a));
            assert_eq!(all[0].get(z), Some(inside));
        }
    }
}

// =============================================================================
// TIER T3: RULE MODES
// =============================================================================

mod t3_rule_modes {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    /// T3.1: FindAll rewrites every disjoint match in one pass.
    #[test]
    fn find_all_is_one_simultaneous_pass() {
        let (host, leaves) = isolated(4, "A");
        let config = RuleConfig {
            mode: Mode::FindAll,
            ..RuleConfig::default()
        };
        let mut engine =
            RuleEngine::seeded(retype_rule("A", "B", config), GraphRewriter::new(), 7);
        let (out, replacements) =
            rewritten(engine.activate(&host, &BTreeMap::new()).expect("activate"));

        assert_eq!(replacements, 4);
        assert!(classes(&out, &leaves).iter().all(|c| c == "B"));
    }

    /// T3.2: A fixpoint loop on a rewrite that removes its own match stops
    /// after one replacement.
    #[test]
    fn fixpoint_terminates_after_single_rewrite() {
        let (host, _) = isolated(1, "A");
        let config = RuleConfig {
            repeat_until_fixpoint: true,
            ..RuleConfig::default()
        };
        let mut engine =
            RuleEngine::seeded(retype_rule("A", "B", config), GraphRewriter::new(), 7);
        let (_, replacements) =
            rewritten(engine.activate(&host, &BTreeMap::new()).expect("activate"));
        assert_eq!(replacements, 1);
    }

    /// T3.3: FindAny with a repeat count of 3 over 3 matches replaces all 3.
    #[test]
    fn find_any_repeats_exactly_three_times() {
        let (host, leaves) = isolated(3, "A");
        let config = RuleConfig {
            mode: Mode::FindAny,
            repeat_count: 3,
            ..RuleConfig::default()
        };
        let mut engine =
            RuleEngine::seeded(retype_rule("A", "B", config), GraphRewriter::new(), 42);
        let (out, replacements) =
            rewritten(engine.activate(&host, &BTreeMap::new()).expect("activate"));

        assert_eq!(replacements, 3);
        assert!(classes(&out, &leaves).iter().all(|c| c == "B"));
    }

    /// T3.4: FindAny picks uniformly from the pass's matches using the
    /// injected generator.
    #[test]
    fn find_any_follows_seeded_generator() {
        let seed = 2024;
        let (mut host, leaves) = isolated(3, "A");
        let config = RuleConfig {
            mode: Mode::FindAny,
            ..RuleConfig::default()
        };
        let mut engine =
            RuleEngine::seeded(retype_rule("A", "B", config), GraphRewriter::new(), seed);
        let mut oracle = Pcg64Mcg::seed_from_u64(seed);

        let mut pending = leaves.clone();
        while !pending.is_empty() {
            let expected = pending.remove(oracle.gen_range(0..pending.len()));
            let (next, replacements) =
                rewritten(engine.activate(&host, &BTreeMap::new()).expect("activate"));
            assert_eq!(replacements, 1);
            assert_eq!(next.class(expected).expect("class"), "B");
            host = next;
        }
    }

    /// T3.5: Stepped mode queues matches and hands them out first-in-first-out.
    #[test]
    fn stepped_queue_is_fifo() {
        let (host, leaves) = isolated(3, "A");
        let config = RuleConfig {
            mode: Mode::Stepped,
            ..RuleConfig::default()
        };
        let mut engine =
            RuleEngine::seeded(retype_rule("A", "B", config), GraphRewriter::new(), 7);

        let outcome = engine.activate(&host, &BTreeMap::new()).expect("activate");
        assert!(matches!(outcome, Activation::Stepped { remaining: 3 }));

        let first = engine.advance().expect("advance").expect("queued");
        let second = engine.advance().expect("advance").expect("queued");
        assert_eq!(engine.remaining(), 1);
        assert!(first.contains_host(leaves[0]));
        assert!(second.contains_host(leaves[1]));

        let out = engine.apply_match(&second).expect("apply");
        assert_eq!(classes(&out, &leaves), vec!["A", "B", "A"]);
        let out = engine.apply_match(&first).expect("apply");
        assert_eq!(classes(&out, &leaves), vec!["B", "B", "A"]);
        // The caller's host is untouched.
        assert_eq!(classes(&host, &leaves), vec!["A", "A", "A"]);
    }

    /// T3.6: A stepped match whose nodes are gone is rejected.
    #[test]
    fn stepped_rejects_stale_match() {
        let (host, _) = isolated(1, "A");
        let mut graph = Graph::new("p");
        let leaf = graph.add_leaf(graph.root(), "x", "").expect("leaf");
        let mut pattern = Pattern::new(graph);
        pattern.add_operation(leaf, Operation::Delete);
        let rule = TransformationRule::new("drop", pattern).with_config(RuleConfig {
            mode: Mode::Stepped,
            ..RuleConfig::default()
        });
        let mut engine = RuleEngine::seeded(rule, GraphRewriter::new(), 7);
        engine.activate(&host, &BTreeMap::new()).expect("activate");

        let only = engine.advance().expect("advance").expect("queued");
        engine.apply_match(&only).expect("apply");
        assert!(matches!(
            engine.apply_match(&only),
            Err(RegraftError::UnresolvableHostNode(_))
        ));
    }

    /// T3.7: Match-only answers the same question the same way.
    #[test]
    fn match_only_is_idempotent() {
        let (host, _) = isolated(2, "A");
        let config = RuleConfig {
            match_only: true,
            ..RuleConfig::default()
        };
        let mut engine =
            RuleEngine::seeded(retype_rule("A", "B", config), GraphRewriter::new(), 7);
        for _ in 0..3 {
            let outcome = engine.activate(&host, &BTreeMap::new()).expect("activate");
            assert!(matches!(outcome, Activation::MatchOnly { matched: true }));
        }
    }
}

// =============================================================================
// TIER T4: BOUNDS AND FAILURES
// =============================================================================

mod t4_bounds {
    use super::*;
    use regraft_core::{CancelToken, SearchLimits};

    /// T4.1: Fixpoint under Stepped mode is a configuration error.
    #[test]
    fn fixpoint_under_stepped_is_rejected() {
        let (host, _) = isolated(1, "A");
        let config = RuleConfig {
            mode: Mode::Stepped,
            repeat_until_fixpoint: true,
            ..RuleConfig::default()
        };
        let mut engine =
            RuleEngine::seeded(retype_rule("A", "B", config), GraphRewriter::new(), 7);
        assert!(matches!(
            engine.activate(&host, &BTreeMap::new()),
            Err(RegraftError::InvalidConfiguration(_))
        ));
    }

    /// T4.2: A criterion naming an undeclared parameter is an invalid pattern.
    #[test]
    fn undeclared_parameter_is_invalid_pattern() {
        let (host, _) = isolated(1, "A");
        let mut graph = Graph::new("p");
        let leaf = graph.add_leaf(graph.root(), "x", "").expect("leaf");
        let mut pattern = Pattern::new(graph);
        pattern.add_criterion(leaf, Criterion::Class(Operand::parameter("kind")));
        let mut engine = RuleEngine::seeded(
            TransformationRule::new("bad", pattern),
            GraphRewriter::new(),
            7,
        );
        assert!(matches!(
            engine.activate(&host, &BTreeMap::new()),
            Err(RegraftError::InvalidPatternGraph(_))
        ));
    }

    /// T4.3: Cancellation aborts the search.
    #[test]
    fn cancellation_aborts_activation() {
        let (host, _) = isolated(2, "A");
        let token = CancelToken::new();
        let mut engine = RuleEngine::seeded(
            retype_rule("A", "B", RuleConfig::default()),
            GraphRewriter::new(),
            7,
        )
        .with_cancel_token(token.clone());
        token.cancel();
        assert!(matches!(
            engine.activate(&host, &BTreeMap::new()),
            Err(RegraftError::Cancelled)
        ));
    }

    /// T4.4: Deep hierarchies hit the depth bound instead of the stack.
    #[test]
    fn nesting_beyond_depth_limit_fails() {
        let mut host = Graph::new("top");
        let mut parent = host.root();
        for level in 0..20 {
            parent = host
                .add_composite(parent, format!("c{level}"))
                .expect("composite");
        }
        host.add_leaf(parent, "bottom", "A").expect("leaf");

        let mut graph = Graph::new("p");
        let leaf = graph.add_leaf(graph.root(), "x", "").expect("leaf");
        let mut pattern = Pattern::new(graph);
        pattern.add_criterion(leaf, class("A"));

        let limits = SearchLimits {
            max_depth: 8,
            ..SearchLimits::default()
        };
        let result = Matcher::new().with_limits(limits).exists(&pattern, &host);
        assert!(matches!(
            result,
            Err(RegraftError::SearchLimitExceeded { limit: "max_depth", .. })
        ));
    }

    /// T4.5: A failed replacement leaves no partial rewrite behind.
    #[test]
    fn conflicting_pass_is_discarded() {
        let (host, _) = isolated(2, "A");
        let mut graph = Graph::new("p");
        let x = graph.add_leaf(graph.root(), "x", "").expect("leaf");
        let y = graph.add_leaf(graph.root(), "y", "").expect("leaf");
        let mut pattern = Pattern::new(graph);
        pattern.add_operation(x, Operation::Retype(Operand::literal("B")));
        pattern.add_operation(y, Operation::Delete);
        let rule = TransformationRule::new("swap", pattern).with_config(RuleConfig {
            mode: Mode::FindAll,
            ..RuleConfig::default()
        });

        // Both orientations match, so each leaf is retyped by one and deleted by the other.
        let mut engine = RuleEngine::seeded(rule, GraphRewriter::new(), 7);
        assert!(matches!(
            engine.activate(&host, &BTreeMap::new()),
            Err(RegraftError::ReplacementConflict(_))
        ));
        assert_eq!(host.node_count(), 5);
    }

    /// T4.6: Parameter values flow into operations; the input host is untouched.
    #[test]
    fn parameterised_rename_leaves_input_alone() {
        let (host, leaves) = isolated(1, "A");
        let port = host.ports(leaves[0]).expect("ports")[0];
        let mut graph = Graph::new("p");
        let leaf = graph.add_leaf(graph.root(), "x", "").expect("leaf");
        let pattern_port = graph.add_port(leaf, "p", Direction::Undirected).expect("port");
        let mut pattern = Pattern::new(graph);
        pattern.add_operation(pattern_port, Operation::Rename(Operand::parameter("name")));
        let rule = TransformationRule::new("rename", pattern).with_parameter("name", "q");

        let mut engine = RuleEngine::seeded(rule, GraphRewriter::new(), 7);
        let (out, _) = rewritten(engine.activate(&host, &BTreeMap::new()).expect("activate"));
        assert_eq!(out.name(port).expect("name"), "q");
        assert_eq!(host.name(port).expect("name"), "p");
    }
}
