//! # Hierarchical Graph
//!
//! The read-only adapter the matcher inspects graphs through, and the arena
//! implementation used for both pattern and host graphs.
//!
//! A hierarchical graph is a tree of composites whose leaves carry ports;
//! relations are hyperedges joining any number of ports, possibly across
//! containment levels. All storage uses `BTreeMap` and insertion-ordered
//! vectors so that enumeration order is deterministic.

use crate::{Direction, NodeId, NodeKind, RegraftError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// ADAPTER TRAIT
// =============================================================================

/// Read-only traversal interface over a hierarchical graph.
///
/// The matcher depends only on this trait, never on a concrete
/// representation. Accessors on an id the adapter does not know return
/// `RegraftError::UnresolvableHostNode`. Asking a node for a relationship
/// its kind does not have (the children of a leaf, the ports of a relation)
/// yields an empty slice.
pub trait HierarchicalGraph {
    /// The top-level composite.
    fn root(&self) -> NodeId;

    /// Whether the id belongs to this graph.
    fn contains(&self, node: NodeId) -> bool;

    /// Classify a node into one of the four kinds.
    fn kind(&self, node: NodeId) -> Result<NodeKind, RegraftError>;

    /// Child composites and leaves of a composite, in a fixed order.
    fn children(&self, composite: NodeId) -> Result<&[NodeId], RegraftError>;

    /// Ports owned by a composite or leaf.
    fn ports(&self, node: NodeId) -> Result<&[NodeId], RegraftError>;

    /// Relations linked to a port.
    fn linked_relations(&self, port: NodeId) -> Result<&[NodeId], RegraftError>;

    /// Ports linked to a relation.
    fn linked_ports(&self, relation: NodeId) -> Result<&[NodeId], RegraftError>;

    /// Direction of a port.
    fn direction(&self, port: NodeId) -> Result<Direction, RegraftError>;

    /// The node that owns this one (`None` for the root).
    fn container(&self, node: NodeId) -> Result<Option<NodeId>, RegraftError>;

    /// Local name of a node.
    fn name(&self, node: NodeId) -> Result<&str, RegraftError>;

    /// Type label of a node. Empty when untyped.
    fn class(&self, node: NodeId) -> Result<&str, RegraftError>;

    /// Attribute value of a node, if set.
    fn attribute(&self, node: NodeId, key: &str) -> Result<Option<&str>, RegraftError>;

    /// Dotted full name from the root, e.g. `top.A1.out`.
    fn path(&self, node: NodeId) -> Result<String, RegraftError> {
        let mut segments = vec![self.name(node)?.to_string()];
        let mut current = self.container(node)?;
        while let Some(parent) = current {
            segments.push(self.name(parent)?.to_string());
            current = self.container(parent)?;
        }
        segments.reverse();
        Ok(segments.join("."))
    }
}

// =============================================================================
// NODE STORAGE
// =============================================================================

/// Kind-specific part of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeBody {
    Composite {
        children: Vec<NodeId>,
        ports: Vec<NodeId>,
        relations: Vec<NodeId>,
    },
    Leaf {
        ports: Vec<NodeId>,
    },
    Port {
        direction: Direction,
        relations: Vec<NodeId>,
    },
    Relation {
        ports: Vec<NodeId>,
    },
}

impl NodeBody {
    fn kind(&self) -> NodeKind {
        match self {
            Self::Composite { .. } => NodeKind::Composite,
            Self::Leaf { .. } => NodeKind::Leaf,
            Self::Port { .. } => NodeKind::Port,
            Self::Relation { .. } => NodeKind::Relation,
        }
    }
}

/// A node stored in a `Graph` arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    /// Arena handle.
    pub id: NodeId,
    /// Local name, unique among siblings by convention (not enforced).
    pub name: String,
    /// Type label; empty when untyped.
    pub class: String,
    /// Owning node (`None` only for the root).
    pub container: Option<NodeId>,
    /// Free-form string attributes.
    pub attributes: BTreeMap<String, String>,
    /// Kind-specific links.
    pub body: NodeBody,
}

impl NodeData {
    /// The node's kind.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.body.kind()
    }
}

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

/// Arena-backed hierarchical graph.
///
/// Uses `BTreeMap` for node storage; child, port and link lists keep
/// insertion order, which is the enumeration order the matcher sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    nodes: BTreeMap<NodeId, NodeData>,
    root: NodeId,
    next_node_id: u64,
}

impl Graph {
    /// Create a graph holding only a root composite.
    #[must_use]
    pub fn new(root_name: impl Into<String>) -> Self {
        let root = NodeId(0);
        let mut nodes = BTreeMap::new();
        nodes.insert(
            root,
            NodeData {
                id: root,
                name: root_name.into(),
                class: String::new(),
                container: None,
                attributes: BTreeMap::new(),
                body: NodeBody::Composite {
                    children: Vec::new(),
                    ports: Vec::new(),
                    relations: Vec::new(),
                },
            },
        );
        Self {
            nodes,
            root,
            next_node_id: 1,
        }
    }

    /// Look up a stored node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(&id)
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeData> {
        self.nodes.values()
    }

    /// Total number of nodes, root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Ids of every node of the given kind, in id order.
    #[must_use]
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.kind() == kind)
            .map(|n| n.id)
            .collect()
    }

    /// Relations owned by a composite.
    pub fn relations(&self, composite: NodeId) -> Result<&[NodeId], RegraftError> {
        match &self.data(composite)?.body {
            NodeBody::Composite { relations, .. } => Ok(relations),
            _ => Ok(&[]),
        }
    }

    /// Resolve a dotted path (as produced by `HierarchicalGraph::path`).
    ///
    /// Children are searched before ports, ports before relations.
    #[must_use]
    pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
        let mut segments = path.split('.');
        let root = self.nodes.get(&self.root)?;
        if segments.next()? != root.name {
            return None;
        }
        let mut current = self.root;
        for segment in segments {
            current = self.find_child(current, segment)?;
        }
        Some(current)
    }

    /// Find a direct member (child, port or relation) of a node by name.
    #[must_use]
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        let data = self.nodes.get(&parent)?;
        let lists: [&[NodeId]; 3] = match &data.body {
            NodeBody::Composite {
                children,
                ports,
                relations,
            } => [children, ports, relations],
            NodeBody::Leaf { ports } => [ports, &[], &[]],
            _ => return None,
        };
        lists
            .into_iter()
            .flatten()
            .copied()
            .find(|id| self.nodes.get(id).is_some_and(|n| n.name == name))
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    /// Add a composite under `parent`.
    pub fn add_composite(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
    ) -> Result<NodeId, RegraftError> {
        self.expect_kind(parent, NodeKind::Composite)?;
        let id = self.allocate(
            parent,
            name.into(),
            String::new(),
            NodeBody::Composite {
                children: Vec::new(),
                ports: Vec::new(),
                relations: Vec::new(),
            },
        );
        self.push_child(parent, id)?;
        Ok(id)
    }

    /// Add a leaf of the given class under `parent`.
    pub fn add_leaf(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        class: impl Into<String>,
    ) -> Result<NodeId, RegraftError> {
        self.expect_kind(parent, NodeKind::Composite)?;
        let id = self.allocate(
            parent,
            name.into(),
            class.into(),
            NodeBody::Leaf { ports: Vec::new() },
        );
        self.push_child(parent, id)?;
        Ok(id)
    }

    /// Add a port to a composite or leaf.
    pub fn add_port(
        &mut self,
        owner: NodeId,
        name: impl Into<String>,
        direction: Direction,
    ) -> Result<NodeId, RegraftError> {
        let kind = self.data(owner)?.kind();
        if !kind.owns_ports() {
            return Err(RegraftError::InvalidConfiguration(format!(
                "{} is a {}; only composites and leaves own ports",
                owner, kind
            )));
        }
        let id = self.allocate(
            owner,
            name.into(),
            String::new(),
            NodeBody::Port {
                direction,
                relations: Vec::new(),
            },
        );
        match &mut self.data_mut(owner)?.body {
            NodeBody::Composite { ports, .. } | NodeBody::Leaf { ports } => ports.push(id),
            _ => {}
        }
        Ok(id)
    }

    /// Add a relation owned by a composite.
    pub fn add_relation(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
    ) -> Result<NodeId, RegraftError> {
        self.expect_kind(parent, NodeKind::Composite)?;
        let id = self.allocate(
            parent,
            name.into(),
            String::new(),
            NodeBody::Relation { ports: Vec::new() },
        );
        if let NodeBody::Composite { relations, .. } = &mut self.data_mut(parent)?.body {
            relations.push(id);
        }
        Ok(id)
    }

    /// Link a port to a relation. Linking twice is a no-op.
    pub fn link(&mut self, port: NodeId, relation: NodeId) -> Result<(), RegraftError> {
        self.expect_kind(port, NodeKind::Port)?;
        self.expect_kind(relation, NodeKind::Relation)?;
        if let NodeBody::Port { relations, .. } = &mut self.data_mut(port)?.body {
            if relations.contains(&relation) {
                return Ok(());
            }
            relations.push(relation);
        }
        if let NodeBody::Relation { ports } = &mut self.data_mut(relation)?.body {
            ports.push(port);
        }
        Ok(())
    }

    /// Remove a link between a port and a relation, if present.
    pub fn unlink(&mut self, port: NodeId, relation: NodeId) -> Result<(), RegraftError> {
        if let NodeBody::Port { relations, .. } = &mut self.data_mut(port)?.body {
            relations.retain(|r| *r != relation);
        }
        if let NodeBody::Relation { ports } = &mut self.data_mut(relation)?.body {
            ports.retain(|p| *p != port);
        }
        Ok(())
    }

    /// Set an attribute value.
    pub fn set_attribute(
        &mut self,
        node: NodeId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), RegraftError> {
        self.data_mut(node)?
            .attributes
            .insert(key.into(), value.into());
        Ok(())
    }

    /// Remove an attribute. Returns the old value.
    pub fn remove_attribute(
        &mut self,
        node: NodeId,
        key: &str,
    ) -> Result<Option<String>, RegraftError> {
        Ok(self.data_mut(node)?.attributes.remove(key))
    }

    /// Change a node's type label.
    pub fn set_class(&mut self, node: NodeId, class: impl Into<String>) -> Result<(), RegraftError> {
        self.data_mut(node)?.class = class.into();
        Ok(())
    }

    /// Change a node's local name.
    pub fn set_name(&mut self, node: NodeId, name: impl Into<String>) -> Result<(), RegraftError> {
        self.data_mut(node)?.name = name.into();
        Ok(())
    }

    /// Remove a node and everything it owns.
    ///
    /// Ports are unlinked from their relations, relations from their ports,
    /// and composites are removed recursively. The root cannot be removed.
    pub fn remove_node(&mut self, node: NodeId) -> Result<(), RegraftError> {
        if node == self.root {
            return Err(RegraftError::InvalidConfiguration(
                "the root composite cannot be removed".to_string(),
            ));
        }
        let data = self.data(node)?.clone();

        match &data.body {
            NodeBody::Composite {
                children,
                ports,
                relations,
            } => {
                for child in children.iter().chain(ports).chain(relations) {
                    self.remove_node(*child)?;
                }
            }
            NodeBody::Leaf { ports } => {
                for port in ports {
                    self.remove_node(*port)?;
                }
            }
            NodeBody::Port { relations, .. } => {
                for relation in relations {
                    self.unlink(node, *relation)?;
                }
            }
            NodeBody::Relation { ports } => {
                for port in ports {
                    self.unlink(*port, node)?;
                }
            }
        }

        if let Some(parent) = data.container
            && let Some(parent_data) = self.nodes.get_mut(&parent)
        {
            match &mut parent_data.body {
                NodeBody::Composite {
                    children,
                    ports,
                    relations,
                } => {
                    children.retain(|c| *c != node);
                    ports.retain(|p| *p != node);
                    relations.retain(|r| *r != node);
                }
                NodeBody::Leaf { ports } => ports.retain(|p| *p != node),
                _ => {}
            }
        }

        self.nodes.remove(&node);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    fn allocate(
        &mut self,
        container: NodeId,
        name: String,
        class: String,
        body: NodeBody,
    ) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id = self.next_node_id.saturating_add(1);
        self.nodes.insert(
            id,
            NodeData {
                id,
                name,
                class,
                container: Some(container),
                attributes: BTreeMap::new(),
                body,
            },
        );
        id
    }

    fn push_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), RegraftError> {
        if let NodeBody::Composite { children, .. } = &mut self.data_mut(parent)?.body {
            children.push(child);
        }
        Ok(())
    }

    fn expect_kind(&self, node: NodeId, expected: NodeKind) -> Result<(), RegraftError> {
        let kind = self.data(node)?.kind();
        if kind != expected {
            return Err(RegraftError::InvalidConfiguration(format!(
                "{} is a {}, expected a {}",
                node, kind, expected
            )));
        }
        Ok(())
    }

    fn data(&self, node: NodeId) -> Result<&NodeData, RegraftError> {
        self.nodes
            .get(&node)
            .ok_or(RegraftError::UnresolvableHostNode(node))
    }

    fn data_mut(&mut self, node: NodeId) -> Result<&mut NodeData, RegraftError> {
        self.nodes
            .get_mut(&node)
            .ok_or(RegraftError::UnresolvableHostNode(node))
    }
}

impl HierarchicalGraph for Graph {
    fn root(&self) -> NodeId {
        self.root
    }

    fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn kind(&self, node: NodeId) -> Result<NodeKind, RegraftError> {
        Ok(self.data(node)?.kind())
    }

    fn children(&self, composite: NodeId) -> Result<&[NodeId], RegraftError> {
        match &self.data(composite)?.body {
            NodeBody::Composite { children, .. } => Ok(children),
            _ => Ok(&[]),
        }
    }

    fn ports(&self, node: NodeId) -> Result<&[NodeId], RegraftError> {
        match &self.data(node)?.body {
            NodeBody::Composite { ports, .. } | NodeBody::Leaf { ports } => Ok(ports),
            _ => Ok(&[]),
        }
    }

    fn linked_relations(&self, port: NodeId) -> Result<&[NodeId], RegraftError> {
        match &self.data(port)?.body {
            NodeBody::Port { relations, .. } => Ok(relations),
            _ => Ok(&[]),
        }
    }

    fn linked_ports(&self, relation: NodeId) -> Result<&[NodeId], RegraftError> {
        match &self.data(relation)?.body {
            NodeBody::Relation { ports } => Ok(ports),
            _ => Ok(&[]),
        }
    }

    fn direction(&self, port: NodeId) -> Result<Direction, RegraftError> {
        match &self.data(port)?.body {
            NodeBody::Port { direction, .. } => Ok(*direction),
            _ => Err(RegraftError::UnresolvableHostNode(port)),
        }
    }

    fn container(&self, node: NodeId) -> Result<Option<NodeId>, RegraftError> {
        Ok(self.data(node)?.container)
    }

    fn name(&self, node: NodeId) -> Result<&str, RegraftError> {
        Ok(&self.data(node)?.name)
    }

    fn class(&self, node: NodeId) -> Result<&str, RegraftError> {
        Ok(&self.data(node)?.class)
    }

    fn attribute(&self, node: NodeId, key: &str) -> Result<Option<&str>, RegraftError> {
        Ok(self.data(node)?.attributes.get(key).map(String::as_str))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn two_leaves() -> (Graph, NodeId, NodeId, NodeId) {
        let mut graph = Graph::new("top");
        let root = graph.root();
        let a = graph.add_leaf(root, "A1", "A").expect("leaf");
        let b = graph.add_leaf(root, "B1", "B").expect("leaf");
        let out = graph.add_port(a, "out", Direction::Output).expect("port");
        let inp = graph.add_port(b, "in", Direction::Input).expect("port");
        let r = graph.add_relation(root, "r").expect("relation");
        graph.link(out, r).expect("link");
        graph.link(inp, r).expect("link");
        (graph, a, b, r)
    }

    #[test]
    fn children_keep_insertion_order() {
        let (graph, a, b, _) = two_leaves();
        assert_eq!(graph.children(graph.root()).expect("children"), &[a, b]);
    }

    #[test]
    fn links_are_symmetric() {
        let (graph, a, _, r) = two_leaves();
        let out = graph.ports(a).expect("ports")[0];
        assert_eq!(graph.linked_relations(out).expect("rels"), &[r]);
        assert!(graph.linked_ports(r).expect("ports").contains(&out));
    }

    #[test]
    fn linking_twice_is_noop() {
        let (mut graph, a, _, r) = two_leaves();
        let out = graph.ports(a).expect("ports")[0];
        graph.link(out, r).expect("link");
        assert_eq!(graph.linked_ports(r).expect("ports").len(), 2);
    }

    #[test]
    fn unknown_node_is_unresolvable() {
        let graph = Graph::new("top");
        let result = graph.kind(NodeId(99));
        assert!(matches!(
            result,
            Err(RegraftError::UnresolvableHostNode(NodeId(99)))
        ));
    }

    #[test]
    fn ports_only_on_composites_and_leaves() {
        let (mut graph, _, _, r) = two_leaves();
        let result = graph.add_port(r, "p", Direction::Input);
        assert!(matches!(result, Err(RegraftError::InvalidConfiguration(_))));
    }

    #[test]
    fn path_round_trips() {
        let (graph, a, _, _) = two_leaves();
        let out = graph.ports(a).expect("ports")[0];
        let path = graph.path(out).expect("path");
        assert_eq!(path, "top.A1.out");
        assert_eq!(graph.find_by_path(&path), Some(out));
    }

    #[test]
    fn removing_leaf_unlinks_its_ports() {
        let (mut graph, a, b, r) = two_leaves();
        graph.remove_node(a).expect("remove");
        assert!(!graph.contains(a));
        assert_eq!(graph.children(graph.root()).expect("children"), &[b]);
        assert_eq!(graph.linked_ports(r).expect("ports").len(), 1);
    }

    #[test]
    fn removing_composite_is_recursive() {
        let mut graph = Graph::new("top");
        let inner = graph.add_composite(graph.root(), "inner").expect("composite");
        let leaf = graph.add_leaf(inner, "x", "X").expect("leaf");
        let port = graph.add_port(leaf, "p", Direction::Input).expect("port");
        graph.remove_node(inner).expect("remove");
        assert!(!graph.contains(leaf));
        assert!(!graph.contains(port));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn root_cannot_be_removed() {
        let mut graph = Graph::new("top");
        let root = graph.root();
        assert!(graph.remove_node(root).is_err());
    }
}
