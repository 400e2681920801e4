//! # Graph and Rule Documents
//!
//! JSON interchange shapes for host graphs and rules, and their conversion
//! to and from the core `Graph`, `Pattern` and `TransformationRule` types.
//!
//! A node document nests children inside composites. Relations are declared
//! on the composite that owns them and list the ports they join as dotted
//! paths relative to that composite, e.g. `"A1.out"`.
//!
//! ```json
//! {
//!   "name": "top",
//!   "children": [
//!     { "name": "A1", "kind": "leaf", "class": "A",
//!       "ports": [{ "name": "out", "direction": "output" }] },
//!     { "name": "B1", "kind": "leaf", "class": "B",
//!       "ports": [{ "name": "in", "direction": "input" }] }
//!   ],
//!   "relations": [{ "name": "r", "links": ["A1.out", "B1.in"] }]
//! }
//! ```
//!
//! Pattern documents use the same shape with optional `criteria` and
//! `operations` on every node, port and relation.

use regraft_core::primitives::{MAX_DOCUMENT_DEPTH, MAX_DOCUMENT_NODES};
use regraft_core::{
    Criterion, Direction, Graph, HierarchicalGraph, NodeBody, NodeId, NodeKind, Operation, Pattern,
    RegraftError, RuleConfig, TransformationRule,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Maximum size of a document file (64 MB).
const MAX_DOCUMENT_BYTES: u64 = 64 * 1024 * 1024;

// =============================================================================
// DOCUMENT TYPES
// =============================================================================

fn composite_kind() -> NodeKind {
    NodeKind::Composite
}

fn is_composite(kind: &NodeKind) -> bool {
    *kind == NodeKind::Composite
}

/// A composite or leaf with everything it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeDocument {
    pub name: String,
    #[serde(default = "composite_kind", skip_serializing_if = "is_composite")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub class: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<RelationDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub criteria: Vec<Criterion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortDocument {
    pub name: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub criteria: Vec<Criterion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationDocument {
    pub name: String,
    /// Port paths relative to the owning composite.
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub criteria: Vec<Criterion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<Operation>,
}

/// A rule: pattern, declared parameters and an optional configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<RuleConfig>,
    pub pattern: NodeDocument,
}

// =============================================================================
// DOCUMENT -> GRAPH
// =============================================================================

/// Criteria and operations collected while building a pattern graph.
type Annotations = Vec<(NodeId, Vec<Criterion>, Vec<Operation>)>;

struct Builder {
    graph: Graph,
    annotations: Annotations,
    nodes: usize,
}

impl Builder {
    fn new(root: &NodeDocument) -> Result<Self, RegraftError> {
        if root.kind != NodeKind::Composite {
            return Err(RegraftError::SerializationError(format!(
                "root '{}' must be a composite",
                root.name
            )));
        }
        Ok(Self {
            graph: Graph::new(root.name.clone()),
            annotations: Vec::new(),
            nodes: 1,
        })
    }

    fn count(&mut self, extra: usize) -> Result<(), RegraftError> {
        self.nodes = self.nodes.saturating_add(extra);
        if self.nodes > MAX_DOCUMENT_NODES {
            return Err(RegraftError::SerializationError(format!(
                "document declares more than {} nodes",
                MAX_DOCUMENT_NODES
            )));
        }
        Ok(())
    }

    fn annotate(&mut self, node: NodeId, criteria: &[Criterion], operations: &[Operation]) {
        if !criteria.is_empty() || !operations.is_empty() {
            self.annotations
                .push((node, criteria.to_vec(), operations.to_vec()));
        }
    }

    /// First pass: nodes, attributes and ports.
    fn fill(&mut self, id: NodeId, doc: &NodeDocument, depth: usize) -> Result<(), RegraftError> {
        if depth > MAX_DOCUMENT_DEPTH {
            return Err(RegraftError::SerializationError(format!(
                "document nesting exceeds {} levels",
                MAX_DOCUMENT_DEPTH
            )));
        }
        self.graph.set_class(id, doc.class.clone())?;
        for (key, value) in &doc.attributes {
            self.graph.set_attribute(id, key.clone(), value.clone())?;
        }
        self.annotate(id, &doc.criteria, &doc.operations);

        self.count(doc.ports.len())?;
        for port in &doc.ports {
            let port_id = self.graph.add_port(id, port.name.clone(), port.direction)?;
            for (key, value) in &port.attributes {
                self.graph.set_attribute(port_id, key.clone(), value.clone())?;
            }
            self.annotate(port_id, &port.criteria, &port.operations);
        }

        if doc.kind == NodeKind::Leaf {
            if !doc.children.is_empty() || !doc.relations.is_empty() {
                return Err(RegraftError::SerializationError(format!(
                    "leaf '{}' cannot own children or relations",
                    doc.name
                )));
            }
            return Ok(());
        }

        self.count(doc.children.len())?;
        for child in &doc.children {
            let child_id = match child.kind {
                NodeKind::Composite => self.graph.add_composite(id, child.name.clone())?,
                NodeKind::Leaf => self.graph.add_leaf(id, child.name.clone(), "")?,
                other => {
                    return Err(RegraftError::SerializationError(format!(
                        "child '{}' is a {}; only composites and leaves nest",
                        child.name, other
                    )));
                }
            };
            self.fill(child_id, child, depth + 1)?;
        }
        Ok(())
    }

    /// Second pass: relations, once every port they may name exists.
    fn wire(&mut self, id: NodeId, doc: &NodeDocument) -> Result<(), RegraftError> {
        if doc.kind != NodeKind::Composite {
            return Ok(());
        }
        self.count(doc.relations.len())?;
        for relation in &doc.relations {
            let relation_id = self.graph.add_relation(id, relation.name.clone())?;
            for (key, value) in &relation.attributes {
                self.graph
                    .set_attribute(relation_id, key.clone(), value.clone())?;
            }
            for link in &relation.links {
                let port = resolve_relative(&self.graph, id, link).ok_or_else(|| {
                    RegraftError::SerializationError(format!(
                        "relation '{}' links unknown port '{}'",
                        relation.name, link
                    ))
                })?;
                if self.graph.kind(port)? != NodeKind::Port {
                    return Err(RegraftError::SerializationError(format!(
                        "relation '{}' links '{}', which is not a port",
                        relation.name, link
                    )));
                }
                self.graph.link(port, relation_id)?;
            }
            self.annotate(relation_id, &relation.criteria, &relation.operations);
        }

        let children = self.graph.children(id)?.to_vec();
        for (child_id, child_doc) in children.into_iter().zip(&doc.children) {
            self.wire(child_id, child_doc)?;
        }
        Ok(())
    }
}

fn resolve_relative(graph: &Graph, base: NodeId, path: &str) -> Option<NodeId> {
    path.split('.')
        .try_fold(base, |current, segment| graph.find_child(current, segment))
}

fn build(doc: &NodeDocument) -> Result<(Graph, Annotations), RegraftError> {
    let mut builder = Builder::new(doc)?;
    let root = builder.graph.root();
    builder.fill(root, doc, 0)?;
    builder.wire(root, doc)?;
    Ok((builder.graph, builder.annotations))
}

/// Build a host graph. Criteria and operations are not allowed.
pub fn graph_from_document(doc: &NodeDocument) -> Result<Graph, RegraftError> {
    let (graph, annotations) = build(doc)?;
    if let Some((node, _, _)) = annotations.first() {
        return Err(RegraftError::SerializationError(format!(
            "host node '{}' carries criteria or operations",
            graph.path(*node)?
        )));
    }
    Ok(graph)
}

/// Build a pattern with its criteria and operations.
pub fn pattern_from_document(doc: &NodeDocument) -> Result<Pattern, RegraftError> {
    let (graph, annotations) = build(doc)?;
    let mut pattern = Pattern::new(graph);
    for (node, criteria, operations) in annotations {
        for criterion in criteria {
            pattern.add_criterion(node, criterion);
        }
        for operation in operations {
            pattern.add_operation(node, operation);
        }
    }
    Ok(pattern)
}

/// Build a rule. The document's configuration, if any, replaces the default.
pub fn rule_from_document(doc: &RuleDocument) -> Result<TransformationRule, RegraftError> {
    let pattern = pattern_from_document(&doc.pattern)?;
    let mut rule = TransformationRule::new(doc.name.clone(), pattern)
        .with_config(doc.config.unwrap_or_default());
    for (name, value) in &doc.parameters {
        rule = rule.with_parameter(name.clone(), value.clone());
    }
    Ok(rule)
}

// =============================================================================
// GRAPH -> DOCUMENT
// =============================================================================

/// Export a graph back into the nested document shape.
pub fn export_graph(graph: &Graph) -> Result<NodeDocument, RegraftError> {
    export_node(graph, graph.root())
}

fn export_node(graph: &Graph, id: NodeId) -> Result<NodeDocument, RegraftError> {
    let data = graph
        .node(id)
        .ok_or(RegraftError::UnresolvableHostNode(id))?;

    let mut doc = NodeDocument {
        name: data.name.clone(),
        kind: data.kind(),
        class: data.class.clone(),
        attributes: data.attributes.clone(),
        ports: Vec::new(),
        children: Vec::new(),
        relations: Vec::new(),
        criteria: Vec::new(),
        operations: Vec::new(),
    };

    for port in graph.ports(id)? {
        let port_data = graph
            .node(*port)
            .ok_or(RegraftError::UnresolvableHostNode(*port))?;
        doc.ports.push(PortDocument {
            name: port_data.name.clone(),
            direction: graph.direction(*port)?,
            attributes: port_data.attributes.clone(),
            criteria: Vec::new(),
            operations: Vec::new(),
        });
    }

    if let NodeBody::Composite {
        children,
        relations,
        ..
    } = &data.body
    {
        for child in children {
            doc.children.push(export_node(graph, *child)?);
        }
        let owner_path = graph.path(id)?;
        for relation in relations {
            let relation_data = graph
                .node(*relation)
                .ok_or(RegraftError::UnresolvableHostNode(*relation))?;
            let mut links = Vec::new();
            for port in graph.linked_ports(*relation)? {
                let full = graph.path(*port)?;
                let relative = full
                    .strip_prefix(&owner_path)
                    .and_then(|rest| rest.strip_prefix('.'))
                    .ok_or_else(|| {
                        RegraftError::SerializationError(format!(
                            "relation '{}' links '{}' outside its owner",
                            relation_data.name, full
                        ))
                    })?;
                links.push(relative.to_string());
            }
            doc.relations.push(RelationDocument {
                name: relation_data.name.clone(),
                links,
                attributes: relation_data.attributes.clone(),
                criteria: Vec::new(),
                operations: Vec::new(),
            });
        }
    }

    Ok(doc)
}

// =============================================================================
// FILE I/O
// =============================================================================

/// Check that `path` is a regular file within the size limit.
fn validate_input_path(path: &Path) -> Result<PathBuf, RegraftError> {
    let canonical = path.canonicalize().map_err(|e| {
        RegraftError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;
    let metadata = std::fs::metadata(&canonical)
        .map_err(|e| RegraftError::IoError(format!("Cannot read file metadata: {}", e)))?;
    if !metadata.is_file() {
        return Err(RegraftError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    if metadata.len() > MAX_DOCUMENT_BYTES {
        return Err(RegraftError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_DOCUMENT_BYTES
        )));
    }
    Ok(canonical)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, RegraftError> {
    let validated = validate_input_path(path)?;
    let contents = std::fs::read(&validated)
        .map_err(|e| RegraftError::IoError(format!("Read '{}': {}", path.display(), e)))?;
    serde_json::from_slice(&contents)
        .map_err(|e| RegraftError::SerializationError(format!("{}: {}", path.display(), e)))
}

/// Load a host graph document.
pub fn load_graph(path: &Path) -> Result<Graph, RegraftError> {
    graph_from_document(&read_json(path)?)
}

/// Load a pattern document.
pub fn load_pattern(path: &Path) -> Result<Pattern, RegraftError> {
    pattern_from_document(&read_json(path)?)
}

/// Load a rule document.
pub fn load_rule(path: &Path) -> Result<TransformationRule, RegraftError> {
    rule_from_document(&read_json(path)?)
}

/// Serialize a graph as pretty JSON.
pub fn graph_to_json(graph: &Graph) -> Result<String, RegraftError> {
    serde_json::to_string_pretty(&export_graph(graph)?)
        .map_err(|e| RegraftError::SerializationError(e.to_string()))
}

/// Write a graph document to `path`.
pub fn write_graph(graph: &Graph, path: &Path) -> Result<(), RegraftError> {
    let json = graph_to_json(graph)?;
    std::fs::write(path, json)
        .map_err(|e| RegraftError::IoError(format!("Write '{}': {}", path.display(), e)))
}

// =============================================================================
// TESTS
// =============================================================================
