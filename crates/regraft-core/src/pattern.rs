//! # Pattern Graphs
//!
//! A pattern is an ordinary hierarchical `Graph` plus, per node, an ordered
//! list of `Criterion` predicates the matcher checks against candidate host
//! nodes, and an ordered list of `Operation`s the replacement applier runs on
//! the matched host nodes.
//!
//! Values inside criteria and operations are `Operand`s: either literals or
//! references to named rule parameters. Parameters are substituted by
//! `Pattern::resolve` on a private working copy before every activation.

use crate::graph::{Graph, HierarchicalGraph};
use crate::{NodeId, NodeKind, RegraftError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// OPERANDS
// =============================================================================

/// A value in a criterion or operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    /// A fixed string.
    Literal(String),
    /// The current value of a named rule parameter.
    Parameter(String),
}

impl Operand {
    /// Literal helper.
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// Parameter helper.
    #[must_use]
    pub fn parameter(name: impl Into<String>) -> Self {
        Self::Parameter(name.into())
    }

    /// The literal value, or `InvalidPatternGraph` if still a parameter.
    pub fn value(&self) -> Result<&str, RegraftError> {
        match self {
            Self::Literal(value) => Ok(value),
            Self::Parameter(name) => Err(RegraftError::InvalidPatternGraph(format!(
                "parameter '{}' was not resolved before use",
                name
            ))),
        }
    }

    fn parameter_name(&self) -> Option<&str> {
        match self {
            Self::Literal(_) => None,
            Self::Parameter(name) => Some(name),
        }
    }

    fn resolve(&self, params: &BTreeMap<String, String>) -> Result<Self, RegraftError> {
        match self {
            Self::Literal(_) => Ok(self.clone()),
            Self::Parameter(name) => params
                .get(name)
                .map(|value| Self::Literal(value.clone()))
                .ok_or_else(|| {
                    RegraftError::InvalidPatternGraph(format!("undeclared parameter '{}'", name))
                }),
        }
    }
}

// =============================================================================
// CRITERIA
// =============================================================================

/// Predicate over a candidate host node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Host node's class equals the operand.
    Class(Operand),
    /// Host node's local name equals the operand.
    Name(Operand),
    /// Host node carries `key` with exactly this value.
    AttributeEquals { key: String, value: Operand },
    /// Host node carries `key` with any value.
    AttributePresent(String),
}

impl Criterion {
    /// Evaluate against a host node.
    pub fn holds<G: HierarchicalGraph + ?Sized>(
        &self,
        host: &G,
        node: NodeId,
    ) -> Result<bool, RegraftError> {
        match self {
            Self::Class(expected) => Ok(host.class(node)? == expected.value()?),
            Self::Name(expected) => Ok(host.name(node)? == expected.value()?),
            Self::AttributeEquals { key, value } => {
                Ok(host.attribute(node, key)? == Some(value.value()?))
            }
            Self::AttributePresent(key) => Ok(host.attribute(node, key)?.is_some()),
        }
    }

    fn operand(&self) -> Option<&Operand> {
        match self {
            Self::Class(op) | Self::Name(op) | Self::AttributeEquals { value: op, .. } => Some(op),
            Self::AttributePresent(_) => None,
        }
    }

    fn resolve(&self, params: &BTreeMap<String, String>) -> Result<Self, RegraftError> {
        Ok(match self {
            Self::Class(op) => Self::Class(op.resolve(params)?),
            Self::Name(op) => Self::Name(op.resolve(params)?),
            Self::AttributeEquals { key, value } => Self::AttributeEquals {
                key: key.clone(),
                value: value.resolve(params)?,
            },
            Self::AttributePresent(key) => Self::AttributePresent(key.clone()),
        })
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Rewrite action applied to the host image of a pattern node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Remove the host node and everything it owns.
    Delete,
    /// Set an attribute on the host node.
    SetAttribute { key: String, value: Operand },
    /// Remove an attribute from the host node.
    RemoveAttribute(String),
    /// Change the host node's class. Leaves only.
    Retype(Operand),
    /// Change the host node's local name.
    Rename(Operand),
}

impl Operation {
    /// Whether this operation can target a node of `kind`.
    #[must_use]
    pub fn applies_to(&self, kind: NodeKind) -> bool {
        match self {
            Self::Retype(_) => kind == NodeKind::Leaf,
            _ => kind != NodeKind::Composite,
        }
    }

    fn operand(&self) -> Option<&Operand> {
        match self {
            Self::SetAttribute { value: op, .. } | Self::Retype(op) | Self::Rename(op) => Some(op),
            Self::Delete | Self::RemoveAttribute(_) => None,
        }
    }

    fn resolve(&self, params: &BTreeMap<String, String>) -> Result<Self, RegraftError> {
        Ok(match self {
            Self::Delete => Self::Delete,
            Self::SetAttribute { key, value } => Self::SetAttribute {
                key: key.clone(),
                value: value.resolve(params)?,
            },
            Self::RemoveAttribute(key) => Self::RemoveAttribute(key.clone()),
            Self::Retype(op) => Self::Retype(op.resolve(params)?),
            Self::Rename(op) => Self::Rename(op.resolve(params)?),
        })
    }
}

// =============================================================================
// PATTERN
// =============================================================================

/// Left-hand side of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    graph: Graph,
    criteria: BTreeMap<NodeId, Vec<Criterion>>,
    operations: BTreeMap<NodeId, Vec<Operation>>,
}

impl Pattern {
    /// Wrap a graph with no criteria or operations.
    #[must_use]
    pub fn new(graph: Graph) -> Self {
        Self {
            graph,
            criteria: BTreeMap::new(),
            operations: BTreeMap::new(),
        }
    }

    /// The pattern's shape.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Append a criterion to a node.
    pub fn add_criterion(&mut self, node: NodeId, criterion: Criterion) {
        self.criteria.entry(node).or_default().push(criterion);
    }

    /// Append an operation to a node.
    pub fn add_operation(&mut self, node: NodeId, operation: Operation) {
        self.operations.entry(node).or_default().push(operation);
    }

    /// Criteria of a node, in order.
    #[must_use]
    pub fn criteria(&self, node: NodeId) -> &[Criterion] {
        self.criteria.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Operations of a node, in order.
    #[must_use]
    pub fn operations(&self, node: NodeId) -> &[Operation] {
        self.operations.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All operations keyed by pattern node.
    #[must_use]
    pub fn all_operations(&self) -> &BTreeMap<NodeId, Vec<Operation>> {
        &self.operations
    }

    /// Whether every criterion of `node` holds against `host_node`.
    pub fn accepts<G: HierarchicalGraph + ?Sized>(
        &self,
        node: NodeId,
        host: &G,
        host_node: NodeId,
    ) -> Result<bool, RegraftError> {
        for criterion in self.criteria(node) {
            if !criterion.holds(host, host_node)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Check the pattern against the set of parameter names a rule declares.
    pub fn validate<'a>(
        &self,
        declared: impl IntoIterator<Item = &'a str> + Clone,
    ) -> Result<(), RegraftError> {
        let root = self.graph.root();
        if self.graph.kind(root)? != NodeKind::Composite {
            return Err(RegraftError::InvalidPatternGraph(
                "pattern root must be a composite".to_string(),
            ));
        }

        let is_declared =
            |name: &str| declared.clone().into_iter().any(|declared| declared == name);

        for (node, criteria) in &self.criteria {
            self.expect_node(*node, "criterion")?;
            for criterion in criteria {
                if let Some(name) = criterion.operand().and_then(Operand::parameter_name)
                    && !is_declared(name)
                {
                    return Err(RegraftError::InvalidPatternGraph(format!(
                        "criterion on {} references undeclared parameter '{}'",
                        node, name
                    )));
                }
            }
        }

        for (node, operations) in &self.operations {
            let kind = self.expect_node(*node, "operation")?;
            for operation in operations {
                if !operation.applies_to(kind) {
                    return Err(RegraftError::InvalidPatternGraph(format!(
                        "operation {:?} cannot target {} ({})",
                        operation, node, kind
                    )));
                }
                if let Some(name) = operation.operand().and_then(Operand::parameter_name)
                    && !is_declared(name)
                {
                    return Err(RegraftError::InvalidPatternGraph(format!(
                        "operation on {} references undeclared parameter '{}'",
                        node, name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Substitute every parameter operand with its value from `params`.
    pub fn resolve(&self, params: &BTreeMap<String, String>) -> Result<Self, RegraftError> {
        let criteria = self
            .criteria
            .iter()
            .map(|(node, list)| {
                let resolved = list
                    .iter()
                    .map(|c| c.resolve(params))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((*node, resolved))
            })
            .collect::<Result<BTreeMap<_, _>, RegraftError>>()?;
        let operations = self
            .operations
            .iter()
            .map(|(node, list)| {
                let resolved = list
                    .iter()
                    .map(|o| o.resolve(params))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((*node, resolved))
            })
            .collect::<Result<BTreeMap<_, _>, RegraftError>>()?;
        Ok(Self {
            graph: self.graph.clone(),
            criteria,
            operations,
        })
    }

    fn expect_node(&self, node: NodeId, what: &str) -> Result<NodeKind, RegraftError> {
        if !self.graph.contains(node) {
            return Err(RegraftError::InvalidPatternGraph(format!(
                "{} attached to undeclared node {}",
                what, node
            )));
        }
        self.graph.kind(node)
    }
}

// =============================================================================
// TESTS
// =============================================================================
