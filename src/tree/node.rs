use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::{TreeError, TreeResult};
use crate::table::{DuplicatePolicy, Operation};
use crate::types::{HttpMethod, MethodSet};

/// Per-method operations for one fully specified path.
#[derive(Debug, Clone)]
pub struct RouteLeaf {
    pattern: String,
    operations: BTreeMap<HttpMethod, Operation>,
}

impl RouteLeaf {
    pub fn new(pattern: impl Into<String>, operation: Operation) -> Self {
        let mut operations = BTreeMap::new();
        operations.insert(operation.method(), operation);
        Self {
            pattern: pattern.into(),
            operations,
        }
    }

    /// Pattern text of the first route that reached this leaf.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn operations(&self) -> &BTreeMap<HttpMethod, Operation> {
        &self.operations
    }

    pub fn get(&self, method: HttpMethod) -> Option<&Operation> {
        self.operations.get(&method)
    }

    pub fn methods(&self) -> MethodSet {
        self.operations.keys().copied().collect()
    }

    /// Union of header-contract property names over all operations,
    /// uppercased.
    pub fn header_names(&self) -> BTreeSet<String> {
        self.operations
            .values()
            .flat_map(|op| op.contract().header_names())
            .map(|name| name.to_ascii_uppercase())
            .collect()
    }

    pub(super) fn absorb(&mut self, other: RouteLeaf, policy: DuplicatePolicy) -> TreeResult<()> {
        for (method, operation) in other.operations {
            if self.operations.contains_key(&method) {
                match policy {
                    DuplicatePolicy::Reject => {
                        return Err(TreeError::MethodCollision {
                            pattern: other.pattern,
                            existing: self.pattern.clone(),
                            method,
                        });
                    }
                    DuplicatePolicy::Override => {
                        tracing::warn!(
                            pattern = %other.pattern,
                            existing = %self.pattern,
                            method = %method,
                            "equivalent route declared twice; later declaration wins"
                        );
                    }
                }
            }
            self.operations.insert(method, operation);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum RouteSegmentNode {
    Const {
        value: String,
        children: Vec<RouteSegmentNode>,
    },
    Param {
        name: String,
        optional: bool,
        children: Vec<RouteSegmentNode>,
    },
    Rest {
        name: String,
        children: Vec<RouteSegmentNode>,
    },
    Leaf(RouteLeaf),
}

impl RouteSegmentNode {
    pub fn children(&self) -> &[RouteSegmentNode] {
        match self {
            RouteSegmentNode::Const { children, .. }
            | RouteSegmentNode::Param { children, .. }
            | RouteSegmentNode::Rest { children, .. } => children,
            RouteSegmentNode::Leaf(_) => &[],
        }
    }

    pub(super) fn children_mut(&mut self) -> Option<&mut Vec<RouteSegmentNode>> {
        match self {
            RouteSegmentNode::Const { children, .. }
            | RouteSegmentNode::Param { children, .. }
            | RouteSegmentNode::Rest { children, .. } => Some(children),
            RouteSegmentNode::Leaf(_) => None,
        }
    }

    pub(super) fn into_children(self) -> Vec<RouteSegmentNode> {
        match self {
            RouteSegmentNode::Const { children, .. }
            | RouteSegmentNode::Param { children, .. }
            | RouteSegmentNode::Rest { children, .. } => children,
            RouteSegmentNode::Leaf(_) => Vec::new(),
        }
    }

    pub fn as_leaf(&self) -> Option<&RouteLeaf> {
        match self {
            RouteSegmentNode::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Same kind and same discriminator: const value, param name and
    /// optionality, rest name. Any two leaves are similar.
    pub fn is_similar(&self, other: &RouteSegmentNode) -> bool {
        match (self, other) {
            (
                RouteSegmentNode::Const { value: a, .. },
                RouteSegmentNode::Const { value: b, .. },
            ) => a == b,
            (
                RouteSegmentNode::Param {
                    name: a,
                    optional: oa,
                    ..
                },
                RouteSegmentNode::Param {
                    name: b,
                    optional: ob,
                    ..
                },
            ) => a == b && oa == ob,
            (RouteSegmentNode::Rest { name: a, .. }, RouteSegmentNode::Rest { name: b, .. }) => {
                a == b
            }
            (RouteSegmentNode::Leaf(_), RouteSegmentNode::Leaf(_)) => true,
            _ => false,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            RouteSegmentNode::Param { .. } => 0,
            RouteSegmentNode::Const { .. } => 1,
            RouteSegmentNode::Rest { .. } => 2,
            RouteSegmentNode::Leaf(_) => 3,
        }
    }

    /// Sibling order: params by name (required before optional), then
    /// consts by value, then rest captures, leaf last.
    pub fn sibling_order(&self, other: &RouteSegmentNode) -> Ordering {
        match (self, other) {
            (
                RouteSegmentNode::Param {
                    name: a,
                    optional: oa,
                    ..
                },
                RouteSegmentNode::Param {
                    name: b,
                    optional: ob,
                    ..
                },
            ) => a.cmp(b).then(oa.cmp(ob)),
            (
                RouteSegmentNode::Const { value: a, .. },
                RouteSegmentNode::Const { value: b, .. },
            ) => a.cmp(b),
            (RouteSegmentNode::Rest { name: a, .. }, RouteSegmentNode::Rest { name: b, .. }) => {
                a.cmp(b)
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }

    pub(super) fn label(&self) -> String {
        match self {
            RouteSegmentNode::Const { value, .. } => value.clone(),
            RouteSegmentNode::Param { name, optional, .. } => {
                if *optional {
                    format!(":{name}?")
                } else {
                    format!(":{name}")
                }
            }
            RouteSegmentNode::Rest { name, .. } => format!("...{name}"),
            RouteSegmentNode::Leaf(leaf) => format!("[{}]", leaf.methods().header_value()),
        }
    }
}
