use std::fmt::Write as _;

use super::{RouteLeaf, RouteSegmentNode, TreeResult};
use crate::pattern::{PathSegmentToken, parse_path};
use crate::table::{DuplicatePolicy, Operation, RouteTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestOptions {
    pub duplicate_policy: DuplicatePolicy,
    /// When false, literal segments are lowercased before merging so that
    /// they meet lowercased request paths.
    pub case_sensitive: bool,
}

impl Default for ForestOptions {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::default(),
            case_sensitive: true,
        }
    }
}

/// Tokenizes every route of `table` and merges the resulting single-path
/// trees into one sibling-sorted forest.
#[tracing::instrument(level = "debug", skip(table), fields(routes = table.len() as u64))]
pub fn build_forest(
    table: &RouteTable,
    options: ForestOptions,
) -> TreeResult<Vec<RouteSegmentNode>> {
    let mut trees = Vec::with_capacity(table.len());
    for entry in table.routes() {
        let mut tokens = parse_path(&entry.path)?;
        if !options.case_sensitive {
            for token in tokens.iter_mut() {
                if let PathSegmentToken::Literal(value) = token {
                    value.make_ascii_lowercase();
                }
            }
        }
        trees.push(fold_route(&entry.path, &tokens, entry.operation.clone()));
    }

    let forest = merge_forest(trees, options.duplicate_policy)?;
    tracing::event!(tracing::Level::DEBUG, roots = forest.len() as u64, "route forest built");
    Ok(forest)
}

/// Folds `tokens` right to left into a single-path tree ending in a leaf
/// that holds `operation`.
pub fn fold_route(
    pattern: &str,
    tokens: &[PathSegmentToken],
    operation: Operation,
) -> RouteSegmentNode {
    let required = tokens
        .iter()
        .filter_map(|token| match token {
            PathSegmentToken::Param {
                name,
                optional: false,
            } => Some(name.clone()),
            _ => None,
        })
        .collect();
    let leaf = RouteSegmentNode::Leaf(RouteLeaf::new(
        pattern,
        operation.with_implicit_params(required),
    ));

    tokens.iter().rev().fold(leaf, |child, token| match token {
        PathSegmentToken::Literal(value) => RouteSegmentNode::Const {
            value: value.clone(),
            children: vec![child],
        },
        PathSegmentToken::Param { name, optional } => RouteSegmentNode::Param {
            name: name.clone(),
            optional: *optional,
            children: vec![child],
        },
        PathSegmentToken::Rest { name } => RouteSegmentNode::Rest {
            name: name.clone(),
            children: vec![child],
        },
    })
}

/// Merges trees whose roots are similar, recursively through their
/// children, then sorts every sibling list.
pub fn merge_forest(
    trees: Vec<RouteSegmentNode>,
    policy: DuplicatePolicy,
) -> TreeResult<Vec<RouteSegmentNode>> {
    let mut merged: Vec<RouteSegmentNode> = Vec::with_capacity(trees.len());
    for tree in trees {
        merge_into(&mut merged, tree, policy)?;
    }
    sort_siblings(&mut merged);
    Ok(merged)
}

fn merge_into(
    siblings: &mut Vec<RouteSegmentNode>,
    incoming: RouteSegmentNode,
    policy: DuplicatePolicy,
) -> TreeResult<()> {
    match siblings.iter_mut().find(|node| node.is_similar(&incoming)) {
        Some(existing) => merge_similar(existing, incoming, policy),
        None => {
            siblings.push(incoming);
            Ok(())
        }
    }
}

fn merge_similar(
    target: &mut RouteSegmentNode,
    incoming: RouteSegmentNode,
    policy: DuplicatePolicy,
) -> TreeResult<()> {
    if let RouteSegmentNode::Leaf(existing) = target {
        if let RouteSegmentNode::Leaf(other) = incoming {
            existing.absorb(other, policy)?;
        }
        return Ok(());
    }

    if let Some(children) = target.children_mut() {
        for child in incoming.into_children() {
            merge_into(children, child, policy)?;
        }
    }
    Ok(())
}

fn sort_siblings(siblings: &mut [RouteSegmentNode]) {
    siblings.sort_by(|a, b| a.sibling_order(b));
    for node in siblings.iter_mut() {
        if let Some(children) = node.children_mut() {
            sort_siblings(children);
        }
    }
}

/// Indented outline of a forest, one node per line, two spaces per level.
pub fn describe_forest(forest: &[RouteSegmentNode]) -> String {
    let mut out = String::new();
    describe_level(forest, 0, &mut out);
    out
}

fn describe_level(nodes: &[RouteSegmentNode], depth: usize, out: &mut String) {
    for node in nodes {
        let _ = writeln!(out, "{:indent$}{}", "", node.label(), indent = depth * 2);
        describe_level(node.children(), depth + 1, out);
    }
}
