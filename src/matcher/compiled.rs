use hashbrown::HashMap as FastHashMap;
use std::sync::Arc;

use super::{CaptureList, LeafTable, MatchOptions, MatchStrategy, Matcher};
use crate::path::NormalizedPath;
use crate::tree::RouteSegmentNode;

#[derive(Debug)]
struct ParamSlot {
    name: Arc<str>,
    optional: bool,
}

/// One forest level lowered for lookup. Branches are tried in sibling
/// order: params, the single const equal to the segment, rest captures,
/// then the leaf.
#[derive(Debug, Default)]
struct CompiledNode {
    params: Vec<(ParamSlot, CompiledNode)>,
    statics: FastHashMap<Box<str>, CompiledNode>,
    rests: Vec<(Arc<str>, CompiledNode)>,
    leaf: Option<usize>,
}

impl CompiledNode {
    fn lower(siblings: &[RouteSegmentNode], leaves: &mut LeafTable) -> Self {
        let mut node = CompiledNode::default();

        for sibling in siblings {
            match sibling {
                RouteSegmentNode::Param {
                    name,
                    optional,
                    children,
                } => {
                    let slot = ParamSlot {
                        name: Arc::from(name.as_str()),
                        optional: *optional,
                    };
                    node.params.push((slot, Self::lower(children, leaves)));
                }
                RouteSegmentNode::Const { value, children } => {
                    let child = Self::lower(children, leaves);
                    node.statics.insert(value.as_str().into(), child);
                }
                RouteSegmentNode::Rest { name, children } => {
                    node.rests
                        .push((Arc::from(name.as_str()), Self::lower(children, leaves)));
                }
                RouteSegmentNode::Leaf(leaf) => node.leaf = Some(leaves.push(leaf)),
            }
        }

        node.statics.shrink_to_fit();
        node
    }

    fn walk(&self, path: &NormalizedPath, index: usize, captures: &mut CaptureList) -> Option<usize> {
        for (slot, child) in &self.params {
            if let Some(span) = path.span(index) {
                let checkpoint = captures.len();
                captures.push((slot.name.clone(), span));
                if let Some(found) = child.walk(path, index + 1, captures) {
                    return Some(found);
                }
                captures.truncate(checkpoint);
            }
            if slot.optional
                && let Some(found) = child.walk(path, index, captures)
            {
                return Some(found);
            }
        }

        if let Some(segment) = path.segment(index)
            && let Some(child) = self.statics.get(segment)
            && let Some(found) = child.walk(path, index + 1, captures)
        {
            return Some(found);
        }

        for (name, child) in &self.rests {
            let checkpoint = captures.len();
            captures.push((name.clone(), path.remainder(index)));
            if let Some(found) = child.walk(path, path.segment_count(), captures) {
                return Some(found);
            }
            captures.truncate(checkpoint);
        }

        if index == path.segment_count() {
            return self.leaf;
        }

        None
    }
}

/// Ahead-of-time matcher: the forest is lowered once into nested nodes with
/// hashed literal children, so a lookup branches once per path segment.
#[derive(Debug)]
pub struct CompiledMatcher {
    root: CompiledNode,
    leaves: LeafTable,
    options: MatchOptions,
}

impl CompiledMatcher {
    pub fn new(forest: &[RouteSegmentNode], options: MatchOptions) -> Self {
        let mut leaves = LeafTable::default();
        let root = CompiledNode::lower(forest, &mut leaves);
        Self {
            root,
            leaves,
            options,
        }
    }
}

impl Matcher for CompiledMatcher {
    fn strategy(&self) -> MatchStrategy {
        MatchStrategy::Compiled
    }

    fn options(&self) -> &MatchOptions {
        &self.options
    }

    fn leaves(&self) -> &LeafTable {
        &self.leaves
    }

    #[tracing::instrument(level = "trace", skip(self, path), fields(segments = path.segment_count() as u64))]
    fn match_normalized(&self, path: &NormalizedPath) -> Option<(usize, CaptureList)> {
        let mut captures = CaptureList::new();
        let leaf = self.root.walk(path, 0, &mut captures)?;
        Some((leaf, captures))
    }
}
