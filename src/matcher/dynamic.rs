use hashbrown::HashMap as FastHashMap;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

use super::{CaptureList, LeafTable, MatchOptions, MatchStrategy, Matcher, MatcherResult};
use crate::path::NormalizedPath;
use crate::tree::RouteSegmentNode;

const PARAM_SEGMENT: &str = "[^/]+";
const REST_REMAINDER: &str = ".+";

#[derive(Debug, Clone)]
struct ParamGroup {
    group: usize,
    name: Arc<str>,
    rest: bool,
}

/// Groups recorded for one leaf: its marker and every parameter on the way
/// down to it.
#[derive(Debug, Clone)]
struct LeafMarker {
    group: usize,
    leaf: usize,
    params: Vec<ParamGroup>,
}

#[derive(Debug, Clone)]
struct PendingParam {
    group_name: String,
    name: Arc<str>,
    rest: bool,
}

#[derive(Default)]
struct ExpressionBuilder {
    leaves: LeafTable,
    next_param: usize,
    path_params: Vec<PendingParam>,
    markers: Vec<(String, usize, Vec<PendingParam>)>,
}

impl ExpressionBuilder {
    fn alternation(&mut self, siblings: &[RouteSegmentNode]) -> String {
        siblings
            .iter()
            .map(|node| self.branch(node))
            .collect::<Vec<_>>()
            .join("|")
    }

    fn branch(&mut self, node: &RouteSegmentNode) -> String {
        match node {
            RouteSegmentNode::Const { value, children } => {
                format!("/{}(?:{})", regex::escape(value), self.alternation(children))
            }
            RouteSegmentNode::Param {
                name,
                optional,
                children,
            } => {
                let group = self.open_param(name, false);
                let children = self.alternation(children);
                self.path_params.pop();
                if *optional {
                    format!("(?:/(?P<{group}>{PARAM_SEGMENT}))?(?:{children})")
                } else {
                    format!("/(?P<{group}>{PARAM_SEGMENT})(?:{children})")
                }
            }
            RouteSegmentNode::Rest { name, children } => {
                let group = self.open_param(name, true);
                let children = self.alternation(children);
                self.path_params.pop();
                format!("(?:/(?P<{group}>{REST_REMAINDER}))?(?:{children})")
            }
            RouteSegmentNode::Leaf(leaf) => {
                let id = self.leaves.push(leaf);
                let group = format!("m{id}");
                self.markers
                    .push((group.clone(), id, self.path_params.clone()));
                format!("(?P<{group}>)")
            }
        }
    }

    fn open_param(&mut self, name: &str, rest: bool) -> String {
        let group_name = format!("p{}", self.next_param);
        self.next_param += 1;
        self.path_params.push(PendingParam {
            group_name: group_name.clone(),
            name: Arc::from(name),
            rest,
        });
        group_name
    }
}

/// Regex-backed matcher: the whole forest becomes `^(?:...)$` with an empty
/// marker group at every leaf. One regex execution per lookup; the marker
/// that participated names the leaf and the parameter groups on its path
/// yield the params.
#[derive(Debug)]
pub struct DynamicMatcher {
    regex: Regex,
    markers: Vec<LeafMarker>,
    leaves: LeafTable,
    options: MatchOptions,
}

impl DynamicMatcher {
    pub fn new(forest: &[RouteSegmentNode], options: MatchOptions) -> MatcherResult<Self> {
        let mut builder = ExpressionBuilder::default();
        let body = builder.alternation(forest);
        let source = format!("(?s)^(?:{body})$");

        let regex = RegexBuilder::new(&source)
            .size_limit(options.regex_size_limit)
            .build()?;

        let groups: FastHashMap<String, usize> = regex
            .capture_names()
            .enumerate()
            .filter_map(|(index, name)| name.map(|n| (n.to_string(), index)))
            .collect();
        let group_index = |name: &str| groups.get(name).copied().unwrap_or(0);

        let markers = builder
            .markers
            .iter()
            .map(|(group, leaf, params)| LeafMarker {
                group: group_index(group.as_str()),
                leaf: *leaf,
                params: params
                    .iter()
                    .map(|p| ParamGroup {
                        group: group_index(p.group_name.as_str()),
                        name: p.name.clone(),
                        rest: p.rest,
                    })
                    .collect(),
            })
            .collect();

        tracing::event!(
            tracing::Level::TRACE,
            expression_len = source.len() as u64,
            groups = regex.captures_len() as u64,
            "route expression compiled"
        );

        Ok(Self {
            regex,
            markers,
            leaves: builder.leaves,
            options,
        })
    }

    /// Source text of the composed expression.
    pub fn expression(&self) -> &str {
        self.regex.as_str()
    }
}

impl Matcher for DynamicMatcher {
    fn strategy(&self) -> MatchStrategy {
        MatchStrategy::Dynamic
    }

    fn options(&self) -> &MatchOptions {
        &self.options
    }

    fn leaves(&self) -> &LeafTable {
        &self.leaves
    }

    #[tracing::instrument(level = "trace", skip(self, path), fields(segments = path.segment_count() as u64))]
    fn match_normalized(&self, path: &NormalizedPath) -> Option<(usize, CaptureList)> {
        let text = path.as_str();
        let found = self.regex.captures(text)?;
        let marker = self
            .markers
            .iter()
            .find(|marker| found.get(marker.group).is_some())?;

        let mut captures = CaptureList::new();
        for param in &marker.params {
            match found.get(param.group) {
                Some(m) => captures.push((param.name.clone(), (m.start(), m.len()))),
                None if param.rest => captures.push((param.name.clone(), (text.len(), 0))),
                None => {}
            }
        }

        Some((marker.leaf, captures))
    }
}
