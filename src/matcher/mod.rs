mod compiled;
mod dynamic;
mod error;
mod leaf;
mod params;

pub use compiled::CompiledMatcher;
pub use dynamic::DynamicMatcher;
pub use error::{MatcherError, MatcherResult};
pub use leaf::{LeafResolution, LeafTable, ResolvedLeaf};
pub use params::CaptureList;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::path::{NormalizedPath, normalize_request_path};
use crate::table::Operation;
use crate::tree::RouteSegmentNode;
use crate::types::{HttpMethod, PathParams};
use params::captures_to_map;

pub const DEFAULT_REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MatchStrategy {
    /// Lowered ahead of time into a hashed decision tree.
    #[default]
    Compiled,
    /// One composed regular expression plus a leaf side-table.
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    pub case_sensitive: bool,
    pub decode_params: bool,
    pub regex_size_limit: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            decode_params: true,
            regex_size_limit: DEFAULT_REGEX_SIZE_LIMIT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LeafMatch<'a> {
    pub leaf: &'a ResolvedLeaf,
    pub params: PathParams,
}

#[derive(Debug)]
pub enum Resolution<'a> {
    Matched {
        leaf: &'a ResolvedLeaf,
        operation: &'a Operation,
        params: PathParams,
    },
    Preflight {
        leaf: &'a ResolvedLeaf,
    },
    MethodNotAllowed {
        leaf: &'a ResolvedLeaf,
    },
    NotFound,
}

/// Strategy-independent summary of a resolution, comparable across
/// matchers built from the same forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Matched { leaf: usize, method: HttpMethod },
    Preflight { leaf: usize },
    MethodNotAllowed { leaf: usize },
    NotFound,
}

impl Resolution<'_> {
    pub fn outcome(&self) -> Outcome {
        match self {
            Resolution::Matched {
                leaf, operation, ..
            } => Outcome::Matched {
                leaf: leaf.id(),
                method: operation.method(),
            },
            Resolution::Preflight { leaf } => Outcome::Preflight { leaf: leaf.id() },
            Resolution::MethodNotAllowed { leaf } => Outcome::MethodNotAllowed { leaf: leaf.id() },
            Resolution::NotFound => Outcome::NotFound,
        }
    }
}

/// Immutable path matcher built once from a route forest. Implementations
/// are shared across request tasks without synchronization.
pub trait Matcher: Send + Sync + fmt::Debug {
    fn strategy(&self) -> MatchStrategy;

    fn options(&self) -> &MatchOptions;

    fn leaves(&self) -> &LeafTable;

    /// Leaf id and raw captures for an already normalized path.
    fn match_normalized(&self, path: &NormalizedPath) -> Option<(usize, CaptureList)>;

    fn lookup(&self, path: &str) -> Option<LeafMatch<'_>> {
        let options = self.options();
        let normalized = normalize_request_path(path, options.case_sensitive);
        let (id, captures) = self.match_normalized(&normalized)?;
        let leaf = self.leaves().get(id)?;
        Some(LeafMatch {
            leaf,
            params: captures_to_map(&normalized, &captures, options.decode_params),
        })
    }

    fn resolve(&self, method: HttpMethod, path: &str) -> Resolution<'_> {
        self.resolve_with(Some(method), path)
    }

    /// `method` is `None` for request methods outside the supported verbs;
    /// those can only ever produce 404 or 405.
    #[tracing::instrument(level = "trace", skip(self, path), fields(strategy = ?self.strategy(), path = %path))]
    fn resolve_with(&self, method: Option<HttpMethod>, path: &str) -> Resolution<'_> {
        let Some(LeafMatch { leaf, params }) = self.lookup(path) else {
            return Resolution::NotFound;
        };

        match leaf.resolve(method) {
            LeafResolution::Operation(operation) => Resolution::Matched {
                leaf,
                operation,
                params,
            },
            LeafResolution::Preflight => Resolution::Preflight { leaf },
            LeafResolution::MethodNotAllowed => Resolution::MethodNotAllowed { leaf },
        }
    }
}

#[tracing::instrument(level = "debug", skip(forest, options), fields(roots = forest.len() as u64))]
pub fn build_matcher(
    forest: &[RouteSegmentNode],
    strategy: MatchStrategy,
    options: MatchOptions,
) -> MatcherResult<Arc<dyn Matcher>> {
    let matcher: Arc<dyn Matcher> = match strategy {
        MatchStrategy::Compiled => Arc::new(CompiledMatcher::new(forest, options)),
        MatchStrategy::Dynamic => Arc::new(DynamicMatcher::new(forest, options)?),
    };
    tracing::event!(
        tracing::Level::DEBUG,
        leaves = matcher.leaves().len() as u64,
        "matcher built"
    );
    Ok(matcher)
}
