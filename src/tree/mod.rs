mod build;
mod error;
mod node;

pub use build::{ForestOptions, build_forest, describe_forest, fold_route, merge_forest};
pub use error::{TreeError, TreeResult};
pub use node::{RouteLeaf, RouteSegmentNode};
