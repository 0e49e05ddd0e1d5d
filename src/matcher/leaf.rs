use std::collections::BTreeMap;

use crate::table::Operation;
use crate::tree::RouteLeaf;
use crate::types::{HttpMethod, MethodSet};

/// Leaf as seen at request time, with the `Allow` and CORS header values
/// precomputed.
#[derive(Debug)]
pub struct ResolvedLeaf {
    id: usize,
    pattern: String,
    operations: BTreeMap<HttpMethod, Operation>,
    methods: MethodSet,
    allow: String,
    cors_headers: String,
}

#[derive(Debug)]
pub enum LeafResolution<'a> {
    Operation(&'a Operation),
    Preflight,
    MethodNotAllowed,
}

impl ResolvedLeaf {
    fn new(id: usize, leaf: &RouteLeaf) -> Self {
        let methods = leaf.methods();
        let allow = (methods | MethodSet::OPTIONS).header_value();
        let cors_headers = leaf.header_names().into_iter().collect::<Vec<_>>().join(", ");

        Self {
            id,
            pattern: leaf.pattern().to_string(),
            operations: leaf.operations().clone(),
            methods,
            allow,
            cors_headers,
        }
    }

    /// Position in preorder over the sorted forest.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn operations(&self) -> &BTreeMap<HttpMethod, Operation> {
        &self.operations
    }

    pub fn methods(&self) -> MethodSet {
        self.methods
    }

    /// Declared methods plus OPTIONS.
    pub fn allow_header(&self) -> &str {
        &self.allow
    }

    pub fn cors_allow_headers(&self) -> &str {
        &self.cors_headers
    }

    pub fn resolve(&self, method: Option<HttpMethod>) -> LeafResolution<'_> {
        match method {
            Some(method) => match self.operations.get(&method) {
                Some(operation) => LeafResolution::Operation(operation),
                None if method == HttpMethod::Options => LeafResolution::Preflight,
                None => LeafResolution::MethodNotAllowed,
            },
            None => LeafResolution::MethodNotAllowed,
        }
    }
}

#[derive(Debug, Default)]
pub struct LeafTable {
    leaves: Vec<ResolvedLeaf>,
}

impl LeafTable {
    pub(super) fn push(&mut self, leaf: &RouteLeaf) -> usize {
        let id = self.leaves.len();
        self.leaves.push(ResolvedLeaf::new(id, leaf));
        id
    }

    pub fn get(&self, id: usize) -> Option<&ResolvedLeaf> {
        self.leaves.get(id)
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedLeaf> {
        self.leaves.iter()
    }
}
