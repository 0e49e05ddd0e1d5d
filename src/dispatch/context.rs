use serde_json::{Map, Value};

use crate::types::{PathParams, Request};

/// Everything the pipeline learned about one request, handed to the handler
/// by value.
#[derive(Debug)]
pub struct RequestContext {
    pub request: Request,
    pub params: PathParams,
    pub headers: Map<String, Value>,
    pub query: Map<String, Value>,
    pub body: Value,
    /// Keys contributed by decorators, in the order they ran.
    pub decorations: Map<String, Value>,
}

impl RequestContext {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query_value(&self, name: &str) -> Option<&Value> {
        self.query.get(name)
    }

    pub fn decoration(&self, key: &str) -> Option<&Value> {
        self.decorations.get(key)
    }
}
