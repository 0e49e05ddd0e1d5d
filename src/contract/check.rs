use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Validation predicate supplied by the schema engine. The router only ever
/// asks whether a decoded value passes.
pub trait Check: Send + Sync {
    fn check(&self, value: &Value) -> bool;

    /// Top-level property names, when the contract describes an object.
    /// Header contracts use these to advertise CORS request headers.
    fn property_names(&self) -> Vec<String> {
        Vec::new()
    }
}

pub type SharedCheck = Arc<dyn Check>;

impl<C: Check + ?Sized> Check for Arc<C> {
    fn check(&self, value: &Value) -> bool {
        (**self).check(value)
    }

    fn property_names(&self) -> Vec<String> {
        (**self).property_names()
    }
}

pub struct FnCheck<F>(F);

impl<F> Check for FnCheck<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn check(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

pub fn check_fn<F>(f: F) -> SharedCheck
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Arc::new(FnCheck(f))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractSection {
    Headers,
    Params,
    Query,
    Body,
    Response,
}

impl fmt::Display for ContractSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContractSection::Headers => "headers",
            ContractSection::Params => "params",
            ContractSection::Query => "query",
            ContractSection::Body => "body",
            ContractSection::Response => "response",
        })
    }
}

/// Per-operation validators. Every section is optional.
#[derive(Clone, Default)]
pub struct Contract {
    pub headers: Option<SharedCheck>,
    pub params: Option<SharedCheck>,
    pub query: Option<SharedCheck>,
    pub body: Option<SharedCheck>,
    pub response: Option<SharedCheck>,
}

impl Contract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(mut self, check: impl Check + 'static) -> Self {
        self.headers = Some(Arc::new(check));
        self
    }

    pub fn params(mut self, check: impl Check + 'static) -> Self {
        self.params = Some(Arc::new(check));
        self
    }

    pub fn query(mut self, check: impl Check + 'static) -> Self {
        self.query = Some(Arc::new(check));
        self
    }

    pub fn body(mut self, check: impl Check + 'static) -> Self {
        self.body = Some(Arc::new(check));
        self
    }

    pub fn response(mut self, check: impl Check + 'static) -> Self {
        self.response = Some(Arc::new(check));
        self
    }

    pub fn section(&self, section: ContractSection) -> Option<&SharedCheck> {
        match section {
            ContractSection::Headers => self.headers.as_ref(),
            ContractSection::Params => self.params.as_ref(),
            ContractSection::Query => self.query.as_ref(),
            ContractSection::Body => self.body.as_ref(),
            ContractSection::Response => self.response.as_ref(),
        }
    }

    /// `Check` for `section`, or true when the section is undeclared.
    pub fn accepts(&self, section: ContractSection, value: &Value) -> bool {
        self.section(section).is_none_or(|check| check.check(value))
    }

    pub fn header_names(&self) -> Vec<String> {
        self.headers
            .as_ref()
            .map(|check| check.property_names())
            .unwrap_or_default()
    }
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract")
            .field("headers", &self.headers.is_some())
            .field("params", &self.params.is_some())
            .field("query", &self.query.is_some())
            .field("body", &self.body.is_some())
            .field("response", &self.response.is_some())
            .finish()
    }
}
