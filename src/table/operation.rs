use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::contract::{Contract, RequiredParams};
use crate::dispatch::RequestContext;
use crate::types::{BoxError, HttpMethod, Response};

pub type HandlerFuture = BoxFuture<'static, Result<Response, BoxError>>;

pub trait Handler: Send + Sync + 'static {
    fn call(&self, context: RequestContext) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
{
    fn call(&self, context: RequestContext) -> HandlerFuture {
        Box::pin(self(context))
    }
}

pub type SharedHandler = Arc<dyn Handler>;

/// Handler plus contract registered for one method on one path.
#[derive(Clone)]
pub struct Operation {
    method: HttpMethod,
    handler: SharedHandler,
    contract: Contract,
}

impl Operation {
    pub fn new(method: HttpMethod, handler: impl Handler, contract: Contract) -> Self {
        Self {
            method,
            handler: Arc::new(handler),
            contract,
        }
    }

    pub fn from_shared(method: HttpMethod, handler: SharedHandler, contract: Contract) -> Self {
        Self {
            method,
            handler,
            contract,
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn handler(&self) -> &SharedHandler {
        &self.handler
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub fn call(&self, context: RequestContext) -> HandlerFuture {
        self.handler.call(context)
    }

    pub(crate) fn with_implicit_params(mut self, required: Vec<String>) -> Self {
        if self.contract.params.is_none() {
            self.contract.params = Some(Arc::new(RequiredParams::new(required)));
        }
        self
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("method", &self.method)
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}
