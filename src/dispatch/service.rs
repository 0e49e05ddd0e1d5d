use futures::FutureExt;
use http::header::ORIGIN;
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use super::decode::{decode_body, decode_headers, decode_query};
use super::{
    CancelSignal, Decorations, DispatchError, DispatchResult, RequestContext, SharedDecorator,
    response,
};
use crate::contract::{Contract, ContractSection};
use crate::matcher::{Matcher, Resolution};
use crate::table::Operation;
use crate::types::{HttpMethod, PathParams, Request, Response};

/// Per-request pipeline over an immutable matcher. Cheap to share behind an
/// `Arc`; `dispatch` never fails, every short-circuit becomes a response.
pub struct Dispatcher {
    matcher: Arc<dyn Matcher>,
    decorators: Vec<SharedDecorator>,
    validate_responses: bool,
}

impl Dispatcher {
    pub fn new(matcher: Arc<dyn Matcher>) -> Self {
        Self {
            matcher,
            decorators: Vec::new(),
            validate_responses: false,
        }
    }

    /// Decorators run in the given order before routing.
    pub fn with_decorators(mut self, decorators: Vec<SharedDecorator>) -> Self {
        self.decorators = decorators;
        self
    }

    pub fn with_response_validation(mut self, enabled: bool) -> Self {
        self.validate_responses = enabled;
        self
    }

    pub fn matcher(&self) -> &Arc<dyn Matcher> {
        &self.matcher
    }

    pub async fn dispatch(&self, request: Request) -> Response {
        self.dispatch_with_signal(request, &CancelSignal::new())
            .await
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(method = %request.method(), path = %request.uri().path())
    )]
    pub async fn dispatch_with_signal(&self, request: Request, signal: &CancelSignal) -> Response {
        match AssertUnwindSafe(self.run(request, signal))
            .catch_unwind()
            .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => {
                if error.is_server_error() {
                    tracing::error!(error = %error, "request failed");
                } else {
                    tracing::debug!(status = error.status().as_u16(), error = %error, "request rejected");
                }
                error.into_response()
            }
            Err(panic) => {
                let error = DispatchError::HandlerPanic(panic_message(panic.as_ref()));
                tracing::error!(error = %error, "request failed");
                error.into_response()
            }
        }
    }

    async fn run(&self, request: Request, signal: &CancelSignal) -> DispatchResult<Response> {
        let decorations = self.decorate(&request, signal).await?;

        checkpoint(signal)?;
        let method = HttpMethod::try_from(request.method()).ok();
        let (operation, params) = match self.matcher.resolve_with(method, request.uri().path()) {
            Resolution::Matched {
                operation, params, ..
            } => (operation, params),
            Resolution::Preflight { leaf } => {
                tracing::event!(tracing::Level::TRACE, stage = "preflight", pattern = %leaf.pattern());
                return Ok(response::preflight(leaf, request.headers().get(ORIGIN)));
            }
            Resolution::MethodNotAllowed { leaf } => {
                return Err(DispatchError::MethodNotAllowed {
                    method: request.method().to_string(),
                    path: request.uri().path().to_string(),
                    allow: leaf.allow_header().to_string(),
                });
            }
            Resolution::NotFound => {
                return Err(DispatchError::NotFound {
                    path: request.uri().path().to_string(),
                });
            }
        };

        let context = validate(request, operation, params, decorations, signal)?;

        checkpoint(signal)?;
        tracing::event!(tracing::Level::TRACE, stage = "handler", method = %operation.method());
        let response = operation
            .call(context)
            .await
            .map_err(DispatchError::Handler)?;

        if self.validate_responses {
            check_response(operation, &response)?;
        }
        Ok(response)
    }

    async fn decorate(
        &self,
        request: &Request,
        signal: &CancelSignal,
    ) -> DispatchResult<Decorations> {
        let mut decorations = Decorations::new();
        for (index, decorator) in self.decorators.iter().enumerate() {
            checkpoint(signal)?;
            let produced = decorator
                .decorate(request, &decorations)
                .await
                .map_err(|source| DispatchError::Decorator { index, source })?;
            tracing::event!(
                tracing::Level::TRACE,
                stage = "decorate",
                index = index as u64,
                keys = produced.len() as u64
            );
            decorations.extend(produced);
        }
        Ok(decorations)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("strategy", &self.matcher.strategy())
            .field("leaves", &self.matcher.leaves().len())
            .field("decorators", &self.decorators.len())
            .field("validate_responses", &self.validate_responses)
            .finish()
    }
}

/// Headers, params, query, then body, each checked against its contract
/// section before the next one is decoded.
fn validate(
    request: Request,
    operation: &Operation,
    params: PathParams,
    decorations: Decorations,
    signal: &CancelSignal,
) -> DispatchResult<RequestContext> {
    let contract = operation.contract();

    checkpoint(signal)?;
    let headers = decode_headers(request.headers());
    let headers_value = Value::Object(headers.clone());
    require(contract, ContractSection::Headers, &headers_value)?;

    checkpoint(signal)?;
    let params_value: Map<String, Value> = params
        .iter()
        .map(|(name, value)| (name.clone(), Value::String(value.clone())))
        .collect();
    require(contract, ContractSection::Params, &Value::Object(params_value))?;

    checkpoint(signal)?;
    let query = decode_query(request.uri().query());
    let query_value = Value::Object(query.clone());
    require(contract, ContractSection::Query, &query_value)?;

    let body = if contract.body.is_some() {
        checkpoint(signal)?;
        let body = decode_body(request.headers(), request.body())?;
        require(contract, ContractSection::Body, &body)?;
        body
    } else {
        Value::Null
    };

    Ok(RequestContext {
        request,
        params,
        headers,
        query,
        body,
        decorations,
    })
}

fn checkpoint(signal: &CancelSignal) -> DispatchResult<()> {
    if signal.is_cancelled() {
        return Err(DispatchError::Cancelled);
    }
    Ok(())
}

fn require(contract: &Contract, section: ContractSection, value: &Value) -> DispatchResult<()> {
    if contract.accepts(section, value) {
        Ok(())
    } else {
        Err(DispatchError::ContractViolation { section })
    }
}

/// Only JSON bodies of successful responses are checked.
fn check_response(operation: &Operation, response: &Response) -> DispatchResult<()> {
    let Some(check) = operation.contract().response.as_ref() else {
        return Ok(());
    };
    if !response.status().is_success() {
        return Ok(());
    }
    let value: Value =
        serde_json::from_slice(response.body()).map_err(|_| DispatchError::ResponseContract)?;
    if check.check(&value) {
        Ok(())
    } else {
        Err(DispatchError::ResponseContract)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
