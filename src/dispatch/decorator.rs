use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::types::{BoxError, Request};

pub type Decorations = Map<String, Value>;

pub type DecoratorFuture<'a> = BoxFuture<'a, Result<Decorations, BoxError>>;

/// Context provider run before routing. Receives the request and every key
/// contributed by earlier decorators; returned keys are merged over them.
pub trait Decorator: Send + Sync + 'static {
    fn decorate<'a>(&'a self, request: &'a Request, context: &'a Decorations)
    -> DecoratorFuture<'a>;
}

pub type SharedDecorator = Arc<dyn Decorator>;

struct FnDecorator<F>(F);

impl<F> Decorator for FnDecorator<F>
where
    F: Fn(&Request, &Decorations) -> Result<Decorations, BoxError> + Send + Sync + 'static,
{
    fn decorate<'a>(
        &'a self,
        request: &'a Request,
        context: &'a Decorations,
    ) -> DecoratorFuture<'a> {
        futures::future::ready((self.0)(request, context)).boxed()
    }
}

/// Wraps a synchronous closure as a decorator.
pub fn decorator_fn<F>(f: F) -> SharedDecorator
where
    F: Fn(&Request, &Decorations) -> Result<Decorations, BoxError> + Send + Sync + 'static,
{
    Arc::new(FnDecorator(f))
}
