mod cancel;
mod context;
pub mod decode;
mod decorator;
mod error;
pub mod response;
mod service;

pub use cancel::CancelSignal;
pub use context::RequestContext;
pub use decorator::{Decorations, Decorator, DecoratorFuture, SharedDecorator, decorator_fn};
pub use error::{DispatchError, DispatchResult};
pub use service::Dispatcher;
