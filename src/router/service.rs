use parking_lot::RwLock;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use crate::contract::Contract;
use crate::dispatch::{DispatchError, Dispatcher, SharedDecorator};
use crate::matcher::build_matcher;
use crate::router::{RouterError, RouterOptions, RouterResult};
use crate::table::{Handler, RouteTable, RouteTableBuilder};
use crate::tree::build_forest;
use crate::types::{BoxError, HttpMethod, Request, Response};

struct RouterState {
    /// Pending registrations; taken by `seal()`.
    builder: Option<RouteTableBuilder>,
    decorators: Vec<SharedDecorator>,
    dispatcher: OnceLock<Arc<Dispatcher>>,
}

impl RouterState {
    fn new(options: &RouterOptions) -> Self {
        Self {
            builder: Some(RouteTableBuilder::with_policy(options.duplicate_policy)),
            decorators: Vec::new(),
            dispatcher: OnceLock::new(),
        }
    }
}

impl fmt::Debug for RouterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterState")
            .field("builder", &self.builder)
            .field("decorators", &self.decorators.len())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

/// Registration front end plus the dispatcher it seals into.
///
/// Routes, mounts and decorators are accepted until `seal()`. Sealing
/// consumes the pending registrations even when it fails; a router whose
/// seal failed has to be rebuilt.
#[derive(Debug)]
pub struct Router {
    options: RouterOptions,
    inner: RwLock<RouterState>,
}

impl Router {
    pub fn new(options: Option<RouterOptions>) -> Self {
        let options = options.unwrap_or_default();
        Self {
            inner: RwLock::new(RouterState::new(&options)),
            options,
        }
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    pub fn add(
        &self,
        method: HttpMethod,
        path: &str,
        handler: impl Handler,
        contract: Contract,
    ) -> RouterResult<()> {
        let mut guard = self.inner.write();
        let Some(builder) = guard.builder.as_mut() else {
            return Err(RouterError::AddWhileSealed {
                path: path.to_string(),
            });
        };
        builder.add(method, path, handler, contract);
        Ok(())
    }

    pub fn mount(&self, prefix: &str, table: RouteTable) -> RouterResult<()> {
        self.with_builder(prefix, |builder| {
            builder.mount(prefix, table);
        })
    }

    pub fn mount_factory<F>(&self, prefix: &str, factory: F) -> RouterResult<()>
    where
        F: FnOnce(&RouteTable) -> Result<RouteTable, BoxError> + Send + Sync + 'static,
    {
        self.with_builder(prefix, |builder| {
            builder.mount_factory(prefix, factory);
        })
    }

    pub fn mount_async_factory<F, Fut>(&self, prefix: &str, factory: F) -> RouterResult<()>
    where
        F: FnOnce(RouteTable) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RouteTable, BoxError>> + Send + 'static,
    {
        self.with_builder(prefix, |builder| {
            builder.mount_async_factory(prefix, factory);
        })
    }

    pub fn decorate(&self, decorator: SharedDecorator) -> RouterResult<()> {
        let mut guard = self.inner.write();
        if guard.builder.is_none() {
            return Err(RouterError::DecorateWhileSealed);
        }
        guard.decorators.push(decorator);
        Ok(())
    }

    /// Builds the route table (running mount factories), merges it into the
    /// route forest and compiles the configured matcher.
    #[tracing::instrument(level = "debug", skip(self), fields(strategy = ?self.options.strategy))]
    pub async fn seal(&self) -> RouterResult<Arc<Dispatcher>> {
        self.options.validate()?;

        let (builder, decorators) = {
            let mut guard = self.inner.write();
            let builder = guard.builder.take().ok_or(RouterError::AlreadySealed)?;
            (builder, std::mem::take(&mut guard.decorators))
        };

        let table = builder.build().await?;
        let forest = build_forest(&table, self.options.forest_options())?;
        let matcher = build_matcher(
            &forest,
            self.options.strategy,
            self.options.match_options(),
        )?;

        let dispatcher = Arc::new(
            Dispatcher::new(matcher)
                .with_decorators(decorators)
                .with_response_validation(self.options.validate_responses),
        );
        // `builder.take()` above admits exactly one seal past this point.
        let installed = self.inner.read().dispatcher.set(dispatcher.clone()).is_ok();
        debug_assert!(installed, "dispatcher installed twice");

        tracing::info!(
            routes = table.len() as u64,
            leaves = dispatcher.matcher().leaves().len() as u64,
            "router sealed"
        );
        Ok(dispatcher)
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.read().dispatcher.get().is_some()
    }

    pub fn dispatcher(&self) -> RouterResult<Arc<Dispatcher>> {
        self.inner
            .read()
            .dispatcher
            .get()
            .cloned()
            .ok_or(RouterError::NotSealed)
    }

    /// Dispatches through the sealed dispatcher; 503 before `seal()`.
    pub async fn dispatch(&self, request: Request) -> Response {
        match self.dispatcher() {
            Ok(dispatcher) => dispatcher.dispatch(request).await,
            Err(_) => DispatchError::NotReady.into_response(),
        }
    }

    fn with_builder(
        &self,
        prefix: &str,
        register: impl FnOnce(&mut RouteTableBuilder),
    ) -> RouterResult<()> {
        let mut guard = self.inner.write();
        match guard.builder.as_mut() {
            Some(builder) => {
                register(builder);
                Ok(())
            }
            None => Err(RouterError::MountWhileSealed {
                prefix: prefix.to_string(),
            }),
        }
    }
}
