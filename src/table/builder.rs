use futures::FutureExt;
use futures::future::BoxFuture;
use hashbrown::HashMap as FastHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

use super::{Handler, Operation, TableError, TableResult};
use crate::contract::Contract;
use crate::types::{BoxError, HttpMethod};

/// What happens when the same (path, method) is registered twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DuplicatePolicy {
    /// The later registration replaces the earlier one.
    #[default]
    Override,
    /// Registration fails with a method collision.
    Reject,
}

#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub path: String,
    pub operation: Operation,
}

impl RouteEntry {
    pub fn new(path: impl Into<String>, operation: Operation) -> Self {
        Self {
            path: path.into(),
            operation,
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.operation.method()
    }

    fn key(&self) -> (String, HttpMethod) {
        (self.path.clone(), self.method())
    }

    fn prefixed(mut self, prefix: &str) -> Self {
        if !prefix.is_empty() {
            self.path = format!("{prefix}{}", self.path);
        }
        self
    }
}

/// Frozen set of (path, method) registrations in registration order.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    index: FastHashMap<(String, HttpMethod), usize>,
}

impl RouteTable {
    pub fn routes(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str, method: HttpMethod) -> Option<&Operation> {
        self.index
            .get(&(path.to_string(), method))
            .map(|&i| &self.entries[i].operation)
    }

    /// Distinct path strings, first-registration order.
    pub fn paths(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !out.contains(&entry.path.as_str()) {
                out.push(&entry.path);
            }
        }
        out
    }

    pub(crate) fn insert(&mut self, entry: RouteEntry, policy: DuplicatePolicy) -> TableResult<()> {
        let key = entry.key();

        match self.index.get(&key) {
            Some(_) if policy == DuplicatePolicy::Reject => Err(TableError::MethodCollision {
                path: key.0,
                method: key.1,
            }),
            _ => {
                self.upsert(key, entry);
                Ok(())
            }
        }
    }

    fn upsert(&mut self, key: (String, HttpMethod), entry: RouteEntry) {
        match self.index.get(&key) {
            Some(&existing) => {
                tracing::warn!(
                    path = %entry.path,
                    method = %entry.method(),
                    "route registered twice; later registration wins"
                );
                self.entries[existing] = entry;
            }
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(entry);
            }
        }
    }
}

/// Collects entries with last-write-wins semantics; the way synchronous
/// mount factories assemble the table they return.
impl FromIterator<RouteEntry> for RouteTable {
    fn from_iter<I: IntoIterator<Item = RouteEntry>>(iter: I) -> Self {
        let mut table = RouteTable::default();
        for entry in iter {
            table.upsert(entry.key(), entry);
        }
        table
    }
}

type MountFactory =
    Box<dyn FnOnce(RouteTable) -> BoxFuture<'static, Result<RouteTable, BoxError>> + Send + Sync>;

enum Registration {
    Route(RouteEntry),
    Table { prefix: String, table: RouteTable },
    Factory { prefix: String, factory: MountFactory },
}

/// Accumulates routes and mounts at startup.
///
/// Factories are not run when mounted. `build()` first applies every direct
/// route and table mount in call order, then runs each factory in call order,
/// handing it a snapshot of everything resolved so far. A factory route never
/// replaces a (path, method) registered after the factory itself, so repeated
/// registrations stay last-write-wins in call order.
#[derive(Default)]
pub struct RouteTableBuilder {
    registrations: Vec<Registration>,
    policy: DuplicatePolicy,
}

impl RouteTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            registrations: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub fn add(
        &mut self,
        method: HttpMethod,
        path: impl Into<String>,
        handler: impl Handler,
        contract: Contract,
    ) -> &mut Self {
        self.add_operation(path, Operation::new(method, handler, contract))
    }

    pub fn add_operation(&mut self, path: impl Into<String>, operation: Operation) -> &mut Self {
        self.registrations.push(Registration::Route(RouteEntry {
            path: path.into(),
            operation,
        }));
        self
    }

    /// Mounts every route of `table` with `prefix` prepended verbatim.
    pub fn mount(&mut self, prefix: impl Into<String>, table: RouteTable) -> &mut Self {
        self.registrations.push(Registration::Table {
            prefix: prefix.into(),
            table,
        });
        self
    }

    pub fn mount_factory<F>(&mut self, prefix: impl Into<String>, factory: F) -> &mut Self
    where
        F: FnOnce(&RouteTable) -> Result<RouteTable, BoxError> + Send + Sync + 'static,
    {
        self.registrations.push(Registration::Factory {
            prefix: prefix.into(),
            factory: Box::new(move |routes: RouteTable| {
                futures::future::ready(factory(&routes)).boxed()
            }),
        });
        self
    }

    pub fn mount_async_factory<F, Fut>(&mut self, prefix: impl Into<String>, factory: F) -> &mut Self
    where
        F: FnOnce(RouteTable) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RouteTable, BoxError>> + Send + 'static,
    {
        self.registrations.push(Registration::Factory {
            prefix: prefix.into(),
            factory: Box::new(move |routes: RouteTable| factory(routes).boxed()),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    #[tracing::instrument(level = "debug", skip(self), fields(registrations = self.registrations.len() as u64))]
    pub async fn build(self) -> TableResult<RouteTable> {
        let policy = self.policy;
        let mut table = RouteTable::default();
        // Registration index that last wrote each key.
        let mut written_at: FastHashMap<(String, HttpMethod), usize> = FastHashMap::new();
        let mut factories: Vec<(usize, String, MountFactory)> = Vec::new();

        for (order, registration) in self.registrations.into_iter().enumerate() {
            match registration {
                Registration::Route(entry) => {
                    written_at.insert(entry.key(), order);
                    table.insert(entry, policy)?;
                }
                Registration::Table {
                    prefix,
                    table: mounted,
                } => {
                    for entry in mounted.entries {
                        let entry = entry.prefixed(&prefix);
                        written_at.insert(entry.key(), order);
                        table.insert(entry, policy)?;
                    }
                }
                Registration::Factory { prefix, factory } => {
                    factories.push((order, prefix, factory))
                }
            }
        }

        for (order, prefix, factory) in factories {
            tracing::event!(tracing::Level::TRACE, operation = "mount_factory", prefix = %prefix);
            let mounted = factory(table.clone())
                .await
                .map_err(|source| TableError::MountFactory {
                    prefix: prefix.clone(),
                    source,
                })?;
            for entry in mounted.entries {
                let entry = entry.prefixed(&prefix);
                let key = entry.key();
                if policy == DuplicatePolicy::Override
                    && written_at.get(&key).is_some_and(|&at| at > order)
                {
                    tracing::event!(
                        tracing::Level::DEBUG,
                        path = %entry.path,
                        method = %entry.method(),
                        prefix = %prefix,
                        "factory route superseded by a later registration"
                    );
                    continue;
                }
                written_at.insert(key, order);
                table.insert(entry, policy)?;
            }
        }

        Ok(table)
    }
}

impl fmt::Debug for RouteTableBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTableBuilder")
            .field("registrations", &self.registrations.len())
            .field("policy", &self.policy)
            .finish()
    }
}
