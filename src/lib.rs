pub mod contract;
pub mod dispatch;
pub mod matcher;
pub mod path;
pub mod pattern;
pub mod router;
pub mod table;
pub mod tree;
pub mod types;

pub use contract::{Check, Contract, FieldKind, Fields, check_fn};
pub use dispatch::{CancelSignal, Decorator, Dispatcher, RequestContext, decorator_fn};
pub use matcher::{MatchStrategy, Matcher};
pub use router::{Router, RouterError, RouterOptions, RouterOptionsBuilder, RouterResult};
pub use table::{DuplicatePolicy, Handler, Operation, RouteTable, RouteTableBuilder};
pub use types::{BoxError, HttpMethod, MethodSet, PathParams, Request, Response};
