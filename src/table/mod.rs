mod builder;
mod error;
mod operation;

pub use builder::{DuplicatePolicy, RouteEntry, RouteTable, RouteTableBuilder};
pub use error::{TableError, TableResult};
pub use operation::{Handler, HandlerFuture, Operation, SharedHandler};
