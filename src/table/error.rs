use crate::types::{BoxError, HttpMethod};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("route table factory mounted at '{prefix}' failed: {source}")]
    MountFactory {
        prefix: String,
        #[source]
        source: BoxError,
    },
    #[error("duplicate route for method {method:?} on path '{path}'")]
    MethodCollision { path: String, method: HttpMethod },
}

pub type TableResult<T> = Result<T, TableError>;
