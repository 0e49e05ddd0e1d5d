use crate::pattern::PatternError;
use crate::types::HttpMethod;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreeError {
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error(
        "method {method:?} on '{pattern}' collides with the same method already declared by '{existing}'"
    )]
    MethodCollision {
        pattern: String,
        existing: String,
        method: HttpMethod,
    },
}

pub type TreeResult<T> = Result<T, TreeError>;
