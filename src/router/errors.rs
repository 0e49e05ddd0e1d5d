use crate::matcher::MatcherError;
use crate::router::RouterOptionsError;
use crate::table::TableError;
use crate::tree::TreeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("router is sealed; cannot add route '{path}'")]
    AddWhileSealed { path: String },
    #[error("router is sealed; cannot mount routes under '{prefix}'")]
    MountWhileSealed { prefix: String },
    #[error("router is sealed; cannot register decorators")]
    DecorateWhileSealed,
    #[error("router was already sealed")]
    AlreadySealed,
    #[error("router is not sealed; dispatcher is unavailable")]
    NotSealed,
    #[error(transparent)]
    Options(#[from] RouterOptionsError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Matcher(#[from] MatcherError),
}

pub type RouterResult<T> = Result<T, RouterError>;
