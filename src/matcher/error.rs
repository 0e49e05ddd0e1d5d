use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatcherError {
    #[error("composed route expression failed to compile: {0}")]
    Regex(#[from] regex::Error),
}

pub type MatcherResult<T> = Result<T, MatcherError>;
