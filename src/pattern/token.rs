use smallvec::SmallVec;
use std::fmt;

pub(crate) const PARAM_SIGIL: char = ':';
pub(crate) const OPTIONAL_SUFFIX: char = '?';
pub(crate) const REST_SIGIL: &str = "...";

/// One `/`-delimited piece of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegmentToken {
    Literal(String),
    Param { name: String, optional: bool },
    Rest { name: String },
}

pub type TokenList = SmallVec<[PathSegmentToken; 8]>;

impl PathSegmentToken {
    pub fn param_name(&self) -> Option<&str> {
        match self {
            PathSegmentToken::Literal(_) => None,
            PathSegmentToken::Param { name, .. } | PathSegmentToken::Rest { name } => Some(name),
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, PathSegmentToken::Param { optional: true, .. })
    }
}

impl fmt::Display for PathSegmentToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegmentToken::Literal(value) => f.write_str(value),
            PathSegmentToken::Param { name, optional } => {
                write!(f, "{PARAM_SIGIL}{name}")?;
                if *optional {
                    write!(f, "{OPTIONAL_SUFFIX}")?;
                }
                Ok(())
            }
            PathSegmentToken::Rest { name } => write!(f, "{REST_SIGIL}{name}"),
        }
    }
}
