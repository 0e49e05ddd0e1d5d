use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("parameter segment '{segment}' is missing a name")]
    ParameterMissingName { segment: String },
    #[error(
        "parameter name '{name}' in segment '{segment}' must start with an alphabetic character or underscore (found '{found}')"
    )]
    ParameterInvalidStart {
        segment: String,
        name: String,
        found: char,
    },
    #[error(
        "parameter name '{name}' in segment '{segment}' contains invalid character '{invalid}'"
    )]
    ParameterInvalidCharacter {
        segment: String,
        name: String,
        invalid: char,
    },
    #[error("segment '{segment}' mixes parameter and literal syntax")]
    MixedParameterLiteralSyntax { segment: String },
    #[error("duplicate parameter name '{param}' in path '{pattern}'")]
    DuplicateParamName { param: String, pattern: String },
    #[error("required segment '{segment}' follows an optional parameter in path '{pattern}'")]
    RequiredAfterOptional { segment: String, pattern: String },
    #[error("rest capture '{name}' must be the last segment of path '{pattern}'")]
    RestNotTerminal { name: String, pattern: String },
}

impl PatternError {
    /// True for the ordering violations that make a pattern structurally
    /// unmatchable, as opposed to plain syntax mistakes.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            PatternError::RequiredAfterOptional { .. } | PatternError::RestNotTerminal { .. }
        )
    }
}

pub type PatternResult<T> = Result<T, PatternError>;
