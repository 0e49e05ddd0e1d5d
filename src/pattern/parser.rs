use smallvec::SmallVec;

use super::token::{OPTIONAL_SUFFIX, PARAM_SIGIL, REST_SIGIL};
use super::{PathSegmentToken, PatternError, PatternResult, TokenList};

/// Splits a route pattern on `/` and classifies every non-empty piece.
///
/// Besides per-segment syntax, the whole pattern is checked for the
/// orderings that can never match: a required segment after an optional
/// parameter, a rest capture that is not last, and a parameter name bound
/// twice.
#[tracing::instrument(level = "trace", skip(pattern), fields(pattern = %pattern))]
pub fn parse_path(pattern: &str) -> PatternResult<TokenList> {
    let pieces: SmallVec<[&str; 8]> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let mut tokens = TokenList::new();
    let mut seen_optional = false;

    for (index, piece) in pieces.iter().enumerate() {
        let token = parse_segment(piece)?;

        match &token {
            PathSegmentToken::Rest { name } => {
                if index + 1 != pieces.len() {
                    return Err(PatternError::RestNotTerminal {
                        name: name.clone(),
                        pattern: pattern.to_string(),
                    });
                }
            }
            PathSegmentToken::Param { optional: true, .. } => seen_optional = true,
            PathSegmentToken::Param { .. } | PathSegmentToken::Literal(_) => {
                if seen_optional {
                    return Err(PatternError::RequiredAfterOptional {
                        segment: piece.to_string(),
                        pattern: pattern.to_string(),
                    });
                }
            }
        }

        if let Some(name) = token.param_name()
            && tokens.iter().any(|t| t.param_name() == Some(name))
        {
            return Err(PatternError::DuplicateParamName {
                param: name.to_string(),
                pattern: pattern.to_string(),
            });
        }

        tokens.push(token);
    }

    Ok(tokens)
}

/// Canonical pattern text for a token list; `/` for the empty list.
pub fn render_path(tokens: &[PathSegmentToken]) -> String {
    if tokens.is_empty() {
        return "/".to_string();
    }

    let mut out = String::new();
    for token in tokens {
        out.push('/');
        out.push_str(&token.to_string());
    }
    out
}

fn parse_segment(segment: &str) -> PatternResult<PathSegmentToken> {
    if let Some(name) = segment.strip_prefix(REST_SIGIL) {
        validate_name(segment, name)?;
        return Ok(PathSegmentToken::Rest {
            name: name.to_string(),
        });
    }

    if let Some(body) = segment.strip_prefix(PARAM_SIGIL) {
        let (name, optional) = match body.strip_suffix(OPTIONAL_SUFFIX) {
            Some(name) => (name, true),
            None => (body, false),
        };
        validate_name(segment, name)?;
        return Ok(PathSegmentToken::Param {
            name: name.to_string(),
            optional,
        });
    }

    if segment.contains(PARAM_SIGIL) {
        return Err(PatternError::MixedParameterLiteralSyntax {
            segment: segment.to_string(),
        });
    }

    Ok(PathSegmentToken::Literal(segment.to_string()))
}

fn validate_name(segment: &str, name: &str) -> PatternResult<()> {
    let mut chars = name.chars();

    let Some(first) = chars.next() else {
        return Err(PatternError::ParameterMissingName {
            segment: segment.to_string(),
        });
    };

    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(PatternError::ParameterInvalidStart {
            segment: segment.to_string(),
            name: name.to_string(),
            found: first,
        });
    }

    if let Some(invalid) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(PatternError::ParameterInvalidCharacter {
            segment: segment.to_string(),
            name: name.to_string(),
            invalid,
        });
    }

    Ok(())
}
