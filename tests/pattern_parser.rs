use bunner_dispatch::pattern::{PathSegmentToken, PatternError, parse_path, render_path};
use proptest::prelude::*;

fn literal(value: &str) -> PathSegmentToken {
    PathSegmentToken::Literal(value.to_string())
}

fn param(name: &str, optional: bool) -> PathSegmentToken {
    PathSegmentToken::Param {
        name: name.to_string(),
        optional,
    }
}

#[test]
fn parser_when_pattern_mixes_kinds_then_classifies_each_segment() {
    let tokens = parse_path("/users/:id/files/...rest").expect("pattern should parse");

    assert_eq!(
        tokens.as_slice(),
        &[
            literal("users"),
            param("id", false),
            literal("files"),
            PathSegmentToken::Rest {
                name: "rest".to_string()
            },
        ]
    );
}

#[test]
fn parser_when_slashes_repeat_or_trail_then_empty_pieces_are_dropped() {
    let tokens = parse_path("//a///b/").expect("pattern should parse");
    assert_eq!(tokens.as_slice(), &[literal("a"), literal("b")]);
    assert!(parse_path("/").expect("root should parse").is_empty());
    assert!(parse_path("").expect("empty should parse").is_empty());
}

#[test]
fn parser_when_required_param_follows_optional_then_structural_error() {
    match parse_path("/:a?/:b") {
        Err(err @ PatternError::RequiredAfterOptional { .. }) => {
            assert!(err.is_structural());
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn parser_when_literal_follows_optional_then_structural_error() {
    match parse_path("/:a?/edit") {
        Err(PatternError::RequiredAfterOptional { segment, .. }) => assert_eq!(segment, "edit"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn parser_when_optional_params_chain_then_accepted() {
    let tokens = parse_path("/:a?/:b?").expect("optional chain should parse");
    assert_eq!(tokens.as_slice(), &[param("a", true), param("b", true)]);

    let tokens = parse_path("/:a?/...tail").expect("rest after optional should parse");
    assert_eq!(tokens.len(), 2);
}

#[test]
fn parser_when_rest_is_not_last_then_structural_error() {
    match parse_path("/files/...path/raw") {
        Err(err @ PatternError::RestNotTerminal { .. }) => assert!(err.is_structural()),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn parser_when_param_name_repeats_then_returns_error() {
    match parse_path("/:id/:id") {
        Err(PatternError::DuplicateParamName { param, .. }) => assert_eq!(param, "id"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn parser_when_param_name_is_invalid_then_returns_syntax_error() {
    match parse_path("/:1id") {
        Err(PatternError::ParameterInvalidStart { found, .. }) => assert_eq!(found, '1'),
        other => panic!("unexpected result: {other:?}"),
    }
    match parse_path("/:id-x") {
        Err(PatternError::ParameterInvalidCharacter { invalid, .. }) => assert_eq!(invalid, '-'),
        other => panic!("unexpected result: {other:?}"),
    }
    match parse_path("/:") {
        Err(err @ PatternError::ParameterMissingName { .. }) => assert!(!err.is_structural()),
        other => panic!("unexpected result: {other:?}"),
    }
    match parse_path("/user:id") {
        Err(PatternError::MixedParameterLiteralSyntax { segment }) => assert_eq!(segment, "user:id"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn renderer_when_tokens_rendered_then_canonical_text() {
    let tokens = parse_path("users//:id?/").expect("pattern should parse");
    assert_eq!(render_path(&tokens), "/users/:id?");
    assert_eq!(render_path(&[]), "/");
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,5}"
}

/// Valid token lists: literals and required params, then optional params,
/// then at most one rest capture, with distinct parameter names.
fn token_list_strategy() -> impl Strategy<Value = Vec<PathSegmentToken>> {
    let head = prop::collection::vec(
        prop_oneof![
            "[a-z0-9][a-z0-9.-]{0,5}".prop_map(PathSegmentToken::Literal),
            name_strategy().prop_map(|name| PathSegmentToken::Param {
                name,
                optional: false
            }),
        ],
        0..5,
    );
    let optional = prop::collection::vec(
        name_strategy().prop_map(|name| PathSegmentToken::Param {
            name,
            optional: true,
        }),
        0..3,
    );
    let rest = prop::option::of(
        name_strategy().prop_map(|name| PathSegmentToken::Rest { name }),
    );

    (head, optional, rest).prop_map(|(head, optional, rest)| {
        let mut seen = std::collections::HashSet::new();
        head.into_iter()
            .chain(optional)
            .chain(rest)
            .filter(|token| match token.param_name() {
                Some(name) => seen.insert(name.to_string()),
                None => true,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn parser_round_trips_rendered_patterns(tokens in token_list_strategy()) {
        let rendered = render_path(&tokens);
        let reparsed = parse_path(&rendered).expect("rendered pattern should parse");
        prop_assert_eq!(reparsed.as_slice(), tokens.as_slice());
    }
}
