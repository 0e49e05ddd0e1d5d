use bunner_dispatch::dispatch::response;
use bunner_dispatch::matcher::{
    CompiledMatcher, DynamicMatcher, MatchOptions, MatchStrategy, Matcher, MatcherError, Resolution,
    build_matcher,
};
use bunner_dispatch::tree::{ForestOptions, RouteSegmentNode, build_forest};
use bunner_dispatch::{BoxError, Contract, HttpMethod, RequestContext, RouteTableBuilder};
use http::StatusCode;
use proptest::prelude::*;
use std::collections::HashSet;

fn forest_of(routes: &[(HttpMethod, String)]) -> Vec<RouteSegmentNode> {
    let mut builder = RouteTableBuilder::new();
    for (method, path) in routes {
        builder.add(
            *method,
            path.clone(),
            |_ctx: RequestContext| async { Ok::<_, BoxError>(response::empty(StatusCode::OK)) },
            Contract::new(),
        );
    }
    let table = futures::executor::block_on(builder.build()).expect("table should build");
    build_forest(&table, ForestOptions::default()).expect("forest should build")
}

fn both(routes: &[(HttpMethod, &str)]) -> [Box<dyn Matcher>; 2] {
    let routes: Vec<_> = routes
        .iter()
        .map(|(method, path)| (*method, path.to_string()))
        .collect();
    let forest = forest_of(&routes);
    [
        Box::new(CompiledMatcher::new(&forest, MatchOptions::default())),
        Box::new(DynamicMatcher::new(&forest, MatchOptions::default()).expect("regex should build")),
    ]
}

fn param(matcher: &dyn Matcher, path: &str, name: &str) -> Option<String> {
    matcher
        .lookup(path)
        .and_then(|found| found.params.get(name).cloned())
}

#[test]
fn matcher_when_prefixes_overlap_then_deepest_full_match_wins() {
    for matcher in both(&[
        (HttpMethod::Get, "/users/:id"),
        (HttpMethod::Get, "/users/:id/comments/:comment"),
    ]) {
        let found = matcher
            .lookup("/users/123/comments/456")
            .expect("nested route should match");
        assert_eq!(found.leaf.pattern(), "/users/:id/comments/:comment");
        assert_eq!(found.params.get("id").map(String::as_str), Some("123"));
        assert_eq!(found.params.get("comment").map(String::as_str), Some("456"));

        let found = matcher.lookup("/users/123").expect("short route should match");
        assert_eq!(found.leaf.pattern(), "/users/:id");
        assert_eq!(found.params.len(), 1);
    }
}

#[test]
fn matcher_when_param_branch_fails_deeper_then_const_sibling_is_tried() {
    for matcher in both(&[
        (HttpMethod::Get, "/users/:id"),
        (HttpMethod::Get, "/users/me/settings"),
    ]) {
        let found = matcher.lookup("/users/me").expect("param route should match");
        assert_eq!(found.leaf.pattern(), "/users/:id");
        assert_eq!(found.params.get("id").map(String::as_str), Some("me"));

        let found = matcher
            .lookup("/users/me/settings")
            .expect("const route should match after backtracking");
        assert_eq!(found.leaf.pattern(), "/users/me/settings");
        assert!(found.params.is_empty(), "{:?} leaked a stale binding", matcher.strategy());
    }
}

#[test]
fn matcher_when_rest_captures_then_binds_joined_remainder() {
    for matcher in both(&[(HttpMethod::Get, "/files/...path")]) {
        assert_eq!(param(&*matcher, "/files/a/b/c.txt", "path").as_deref(), Some("a/b/c.txt"));
        assert_eq!(param(&*matcher, "/files//a//b/", "path").as_deref(), Some("a/b"));
        assert_eq!(param(&*matcher, "/files", "path").as_deref(), Some(""));
        assert!(matcher.lookup("/other/a").is_none());
    }
}

#[test]
fn matcher_when_optional_param_absent_then_unbound() {
    for matcher in both(&[(HttpMethod::Get, "/posts/:id?")]) {
        let present = matcher.lookup("/posts/9").expect("present optional should match");
        assert_eq!(present.params.get("id").map(String::as_str), Some("9"));

        let absent = matcher.lookup("/posts").expect("absent optional should match");
        assert!(!absent.params.contains_key("id"));
        assert!(matcher.lookup("/posts/9/10").is_none());
    }
}

#[test]
fn matcher_when_query_fragment_or_encoding_present_then_normalized() {
    for matcher in both(&[(HttpMethod::Get, "/search/:term"), (HttpMethod::Get, "/")]) {
        assert_eq!(
            param(&*matcher, "/search/caf%C3%A9?page=2#top", "term").as_deref(),
            Some("café")
        );
        let root = matcher.lookup("/?x=1").expect("root should match");
        assert_eq!(root.leaf.pattern(), "/");
    }
}

#[test]
fn matcher_when_literal_has_regex_metacharacters_then_matched_literally() {
    for matcher in both(&[(HttpMethod::Get, "/v1.0/a+b/(x)")]) {
        assert!(matcher.lookup("/v1.0/a+b/(x)").is_some());
        assert!(matcher.lookup("/v1x0/a+b/(x)").is_none());
        assert!(matcher.lookup("/v1.0/aab/(x)").is_none());
    }
}

#[test]
fn matcher_when_method_differs_then_resolves_preflight_or_not_allowed() {
    for matcher in both(&[(HttpMethod::Get, "/login"), (HttpMethod::Post, "/login")]) {
        assert!(matches!(
            matcher.resolve(HttpMethod::Post, "/login"),
            Resolution::Matched { .. }
        ));

        match matcher.resolve(HttpMethod::Options, "/login") {
            Resolution::Preflight { leaf } => assert_eq!(leaf.allow_header(), "GET, POST, OPTIONS"),
            other => panic!("unexpected resolution: {other:?}"),
        }

        match matcher.resolve(HttpMethod::Delete, "/login") {
            Resolution::MethodNotAllowed { leaf } => {
                assert_eq!(leaf.allow_header(), "GET, POST, OPTIONS")
            }
            other => panic!("unexpected resolution: {other:?}"),
        }

        assert!(matches!(
            matcher.resolve_with(None, "/login"),
            Resolution::MethodNotAllowed { .. }
        ));
        assert!(matches!(
            matcher.resolve(HttpMethod::Get, "/logout"),
            Resolution::NotFound
        ));
    }
}

#[test]
fn matcher_when_explicit_options_declared_then_no_preflight() {
    for matcher in both(&[(HttpMethod::Get, "/x"), (HttpMethod::Options, "/x")]) {
        match matcher.resolve(HttpMethod::Options, "/x") {
            Resolution::Matched { operation, .. } => {
                assert_eq!(operation.method(), HttpMethod::Options)
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }
}

#[test]
fn matcher_when_case_insensitive_then_request_path_is_folded() {
    let routes = vec![(HttpMethod::Get, "/Users/:id".to_string())];
    let mut builder = RouteTableBuilder::new();
    for (method, path) in &routes {
        builder.add(
            *method,
            path.clone(),
            |_ctx: RequestContext| async { Ok::<_, BoxError>(response::empty(StatusCode::OK)) },
            Contract::new(),
        );
    }
    let table = futures::executor::block_on(builder.build()).expect("table should build");
    let forest = build_forest(
        &table,
        ForestOptions {
            case_sensitive: false,
            ..ForestOptions::default()
        },
    )
    .expect("forest should build");
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::default()
    };

    for strategy in [MatchStrategy::Compiled, MatchStrategy::Dynamic] {
        let matcher = build_matcher(&forest, strategy, options).expect("matcher should build");
        assert_eq!(matcher.strategy(), strategy);
        assert!(matcher.lookup("/USERS/7").is_some());
        assert!(matcher.lookup("/users/7").is_some());

        let found = matcher.lookup("/USERS/AbC").expect("folded literal should match");
        assert_eq!(found.params.get("id").map(String::as_str), Some("AbC"));
    }
}

#[test]
fn dynamic_when_size_limit_too_small_then_returns_regex_error() {
    let routes: Vec<_> = (0..50)
        .map(|i| (HttpMethod::Get, format!("/segment{i}/:id/child{i}")))
        .collect();
    let forest = forest_of(&routes);
    let options = MatchOptions {
        regex_size_limit: 64,
        ..MatchOptions::default()
    };

    match DynamicMatcher::new(&forest, options) {
        Err(MatcherError::Regex(_)) => {}
        Ok(matcher) => panic!("expected size limit failure, got {}", matcher.expression()),
    }
}

#[test]
fn dynamic_expression_carries_one_marker_per_leaf() {
    let forest = forest_of(&[
        (HttpMethod::Get, "/a".to_string()),
        (HttpMethod::Post, "/a".to_string()),
        (HttpMethod::Get, "/b/:x".to_string()),
    ]);
    let matcher = DynamicMatcher::new(&forest, MatchOptions::default()).expect("regex should build");

    assert_eq!(matcher.leaves().len(), 2);
    assert!(matcher.expression().contains("(?P<m0>)"));
    assert!(matcher.expression().contains("(?P<m1>)"));
    assert!(!matcher.expression().contains("(?P<m2>)"));
}

const LITERALS: &[&str] = &["a", "b", "c"];
const PARAM_NAMES: &[&str] = &["x", "y", "z"];
const OPTIONAL_NAMES: &[&str] = &["o", "p"];
const REQUEST_SEGMENTS: &[&str] = &["a", "b", "c", "d", "%61", ""];
const METHODS: &[HttpMethod] = &[
    HttpMethod::Get,
    HttpMethod::Post,
    HttpMethod::Delete,
    HttpMethod::Options,
];

fn segment_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::sample::select(LITERALS).prop_map(str::to_string),
        2 => prop::sample::select(PARAM_NAMES).prop_map(|n| format!(":{n}")),
    ]
}

/// A valid pattern over a tiny vocabulary so that generated paths collide
/// with it often: literals and required params, then optional params, then
/// an optional rest capture.
fn pattern_strategy() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(segment_strategy(), 0..4),
        prop::collection::vec(prop::sample::select(OPTIONAL_NAMES), 0..2),
        prop::bool::weighted(0.25),
    )
        .prop_map(|(head, optional, rest)| {
            let mut seen = HashSet::new();
            let mut parts: Vec<String> = head
                .into_iter()
                .filter(|s| !s.starts_with(':') || seen.insert(s.clone()))
                .collect();
            for name in optional {
                if seen.insert(name.to_string()) {
                    parts.push(format!(":{name}?"));
                }
            }
            if rest {
                parts.push("...r".to_string());
            }
            format!("/{}", parts.join("/"))
        })
}

fn request_path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(REQUEST_SEGMENTS), 0..6)
    .prop_map(|segments| format!("/{}", segments.join("/")))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn compiled_and_dynamic_agree_on_every_request(
        routes in prop::collection::vec(
            (prop::sample::select(METHODS), pattern_strategy()),
            1..8,
        ),
        requests in prop::collection::vec(
            (prop::sample::select(METHODS), request_path_strategy()),
            1..24,
        ),
    ) {
        let forest = forest_of(&routes);
        let compiled = CompiledMatcher::new(&forest, MatchOptions::default());
        let dynamic = DynamicMatcher::new(&forest, MatchOptions::default())
            .expect("regex should build");

        prop_assert_eq!(compiled.leaves().len(), dynamic.leaves().len());

        for (method, path) in &requests {
            let left = compiled.resolve(*method, path);
            let right = dynamic.resolve(*method, path);
            prop_assert_eq!(left.outcome(), right.outcome(), "path {}", path);

            if let (Resolution::Matched { params: a, .. }, Resolution::Matched { params: b, .. }) =
                (&left, &right)
            {
                prop_assert_eq!(a, b, "params for {}", path);
            }

            let left = compiled.lookup(path).map(|m| (m.leaf.id(), m.params));
            let right = dynamic.lookup(path).map(|m| (m.leaf.id(), m.params));
            prop_assert_eq!(left, right, "lookup {}", path);
        }
    }
}
