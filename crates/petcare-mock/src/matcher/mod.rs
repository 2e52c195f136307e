//! Path matcher: resolves `(method, url)` to a registered route.
//!
//! Resolution order:
//!
//! 1. **Exact key**: `"METHOD:path"` looked up directly.
//! 2. **Fallback tiers**, each run over every entry of the request method in
//!    registration order before the next tier starts:
//!    - `ExactPath`: pattern equals the path, trailing `/` ignored
//!    - `Template`: `{name}` / `*` segment patterns
//!    - `DynamicSuffix`: pattern ends with `/` and prefixes the path
//!    - `Substring`: path contains the pattern (lowest precision)
//!
//! A substring match can therefore never shadow a more precise match of a
//! later-registered route. Between two substring candidates the first
//! registered wins.

mod pattern;

pub use pattern::{
    match_dynamic_suffix, match_exact, match_substring, match_template, PatternKind, RoutePattern,
    WILDCARD,
};

use crate::handler::RouteHandler;
use crate::registry::{route_key, RouteEntry, RouteRegistry};
use crate::request::{derive_path, ApiRequest};
use hyper::Method;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

/// Which rule produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    ExactKey,
    ExactPath,
    Template,
    DynamicSuffix,
    Substring,
}

const FALLBACK_TIERS: [MatchTier; 4] = [
    MatchTier::ExactPath,
    MatchTier::Template,
    MatchTier::DynamicSuffix,
    MatchTier::Substring,
];

/// A resolved route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    entry: Arc<RouteEntry>,
    pub tier: MatchTier,
    /// Path derived from the request URL.
    pub path: String,
    /// Path left after a dynamic-suffix pattern, without leading `/`.
    pub remainder: String,
    pub captures: BTreeMap<String, String>,
}

impl RouteMatch {
    pub fn entry(&self) -> &Arc<RouteEntry> {
        &self.entry
    }

    pub fn handler(&self) -> &Arc<dyn RouteHandler> {
        self.entry.handler()
    }

    pub fn key(&self) -> String {
        self.entry.key()
    }

    pub fn capture(&self, name: &str) -> Option<&str> {
        self.captures.get(name).map(String::as_str)
    }

    pub fn remainder_segments(&self) -> Vec<&str> {
        self.remainder
            .split('/')
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl PartialEq for RouteMatch {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entry, &other.entry)
            && self.tier == other.tier
            && self.path == other.path
            && self.remainder == other.remainder
            && self.captures == other.captures
    }
}

#[derive(Debug, Clone)]
pub struct PathMatcher {
    registry: Arc<RouteRegistry>,
}

impl PathMatcher {
    pub fn new(registry: Arc<RouteRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<RouteRegistry> {
        &self.registry
    }

    pub fn resolve_request(&self, request: &ApiRequest) -> Option<RouteMatch> {
        self.resolve(&request.method, &request.full_url())
    }

    /// Resolve a raw URL (absolute, relative, with or without query).
    pub fn resolve(&self, method: &Method, raw_url: &str) -> Option<RouteMatch> {
        let (path, _) = derive_path(raw_url);

        if let Some(entry) = self.registry.get(&route_key(method, &path)) {
            trace!("{} {} matched by key", method, path);
            return Some(RouteMatch {
                entry: entry.clone(),
                tier: MatchTier::ExactKey,
                path,
                remainder: String::new(),
                captures: BTreeMap::new(),
            });
        }

        let candidates: Vec<&Arc<RouteEntry>> = self
            .registry
            .entries()
            .iter()
            .filter(|entry| entry.method() == method)
            .collect();

        for tier in FALLBACK_TIERS {
            for entry in &candidates {
                if let Some((remainder, captures)) = match_tier(tier, entry, &path) {
                    trace!(
                        "{} {} matched {} via {:?}",
                        method,
                        path,
                        entry.pattern().as_str(),
                        tier
                    );
                    return Some(RouteMatch {
                        entry: Arc::clone(*entry),
                        tier,
                        path,
                        remainder,
                        captures,
                    });
                }
            }
        }

        None
    }
}

fn match_tier(
    tier: MatchTier,
    entry: &RouteEntry,
    path: &str,
) -> Option<(String, BTreeMap<String, String>)> {
    let pattern = entry.pattern();
    let raw = pattern.as_str();
    match (tier, pattern.kind()) {
        (MatchTier::ExactPath, PatternKind::Literal | PatternKind::DynamicSuffix) => {
            match_exact(raw, path).then(|| (String::new(), BTreeMap::new()))
        }
        (MatchTier::Template, PatternKind::Template { regex, names }) => {
            match_template(regex, names, path).map(|captures| (String::new(), captures))
        }
        (MatchTier::DynamicSuffix, PatternKind::DynamicSuffix) => {
            match_dynamic_suffix(raw, path).map(|rest| (rest.to_string(), BTreeMap::new()))
        }
        (MatchTier::Substring, PatternKind::Literal | PatternKind::DynamicSuffix) => {
            match_substring(raw, path).then(|| (String::new(), BTreeMap::new()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::static_handler;
    use serde_json::json;

    fn registry(routes: &[(&str, &str)]) -> PathMatcher {
        let mut builder = RouteRegistry::builder();
        for (key, tag) in routes {
            builder
                .register_key(key, static_handler(json!({ "route": tag })))
                .unwrap();
        }
        PathMatcher::new(Arc::new(builder.build()))
    }

    #[test]
    fn test_exact_key_wins_regardless_of_order() {
        let matcher = registry(&[
            ("GET:/api/", "general"),
            ("GET:/api/boards/", "detail"),
            ("GET:/api/boards", "list"),
        ]);
        let m = matcher.resolve(&Method::GET, "/api/boards").unwrap();
        assert_eq!(m.tier, MatchTier::ExactKey);
        assert_eq!(m.key(), "GET:/api/boards");
    }

    #[test]
    fn test_query_string_is_ignored_for_matching() {
        let matcher = registry(&[("GET:/api/boards", "list")]);
        let m = matcher.resolve(&Method::GET, "/api/boards?page=1").unwrap();
        assert_eq!(m.tier, MatchTier::ExactKey);
        assert_eq!(m.path, "/api/boards");
    }

    #[test]
    fn test_absolute_url_is_reduced_to_path() {
        let matcher = registry(&[("GET:/api/pets", "pets")]);
        let m = matcher
            .resolve(&Method::GET, "http://localhost:8080/api/pets")
            .unwrap();
        assert_eq!(m.key(), "GET:/api/pets");
    }

    #[test]
    fn test_trailing_slash_exact_path() {
        let matcher = registry(&[("GET:/api/users/me", "me")]);
        let m = matcher.resolve(&Method::GET, "/api/users/me/").unwrap();
        assert_eq!(m.tier, MatchTier::ExactPath);
    }

    #[test]
    fn test_dynamic_suffix_numeric_identifier() {
        let matcher = registry(&[("GET:/api/boards/", "detail")]);
        let m = matcher.resolve(&Method::GET, "/api/boards/42").unwrap();
        assert_eq!(m.tier, MatchTier::DynamicSuffix);
        assert_eq!(m.remainder, "42");
        assert_eq!(m.remainder_segments(), vec!["42"]);
    }

    #[test]
    fn test_dynamic_suffix_nested_collection() {
        let matcher = registry(&[("GET:/api/boards/", "detail")]);
        let m = matcher
            .resolve(&Method::GET, "/api/boards/77/comments")
            .unwrap();
        assert_eq!(m.remainder_segments(), vec!["77", "comments"]);
    }

    #[test]
    fn test_template_captures() {
        let matcher = registry(&[
            ("GET:/api/boards/", "detail"),
            ("GET:/api/boards/{boardId}/comments", "comments"),
        ]);
        let m = matcher
            .resolve(&Method::GET, "/api/boards/9/comments")
            .unwrap();
        assert_eq!(m.tier, MatchTier::Template);
        assert_eq!(m.capture("boardId"), Some("9"));
    }

    #[test]
    fn test_method_must_match() {
        let matcher = registry(&[("DELETE:/api/boards/", "delete")]);
        assert!(matcher.resolve(&Method::GET, "/api/boards/5").is_none());
        assert!(matcher.resolve(&Method::DELETE, "/api/boards/5").is_some());
    }

    #[test]
    fn test_substring_first_registered_wins() {
        let matcher = registry(&[("GET:/boards", "short"), ("GET:/api/boards", "long")]);
        let m = matcher
            .resolve(&Method::GET, "/backend/api/boards")
            .unwrap();
        assert_eq!(m.tier, MatchTier::Substring);
        assert_eq!(m.key(), "GET:/boards");

        let reversed = registry(&[("GET:/api/boards", "long"), ("GET:/boards", "short")]);
        let m = reversed
            .resolve(&Method::GET, "/backend/api/boards")
            .unwrap();
        assert_eq!(m.key(), "GET:/api/boards");
    }

    #[test]
    fn test_substring_never_shadows_more_precise_tier() {
        // "/api" is registered first and is contained in every path, but the
        // dynamic suffix route still wins because its tier runs earlier.
        let matcher = registry(&[("GET:/api", "catch-all"), ("GET:/api/boards/", "detail")]);
        let m = matcher.resolve(&Method::GET, "/api/boards/3").unwrap();
        assert_eq!(m.key(), "GET:/api/boards/");
        assert_eq!(m.tier, MatchTier::DynamicSuffix);
    }

    #[test]
    fn test_no_match() {
        let matcher = registry(&[("GET:/api/boards", "list")]);
        assert!(matcher
            .resolve(&Method::POST, "/api/unknown/path")
            .is_none());
        assert!(matcher.resolve(&Method::GET, "/api/pets").is_none());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let matcher = registry(&[
            ("GET:/api/boards", "list"),
            ("GET:/api/boards/", "detail"),
            ("GET:/api", "catch-all"),
        ]);
        for url in ["/api/boards", "/api/boards/1/comments", "/x/api/y", "/nope"] {
            let first = matcher.resolve(&Method::GET, url);
            let second = matcher.resolve(&Method::GET, url);
            assert_eq!(first, second, "resolution of {url} changed between calls");
        }
    }
}
