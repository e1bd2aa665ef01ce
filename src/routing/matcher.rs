//! Matcher strategies.
//!
//! # Responsibilities
//! - Direct: the request path names an existing plain file
//! - Index: an extension-less path has an `index.html` beneath it
//! - Route: a configured method + pattern points at an existing target
//! - Route collection: first matching route in document order wins
//!
//! # Design Decisions
//! - Matchers hold no state; resolver and routes are supplied per call
//! - No error state: anything that goes wrong inside a matcher is NoMatch
//! - Index triggers on "no extension", not on a directory stat
//! - A route may override the content type of what it resolves to

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::http::request::Request;
use crate::resolver::Resolver;
use crate::routing::route::{Route, RouteSet};

/// File served for directory-style paths.
pub const INDEX_FILE: &str = "index.html";

/// A resolved resource location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub path: PathBuf,
    /// Set when a route names the content type to serve.
    pub content_type: Option<String>,
}

impl Resolved {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: Option<&str>) -> Self {
        self.content_type = content_type.map(str::to_string);
        self
    }
}

impl From<PathBuf> for Resolved {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&str> for Resolved {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Result of one matcher attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched(Resolved),
    NoMatch,
}

impl MatchOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchOutcome::Matched(_))
    }

    /// Keep `self` if matched, otherwise evaluate `next`.
    pub fn or_else(self, next: impl FnOnce() -> MatchOutcome) -> MatchOutcome {
        match self {
            MatchOutcome::Matched(_) => self,
            MatchOutcome::NoMatch => next(),
        }
    }
}

/// A strategy that attempts to resolve one request.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    fn match_request(
        &self,
        request: &Request,
        resolver: &dyn Resolver,
        routes: &RouteSet,
    ) -> MatchOutcome;
}

/// Matches when the request path is an existing plain file.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectMatcher;

impl Matcher for DirectMatcher {
    fn match_request(
        &self,
        request: &Request,
        resolver: &dyn Resolver,
        _: &RouteSet,
    ) -> MatchOutcome {
        match_file(request.location(), resolver)
    }
}

/// Matches `<path>/index.html` for extension-less request paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexMatcher;

impl Matcher for IndexMatcher {
    fn match_request(
        &self,
        request: &Request,
        resolver: &dyn Resolver,
        _: &RouteSet,
    ) -> MatchOutcome {
        if has_extension(Path::new(request.path())) {
            return MatchOutcome::NoMatch;
        }
        match_index(request.location(), resolver)
    }
}

/// Matches a single configured route.
#[derive(Debug, Clone, Copy)]
pub struct RouteMatcher<'a> {
    route: &'a Route,
}

impl<'a> RouteMatcher<'a> {
    pub fn new(route: &'a Route) -> Self {
        Self { route }
    }
}

impl Matcher for RouteMatcher<'_> {
    fn match_request(
        &self,
        request: &Request,
        resolver: &dyn Resolver,
        _: &RouteSet,
    ) -> MatchOutcome {
        if !self.route.matches(request.method(), request.path()) {
            return MatchOutcome::NoMatch;
        }

        let target = resolver.locate(&self.route.resource().to_string_lossy());
        let outcome = match_file(&target, resolver).or_else(|| {
            if has_extension(&target) {
                MatchOutcome::NoMatch
            } else {
                match_index(&target, resolver)
            }
        });

        match outcome {
            MatchOutcome::Matched(resolved) => {
                MatchOutcome::Matched(resolved.with_content_type(self.route.content_type()))
            }
            MatchOutcome::NoMatch => {
                tracing::debug!(
                    pattern = %self.route.pattern(),
                    target = %target.display(),
                    "Route matched but its target does not exist"
                );
                MatchOutcome::NoMatch
            }
        }
    }
}

/// Evaluates every route in order; first match wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteCollectionMatcher;

impl Matcher for RouteCollectionMatcher {
    fn match_request(
        &self,
        request: &Request,
        resolver: &dyn Resolver,
        routes: &RouteSet,
    ) -> MatchOutcome {
        routes
            .iter()
            .map(|route| RouteMatcher::new(route).match_request(request, resolver, routes))
            .find(MatchOutcome::is_matched)
            .unwrap_or(MatchOutcome::NoMatch)
    }
}

/// Matcher kinds, as named in the server configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    Index,
    Direct,
    Routes,
}

impl MatcherKind {
    /// Real content before configured fallbacks.
    pub const DEFAULT_ORDER: [MatcherKind; 3] =
        [MatcherKind::Index, MatcherKind::Direct, MatcherKind::Routes];
}

impl Matcher for MatcherKind {
    fn match_request(
        &self,
        request: &Request,
        resolver: &dyn Resolver,
        routes: &RouteSet,
    ) -> MatchOutcome {
        match self {
            MatcherKind::Index => IndexMatcher.match_request(request, resolver, routes),
            MatcherKind::Direct => DirectMatcher.match_request(request, resolver, routes),
            MatcherKind::Routes => RouteCollectionMatcher.match_request(request, resolver, routes),
        }
    }
}

fn match_file(path: &Path, resolver: &dyn Resolver) -> MatchOutcome {
    if resolver.exists(path) && resolver.is_file(path) {
        MatchOutcome::Matched(Resolved::new(path))
    } else {
        MatchOutcome::NoMatch
    }
}

fn match_index(path: &Path, resolver: &dyn Resolver) -> MatchOutcome {
    match_file(&path.join(INDEX_FILE), resolver)
}

fn has_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| !ext.is_empty())
}
