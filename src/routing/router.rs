//! Request mapping.
//!
//! # Responsibilities
//! - Run the matcher chain against one request
//! - Return the first matched resource, or an explicit NotFound
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Resolver and RouteSet are supplied per call, never cached here
//! - Explicit failure codes rather than silent defaults

use crate::http::request::Request;
use crate::resolver::Resolver;
use crate::routing::matcher::{MatchOutcome, Matcher, MatcherKind, Resolved};
use crate::routing::route::RouteSet;

/// Failure codes a mapping (or canonicalization) can end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseErrorCode {
    NotFound = 404,
    InternalError = 500,
}

impl ResponseErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn reason(self) -> &'static str {
        match self {
            ResponseErrorCode::NotFound => "Not Found",
            ResponseErrorCode::InternalError => "Internal Error",
        }
    }
}

/// Outcome of mapping a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Success(Resolved),
    Failure(ResponseErrorCode),
}

/// Runs an ordered matcher chain; stops at the first match.
#[derive(Debug, Clone)]
pub struct RequestMapper {
    chain: Vec<MatcherKind>,
}

impl RequestMapper {
    pub fn new(chain: Vec<MatcherKind>) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &[MatcherKind] {
        &self.chain
    }

    pub fn map(&self, request: &Request, resolver: &dyn Resolver, routes: &RouteSet) -> Response {
        for matcher in &self.chain {
            let outcome = matcher.match_request(request, resolver, routes);
            if let MatchOutcome::Matched(resolved) = outcome {
                tracing::debug!(
                    method = %request.method(),
                    path = %request.path(),
                    matcher = ?matcher,
                    resolved = %resolved.path.display(),
                    "Request matched"
                );
                return Response::Success(resolved);
            }
        }

        tracing::debug!(
            method = %request.method(),
            path = %request.path(),
            "No matcher resolved request"
        );
        Response::Failure(ResponseErrorCode::NotFound)
    }
}

impl Default for RequestMapper {
    fn default() -> Self {
        Self::new(MatcherKind::DEFAULT_ORDER.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{FileNode, MemoryResolver};
    use crate::routing::Verb;

    fn resolver() -> MemoryResolver {
        MemoryResolver::new(vec![
            FileNode::dir("Pictures", vec![FileNode::file("cat.jpg", "meow")]),
            FileNode::dir("Documents", vec![FileNode::file("index.html", "<h1>docs</h1>")]),
        ])
    }

    fn cat_route() -> RouteSet {
        RouteSet::parse(Some(
            br#"{"routes": [{"method": "POST", "path": "/cat", "resource": "/Pictures/cat.jpg"}]}"#,
        ))
    }

    fn map(mapper: &RequestMapper, method: Verb, path: &str, routes: &RouteSet) -> Response {
        let r = resolver();
        let request = Request::with_method(method, path, &r).unwrap();
        mapper.map(&request, &r, routes)
    }

    #[test]
    fn test_direct_file() {
        let mapper = RequestMapper::default();
        assert_eq!(
            map(&mapper, Verb::Get, "/Pictures/cat.jpg", &RouteSet::empty()),
            Response::Success("/Pictures/cat.jpg".into())
        );
    }

    #[test]
    fn test_directory_index() {
        let mapper = RequestMapper::default();
        assert_eq!(
            map(&mapper, Verb::Get, "/Documents", &RouteSet::empty()),
            Response::Success("/Documents/index.html".into())
        );
    }

    #[test]
    fn test_declared_route() {
        let mapper = RequestMapper::default();
        let routes = cat_route();
        assert_eq!(
            map(&mapper, Verb::Post, "/cat", &routes),
            Response::Success("/Pictures/cat.jpg".into())
        );
        assert_eq!(
            map(&mapper, Verb::Get, "/cat", &routes),
            Response::Failure(ResponseErrorCode::NotFound)
        );
    }

    #[test]
    fn test_missing_file() {
        let mapper = RequestMapper::default();
        assert_eq!(
            map(&mapper, Verb::Get, "/Pictures/dog.jpg", &cat_route()),
            Response::Failure(ResponseErrorCode::NotFound)
        );
    }

    #[test]
    fn test_route_cannot_shadow_existing_file() {
        let routes = RouteSet::parse(Some(
            br#"{"routes": [{"path": "/Pictures/cat.jpg", "resource": "Documents/index.html"}]}"#,
        ));
        assert_eq!(
            map(&RequestMapper::default(), Verb::Get, "/Pictures/cat.jpg", &routes),
            Response::Success("/Pictures/cat.jpg".into())
        );

        // With routes first, the configured rule wins.
        let routes_first = RequestMapper::new(vec![
            MatcherKind::Routes,
            MatcherKind::Index,
            MatcherKind::Direct,
        ]);
        assert_eq!(
            map(&routes_first, Verb::Get, "/Pictures/cat.jpg", &routes),
            Response::Success("/Documents/index.html".into())
        );
    }

    #[test]
    fn test_empty_chain_is_not_found() {
        let mapper = RequestMapper::new(Vec::new());
        assert_eq!(
            map(&mapper, Verb::Get, "/Pictures/cat.jpg", &RouteSet::empty()),
            Response::Failure(ResponseErrorCode::NotFound)
        );
    }
}
