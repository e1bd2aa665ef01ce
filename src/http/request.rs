//! Request canonicalization.
//!
//! # Responsibilities
//! - Validate the method against the closed set of verbs
//! - Percent-decode and normalize the URL path
//! - Reject traversal segments before anything touches the resolver
//! - Root the path against the serving folder exactly once, at ingress
//!
//! # Design Decisions
//! - An unknown method is a canonicalization failure (500), not a NoMatch (404)
//! - Route patterns see the normalized URL path; existence checks see the rooted location

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::resolver::Resolver;
use crate::routing::{UnknownVerb, Verb};

/// Error type for request canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("unknown HTTP method: {0}")]
    UnknownMethod(String),
    #[error("invalid request path: {0}")]
    InvalidPath(String),
}

impl From<UnknownVerb> for RequestError {
    fn from(err: UnknownVerb) -> Self {
        RequestError::UnknownMethod(err.0)
    }
}

/// A validated request, ready for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Verb,
    path: String,
    location: PathBuf,
}

impl Request {
    /// Canonicalize a raw method string and URI path.
    pub fn canonicalize(
        method: &str,
        uri_path: &str,
        resolver: &dyn Resolver,
    ) -> Result<Self, RequestError> {
        let method: Verb = method.parse()?;
        Self::with_method(method, uri_path, resolver)
    }

    /// Canonicalize a URI path for an already validated verb.
    pub fn with_method(
        method: Verb,
        uri_path: &str,
        resolver: &dyn Resolver,
    ) -> Result<Self, RequestError> {
        let path = normalize_path(uri_path)?;
        let location = resolver.locate(&path);
        Ok(Self {
            method,
            path,
            location,
        })
    }

    pub fn method(&self) -> Verb {
        self.method
    }

    /// Normalized URL path, always starting with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path rooted against the serving folder.
    pub fn location(&self) -> &Path {
        &self.location
    }
}

fn normalize_path(uri_path: &str) -> Result<String, RequestError> {
    let decoded = percent_decode_str(uri_path)
        .decode_utf8()
        .map_err(|_| RequestError::InvalidPath(uri_path.to_string()))?;

    let mut normalized = String::with_capacity(decoded.len() + 1);
    for segment in decoded.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." || segment.contains('\\') || segment.contains('\0') {
            tracing::warn!(path = %uri_path, "Rejecting request path segment");
            return Err(RequestError::InvalidPath(uri_path.to_string()));
        }
        if cfg!(windows) && segment.contains(':') {
            return Err(RequestError::InvalidPath(uri_path.to_string()));
        }
        normalized.push('/');
        normalized.push_str(segment);
    }

    if normalized.is_empty() {
        normalized.push('/');
    }
    Ok(normalized)
}
