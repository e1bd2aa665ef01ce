//! Route model and routes-document parsing.
//!
//! # Document Shape
//! ```text
//! { "routes": [ { "method": "POST", "path": "/cat", "resource": "Pictures/cat.jpg",
//!                  "contentType": "image/jpeg" }, ... ] }
//! ```
//!
//! `method` defaults to GET and `contentType` is optional.
//!
//! # Design Decisions
//! - Parsing is best-effort: a malformed entry is dropped, the rest survive
//! - A missing or malformed document is an empty RouteSet, never an error
//! - Patterns are compiled once here, anchored at both ends, case-insensitive
//! - A pattern that fails to compile keeps its entry but never matches
//! - A resource that climbs out of the root (`..`) makes the entry malformed

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use axum::http::HeaderValue;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// HTTP verbs a route (and a request) may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Options,
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Trace,
    Connect,
}

impl Verb {
    pub const ALL: [Verb; 9] = [
        Verb::Options,
        Verb::Get,
        Verb::Head,
        Verb::Post,
        Verb::Put,
        Verb::Patch,
        Verb::Delete,
        Verb::Trace,
        Verb::Connect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Options => "OPTIONS",
            Verb::Get => "GET",
            Verb::Head => "HEAD",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Trace => "TRACE",
            Verb::Connect => "CONNECT",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a method string names no known verb.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown HTTP method: {0}")]
pub struct UnknownVerb(pub String);

impl FromStr for Verb {
    type Err = UnknownVerb;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.as_str() == s)
            .ok_or_else(|| UnknownVerb(s.to_string()))
    }
}

/// One configured rule: method + path pattern → target resource.
#[derive(Debug, Clone)]
pub struct Route {
    method: Verb,
    pattern: String,
    resource: PathBuf,
    content_type: Option<String>,
    compiled: Option<Regex>,
}

impl Route {
    /// Method used when an entry does not name one.
    pub const DEFAULT_METHOD: Verb = Verb::Get;

    pub fn new(method: Verb, pattern: impl Into<String>, resource: impl Into<PathBuf>) -> Self {
        let pattern = pattern.into();
        let compiled = match RegexBuilder::new(&format!("^(?:{pattern})$"))
            .case_insensitive(true)
            .build()
        {
            Ok(regex) => Some(regex),
            Err(e) => {
                tracing::warn!(
                    pattern = %pattern,
                    error = %e,
                    "Route pattern does not compile; route will never match"
                );
                None
            }
        };

        Self {
            method,
            pattern,
            resource: resource.into(),
            content_type: None,
            compiled,
        }
    }

    /// Serve the target with `content_type` instead of the guessed one.
    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn method(&self) -> Verb {
        self.method
    }

    /// The pattern as written in the document, before anchoring.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Target resource, relative to the serving root.
    pub fn resource(&self) -> &Path {
        &self.resource
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Whether the pattern compiled.
    pub fn is_valid(&self) -> bool {
        self.compiled.is_some()
    }

    /// Returns true if both the method and the whole path match.
    pub fn matches(&self, method: Verb, path: &str) -> bool {
        if method != self.method {
            return false;
        }
        self.compiled
            .as_ref()
            .map(|regex| regex.is_match(path))
            .unwrap_or(false)
    }
}

fn default_method() -> Verb {
    Route::DEFAULT_METHOD
}

#[derive(Debug, Deserialize)]
struct RouteEntry {
    #[serde(default = "default_method")]
    method: Verb,
    path: String,
    resource: String,
    #[serde(rename = "contentType", default)]
    content_type: Option<String>,
}

impl RouteEntry {
    /// Entry-level checks serde cannot express.
    fn check(&self) -> Result<(), String> {
        if Path::new(&self.resource)
            .components()
            .any(|c| c == Component::ParentDir)
        {
            return Err(format!("resource {:?} leaves the served folder", self.resource));
        }
        if let Some(content_type) = &self.content_type {
            if HeaderValue::from_str(content_type).is_err() {
                return Err(format!("contentType {content_type:?} is not a valid header value"));
            }
        }
        Ok(())
    }

    fn into_route(self) -> Route {
        Route::new(self.method, self.path, self.resource).with_content_type(self.content_type)
    }
}

#[derive(Debug, Deserialize)]
struct RoutesDocument {
    routes: Vec<serde_json::Value>,
}

/// Ordered, immutable collection of routes. Insertion order is evaluation order.
#[derive(Debug, Clone, Default)]
pub struct RouteSet {
    routes: Vec<Route>,
}

impl RouteSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a routes document, dropping entries that fail to decode.
    pub fn parse(document: Option<&[u8]>) -> Self {
        let Some(bytes) = document else {
            return Self::empty();
        };

        let document: RoutesDocument = match serde_json::from_slice(bytes) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(error = %e, "Routes document is malformed; serving without routes");
                return Self::empty();
            }
        };

        let routes = document
            .routes
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                let entry = serde_json::from_value::<RouteEntry>(value)
                    .map_err(|e| e.to_string())
                    .and_then(|entry| entry.check().map(|()| entry));
                match entry {
                    Ok(entry) => Some(entry.into_route()),
                    Err(e) => {
                        tracing::warn!(index, error = %e, "Dropping malformed route entry");
                        None
                    }
                }
            })
            .collect();

        Self { routes }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
