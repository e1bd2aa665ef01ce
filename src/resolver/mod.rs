//! Resource resolution subsystem.
//!
//! # Data Flow
//! ```text
//! Request.path ("/Pictures/cat.jpg")
//!     → Resolver::locate (root the path against the serving folder)
//!     → Resolver::exists / is_file (matcher existence checks)
//!     → Resolver::read (bytes + content type for the HTTP response)
//! ```
//!
//! # Design Decisions
//! - Matching never touches `std::fs` directly; everything goes through a Resolver
//! - "Reachable" (`exists`) is distinct from "plain file" (`is_file`)
//! - A resolver is bound to one root for its whole lifetime
//! - Content type is decided by the resolver, not by the matcher

pub mod fs;
pub mod memory;

use std::fmt::Debug;
use std::path::{Path, PathBuf};

pub use fs::LocalResolver;
pub use memory::{FileNode, MemoryResolver};

/// Fallback content type for resources with an unknown extension.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Error type for resource reads.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("resource not found: {0}")]
    NotFound(PathBuf),
    #[error("resource is not a plain file: {0}")]
    NotAFile(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The bytes of a resolved resource and the content type to serve them with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Abstraction over "does this resource exist / fetch its bytes".
///
/// Implementations must be safe to call from many request workers at once.
pub trait Resolver: Send + Sync + Debug {
    /// Root a normalized URL path (always starting with `/`) against the
    /// serving folder. `.` and `..` segments are skipped, so the result
    /// never leaves the root.
    fn locate(&self, path: &str) -> PathBuf;

    /// Returns true if something (file or directory) is reachable at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns true if `path` exists and is not a directory.
    fn is_file(&self, path: &Path) -> bool;

    /// Read the resource at `path`.
    fn read(&self, path: &Path) -> Result<Resource, ResolveError>;
}

/// Guess a content type from the file extension.
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}
