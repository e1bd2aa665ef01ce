//! Local filesystem resolver.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{content_type_for, ResolveError, Resolver, Resource};

/// Resolves resources against a folder on the local disk.
#[derive(Debug, Clone)]
pub struct LocalResolver {
    root: PathBuf,
}

impl LocalResolver {
    /// Create a resolver serving from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The folder this resolver serves from.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Resolver for LocalResolver {
    fn locate(&self, path: &str) -> PathBuf {
        let mut located = self.root.clone();
        for segment in path.split('/').filter(|s| !matches!(*s, "" | "." | "..")) {
            located.push(segment);
        }
        located
    }

    fn exists(&self, path: &Path) -> bool {
        path.try_exists().unwrap_or(false)
    }

    fn is_file(&self, path: &Path) -> bool {
        fs::metadata(path).map(|m| !m.is_dir()).unwrap_or(false)
    }

    fn read(&self, path: &Path) -> Result<Resource, ResolveError> {
        let metadata = fs::metadata(path).map_err(|e| io_error(path, e))?;
        if metadata.is_dir() {
            return Err(ResolveError::NotAFile(path.to_path_buf()));
        }

        let bytes = fs::read(path).map_err(|e| io_error(path, e))?;
        Ok(Resource {
            bytes,
            content_type: content_type_for(path),
        })
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ResolveError {
    if source.kind() == ErrorKind::NotFound {
        ResolveError::NotFound(path.to_path_buf())
    } else {
        ResolveError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
