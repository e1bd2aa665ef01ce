//! In-memory resolver backed by a synthetic file tree.
//!
//! Used as a fixture wherever a real folder would make a test slow or
//! order-dependent. Paths are rooted at `/`.

use std::path::{Component, Path, PathBuf};

use super::{content_type_for, ResolveError, Resolver, Resource};

/// One node of a synthetic file tree.
///
/// A node carrying data is a file; a node without data is a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub name: String,
    pub children: Vec<FileNode>,
    pub data: Option<Vec<u8>>,
}

impl FileNode {
    pub fn dir(name: impl Into<String>, children: Vec<FileNode>) -> Self {
        Self {
            name: name.into(),
            children,
            data: None,
        }
    }

    pub fn file(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            data: Some(data.into()),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.data.is_none()
    }

    /// Direct child with the given name.
    pub fn member(&self, name: &str) -> Option<&FileNode> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Descend the tree along `path`, which is interpreted relative to this node.
    pub fn lookup(&self, path: &Path) -> Option<&FileNode> {
        let mut node = self;
        for component in path.components() {
            match component {
                Component::RootDir | Component::CurDir => continue,
                Component::Normal(name) => {
                    node = node.member(name.to_str()?)?;
                }
                Component::ParentDir | Component::Prefix(_) => return None,
            }
        }
        Some(node)
    }
}

/// Resolver over a [`FileNode`] tree whose root stands for `/`.
#[derive(Debug, Clone)]
pub struct MemoryResolver {
    root: FileNode,
}

impl MemoryResolver {
    pub fn new(children: Vec<FileNode>) -> Self {
        Self {
            root: FileNode::dir("", children),
        }
    }

    pub fn tree(&self) -> &FileNode {
        &self.root
    }
}

impl Resolver for MemoryResolver {
    fn locate(&self, path: &str) -> PathBuf {
        let mut located = PathBuf::from("/");
        for segment in path.split('/').filter(|s| !matches!(*s, "" | "." | "..")) {
            located.push(segment);
        }
        located
    }

    fn exists(&self, path: &Path) -> bool {
        self.root.lookup(path).is_some()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.root.lookup(path).is_some_and(|node| !node.is_dir())
    }

    fn read(&self, path: &Path) -> Result<Resource, ResolveError> {
        let node = self
            .root
            .lookup(path)
            .ok_or_else(|| ResolveError::NotFound(path.to_path_buf()))?;
        let data = node
            .data
            .as_ref()
            .ok_or_else(|| ResolveError::NotAFile(path.to_path_buf()))?;

        Ok(Resource {
            bytes: data.clone(),
            content_type: content_type_for(path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> MemoryResolver {
        MemoryResolver::new(vec![
            FileNode::dir("Pictures", vec![FileNode::file("cat.jpg", "meow")]),
            FileNode::dir(
                "Documents",
                vec![FileNode::file("index.html", "<h1>docs</h1>")],
            ),
        ])
    }

    #[test]
    fn test_lookup_descends_tree() {
        let resolver = fixture();
        assert!(resolver.is_file(Path::new("/Pictures/cat.jpg")));
        assert!(resolver.exists(Path::new("/Documents")));
        assert!(!resolver.is_file(Path::new("/Documents")));
        assert!(!resolver.exists(Path::new("/Pictures/dog.jpg")));
        assert!(!resolver.exists(Path::new("/Pictures/../Documents")));
    }

    #[test]
    fn test_read() {
        let resolver = fixture();
        let resource = resolver.read(Path::new("/Pictures/cat.jpg")).unwrap();
        assert_eq!(resource.bytes, b"meow");
        assert_eq!(resource.content_type, "image/jpeg");

        assert!(matches!(
            resolver.read(Path::new("/Documents")),
            Err(ResolveError::NotAFile(_))
        ));
    }
}
