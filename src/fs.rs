//! File-tree abstraction used by loaders and file-backed resources.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ResourceError, Result};

pub trait FileTree: Send + Sync + fmt::Debug {
    /// Immediate children of `dir`, sorted.
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>>;
    fn is_dir(&self, path: &Path) -> bool;
    fn exists(&self, path: &Path) -> bool;
    fn open(&self, path: &Path) -> Result<Box<dyn Read + Send>>;

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let mut s = String::new();
        self.open(path)?.read_to_string(&mut s)?;
        Ok(s)
    }
}

// ------------- Disk -------------
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskFileTree;

impl FileTree for DiskFileTree {
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut children = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            children.push(entry?.path());
        }
        children.sort();
        Ok(children)
    }
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
    fn open(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        Ok(Box::new(std::fs::File::open(path)?))
    }
}

// ------------- Memory -------------
/// Files held in memory, keyed by path. Directories exist implicitly as the
/// ancestors of stored files.
#[derive(Debug, Default, Clone)]
pub struct MemoryFileTree {
    files: BTreeMap<PathBuf, Arc<[u8]>>,
}

impl MemoryFileTree {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl AsRef<[u8]>) {
        self.files.insert(path.into(), Arc::from(contents.as_ref()));
    }
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl AsRef<[u8]>) -> Self {
        self.insert(path, contents);
        self
    }
    pub fn len(&self) -> usize {
        self.files.len()
    }
}

impl FileTree for MemoryFileTree {
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !self.is_dir(dir) {
            return Err(ResourceError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no directory {}", dir.display()),
            )));
        }
        let mut children: Vec<PathBuf> = self
            .files
            .keys()
            .filter_map(|path| path.strip_prefix(dir).ok())
            .filter_map(|rest| rest.components().next())
            .map(|first| dir.join(first))
            .collect();
        children.dedup();
        Ok(children)
    }
    fn is_dir(&self, path: &Path) -> bool {
        self.files.keys().any(|file| file != path && file.starts_with(path))
    }
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.is_dir(path)
    }
    fn open(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        match self.files.get(path) {
            Some(contents) => Ok(Box::new(Cursor::new(contents.to_vec()))),
            None => Err(ResourceError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no file {}", path.display()),
            ))),
        }
    }
}

// ------------- FsFile -------------
fn disk_tree() -> Arc<dyn FileTree> {
    Arc::new(DiskFileTree)
}

/// A path inside a particular file tree. Only the path is serialized; a
/// deserialized file always points at the disk.
#[derive(Clone, Serialize, Deserialize)]
pub struct FsFile {
    path: PathBuf,
    #[serde(skip, default = "disk_tree")]
    tree: Arc<dyn FileTree>,
}

impl FsFile {
    pub fn new(tree: Arc<dyn FileTree>, path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), tree }
    }
    pub fn on_disk(path: impl Into<PathBuf>) -> Self {
        Self::new(disk_tree(), path)
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
    pub fn tree(&self) -> Arc<dyn FileTree> {
        Arc::clone(&self.tree)
    }
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
    pub fn exists(&self) -> bool {
        self.tree.exists(&self.path)
    }
    pub fn open(&self) -> Result<Box<dyn Read + Send>> {
        self.tree.open(&self.path)
    }
    pub fn read_to_string(&self) -> Result<String> {
        self.tree.read_to_string(&self.path)
    }
}

impl PartialEq for FsFile {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl fmt::Debug for FsFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FsFile({})", self.path.display())
    }
}

impl fmt::Display for FsFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
