use crate::error::Result;
use crate::paths::RepoPath;
use crate::scanner::FileScanner;
use fence_imports::Dialect;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

pub const MANIFEST_FILE_NAME: &str = "package.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    /// Present in the tree but not readable as UTF-8 text
    Unreadable,
}

/// Immutable view of one revision of the repository.
///
/// Every path is listed, so existence checks are exact; content is only kept for
/// files the analysis reads (TypeScript sources and package manifests).
#[derive(Debug, Clone, Default)]
pub struct SourceTree {
    label: String,
    files: BTreeSet<RepoPath>,
    contents: BTreeMap<RepoPath, FileContent>,
}

impl SourceTree {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Build a tree from in-memory files. `None` content marks an unreadable file.
    pub fn from_files<I, P, C>(label: impl Into<String>, files: I) -> Self
    where
        I: IntoIterator<Item = (P, Option<C>)>,
        P: AsRef<str>,
        C: Into<String>,
    {
        let mut tree = Self::new(label);
        for (path, content) in files {
            let Some(path) = RepoPath::new(path.as_ref()) else {
                log::warn!("Ignoring invalid repository path {:?}", path.as_ref());
                continue;
            };
            let content = content.map_or(FileContent::Unreadable, |c| FileContent::Text(c.into()));
            tree.insert(path, content);
        }
        tree
    }

    /// Snapshot the working tree under `root`
    pub fn from_working_tree(root: &Path) -> Result<Self> {
        let scanner = FileScanner::new(root);
        let mut tree = Self::new("WORKTREE");
        for path in scanner.scan() {
            if !Self::is_content_path(&path) {
                tree.files.insert(path);
                continue;
            }
            let content = match std::fs::read(root.join(path.as_str())) {
                Ok(bytes) => decode(bytes),
                Err(e) => {
                    log::warn!("Failed to read {path}: {e}");
                    FileContent::Unreadable
                }
            };
            tree.insert(path, content);
        }
        Ok(tree)
    }

    pub(crate) fn insert(&mut self, path: RepoPath, content: FileContent) {
        self.files.insert(path.clone());
        self.contents.insert(path, content);
    }

    pub(crate) fn insert_path(&mut self, path: RepoPath) {
        self.files.insert(path);
    }

    /// Whether the analysis needs the content of this path
    pub fn is_content_path(path: &RepoPath) -> bool {
        Dialect::is_source_path(path.as_str()) || path.file_name() == MANIFEST_FILE_NAME
    }

    /// Revision name or `WORKTREE`
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn contains(&self, path: &RepoPath) -> bool {
        self.files.contains(path)
    }

    pub fn content(&self, path: &RepoPath) -> Option<&FileContent> {
        self.contents.get(path)
    }

    /// Text of a readable file
    pub fn read(&self, path: &RepoPath) -> Option<&str> {
        match self.contents.get(path) {
            Some(FileContent::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// All files, in canonical order
    pub fn files(&self) -> impl Iterator<Item = &RepoPath> {
        self.files.iter()
    }

    /// TypeScript sources with their dialect, in canonical order
    pub fn source_files(&self) -> impl Iterator<Item = (&RepoPath, Dialect)> {
        self.files
            .iter()
            .filter_map(|path| Dialect::from_path(path.as_str()).map(|dialect| (path, dialect)))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

pub(crate) fn decode(bytes: Vec<u8>) -> FileContent {
    match String::from_utf8(bytes) {
        Ok(text) => FileContent::Text(text),
        Err(_) => FileContent::Unreadable,
    }
}
