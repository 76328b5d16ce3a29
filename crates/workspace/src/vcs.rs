//! Version-control collaborators.
//!
//! The analysis needs two things from version control: the list of files changed
//! between two revisions, and a read-only snapshot of a revision. [`GitCli`] gets
//! both from the `git` binary; [`MemoryVcs`] serves them from memory.

use crate::error::{Result, WorkspaceError};
use crate::paths::RepoPath;
use crate::tree::{decode, FileContent, SourceTree};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub path: RepoPath,
    pub status: ChangeStatus,
}

impl ChangeEntry {
    pub fn new(path: RepoPath, status: ChangeStatus) -> Self {
        Self { path, status }
    }
}

pub trait VersionControl {
    /// Files changed between `base` and `head`, sorted by path
    fn diff(&self, base: &str, head: &str) -> Result<Vec<ChangeEntry>>;

    /// Read-only view of the files at `rev`
    fn snapshot(&self, rev: &str) -> Result<SourceTree>;
}

/// [`VersionControl`] backed by the `git` command-line tool
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn run(&self, args: &[&str]) -> Result<Vec<u8>> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(WorkspaceError::git(args.join(" "), stderr));
        }
        Ok(output.stdout)
    }

    fn verify_revision(&self, rev: &str) -> Result<()> {
        let spec = format!("{rev}^{{commit}}");
        self.run(&["rev-parse", "--verify", "--quiet", &spec])
            .map(|_| ())
            .map_err(|_| WorkspaceError::UnknownRevision(rev.to_string()))
    }

    /// Feed `rev:path` names to `git cat-file --batch` and collect blob contents
    fn read_blobs(&self, rev: &str, paths: &[RepoPath]) -> Result<Vec<FileContent>> {
        let mut child = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(["cat-file", "--batch"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut request = Vec::new();
        for path in paths {
            request.extend_from_slice(format!("{rev}:{path}\n").as_bytes());
        }
        let Some(mut stdin) = child.stdin.take() else {
            return Err(WorkspaceError::git("cat-file --batch", "stdin unavailable"));
        };
        // Written from a separate thread so a full stdout pipe cannot stall the request
        let writer = std::thread::spawn(move || stdin.write_all(&request));

        let output = child.wait_with_output()?;
        match writer.join() {
            Ok(result) => result?,
            Err(_) => return Err(WorkspaceError::git("cat-file --batch", "writer thread panicked")),
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(WorkspaceError::git("cat-file --batch", stderr));
        }

        parse_batch_output(&output.stdout, paths.len())
    }
}

impl VersionControl for GitCli {
    fn diff(&self, base: &str, head: &str) -> Result<Vec<ChangeEntry>> {
        self.verify_revision(base)?;
        self.verify_revision(head)?;
        let stdout = self.run(&["diff", "--name-status", "-z", "--no-renames", base, head])?;
        let entries = parse_name_status(&stdout);
        log::debug!("git diff {base}..{head}: {} changed files", entries.len());
        Ok(entries)
    }

    fn snapshot(&self, rev: &str) -> Result<SourceTree> {
        self.verify_revision(rev)?;
        let stdout = self.run(&["ls-tree", "-r", "-z", "--name-only", rev])?;

        let mut tree = SourceTree::new(rev);
        let mut wanted = Vec::new();
        for raw in stdout.split(|b| *b == 0).filter(|s| !s.is_empty()) {
            let raw = String::from_utf8_lossy(raw);
            let Some(path) = RepoPath::new(&raw) else {
                log::debug!("Skipping unrepresentable path {raw:?} at {rev}");
                continue;
            };
            if SourceTree::is_content_path(&path) && !path.as_str().contains('\n') {
                wanted.push(path);
            } else {
                tree.insert_path(path);
            }
        }

        let contents = self.read_blobs(rev, &wanted)?;
        for (path, content) in wanted.into_iter().zip(contents) {
            tree.insert(path, content);
        }
        log::debug!("Snapshot {rev}: {} files", tree.len());
        Ok(tree)
    }
}

/// Parse `git diff --name-status -z --no-renames` output
pub(crate) fn parse_name_status(stdout: &[u8]) -> Vec<ChangeEntry> {
    let mut tokens = stdout.split(|b| *b == 0).filter(|s| !s.is_empty());
    let mut entries = Vec::new();

    while let (Some(status), Some(path)) = (tokens.next(), tokens.next()) {
        let status = match status.first() {
            Some(b'A') => ChangeStatus::Added,
            Some(b'M' | b'T' | b'U') => ChangeStatus::Modified,
            Some(b'D') => ChangeStatus::Deleted,
            _ => {
                log::debug!("Ignoring diff status {:?}", String::from_utf8_lossy(status));
                continue;
            }
        };
        let path = String::from_utf8_lossy(path);
        if let Some(path) = RepoPath::new(&path) {
            entries.push(ChangeEntry::new(path, status));
        }
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}

/// Parse `git cat-file --batch` output for `expected` requests
pub(crate) fn parse_batch_output(stdout: &[u8], expected: usize) -> Result<Vec<FileContent>> {
    let mut contents = Vec::with_capacity(expected);
    let mut rest = stdout;

    while contents.len() < expected {
        let Some(newline) = rest.iter().position(|b| *b == b'\n') else {
            return Err(WorkspaceError::git("cat-file --batch", "truncated output"));
        };
        let header = String::from_utf8_lossy(&rest[..newline]).into_owned();
        rest = &rest[newline + 1..];

        if header.ends_with(" missing") || header.ends_with(" ambiguous") {
            contents.push(FileContent::Unreadable);
            continue;
        }

        let mut fields = header.split(' ');
        let (Some(_oid), Some(kind), Some(size)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(WorkspaceError::git("cat-file --batch", format!("bad header {header:?}")));
        };
        let size: usize = size
            .parse()
            .map_err(|_| WorkspaceError::git("cat-file --batch", format!("bad size in {header:?}")))?;
        if rest.len() < size + 1 {
            return Err(WorkspaceError::git("cat-file --batch", "truncated object"));
        }

        let body = rest[..size].to_vec();
        rest = &rest[size + 1..];
        contents.push(if kind == "blob" {
            decode(body)
        } else {
            FileContent::Unreadable
        });
    }

    Ok(contents)
}

/// In-memory [`VersionControl`]: named revisions mapped to source trees
#[derive(Debug, Clone, Default)]
pub struct MemoryVcs {
    revisions: BTreeMap<String, SourceTree>,
}

impl MemoryVcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_revision(mut self, tree: SourceTree) -> Self {
        self.insert(tree);
        self
    }

    /// Register `tree` under its label
    pub fn insert(&mut self, tree: SourceTree) {
        self.revisions.insert(tree.label().to_string(), tree);
    }

    fn tree(&self, rev: &str) -> Result<&SourceTree> {
        self.revisions
            .get(rev)
            .ok_or_else(|| WorkspaceError::UnknownRevision(rev.to_string()))
    }
}

impl VersionControl for MemoryVcs {
    fn diff(&self, base: &str, head: &str) -> Result<Vec<ChangeEntry>> {
        let base = self.tree(base)?;
        let head = self.tree(head)?;

        let mut entries = Vec::new();
        for path in head.files() {
            if !base.contains(path) {
                entries.push(ChangeEntry::new(path.clone(), ChangeStatus::Added));
            } else if base.content(path) != head.content(path) {
                entries.push(ChangeEntry::new(path.clone(), ChangeStatus::Modified));
            }
        }
        for path in base.files() {
            if !head.contains(path) {
                entries.push(ChangeEntry::new(path.clone(), ChangeStatus::Deleted));
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn snapshot(&self, rev: &str) -> Result<SourceTree> {
        self.tree(rev).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn path(raw: &str) -> RepoPath {
        RepoPath::new(raw).unwrap()
    }

    #[test]
    fn name_status_maps_statuses_and_sorts() {
        let raw = b"M\0packages/b/src/use.ts\0A\0packages/a/src/new.ts\0D\0packages/a/src/old.ts\0T\0link.ts\0X\0weird\0";
        let entries = parse_name_status(raw);
        assert_eq!(
            entries,
            vec![
                ChangeEntry::new(path("link.ts"), ChangeStatus::Modified),
                ChangeEntry::new(path("packages/a/src/new.ts"), ChangeStatus::Added),
                ChangeEntry::new(path("packages/a/src/old.ts"), ChangeStatus::Deleted),
                ChangeEntry::new(path("packages/b/src/use.ts"), ChangeStatus::Modified),
            ]
        );
    }

    #[test]
    fn batch_output_handles_missing_and_binary_objects() {
        let mut raw = Vec::new();
        raw.extend_from_slice(b"aaaa blob 5\nhello\n");
        raw.extend_from_slice(b"HEAD:gone.ts missing\n");
        raw.extend_from_slice(b"bbbb blob 2\n\xff\xfe\n");
        raw.extend_from_slice(b"cccc tree 0\n\n");

        let contents = parse_batch_output(&raw, 4).unwrap();
        assert_eq!(
            contents,
            vec![
                FileContent::Text("hello".to_string()),
                FileContent::Unreadable,
                FileContent::Unreadable,
                FileContent::Unreadable,
            ]
        );
    }

    #[test]
    fn batch_output_rejects_truncation() {
        assert!(parse_batch_output(b"aaaa blob 10\nshort\n", 1).is_err());
        assert!(parse_batch_output(b"", 1).is_err());
    }

    #[test]
    fn memory_vcs_diffs_by_content() {
        let base = SourceTree::from_files(
            "base",
            vec![
                ("a.ts", Some("export const a = 1;")),
                ("b.ts", Some("export const b = 1;")),
                ("gone.ts", Some("")),
            ],
        );
        let head = SourceTree::from_files(
            "head",
            vec![
                ("a.ts", Some("export const a = 1;")),
                ("b.ts", Some("export const b = 2;")),
                ("new.ts", Some("")),
            ],
        );
        let vcs = MemoryVcs::new().with_revision(base).with_revision(head);

        let entries = vcs.diff("base", "head").unwrap();
        assert_eq!(
            entries,
            vec![
                ChangeEntry::new(path("b.ts"), ChangeStatus::Modified),
                ChangeEntry::new(path("gone.ts"), ChangeStatus::Deleted),
                ChangeEntry::new(path("new.ts"), ChangeStatus::Added),
            ]
        );
        assert!(matches!(
            vcs.diff("base", "nope"),
            Err(WorkspaceError::UnknownRevision(rev)) if rev == "nope"
        ));
        assert_eq!(vcs.snapshot("head").unwrap().len(), 3);
    }
}
