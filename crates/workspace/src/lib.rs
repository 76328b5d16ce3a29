//! # Fence Workspace
//!
//! Everything the analysis knows about a repository revision:
//!
//! - [`RepoPath`]: canonical repo-relative file identity
//! - [`SourceTree`]: immutable snapshot of one revision (or the working tree)
//! - [`WorkspaceIndex`]: package registry discovered from a snapshot
//! - [`ModuleTable`]: parsed imports of every TypeScript source
//! - [`VersionControl`]: diff and snapshot provider ([`GitCli`], [`MemoryVcs`])
//! - [`repo_fingerprint`]: platform-stable content hash of a working tree
//!
//! ## Example
//!
//! ```
//! use fence_workspace::{ModuleTable, SourceTree, WorkspaceIndex, WorkspaceOptions};
//!
//! let tree = SourceTree::from_files(
//!     "head",
//!     vec![
//!         ("packages/a/package.json", Some(r#"{"name":"@s/a"}"#)),
//!         ("packages/a/src/index.ts", Some("export * from './pub';")),
//!     ],
//! );
//! let index = WorkspaceIndex::discover(&tree, &WorkspaceOptions::default()).unwrap();
//! let modules = ModuleTable::parse_all(&tree);
//!
//! assert_eq!(index.packages().len(), 1);
//! assert_eq!(modules.len(), 1);
//! ```

mod error;
mod fingerprint;
mod modules;
mod packages;
mod paths;
mod scanner;
mod tree;
mod vcs;

pub use error::{Result, WorkspaceError};
pub use fingerprint::{
    content_hash, fingerprint_working_tree, repo_fingerprint, FingerprintEntry, FINGERPRINT_SCHEMA,
};
pub use modules::{ModuleEntry, ModuleTable};
pub use packages::{
    Package, WorkspaceIndex, WorkspaceOptions, DEFAULT_RESERVED_SEGMENTS, DEFAULT_SOURCE_DIR,
    DEFAULT_WORKSPACE_GLOB,
};
pub use paths::{canonicalize, join, RepoPath};
pub use scanner::FileScanner;
pub use tree::{FileContent, SourceTree, MANIFEST_FILE_NAME};
pub use vcs::{ChangeEntry, ChangeStatus, GitCli, MemoryVcs, VersionControl};
