use crate::paths::{canonicalize, RepoPath};
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};

/// Scanner for the files of a working tree (.gitignore aware)
pub struct FileScanner {
    root: PathBuf,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Every non-ignored file, as canonical paths in canonical order
    pub fn scan(&self) -> Vec<RepoPath> {
        let mut files = Vec::new();

        let root = self.root.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(false)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .require_git(false);
        builder.filter_entry(move |entry| !FileScanner::is_ignored_scope(entry.path(), &root));

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    match canonicalize(&self.root, entry.path()) {
                        Some(path) => files.push(path),
                        None => log::debug!("Skipping path outside root {}", entry.path().display()),
                    }
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        files.sort();
        files.dedup();
        log::debug!("Found {} files under {}", files.len(), self.root.display());
        files
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether any directory between `root` and `path` is a skipped scope
    fn is_ignored_scope(path: &Path, root: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(root) else {
            return false;
        };
        relative.components().any(|component| match component {
            Component::Normal(name) => name.to_str().is_some_and(|name| SKIPPED_DIRS.contains(&name)),
            _ => false,
        })
    }
}

const SKIPPED_DIRS: &[&str] = &[".git", ".hg", ".svn", "node_modules"];

#[cfg(test)]
mod tests {
    use super::FileScanner;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn lists_files_in_canonical_order() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("packages/b/src")).unwrap();
        fs::create_dir_all(temp.path().join("packages/a/src")).unwrap();
        fs::write(temp.path().join("packages/b/src/index.ts"), b"").unwrap();
        fs::write(temp.path().join("packages/a/src/index.ts"), b"").unwrap();
        fs::write(temp.path().join("Readme.md"), b"").unwrap();

        let files = FileScanner::new(temp.path()).scan();
        let files: Vec<&str> = files.iter().map(|p| p.as_str()).collect();

        assert_eq!(
            files,
            vec!["Readme.md", "packages/a/src/index.ts", "packages/b/src/index.ts"]
        );
    }

    #[test]
    fn skips_ignored_directories() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("node_modules/dep")).unwrap();
        fs::create_dir_all(temp.path().join("dist")).unwrap();
        fs::write(temp.path().join("node_modules/dep/index.ts"), b"").unwrap();
        fs::write(temp.path().join("dist/out.ts"), b"").unwrap();
        fs::write(temp.path().join("main.ts"), b"").unwrap();
        fs::write(temp.path().join(".gitignore"), b"/dist\n").unwrap();

        let files = FileScanner::new(temp.path()).scan();

        assert!(files.iter().all(|p| !p.as_str().contains("node_modules")));
        assert!(files.iter().all(|p| !p.as_str().starts_with("dist/")));
        assert!(files.iter().any(|p| p.as_str() == "main.ts"));
    }
}
