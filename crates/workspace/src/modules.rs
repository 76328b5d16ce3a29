use crate::paths::RepoPath;
use crate::tree::{FileContent, SourceTree};
use fence_imports::{Dialect, ImportParser, ModuleImports};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Outcome of reading and parsing one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleEntry {
    Parsed(ModuleImports),
    Unreadable,
    ParseFailed(String),
}

impl ModuleEntry {
    pub fn imports(&self) -> Option<&ModuleImports> {
        match self {
            Self::Parsed(imports) => Some(imports),
            _ => None,
        }
    }
}

/// Parsed imports of every source file in a tree, keyed by canonical path
#[derive(Debug, Clone, Default)]
pub struct ModuleTable {
    entries: BTreeMap<RepoPath, ModuleEntry>,
}

impl ModuleTable {
    /// Parse every TypeScript source of `tree` in parallel.
    ///
    /// Each worker owns its own parser; results are rejoined into canonical order.
    pub fn parse_all(tree: &SourceTree) -> Self {
        let sources: Vec<(&RepoPath, Dialect)> = tree.source_files().collect();

        let entries: BTreeMap<RepoPath, ModuleEntry> = sources
            .par_iter()
            .map_init(ImportParser::new, |parser, (path, dialect)| {
                let entry = match (tree.content(path), parser) {
                    (Some(FileContent::Text(text)), Ok(parser)) => {
                        match parser.parse(text, *dialect) {
                            Ok(imports) => ModuleEntry::Parsed(imports),
                            Err(e) => ModuleEntry::ParseFailed(e.to_string()),
                        }
                    }
                    (Some(FileContent::Text(_)), Err(e)) => ModuleEntry::ParseFailed(e.to_string()),
                    _ => ModuleEntry::Unreadable,
                };
                ((*path).clone(), entry)
            })
            .collect();

        let failed = entries
            .values()
            .filter(|entry| !matches!(entry, ModuleEntry::Parsed(_)))
            .count();
        log::debug!(
            "Parsed {} modules of {} ({failed} unreadable or unparseable)",
            entries.len(),
            tree.label()
        );
        Self { entries }
    }

    pub fn from_entries(entries: BTreeMap<RepoPath, ModuleEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, path: &RepoPath) -> Option<&ModuleEntry> {
        self.entries.get(path)
    }

    pub fn imports(&self, path: &RepoPath) -> Option<&ModuleImports> {
        self.entries.get(path).and_then(ModuleEntry::imports)
    }

    /// Entries in canonical path order
    pub fn iter(&self) -> impl Iterator<Item = (&RepoPath, &ModuleEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_sources_and_records_failures() {
        let tree = SourceTree::from_files(
            "head",
            vec![
                ("packages/a/src/index.ts", Some("export * from './pub';")),
                ("packages/a/src/view.tsx", Some("import { x } from './pub';\nexport const V = () => <div />;")),
                ("packages/a/src/blob.ts", None),
                ("packages/a/README.md", Some("# a")),
            ],
        );
        let table = ModuleTable::parse_all(&tree);

        let paths: Vec<&str> = table.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(
            paths,
            vec!["packages/a/src/blob.ts", "packages/a/src/index.ts", "packages/a/src/view.tsx"]
        );

        let blob = RepoPath::new("packages/a/src/blob.ts").unwrap();
        assert_eq!(table.get(&blob), Some(&ModuleEntry::Unreadable));

        let index = RepoPath::new("packages/a/src/index.ts").unwrap();
        assert_eq!(table.imports(&index).unwrap().reexports.len(), 1);

        let view = RepoPath::new("packages/a/src/view.tsx").unwrap();
        assert_eq!(table.imports(&view).unwrap().value_imports[0].specifier, "./pub");
    }
}
