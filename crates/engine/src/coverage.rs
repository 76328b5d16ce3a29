use fence_workspace::RepoPath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why part of a change could not be analyzed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageLoss {
    /// No candidate file exists for the specifier
    Unresolved,
    /// Package-scoped specifier into a reserved segment; the target file is unknown
    ForbiddenSpecifier,
    Unreadable,
    ParseFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageNote {
    pub path: RepoPath,
    pub specifier: Option<String>,
    pub loss: CoverageLoss,
}

/// Suspicions that could not be proven, and files that could not be analyzed.
///
/// Never turned into violations; reported alongside the report and in logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    /// Changed source files examined
    pub analyzed_files: usize,
    notes: Vec<CoverageNote>,
}

impl Coverage {
    pub fn record(&mut self, path: &RepoPath, specifier: Option<&str>, loss: CoverageLoss) {
        log::debug!("Coverage loss in {path}: {loss:?} {}", specifier.unwrap_or(""));
        self.notes.push(CoverageNote {
            path: path.clone(),
            specifier: specifier.map(str::to_string),
            loss,
        });
    }

    pub fn notes(&self) -> &[CoverageNote] {
        &self.notes
    }

    pub fn is_complete(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn counts(&self) -> BTreeMap<CoverageLoss, usize> {
        let mut counts = BTreeMap::new();
        for note in &self.notes {
            *counts.entry(note.loss).or_insert(0) += 1;
        }
        counts
    }

    pub(crate) fn log_summary(&self) {
        if self.is_complete() {
            log::info!("Analyzed {} changed files with full coverage", self.analyzed_files);
            return;
        }
        log::warn!(
            "Analyzed {} changed files; {} imports or files could not be proven: {:?}",
            self.analyzed_files,
            self.notes.len(),
            self.counts()
        );
    }
}
