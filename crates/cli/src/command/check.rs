use crate::command::emit;
use crate::config::FenceConfig;
use anyhow::{Context, Result};
use fence_engine::{AnalysisRequest, Analyzer, Coverage};
use fence_protocol::{DecisionLevel, ScopeMode};
use fence_workspace::GitCli;
use std::path::PathBuf;

pub struct CheckOptions {
    pub root: PathBuf,
    pub base: String,
    pub head: String,
    pub scope: ScopeMode,
    pub config: Option<PathBuf>,
    pub out: Option<PathBuf>,
}

/// Analyze `base..head` in the git repository at `root` and emit the canonical report
pub fn run(options: &CheckOptions) -> Result<DecisionLevel> {
    let config = FenceConfig::load(&options.root, options.config.as_deref())?;
    let request = AnalysisRequest::diff(&options.base, &options.head)
        .with_scope(options.scope)
        .with_options(config.analysis_options());

    let outcome = Analyzer::new(GitCli::new(&options.root)).run(&request);
    log_held_back(&outcome.coverage);

    let report = outcome.report;
    log::info!(
        "Decision: {:?} ({})",
        report.decision.level,
        report.decision.reason
    );
    let json = report
        .to_canonical_json()
        .context("Failed to encode report")?;
    emit(&json, options.out.as_deref())?;
    Ok(report.decision.level)
}

/// Each held-back note goes to stderr at warn level
fn log_held_back(coverage: &Coverage) {
    if coverage.is_complete() {
        return;
    }
    log::warn!("Coverage losses: {:?}", coverage.counts());
    for note in coverage.notes() {
        match &note.specifier {
            Some(specifier) => log::warn!("  {:?} {} -> {specifier}", note.loss, note.path),
            None => log::warn!("  {:?} {}", note.loss, note.path),
        }
    }
}
