use crate::coverage::Coverage;
use crate::detector::{detect, Detection, ROOT_PACKAGE};
use crate::error::Result;
use crate::report::ReportBuilder;
use crate::revision::Revision;
use fence_graph::{detect_cycles, ModuleGraph};
use fence_protocol::{Proof, ProofKind, ProofRule, Report, ReportStatus, ScopeMode, Violation, ViolationCause};
use fence_workspace::{ChangeEntry, ChangeStatus, RepoPath, SourceTree, VersionControl, WorkspaceOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub workspace: WorkspaceOptions,
    /// Report import cycles through changed files as violations
    pub enforce_cycles: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            workspace: WorkspaceOptions::default(),
            enforce_cycles: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub base: String,
    pub head: String,
    pub scope: ScopeMode,
    pub options: AnalysisOptions,
}

impl AnalysisRequest {
    pub fn diff(base: impl Into<String>, head: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            head: head.into(),
            scope: ScopeMode::Diff,
            options: AnalysisOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_scope(mut self, scope: ScopeMode) -> Self {
        self.scope = scope;
        self
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: Report,
    pub coverage: Coverage,
    /// Every import cycle at head, including those that touch no changed file
    pub cycles: Vec<Vec<RepoPath>>,
}

/// Runs one analysis against a version-control collaborator.
///
/// Never fails: an unavailable diff or revision becomes an `Incomplete` report.
pub struct Analyzer<V> {
    vcs: V,
}

impl<V: VersionControl> Analyzer<V> {
    pub fn new(vcs: V) -> Self {
        Self { vcs }
    }

    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    pub fn run(&self, request: &AnalysisRequest) -> AnalysisOutcome {
        log::info!(
            "Analyzing {}..{} ({:?} scope)",
            request.base,
            request.head,
            request.scope
        );

        let (changes, head_tree, base_tree) = match self.collect(request) {
            Ok(inputs) => inputs,
            Err(reason) => {
                log::warn!("Analysis incomplete: {reason}");
                return incomplete(request, reason);
            }
        };

        match analyze(request, &changes, &head_tree, base_tree.as_ref()) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("Analysis incomplete: {e}");
                incomplete(request, e.to_string())
            }
        }
    }

    /// Diff and snapshots; the only steps that may short-circuit a run
    fn collect(
        &self,
        request: &AnalysisRequest,
    ) -> std::result::Result<(Vec<ChangeEntry>, SourceTree, Option<SourceTree>), String> {
        match request.scope {
            ScopeMode::Diff => {
                let changes = self
                    .vcs
                    .diff(&request.base, &request.head)
                    .map_err(|e| format!("diff unavailable ({e})"))?;
                let head = self
                    .vcs
                    .snapshot(&request.head)
                    .map_err(|e| format!("head revision unavailable ({e})"))?;
                let base = self
                    .vcs
                    .snapshot(&request.base)
                    .map_err(|e| format!("base revision unavailable ({e})"))?;
                Ok((changes, head, Some(base)))
            }
            ScopeMode::Full => {
                let head = self
                    .vcs
                    .snapshot(&request.head)
                    .map_err(|e| format!("head revision unavailable ({e})"))?;
                let changes = head
                    .source_files()
                    .map(|(path, _)| ChangeEntry::new(path.clone(), ChangeStatus::Added))
                    .collect();
                Ok((changes, head, None))
            }
        }
    }
}

fn incomplete(request: &AnalysisRequest, reason: String) -> AnalysisOutcome {
    let report = ReportBuilder::new(&request.base, &request.head)
        .scope(request.scope)
        .unavailable(reason)
        .build(ReportStatus::Incomplete);
    AnalysisOutcome {
        report,
        coverage: Coverage::default(),
        cycles: Vec::new(),
    }
}

fn analyze(
    request: &AnalysisRequest,
    changes: &[ChangeEntry],
    head_tree: &SourceTree,
    base_tree: Option<&SourceTree>,
) -> Result<AnalysisOutcome> {
    let options = &request.options;
    let head = Revision::load(head_tree, &options.workspace)?;
    let base = base_tree
        .map(|tree| Revision::load(tree, &options.workspace))
        .transpose()?;

    let Detection {
        mut violations,
        coverage,
    } = detect(changes, &head, base.as_ref());

    let graph = head.graph();
    let cycles = detect_cycles(&graph.graph);
    if options.enforce_cycles {
        violations.extend(cycle_violations(&head, &graph.graph, &cycles, changes)?);
    }

    let status = if violations.is_empty() {
        ReportStatus::Verified
    } else {
        ReportStatus::Blocked
    };
    log::info!(
        "{} violations, {} import cycles; status {status:?}",
        violations.len(),
        cycles.len()
    );

    let report = ReportBuilder::new(&request.base, &request.head)
        .scope(request.scope)
        .paths(graph.graph.nodes().map(|(_, path)| path.to_string()))
        .violations(violations)
        .build(status);

    Ok(AnalysisOutcome {
        report,
        coverage,
        cycles,
    })
}

/// One violation per cycle that runs through an added or modified file
fn cycle_violations(
    head: &Revision<'_>,
    graph: &ModuleGraph,
    cycles: &[Vec<RepoPath>],
    changes: &[ChangeEntry],
) -> Result<Vec<Violation>> {
    let touched: BTreeSet<&RepoPath> = changes
        .iter()
        .filter(|change| change.status != ChangeStatus::Deleted)
        .map(|change| &change.path)
        .collect();

    let mut violations = Vec::new();
    for cycle in cycles {
        let Some(first) = cycle.first() else {
            continue;
        };
        if !cycle.iter().any(|member| touched.contains(member)) {
            continue;
        }

        let proof = graph.successor_within(first, cycle)?.map(|next| Proof {
            kind: ProofKind::ImportCycle,
            source: first.to_string(),
            target: next.to_string(),
            rule: ProofRule::StronglyConnectedComponent,
        });
        let package = head
            .index
            .package_of(first)
            .map_or(ROOT_PACKAGE, |pkg| pkg.name.as_str());

        violations.push(Violation {
            package: package.to_string(),
            path: first.to_string(),
            cause: ViolationCause::CircularImport,
            specifier: None,
            proof,
        });
    }
    Ok(violations)
}
