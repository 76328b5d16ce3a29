use fence_engine::{AnalysisOptions, AnalysisRequest, Analyzer, CoverageLoss};
use fence_protocol::{
    DecisionLevel, Proof, ProofKind, ProofRule, ReportStatus, ScopeMode, ViolationCause,
};
use fence_workspace::{MemoryVcs, SourceTree};
use pretty_assertions::assert_eq;

const BASE: &[(&str, &str)] = &[
    ("package.json", r#"{"private":true,"workspaces":["packages/*"]}"#),
    ("packages/a/package.json", r#"{"name":"@s/a"}"#),
    ("packages/a/src/index.ts", "export * from './pub';"),
    ("packages/a/src/pub.ts", "export function doThing() {}\nexport const version = 1;"),
    ("packages/a/src/internal.ts", "export const secret = 42;"),
    ("packages/b/package.json", r#"{"name":"@s/b"}"#),
    ("packages/b/src/index.ts", "export * from './use';"),
    ("packages/b/src/use.ts", "import { doThing } from '@s/a';\nexport const run = doThing;"),
];

fn tree(label: &str, files: &[(&str, &str)]) -> SourceTree {
    SourceTree::from_files(label, files.iter().map(|(p, c)| (*p, Some(*c))))
}

/// Base files with `edits` applied; `None` content deletes the file
fn edited(edits: &[(&str, Option<&str>)]) -> SourceTree {
    let mut files: Vec<(&str, &str)> = BASE
        .iter()
        .copied()
        .filter(|(path, _)| !edits.iter().any(|(edited, _)| edited == path))
        .collect();
    for (path, content) in edits {
        if let Some(content) = content {
            files.push((*path, *content));
        }
    }
    tree("head", &files)
}

fn analyzer(head: SourceTree) -> Analyzer<MemoryVcs> {
    Analyzer::new(MemoryVcs::new().with_revision(tree("base", BASE)).with_revision(head))
}

#[test]
fn direct_import_of_private_file_is_blocked() {
    let head = edited(&[(
        "packages/b/src/use.ts",
        Some("import { doThing } from '@s/a';\nimport { secret } from '@s/a/src/internal';\nexport const run = doThing;"),
    )]);
    let outcome = analyzer(head).run(&AnalysisRequest::diff("base", "head"));
    let report = outcome.report;

    assert_eq!(report.status, ReportStatus::Blocked);
    assert_eq!(report.decision.level, DecisionLevel::Block);
    assert_eq!(report.decision.reason, "boundary_violation");
    assert_eq!(
        report.classification.primary_cause,
        Some(ViolationCause::BoundaryViolation)
    );
    assert_eq!(
        report.minimal_cut,
        vec!["@s/b:packages/b/src/use.ts:boundary_violation:@s/a/src/internal".to_string()]
    );
    assert_eq!(
        report.proofs,
        Some(vec![Proof {
            kind: ProofKind::ResolvedImport,
            source: "packages/b/src/use.ts".to_string(),
            target: "packages/a/src/internal.ts".to_string(),
            rule: ProofRule::TargetOutsidePublicSurface,
        }])
    );
}

#[test]
fn removed_public_export_is_blocked() {
    let head = edited(&[("packages/a/src/pub.ts", Some("export const version = 2;"))]);
    let outcome = analyzer(head).run(&AnalysisRequest::diff("base", "head"));
    let report = outcome.report;

    assert_eq!(report.status, ReportStatus::Blocked);
    assert_eq!(
        report.minimal_cut,
        vec!["@s/a:packages/a/src/pub.ts:deleted_public_api:doThing".to_string()]
    );
    let proofs = report.proofs.unwrap();
    assert_eq!(proofs[0].kind, ProofKind::PublicSurfaceMembership);
    assert_eq!(proofs[0].rule, ProofRule::RemovedPublicExport);
}

#[test]
fn deleted_public_file_is_blocked() {
    let head = edited(&[
        ("packages/a/src/pub.ts", None),
        ("packages/a/src/index.ts", Some("export const doThing = () => {};\nexport const version = 1;")),
    ]);
    let outcome = analyzer(head).run(&AnalysisRequest::diff("base", "head"));

    assert_eq!(
        outcome.report.minimal_cut,
        vec!["@s/a:packages/a/src/pub.ts:deleted_public_api".to_string()]
    );
}

#[test]
fn clean_change_is_verified() {
    let head = edited(&[(
        "packages/b/src/use.ts",
        Some("import { doThing, version } from '@s/a';\nexport const run = () => doThing(version);"),
    )]);
    let outcome = analyzer(head).run(&AnalysisRequest::diff("base", "head"));
    let report = outcome.report;

    assert_eq!(report.status, ReportStatus::Verified);
    assert_eq!(report.decision.level, DecisionLevel::Allow);
    assert_eq!(report.confidence.coverage_ratio, 1.0);
    assert!(report.minimal_cut.is_empty());
    assert_eq!(report.proofs, Some(Vec::new()));
    assert!(outcome.coverage.is_complete());
}

#[test]
fn missing_revision_is_incomplete() {
    let vcs = MemoryVcs::new().with_revision(tree("base", BASE));
    let outcome = Analyzer::new(vcs).run(&AnalysisRequest::diff("base", "head"));
    let report = outcome.report;

    assert_eq!(report.status, ReportStatus::Incomplete);
    assert_eq!(report.decision.level, DecisionLevel::Warn);
    assert!(report.decision.reason.contains("diff unavailable"));
    assert!(report.decision.reason.contains("Unknown revision: head"));
    assert_eq!(report.confidence.coverage_ratio, 0.0);
    assert_eq!(report.proofs, None);
}

#[test]
fn new_cycle_through_changed_file_is_reported() {
    let head = edited(&[
        ("packages/a/src/x.ts", Some("import { y } from './y';\nexport const x = 1;")),
        ("packages/a/src/y.ts", Some("import { x } from './x';\nexport const y = 1;")),
    ]);
    let outcome = analyzer(head).run(&AnalysisRequest::diff("base", "head"));

    assert_eq!(outcome.cycles.len(), 1);
    assert_eq!(
        outcome.report.minimal_cut,
        vec!["@s/a:packages/a/src/x.ts:circular_import".to_string()]
    );
    assert_eq!(
        outcome.report.proofs,
        Some(vec![Proof {
            kind: ProofKind::ImportCycle,
            source: "packages/a/src/x.ts".to_string(),
            target: "packages/a/src/y.ts".to_string(),
            rule: ProofRule::StronglyConnectedComponent,
        }])
    );
}

#[test]
fn cycle_enforcement_can_be_disabled() {
    let head = edited(&[
        ("packages/a/src/x.ts", Some("import { y } from './y';")),
        ("packages/a/src/y.ts", Some("import { x } from './x';")),
    ]);
    let request = AnalysisRequest::diff("base", "head").with_options(AnalysisOptions {
        enforce_cycles: false,
        ..AnalysisOptions::default()
    });
    let outcome = analyzer(head).run(&request);

    assert_eq!(outcome.cycles.len(), 1);
    assert_eq!(outcome.report.status, ReportStatus::Verified);
}

#[test]
fn unresolved_imports_lower_coverage_only() {
    let head = edited(&[(
        "packages/b/src/use.ts",
        Some("import { gone } from './gone';\nimport '@s/a/src/internal/secret';\nexport const run = 1;"),
    )]);
    let outcome = analyzer(head).run(&AnalysisRequest::diff("base", "head"));

    assert_eq!(outcome.report.status, ReportStatus::Verified);
    let counts = outcome.coverage.counts();
    assert_eq!(counts.get(&CoverageLoss::Unresolved), Some(&1));
    assert_eq!(counts.get(&CoverageLoss::ForbiddenSpecifier), Some(&1));
}

#[test]
fn full_scope_needs_no_base() {
    let head = edited(&[(
        "packages/b/src/use.ts",
        Some("import { secret } from '../../a/src/internal';"),
    )]);
    let vcs = MemoryVcs::new().with_revision(head);
    let request = AnalysisRequest::diff("unused", "head").with_scope(ScopeMode::Full);
    let outcome = Analyzer::new(vcs).run(&request);

    assert_eq!(outcome.report.scope.mode, ScopeMode::Full);
    assert_eq!(
        outcome.report.minimal_cut,
        vec!["@s/b:packages/b/src/use.ts:boundary_violation:../../a/src/internal".to_string()]
    );
}

#[test]
fn repeated_runs_are_byte_identical() {
    let head = || {
        edited(&[
            ("packages/b/src/use.ts", Some("import { secret } from '@s/a/src/internal';")),
            ("packages/a/src/pub.ts", None),
        ])
    };
    let request = AnalysisRequest::diff("base", "head");
    let first = analyzer(head()).run(&request).report.to_canonical_json().unwrap();
    let second = analyzer(head()).run(&request).report.to_canonical_json().unwrap();

    assert_eq!(first, second);
    assert!(first.starts_with("{\"analysisId\":"));
}
