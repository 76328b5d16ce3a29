//! Deterministic report assembly.
//!
//! Identical inputs give byte-identical reports: paths and violation keys are
//! canonically sorted before hashing, and nothing time- or host-dependent enters
//! the content hash.

use fence_protocol::ordering::{canonical_cmp, canonical_sort};
use fence_protocol::{
    Classification, Confidence, Decision, DecisionLevel, Proof, Report, ReportStatus, RunInfo,
    Scope, ScopeMode, Violation, ViolationCause, ViolationKey,
};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

pub const VERIFIED_REASON: &str = "No architectural boundary violations detected.";
const DEFAULT_UNAVAILABLE: &str = "version control unavailable";

fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Builder for [`Report`]
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    base: String,
    head: String,
    scope: ScopeMode,
    paths: Vec<String>,
    violations: Vec<Violation>,
    unavailable: Option<String>,
}

impl ReportBuilder {
    pub fn new(base: impl Into<String>, head: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            head: head.into(),
            scope: ScopeMode::Diff,
            paths: Vec::new(),
            violations: Vec::new(),
            unavailable: None,
        }
    }

    pub fn scope(mut self, scope: ScopeMode) -> Self {
        self.scope = scope;
        self
    }

    /// Every known module path; hashed into the graph identity
    pub fn paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn violations(mut self, violations: Vec<Violation>) -> Self {
        self.violations = violations;
        self
    }

    /// What made the analysis impossible, for `Incomplete` reports
    pub fn unavailable(mut self, reason: impl Into<String>) -> Self {
        self.unavailable = Some(reason.into());
        self
    }

    pub fn build(self, status: ReportStatus) -> Report {
        let mut paths = self.paths;
        canonical_sort(&mut paths);
        paths.dedup();
        let graph_hash = sha256_hex(&paths.join("\n"));

        let mut by_key: BTreeMap<ViolationKey, Violation> = BTreeMap::new();
        for violation in self.violations {
            match by_key.entry(violation.key()) {
                Entry::Vacant(slot) => {
                    slot.insert(violation);
                }
                Entry::Occupied(mut slot) => {
                    if supersedes(&violation, slot.get()) {
                        slot.insert(violation);
                    }
                }
            }
        }
        let minimal_cut: Vec<String> = by_key.keys().map(ViolationKey::encode).collect();
        let violations_hash = sha256_hex(&minimal_cut.join("\n"));

        let id = sha256_hex(&format!(
            "{}\n{}\n{}\n{}",
            self.base, self.head, graph_hash, violations_hash
        ));

        let violations: Vec<&Violation> = by_key.values().collect();
        let primary_cause = primary_cause(&violations);
        let unproven = violations.iter().filter(|v| !v.is_proven()).count();

        let (status, decision, proofs) = match status {
            ReportStatus::Incomplete => {
                let detail = self.unavailable.as_deref().unwrap_or(DEFAULT_UNAVAILABLE);
                (
                    ReportStatus::Incomplete,
                    decision(DecisionLevel::Warn, format!("Analysis could not run: {detail}")),
                    None,
                )
            }
            ReportStatus::Blocked if unproven > 0 => {
                log::warn!("{unproven} violations lack a causal proof; downgrading to indeterminate");
                (
                    ReportStatus::Indeterminate,
                    decision(
                        DecisionLevel::Warn,
                        format!(
                            "Missing causal proof for {unproven} of {} violations; blocking verdict withheld",
                            violations.len()
                        ),
                    ),
                    None,
                )
            }
            ReportStatus::Blocked => {
                let cause = primary_cause.unwrap_or(ViolationCause::BoundaryViolation);
                (
                    ReportStatus::Blocked,
                    decision(DecisionLevel::Block, cause.as_str().to_string()),
                    Some(violations.iter().filter_map(|v| v.proof.clone()).collect()),
                )
            }
            ReportStatus::Verified => (
                ReportStatus::Verified,
                decision(DecisionLevel::Allow, VERIFIED_REASON.to_string()),
                Some(violations.iter().filter_map(|v| v.proof.clone()).collect()),
            ),
            ReportStatus::Indeterminate => (
                ReportStatus::Indeterminate,
                decision(
                    DecisionLevel::Warn,
                    "Classification is indeterminate".to_string(),
                ),
                None,
            ),
        };

        let coverage_ratio = if status == ReportStatus::Verified {
            1.0
        } else {
            0.0
        };

        Report {
            analysis_id: id.clone(),
            status,
            classification: Classification { primary_cause },
            minimal_cut,
            decision,
            confidence: Confidence { coverage_ratio },
            scope: Scope { mode: self.scope },
            run: RunInfo { id },
            proofs,
        }
    }
}

/// Which of two violations sharing a key is kept.
///
/// An unproven duplicate always wins, so a missing proof cannot be hidden behind a
/// proven twin. Between two proofs the canonically smaller one is kept.
fn supersedes(candidate: &Violation, current: &Violation) -> bool {
    match (&candidate.proof, &current.proof) {
        (None, Some(_)) => true,
        (Some(new), Some(old)) => proof_cmp(new, old) == Ordering::Less,
        _ => false,
    }
}

fn proof_cmp(a: &Proof, b: &Proof) -> Ordering {
    canonical_cmp(&a.source, &b.source)
        .then_with(|| canonical_cmp(&a.target, &b.target))
        .then_with(|| a.kind.cmp(&b.kind))
        .then_with(|| a.rule.cmp(&b.rule))
}

fn decision(level: DecisionLevel, reason: String) -> Decision {
    Decision { level, reason }
}

/// Most frequent cause; any tie for first place resolves to `boundary_violation`
fn primary_cause(violations: &[&Violation]) -> Option<ViolationCause> {
    let mut counts: BTreeMap<&'static str, (ViolationCause, usize)> = BTreeMap::new();
    for violation in violations {
        counts
            .entry(violation.cause.as_str())
            .or_insert((violation.cause, 0))
            .1 += 1;
    }

    let max = counts.values().map(|(_, n)| *n).max()?;
    let mut leaders = counts.values().filter(|(_, n)| *n == max);
    match (leaders.next(), leaders.next()) {
        (Some((cause, _)), None) => Some(*cause),
        _ => Some(ViolationCause::BoundaryViolation),
    }
}

/// Report for a finished analysis with `Diff` scope
pub fn build(
    status: ReportStatus,
    violations: Vec<Violation>,
    base: &str,
    head: &str,
    all_paths: &[String],
) -> Report {
    ReportBuilder::new(base, head)
        .paths(all_paths.iter().cloned())
        .violations(violations)
        .build(status)
}
