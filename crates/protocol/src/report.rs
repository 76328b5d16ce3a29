use crate::error::Result;
use crate::key::ViolationKey;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Why a change is considered unsafe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCause {
    /// Import of a file outside another package's public surface.
    BoundaryViolation,
    /// Type-only import of a file outside another package's public surface.
    TypeImportPrivateTarget,
    /// Relative specifier that walks into another package's root.
    RelativeEscape,
    /// A file or export that was public at the base revision is gone.
    DeletedPublicApi,
    /// A changed file participates in an import cycle.
    CircularImport,
}

impl ViolationCause {
    pub const ALL: [ViolationCause; 5] = [
        ViolationCause::BoundaryViolation,
        ViolationCause::TypeImportPrivateTarget,
        ViolationCause::RelativeEscape,
        ViolationCause::DeletedPublicApi,
        ViolationCause::CircularImport,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ViolationCause::BoundaryViolation => "boundary_violation",
            ViolationCause::TypeImportPrivateTarget => "type_import_private_target",
            ViolationCause::RelativeEscape => "relative_escape",
            ViolationCause::DeletedPublicApi => "deleted_public_api",
            ViolationCause::CircularImport => "circular_import",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cause| cause.as_str() == raw)
    }
}

impl fmt::Display for ViolationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViolationCause {
    type Err = crate::ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| crate::ProtocolError::UnknownCause(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProofKind {
    /// An import statement resolved to a concrete file pair.
    ResolvedImport,
    /// A file's membership in a package's public surface.
    PublicSurfaceMembership,
    /// A strongly connected component of the import graph.
    ImportCycle,
}

/// The rule that turned a piece of evidence into a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProofRule {
    TargetOutsidePublicSurface,
    TypeTargetOutsidePublicSurface,
    RelativeSpecifierCrossesPackage,
    DeletedPublicFile,
    RemovedPublicExport,
    StronglyConnectedComponent,
}

/// Re-derivable evidence: given the same revisions, `source`, `target` and `rule`
/// reproduce the violation without any other input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Proof {
    pub kind: ProofKind,
    pub source: String,
    pub target: String,
    pub rule: ProofRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Violation {
    pub package: String,
    pub path: String,
    pub cause: ViolationCause,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

impl Violation {
    #[must_use]
    pub fn key(&self) -> ViolationKey {
        ViolationKey {
            package: self.package.clone(),
            path: self.path.clone(),
            cause: self.cause,
            specifier: self.specifier.clone(),
        }
    }

    #[must_use]
    pub const fn is_proven(&self) -> bool {
        self.proof.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Verified,
    Blocked,
    Incomplete,
    Indeterminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DecisionLevel {
    Allow,
    Warn,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScopeMode {
    /// Only the files touched between base and head.
    Diff,
    /// Every source file at head, as if newly added.
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub primary_cause: Option<ViolationCause>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Decision {
    pub level: DecisionLevel,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Confidence {
    pub coverage_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Scope {
    pub mode: ScopeMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RunInfo {
    pub id: String,
}

/// Outcome of one analysis run. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub analysis_id: String,
    pub status: ReportStatus,
    pub classification: Classification,
    pub minimal_cut: Vec<String>,
    pub decision: Decision,
    pub confidence: Confidence,
    pub scope: Scope,
    pub run: RunInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proofs: Option<Vec<Proof>>,
}

impl Report {
    /// Artifact bytes: sorted keys, no whitespace.
    ///
    /// Going through `serde_json::Value` sorts object keys, since its map is a
    /// `BTreeMap` unless `preserve_order` is enabled.
    pub fn to_canonical_json(&self) -> Result<String> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::to_string(&value)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Decoded `minimalCut`, for consumers that want typed keys.
    pub fn minimal_cut_keys(&self) -> Result<Vec<ViolationKey>> {
        self.minimal_cut
            .iter()
            .map(|raw| ViolationKey::decode(raw))
            .collect()
    }
}
