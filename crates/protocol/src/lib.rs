//! # Fence Protocol
//!
//! Wire types shared by the analysis engine and its collaborators.
//!
//! - [`Report`] is the single artifact of an analysis run. Its canonical JSON
//!   encoding (sorted keys, no whitespace) is byte-identical for identical inputs.
//! - [`ViolationKey`] is the typed form of the `package:path:cause[:specifier]`
//!   strings carried in `minimalCut`.
//! - [`ordering`] holds the binary, locale-independent string order used for every
//!   list that is hashed or emitted.

mod error;
mod key;
pub mod ordering;
mod report;

pub use error::{ProtocolError, Result};
pub use key::ViolationKey;
pub use report::{
    Classification, Confidence, Decision, DecisionLevel, Proof, ProofKind, ProofRule, Report,
    ReportStatus, RunInfo, Scope, ScopeMode, Violation, ViolationCause,
};
