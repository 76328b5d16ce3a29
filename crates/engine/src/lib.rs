//! # Fence Engine
//!
//! Decides whether a change between two revisions crosses an architectural
//! boundary, and proves it.
//!
//! ## Pipeline
//!
//! ```text
//! VersionControl ──> diff + head/base snapshots
//!     │
//!     ├──> Revision (per snapshot)
//!     │      ├─ WorkspaceIndex (packages)
//!     │      ├─ ModuleTable (parsed imports)
//!     │      └─ PublicSurfaceMap
//!     │
//!     ├──> Detector ──> proven violations + coverage losses
//!     ├──> Module graph ──> import cycles through changed files
//!     │
//!     └──> ReportBuilder ──> canonical, content-hashed Report
//! ```
//!
//! A violation without a proof never produces a blocking verdict: the report is
//! downgraded to `indeterminate` instead.

mod analysis;
mod coverage;
mod detector;
mod error;
mod report;
mod revision;

pub use analysis::{AnalysisOptions, AnalysisOutcome, AnalysisRequest, Analyzer};
pub use coverage::{Coverage, CoverageLoss, CoverageNote};
pub use detector::{detect, Detection, ROOT_PACKAGE};
pub use error::{EngineError, Result};
pub use report::{build, ReportBuilder, VERIFIED_REASON};
pub use revision::Revision;
