//! # Fence Graph
//!
//! Module resolution and dependency-graph analysis for TypeScript workspaces.
//!
//! ## Architecture
//!
//! ```text
//! ModuleTable (parsed imports)
//!     │
//!     ├──> Resolver (frozen rules)
//!     │      └─ relative | workspace | external | forbidden | unresolved
//!     │
//!     ├──> Public surface
//!     │      └─ entry file + re-export closure, reserved segments excluded
//!     │
//!     └──> Module graph (petgraph)
//!            ├─ Nodes: source files, canonical order
//!            ├─ Edges: value imports, re-exports, public-surface bookkeeping
//!            └─ Cycles: Tarjan SCCs of two or more modules
//! ```

mod builder;
mod cycles;
mod error;
mod graph;
mod resolver;
mod surface;
mod types;

pub use builder::{build_graph, GraphResult, GraphStats};
pub use cycles::detect_cycles;
pub use error::{GraphError, Result};
pub use resolver::{is_relative_specifier, resolve, ResolutionKind, ResolvedTarget};
pub use surface::{compute_public_surface, compute_public_surfaces, public_exports, PublicSurfaceMap};
pub use types::{EdgeKind, GraphEdge, ModuleGraph};
