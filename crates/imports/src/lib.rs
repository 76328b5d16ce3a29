//! # Fence Imports
//!
//! Extracts the module dependencies of one TypeScript source file.
//!
//! ```text
//! Source Code
//!     │
//!     ├──> Dialect Detection (.ts / .tsx)
//!     │
//!     ├──> Tree-sitter Parsing → AST
//!     │
//!     └──> Statement Scan
//!          ├─> value imports (specifier + bound names)
//!          ├─> type-only imports
//!          ├─> re-exports (`export * from`, `export { a } from`)
//!          └─> exported names
//! ```
//!
//! ## Example
//!
//! ```rust
//! use fence_imports::{parse_module, Dialect};
//!
//! let code = r#"
//! import { helper } from "./util";
//! import type { Options } from "@acme/config";
//! export * from "./public";
//! "#;
//!
//! let module = parse_module(code, Dialect::TypeScript).unwrap();
//! assert_eq!(module.value_imports[0].specifier, "./util");
//! assert_eq!(module.type_imports[0].specifier, "@acme/config");
//! assert_eq!(module.reexports[0].specifier, "./public");
//! ```

mod error;
mod language;
mod parser;
mod types;

pub use error::{ImportsError, Result};
pub use language::Dialect;
pub use parser::{parse_module, ImportParser};
pub use types::{ImportRef, ModuleImports, Reexport, ReexportNames};
