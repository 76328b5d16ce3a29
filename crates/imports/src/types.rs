use serde::{Deserialize, Serialize};

/// An `import` (or `require`/dynamic `import()`) of another module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRef {
    /// Specifier exactly as written, quotes stripped
    pub specifier: String,

    /// Local names bound by the statement (alias when present)
    pub names: Vec<String>,
}

impl ImportRef {
    pub fn new(specifier: impl Into<String>, names: Vec<String>) -> Self {
        Self {
            specifier: specifier.into(),
            names,
        }
    }
}

/// What a re-export statement republishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReexportNames {
    /// `export * from 'x'`
    All,
    /// `export * as ns from 'x'`
    Namespace(String),
    /// `export { a, b as c } from 'x'` (exported names: `a`, `c`)
    Named(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reexport {
    pub specifier: String,
    pub names: ReexportNames,
    /// `export type { .. } from`, or every specifier marked `type`
    pub type_only: bool,
}

impl Reexport {
    /// Names this statement adds to the module's exports, if it names them.
    pub fn exported_names(&self) -> Vec<String> {
        match &self.names {
            ReexportNames::All => Vec::new(),
            ReexportNames::Namespace(name) => vec![name.clone()],
            ReexportNames::Named(names) => names.clone(),
        }
    }
}

/// Everything the analysis needs from one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleImports {
    pub value_imports: Vec<ImportRef>,
    pub type_imports: Vec<ImportRef>,
    pub reexports: Vec<Reexport>,
    /// Names declared and exported by this file itself (`default` for default exports)
    pub exports: Vec<String>,
    /// Tree-sitter recovered from syntax errors while parsing
    pub had_errors: bool,
}
