use thiserror::Error;

/// Result type for import extraction
pub type Result<T> = std::result::Result<T, ImportsError>;

/// Errors that can occur while extracting module dependencies
#[derive(Error, Debug)]
pub enum ImportsError {
    /// Tree-sitter produced no tree for the source text
    #[error("Parse error: {0}")]
    ParseError(String),

    /// File extension has no supported grammar
    #[error("Unsupported source file: {0}")]
    UnsupportedSource(String),

    /// Tree-sitter error
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),
}

impl ImportsError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }
}
