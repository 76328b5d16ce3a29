use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Workspace error: {0}")]
    Workspace(#[from] fence_workspace::WorkspaceError),

    #[error("Graph error: {0}")]
    Graph(#[from] fence_graph::GraphError),
}
