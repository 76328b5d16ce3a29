use anyhow::{Context, Result};
use fence_protocol::Report;
use std::fs;
use std::path::Path;

pub mod check;
pub mod graph;

/// Print `body` to stdout, or write it to `out`
pub fn emit(body: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Report written to {}", path.display());
        }
        None => println!("{body}"),
    }
    Ok(())
}

pub fn fingerprint(root: &Path) -> Result<String> {
    fence_workspace::fingerprint_working_tree(root)
        .with_context(|| format!("Failed to fingerprint {}", root.display()))
}

pub fn schema() -> Result<String> {
    let schema = schemars::schema_for!(Report);
    serde_json::to_string_pretty(&schema).context("Failed to encode report schema")
}
