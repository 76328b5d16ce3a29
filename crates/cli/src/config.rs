use anyhow::{bail, Context, Result};
use fence_engine::AnalysisOptions;
use fence_workspace::{WorkspaceOptions, DEFAULT_RESERVED_SEGMENTS, DEFAULT_SOURCE_DIR};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "fence.toml";
const SUPPORTED_SCHEMA_VERSION: u32 = 1;

/// Contents of `fence.toml`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FenceConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default = "default_source_dir")]
    pub source_dir: String,
    #[serde(default = "default_reserved_segments")]
    pub reserved_segments: Vec<String>,
    #[serde(default)]
    pub workspaces: Option<Vec<String>>,
    #[serde(default)]
    pub cycles: CyclesConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CyclesConfig {
    #[serde(default = "default_enforce")]
    pub enforce: bool,
}

impl Default for CyclesConfig {
    fn default() -> Self {
        Self {
            enforce: default_enforce(),
        }
    }
}

impl Default for FenceConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            source_dir: default_source_dir(),
            reserved_segments: default_reserved_segments(),
            workspaces: None,
            cycles: CyclesConfig::default(),
        }
    }
}

fn default_schema_version() -> u32 {
    SUPPORTED_SCHEMA_VERSION
}

fn default_source_dir() -> String {
    DEFAULT_SOURCE_DIR.to_string()
}

fn default_reserved_segments() -> Vec<String> {
    DEFAULT_RESERVED_SEGMENTS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_enforce() -> bool {
    true
}

impl FenceConfig {
    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("Invalid fence config")?;
        if config.schema_version != SUPPORTED_SCHEMA_VERSION {
            bail!(
                "Unsupported fence config schema_version {} (expected {SUPPORTED_SCHEMA_VERSION})",
                config.schema_version
            );
        }
        if config.source_dir.trim().is_empty() {
            bail!("fence config source_dir must not be empty");
        }
        Ok(config)
    }

    /// Load `explicit`, or `fence.toml` under `root` when present.
    ///
    /// A missing default file yields the defaults; a missing explicit file is an error.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path: PathBuf = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = root.join(CONFIG_FILE_NAME);
                if !path.is_file() {
                    log::debug!("No {CONFIG_FILE_NAME} under {}; using defaults", root.display());
                    return Ok(Self::default());
                }
                path
            }
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::parse(&raw).with_context(|| format!("In {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn workspace_options(&self) -> WorkspaceOptions {
        WorkspaceOptions {
            source_dir: self.source_dir.clone(),
            reserved_segments: self.reserved_segments.clone(),
            workspaces: self.workspaces.clone(),
        }
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            workspace: self.workspace_options(),
            enforce_cycles: self.cycles.enforce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn empty_config_uses_defaults() {
        let config = FenceConfig::parse("").unwrap();
        assert_eq!(config, FenceConfig::default());
        assert_eq!(config.analysis_options(), AnalysisOptions::default());
    }

    #[test]
    fn full_config_round_trips_into_options() {
        let config = FenceConfig::parse(
            r#"
            schema_version = 1
            source_dir = "lib"
            reserved_segments = ["hidden"]
            workspaces = ["apps/*", "libs/*"]

            [cycles]
            enforce = false
            "#,
        )
        .unwrap();

        let options = config.analysis_options();
        assert!(!options.enforce_cycles);
        assert_eq!(options.workspace.source_dir, "lib");
        assert_eq!(options.workspace.reserved_segments, vec!["hidden".to_string()]);
        assert_eq!(
            options.workspace.workspaces,
            Some(vec!["apps/*".to_string(), "libs/*".to_string()])
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = FenceConfig::parse("schema_version = 1\nsrc_dir = \"lib\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("src_dir"), "{err:#}");

        let err = FenceConfig::parse("[cycles]\nstrict = true\n").unwrap_err();
        assert!(format!("{err:#}").contains("strict"), "{err:#}");
    }

    #[test]
    fn unsupported_schema_version_is_rejected() {
        let err = FenceConfig::parse("schema_version = 2\n").unwrap_err();
        assert!(err.to_string().contains("schema_version 2"), "{err:#}");
    }

    #[test]
    fn load_falls_back_to_defaults_without_file() {
        let temp = tempdir().unwrap();
        let config = FenceConfig::load(temp.path(), None).unwrap();
        assert_eq!(config, FenceConfig::default());
    }

    #[test]
    fn load_reads_root_file_and_requires_explicit_file() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "source_dir = \"lib\"\n").unwrap();
        let config = FenceConfig::load(temp.path(), None).unwrap();
        assert_eq!(config.source_dir, "lib");

        let missing = temp.path().join("other.toml");
        assert!(FenceConfig::load(temp.path(), Some(&missing)).is_err());
    }
}
