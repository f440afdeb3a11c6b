//! Configuration file support
//!
//! Loads project-specific configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.healthriskrc.json` in project root
//! 3. `healthrisk.config.json` in project root
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::store::DEFAULT_STORE_DIR;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default size of the priority recommendation view
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 3;

/// Largest accepted priority view
pub const MAX_LIMIT: usize = 20;

const RC_FILE: &str = ".healthriskrc.json";
const CONFIG_FILE: &str = "healthrisk.config.json";

/// Configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthRiskConfig {
    /// Directory of the file-backed assessment store (default: `.healthrisk`)
    #[serde(default)]
    pub store_dir: Option<String>,

    /// Number of recommendations in the priority view (default: 3)
    #[serde(default)]
    pub recommendation_limit: Option<usize>,

    /// Number of explanation statements in the priority view (default: all)
    #[serde(default)]
    pub explanation_limit: Option<usize>,

    /// Append the safety disclaimer to recommendations (default: true)
    #[serde(default)]
    pub include_disclaimer: Option<bool>,
}

/// Configuration with defaults filled in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    pub store_dir: PathBuf,
    pub recommendation_limit: usize,
    pub explanation_limit: Option<usize>,
    pub include_disclaimer: bool,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl HealthRiskConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.store_dir {
            if dir.trim().is_empty() {
                anyhow::bail!("store_dir must not be empty");
            }
        }

        for (name, value) in [
            ("recommendation_limit", self.recommendation_limit),
            ("explanation_limit", self.explanation_limit),
        ] {
            if let Some(v) = value {
                if v == 0 {
                    anyhow::bail!("{} must be at least 1 (got {})", name, v);
                }
                if v > MAX_LIMIT {
                    anyhow::bail!("{} must be at most {} (got {})", name, MAX_LIMIT, v);
                }
            }
        }

        Ok(())
    }

    /// Resolve config with defaults; relative store paths are joined to `project_root`
    pub fn resolve(&self, project_root: &Path) -> Result<ResolvedConfig> {
        self.validate()?;

        let store_dir = project_root.join(self.store_dir.as_deref().unwrap_or(DEFAULT_STORE_DIR));

        Ok(ResolvedConfig {
            store_dir,
            recommendation_limit: self
                .recommendation_limit
                .unwrap_or(DEFAULT_RECOMMENDATION_LIMIT),
            explanation_limit: self.explanation_limit,
            include_disclaimer: self.include_disclaimer.unwrap_or(true),
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults(project_root: &Path) -> Result<Self> {
        HealthRiskConfig::default().resolve(project_root)
    }
}

/// Discover and load a config file from the project root
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(HealthRiskConfig, PathBuf)>> {
    for name in [RC_FILE, CONFIG_FILE] {
        let path = project_root.join(name);
        if path.exists() {
            debug!(path = %path.display(), "discovered config file");
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }
    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<HealthRiskConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: HealthRiskConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config for a project
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from the project root.
/// Returns default config if nothing is found.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(project_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (HealthRiskConfig::default(), None),
        }
    };

    let mut resolved = config.resolve(project_root)?;
    resolved.config_path = source_path;
    Ok(resolved)
}
