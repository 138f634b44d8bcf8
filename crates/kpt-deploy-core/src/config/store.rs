//! Config store for locating and loading kpt-deploy.toml.

use std::path::{Path, PathBuf};

use super::{CONFIG_FILE_NAME, DeployerConfig, parser};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
    /// Directory a relative `deploy.dir` is resolved against.
    base_dir: Option<PathBuf>,
}

impl ConfigStore {
    /// Use an explicit file; a relative `deploy.dir` is taken relative to it.
    pub fn from_path(config_path: PathBuf) -> Self {
        let base_dir = config_path.parent().map(Path::to_path_buf);
        Self {
            config_path,
            base_dir,
        }
    }

    /// Project file if present, otherwise the user-level file.
    ///
    /// The user-level file is shared by every project, so its relative
    /// `deploy.dir` is taken relative to `project_root`.
    pub fn discover(project_root: &Path) -> Self {
        let project_path = project_root.join(CONFIG_FILE_NAME);
        if project_path.exists() {
            return Self::from_path(project_path);
        }
        match global_config_path() {
            Some(global) if global.exists() => Self {
                config_path: global,
                base_dir: Some(project_root.to_path_buf()),
            },
            _ => Self::from_path(project_path),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the config. A missing file yields defaults.
    pub fn load(&self) -> anyhow::Result<DeployerConfig> {
        if !self.config_path.exists() {
            tracing::debug!(
                path = %self.config_path.display(),
                "No config file, using defaults"
            );
            return Ok(DeployerConfig::default());
        }
        let mut config = parser::parse_config(&self.config_path)?;
        if let Some(base) = &self.base_dir {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }
}

fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("kpt-deploy").join(CONFIG_FILE_NAME))
}
