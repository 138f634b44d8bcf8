//! kpt-deploy.toml schema.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Root of `kpt-deploy.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployerConfig {
    /// kpt executable, looked up on `PATH` when not absolute.
    pub kpt_binary: PathBuf,

    pub deploy: KptDeploy,
}

impl Default for DeployerConfig {
    fn default() -> Self {
        Self {
            kpt_binary: PathBuf::from("kpt"),
            deploy: KptDeploy::default(),
        }
    }
}

/// The `[deploy]` table: one deployment unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KptDeploy {
    /// Package directory holding the Kptfile and manifests.
    pub dir: PathBuf,

    /// Flags passed to every `kpt live` subcommand.
    pub flags: Vec<String>,

    /// Extra flags for `kpt live apply` only.
    pub apply_flags: Vec<String>,

    /// Pass `--force true` to `kpt live init`.
    pub force: bool,

    /// Inventory name.
    pub name: String,

    pub inventory_id: String,

    /// Namespace for the inventory object when no per-run namespace is set.
    pub inventory_namespace: String,
}

impl Default for KptDeploy {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            flags: Vec::new(),
            apply_flags: Vec::new(),
            force: false,
            name: String::new(),
            inventory_id: String::new(),
            inventory_namespace: String::new(),
        }
    }
}

impl DeployerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.deploy.dir.as_os_str().is_empty() {
            anyhow::bail!("deploy.dir must not be empty");
        }
        if self.kpt_binary.as_os_str().is_empty() {
            anyhow::bail!("kpt_binary must not be empty");
        }
        Ok(())
    }

    /// Make a relative `deploy.dir` relative to `base`.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        if self.deploy.dir.is_relative() {
            self.deploy.dir = base.join(&self.deploy.dir);
        }
    }
}

/// Per-run overrides, typically from command-line flags.
///
/// Only non-empty values replace the configured ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub dir: Option<PathBuf>,
    /// Kube context namespace; becomes the per-unit inventory namespace.
    pub namespace: Option<String>,
    pub inventory_namespace: Option<String>,
    pub inventory_id: Option<String>,
    pub inventory_name: Option<String>,
}

impl RunOptions {
    /// Apply overrides to the deploy table.
    pub fn apply_to(&self, deploy: &mut KptDeploy) {
        if let Some(dir) = self.dir.as_ref().filter(|dir| !dir.as_os_str().is_empty()) {
            deploy.dir = dir.clone();
        }
        override_if_set(&mut deploy.inventory_namespace, &self.inventory_namespace);
        override_if_set(&mut deploy.inventory_id, &self.inventory_id);
        override_if_set(&mut deploy.name, &self.inventory_name);
    }

    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or("")
    }
}

fn override_if_set(target: &mut String, value: &Option<String>) {
    if let Some(value) = value.as_ref().filter(|value| !value.is_empty()) {
        target.clone_from(value);
    }
}
