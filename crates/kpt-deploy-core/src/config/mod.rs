//! Deployer configuration.
//!
//! `kpt-deploy.toml` describes one deployment unit. Lookup order:
//! - `<project>/kpt-deploy.toml`
//! - `<config_dir>/kpt-deploy/kpt-deploy.toml`
//!
//! Command-line [`RunOptions`] are applied on top of the loaded file.

pub mod parser;
pub mod schema;
pub mod store;

pub use parser::{parse_config, parse_config_str, to_toml};
pub use schema::{DeployerConfig, KptDeploy, RunOptions};
pub use store::ConfigStore;

pub const CONFIG_FILE_NAME: &str = "kpt-deploy.toml";
