//! The `kpt` command surface the deployer depends on.
//!
//! Sessions and the reconciler only see the [`Kpt`] trait. [`KptCli`] is the
//! production implementation; tests substitute their own.

pub mod cli;
pub(crate) mod process;

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cancel::CancelToken;
use crate::error::ToolError;

pub use cli::KptCli;

/// Arguments for `kpt live init`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveInitRequest {
    pub dir: PathBuf,
    pub name: String,
    pub inventory_id: String,
    pub namespace: String,
    pub force: bool,
    /// Deploy-level flags forwarded verbatim.
    pub extra_flags: Vec<String>,
}

/// External kpt operations.
pub trait Kpt {
    /// `kpt pkg init <dir>`: create a minimal Kptfile.
    fn pkg_init(
        &self,
        dir: &Path,
        out: &mut dyn Write,
        cancel: &CancelToken,
    ) -> Result<(), ToolError>;

    /// `kpt live init`: add inventory identity to an existing Kptfile.
    fn live_init(
        &self,
        request: &LiveInitRequest,
        out: &mut dyn Write,
        cancel: &CancelToken,
    ) -> Result<(), ToolError>;

    fn live_apply(
        &self,
        dir: &Path,
        flags: &[String],
        out: &mut dyn Write,
        cancel: &CancelToken,
    ) -> Result<(), ToolError>;

    fn live_destroy(
        &self,
        dir: &Path,
        flags: &[String],
        out: &mut dyn Write,
        cancel: &CancelToken,
    ) -> Result<(), ToolError>;

    /// `kpt fn source <dir>`: the package's resources as a ResourceList.
    fn fn_source(&self, dir: &Path, cancel: &CancelToken) -> Result<Vec<u8>, ToolError>;
}
