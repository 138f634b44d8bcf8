//! `kpt` binary adapter.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::cancel::CancelToken;
use crate::error::ToolError;

use super::process::{run_capture, run_streaming};
use super::{Kpt, LiveInitRequest};

/// Runs kpt subcommands through the configured binary.
#[derive(Debug, Clone)]
pub struct KptCli {
    binary: PathBuf,
}

impl KptCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut command = Command::new(&self.binary);
        command.args(args.into_iter().map(Into::into));
        command
    }
}

impl Default for KptCli {
    fn default() -> Self {
        Self::new("kpt")
    }
}

impl Kpt for KptCli {
    fn pkg_init(
        &self,
        dir: &Path,
        out: &mut dyn Write,
        cancel: &CancelToken,
    ) -> Result<(), ToolError> {
        let args = vec![
            OsString::from("pkg"),
            OsString::from("init"),
            dir.as_os_str().to_owned(),
        ];
        run_streaming(self.command(args), out, cancel)
    }

    fn live_init(
        &self,
        request: &LiveInitRequest,
        out: &mut dyn Write,
        cancel: &CancelToken,
    ) -> Result<(), ToolError> {
        run_streaming(self.command(live_init_args(request)), out, cancel)
    }

    fn live_apply(
        &self,
        dir: &Path,
        flags: &[String],
        out: &mut dyn Write,
        cancel: &CancelToken,
    ) -> Result<(), ToolError> {
        run_streaming(self.command(live_args("apply", dir, flags)), out, cancel)
    }

    fn live_destroy(
        &self,
        dir: &Path,
        flags: &[String],
        out: &mut dyn Write,
        cancel: &CancelToken,
    ) -> Result<(), ToolError> {
        run_streaming(self.command(live_args("destroy", dir, flags)), out, cancel)
    }

    fn fn_source(&self, dir: &Path, cancel: &CancelToken) -> Result<Vec<u8>, ToolError> {
        let args = vec![
            OsString::from("fn"),
            OsString::from("source"),
            dir.as_os_str().to_owned(),
        ];
        run_capture(self.command(args), cancel)
    }
}

/// `live init <dir> [flags...] [--name N] [--inventory-id I] [--namespace NS] [--force true]`
pub fn live_init_args(request: &LiveInitRequest) -> Vec<OsString> {
    let mut args = vec![
        OsString::from("live"),
        OsString::from("init"),
        request.dir.as_os_str().to_owned(),
    ];
    args.extend(request.extra_flags.iter().map(OsString::from));
    let optional = [
        ("--name", &request.name),
        ("--inventory-id", &request.inventory_id),
        ("--namespace", &request.namespace),
    ];
    for (flag, value) in optional {
        if !value.is_empty() {
            args.push(OsString::from(flag));
            args.push(OsString::from(value));
        }
    }
    if request.force {
        args.push(OsString::from("--force"));
        args.push(OsString::from("true"));
    }
    args
}

fn live_args(action: &str, dir: &Path, flags: &[String]) -> Vec<OsString> {
    let mut args = vec![
        OsString::from("live"),
        OsString::from(action),
        dir.as_os_str().to_owned(),
    ];
    args.extend(flags.iter().map(OsString::from));
    args
}
