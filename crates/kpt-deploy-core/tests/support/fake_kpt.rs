use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use kpt_deploy_core::cancel::CancelToken;
use kpt_deploy_core::error::ToolError;
use kpt_deploy_core::kpt::{Kpt, LiveInitRequest};
use kpt_deploy_core::kptfile::{Inventory, Kptfile, KptfileStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    PkgInit(PathBuf),
    LiveInit(LiveInitRequest),
    LiveApply { dir: PathBuf, flags: Vec<String> },
    LiveDestroy { dir: PathBuf, flags: Vec<String> },
    FnSource(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    PkgInit,
    LiveInit,
    LiveApply,
    LiveDestroy,
    FnSource,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    failing: HashSet<Op>,
    source_output: Vec<u8>,
}

/// In-memory kpt that edits Kptfiles the way the real binary does.
#[derive(Debug, Clone, Default)]
pub struct FakeKpt {
    state: Arc<Mutex<State>>,
}

impl FakeKpt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(self, op: Op) -> Self {
        self.state.lock().unwrap().failing.insert(op);
        self
    }

    pub fn with_source_output(self, output: &str) -> Self {
        self.state.lock().unwrap().source_output = output.as_bytes().to_vec();
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls().iter().filter(|call| op_of(call) == op).count()
    }

    pub fn live_init_requests(&self) -> Vec<LiveInitRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::LiveInit(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> Result<(), ToolError> {
        let op = op_of(&call);
        let mut state = self.state.lock().unwrap();
        let command = format!("kpt {:?}", call);
        state.calls.push(call);
        if state.failing.contains(&op) {
            return Err(ToolError::Exit {
                command,
                code: Some(1),
            });
        }
        Ok(())
    }
}

pub fn op_of(call: &Call) -> Op {
    match call {
        Call::PkgInit(_) => Op::PkgInit,
        Call::LiveInit(_) => Op::LiveInit,
        Call::LiveApply { .. } => Op::LiveApply,
        Call::LiveDestroy { .. } => Op::LiveDestroy,
        Call::FnSource(_) => Op::FnSource,
    }
}

fn tool_failure(message: &str) -> ToolError {
    ToolError::Io {
        command: "kpt".to_string(),
        source: std::io::Error::other(message.to_string()),
    }
}

impl Kpt for FakeKpt {
    fn pkg_init(
        &self,
        dir: &Path,
        out: &mut dyn Write,
        _cancel: &CancelToken,
    ) -> Result<(), ToolError> {
        self.record(Call::PkgInit(dir.to_path_buf()))?;
        std::fs::create_dir_all(dir).map_err(|e| tool_failure(&e.to_string()))?;
        std::fs::write(
            dir.join("Kptfile"),
            "apiVersion: kpt.dev/v1\nkind: Kptfile\nmetadata:\n  name: app\n",
        )
        .map_err(|e| tool_failure(&e.to_string()))?;
        let _ = writeln!(out, "writing Kptfile");
        Ok(())
    }

    fn live_init(
        &self,
        request: &LiveInitRequest,
        out: &mut dyn Write,
        _cancel: &CancelToken,
    ) -> Result<(), ToolError> {
        self.record(Call::LiveInit(request.clone()))?;
        let store = KptfileStore::for_dir(&request.dir);
        let mut kptfile: Kptfile = store.read().map_err(|e| tool_failure(&e.to_string()))?;
        if kptfile.inventory.is_some() {
            return Err(tool_failure("inventory information already set"));
        }
        let inventory_id = if request.inventory_id.is_empty() {
            "generated-id".to_string()
        } else {
            request.inventory_id.clone()
        };
        kptfile.inventory = Some(Inventory::new(
            request.name.clone(),
            inventory_id,
            request.namespace.clone(),
        ));
        store
            .write(&kptfile)
            .map_err(|e| tool_failure(&e.to_string()))?;
        let _ = writeln!(out, "initializing Kptfile inventory info");
        Ok(())
    }

    fn live_apply(
        &self,
        dir: &Path,
        flags: &[String],
        out: &mut dyn Write,
        _cancel: &CancelToken,
    ) -> Result<(), ToolError> {
        self.record(Call::LiveApply {
            dir: dir.to_path_buf(),
            flags: flags.to_vec(),
        })?;
        let _ = writeln!(out, "apply result: 1 attempted, 1 successful");
        Ok(())
    }

    fn live_destroy(
        &self,
        dir: &Path,
        flags: &[String],
        out: &mut dyn Write,
        _cancel: &CancelToken,
    ) -> Result<(), ToolError> {
        self.record(Call::LiveDestroy {
            dir: dir.to_path_buf(),
            flags: flags.to_vec(),
        })?;
        let _ = writeln!(out, "destroy result: 1 attempted, 1 successful");
        Ok(())
    }

    fn fn_source(&self, dir: &Path, _cancel: &CancelToken) -> Result<Vec<u8>, ToolError> {
        self.record(Call::FnSource(dir.to_path_buf()))?;
        Ok(self.state.lock().unwrap().source_output.clone())
    }
}
