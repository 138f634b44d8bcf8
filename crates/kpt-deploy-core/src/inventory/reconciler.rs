//! Kptfile reconciliation run before every apply and destroy.
//!
//! A deployment unit moves through three states:
//!
//! | Kptfile                    | Action                                   |
//! |----------------------------|------------------------------------------|
//! | missing                    | `kpt pkg init`, then read it back        |
//! | present, no `inventory`    | `kpt live init` (never merged same pass) |
//! | present, with `inventory`  | merge desired fields, write if changed   |
//!
//! `kpt live init` fails on a Kptfile that already has an inventory, so the
//! last two rows are mutually exclusive.
//!
//! Each merged field is published once as a warning [`DeployEvent`] through
//! the reconciler's sink, [`TracingEventSink`] unless one is supplied.

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::cancel::CancelToken;
use crate::error::DeployError;
use crate::events::{DeployEvent, EventSink, TracingEventSink};
use crate::kpt::Kpt;
use crate::kptfile::{InventoryState, KptfileStore};

use super::desired::{DesiredInventory, InventoryChange, Resolution};

/// What the inventory step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InventoryAction {
    /// `kpt live init` created the inventory.
    LiveInit,
    /// Existing inventory rewritten with these changes.
    Merged { changes: Vec<InventoryChange> },
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// `kpt pkg init` created the Kptfile during this run.
    pub package_created: bool,
    pub action: InventoryAction,
}

impl ReconcileReport {
    pub fn changes(&self) -> &[InventoryChange] {
        match &self.action {
            InventoryAction::Merged { changes } => changes,
            InventoryAction::LiveInit | InventoryAction::Unchanged => &[],
        }
    }

    /// Whether the Kptfile on disk was created or modified.
    pub fn touched_kptfile(&self) -> bool {
        self.package_created || self.action != InventoryAction::Unchanged
    }
}

/// Guarantees a Kptfile with inventory identity before kpt live commands run.
pub struct InventoryReconciler<'a> {
    kpt: &'a dyn Kpt,
    desired: &'a DesiredInventory,
    events: &'a dyn EventSink,
}

impl<'a> InventoryReconciler<'a> {
    pub fn new(kpt: &'a dyn Kpt, desired: &'a DesiredInventory) -> Self {
        Self {
            kpt,
            desired,
            events: &TracingEventSink,
        }
    }

    /// Publish inventory changes to `events` instead of the log.
    pub fn with_events(mut self, events: &'a dyn EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn reconcile(
        &self,
        dir: &Path,
        out: &mut dyn Write,
        cancel: &CancelToken,
    ) -> Result<ReconcileReport, DeployError> {
        let store = KptfileStore::for_dir(dir);

        let package_created = if store.exists() {
            false
        } else {
            let _span = tracing::info_span!("init_kptfile", dir = %dir.display()).entered();
            tracing::info!("No Kptfile found, running kpt pkg init");
            self.kpt
                .pkg_init(dir, out, cancel)
                .map_err(|source| DeployError::Initialization {
                    dir: dir.to_path_buf(),
                    source,
                })?;
            true
        };

        let mut kptfile = store.read()?;
        let resolution = match kptfile.inventory_state() {
            InventoryState::Uninitialized => None,
            InventoryState::Initialized(stored) => Some(self.desired.resolve(stored)),
        };

        let action = match resolution {
            None => {
                self.init_inventory(dir, out, cancel)?;
                InventoryAction::LiveInit
            }
            Some(Resolution { changes, .. }) if changes.is_empty() => {
                tracing::debug!(dir = %dir.display(), "Kptfile inventory up to date");
                InventoryAction::Unchanged
            }
            Some(Resolution { inventory, changes }) => {
                for change in &changes {
                    self.events.emit(DeployEvent::warning(change));
                }
                if cancel.is_cancelled() {
                    return Err(DeployError::Cancelled {
                        dir: dir.to_path_buf(),
                    });
                }
                kptfile.inventory = Some(inventory);
                store.write(&kptfile)?;
                InventoryAction::Merged { changes }
            }
        };

        Ok(ReconcileReport {
            package_created,
            action,
        })
    }

    fn init_inventory(
        &self,
        dir: &Path,
        out: &mut dyn Write,
        cancel: &CancelToken,
    ) -> Result<(), DeployError> {
        let _span = tracing::info_span!("init_inventory", dir = %dir.display()).entered();
        let request = self.desired.live_init_request(dir);
        tracing::info!(
            name = %request.name,
            namespace = %request.namespace,
            "Kptfile has no inventory, running kpt live init"
        );
        self.kpt
            .live_init(&request, out, cancel)
            .map_err(|source| DeployError::LiveInit {
                dir: dir.to_path_buf(),
                source,
            })
    }
}
