//! kpt-deploy Core Library
//!
//! Keeps a package's Kptfile valid and carrying the desired inventory
//! identity before `kpt live apply` or `kpt live destroy` runs against a
//! cluster.

pub mod cancel;
pub mod config;
pub mod deploy;
pub mod error;
pub mod events;
pub mod inventory;
pub mod kpt;
pub mod kptfile;
pub mod manifest;

/// Re-exports of commonly used types
pub mod prelude {
    pub use crate::cancel::CancelToken;
    pub use crate::config::{ConfigStore, DeployerConfig, KptDeploy, RunOptions};
    pub use crate::deploy::{Artifact, Deployer, ImageList};
    pub use crate::error::{DeployError, ToolError};
    pub use crate::events::{DeployEvent, EventLevel, EventSink, MemoryEventSink, TracingEventSink};
    pub use crate::inventory::{
        DEFAULT_NAMESPACE, DesiredInventory, InventoryAction, InventoryChange, InventoryField,
        InventoryReconciler, ReconcileReport,
    };
    pub use crate::kpt::{Kpt, KptCli, LiveInitRequest};
    pub use crate::kptfile::{Inventory, InventoryState, Kptfile, KptfileStore};
    pub use crate::manifest::{ManifestList, ManifestNamespaces, NamespaceCollector};
}
