//! Inventory identity: desired values, resolution, reconciliation.

pub mod desired;
pub mod reconciler;

pub use desired::{
    DEFAULT_NAMESPACE, DesiredInventory, InventoryChange, InventoryField, Resolution,
};
pub use reconciler::{InventoryAction, InventoryReconciler, ReconcileReport};
