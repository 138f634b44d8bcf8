//! Kptfile model and persistence.

pub mod schema;
pub mod store;

pub use schema::{Inventory, InventoryState, Kptfile};
pub use store::KptfileStore;

/// File name kpt uses for package metadata.
pub const KPTFILE_NAME: &str = "Kptfile";
