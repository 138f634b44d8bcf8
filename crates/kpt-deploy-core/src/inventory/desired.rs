//! Desired inventory identity and the per-field resolution rules.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::kpt::LiveInitRequest;
use crate::kptfile::Inventory;

/// Namespace used when nothing is requested and nothing is stored.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Inventory values requested by configuration and command-line options.
///
/// Empty strings mean "no override requested".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredInventory {
    pub name: String,
    pub inventory_id: String,
    /// Per-unit namespace (the kube context namespace). Wins over
    /// `inventory_namespace`.
    pub namespace: String,
    pub inventory_namespace: String,
    pub force: bool,
    pub extra_flags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryField {
    InventoryId,
    Name,
    Namespace,
}

impl fmt::Display for InventoryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InventoryField::InventoryId => "inventory",
            InventoryField::Name => "name",
            InventoryField::Namespace => "namespace",
        };
        f.write_str(label)
    }
}

/// One overwritten inventory field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryChange {
    pub field: InventoryField,
    pub old: String,
    pub new: String,
}

impl fmt::Display for InventoryChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Updating Kptfile {} from {} to {}",
            self.field, self.old, self.new
        )
    }
}

/// Merged inventory plus the fields that differ from what was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub inventory: Inventory,
    pub changes: Vec<InventoryChange>,
}

impl DesiredInventory {
    /// First non-empty of the per-unit and inventory namespaces.
    pub fn requested_namespace(&self) -> Option<&str> {
        [self.namespace.as_str(), self.inventory_namespace.as_str()]
            .into_iter()
            .find(|ns| !ns.is_empty())
    }

    pub fn live_init_request(&self, dir: &Path) -> LiveInitRequest {
        LiveInitRequest {
            dir: dir.to_path_buf(),
            name: self.name.clone(),
            inventory_id: self.inventory_id.clone(),
            namespace: self
                .requested_namespace()
                .unwrap_or(DEFAULT_NAMESPACE)
                .to_string(),
            force: self.force,
            extra_flags: self.extra_flags.clone(),
        }
    }

    /// Resolve every field of `stored` against the desired values.
    ///
    /// Each field is resolved on its own; the order of `rules` is the order
    /// changes are reported in.
    pub fn resolve(&self, stored: &Inventory) -> Resolution {
        let rules = [
            (
                InventoryField::InventoryId,
                self.inventory_id.as_str(),
                None,
            ),
            (InventoryField::Name, self.name.as_str(), None),
            (
                InventoryField::Namespace,
                self.requested_namespace().unwrap_or(""),
                Some(DEFAULT_NAMESPACE),
            ),
        ];

        let mut inventory = stored.clone();
        let mut changes = Vec::new();
        for (field, desired, fallback) in rules {
            let current = field_mut(&mut inventory, field);
            let resolved = resolve_field(desired, current, fallback).to_string();
            if resolved != *current {
                changes.push(InventoryChange {
                    field,
                    old: std::mem::replace(current, resolved.clone()),
                    new: resolved,
                });
            }
        }

        Resolution { inventory, changes }
    }
}

/// `desired` if set, else `stored` if set, else `fallback`.
fn resolve_field<'a>(desired: &'a str, stored: &'a str, fallback: Option<&'a str>) -> &'a str {
    if !desired.is_empty() {
        desired
    } else if !stored.is_empty() {
        stored
    } else {
        fallback.unwrap_or(stored)
    }
}

fn field_mut(inventory: &mut Inventory, field: InventoryField) -> &mut String {
    match field {
        InventoryField::InventoryId => &mut inventory.inventory_id,
        InventoryField::Name => &mut inventory.name,
        InventoryField::Namespace => &mut inventory.namespace,
    }
}
