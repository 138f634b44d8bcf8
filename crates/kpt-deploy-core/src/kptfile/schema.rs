//! Kptfile document model.
//!
//! Only the `inventory` block is interpreted. Every other key is carried
//! through `extra` so a rewrite does not drop package metadata, pipelines or
//! anything a newer kpt release adds.

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

/// A parsed Kptfile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kptfile {
    /// Keys other than `inventory`, in document order.
    #[serde(flatten)]
    pub extra: Mapping,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Inventory>,
}

/// Ownership record written by `kpt live init`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(
        rename = "inventoryID",
        alias = "id",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub inventory_id: String,

    #[serde(flatten)]
    pub extra: Mapping,
}

impl Inventory {
    pub fn new(
        name: impl Into<String>,
        inventory_id: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            inventory_id: inventory_id.into(),
            extra: Mapping::new(),
        }
    }
}

/// Whether a Kptfile already carries inventory identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InventoryState<'a> {
    Uninitialized,
    Initialized(&'a Inventory),
}

impl Kptfile {
    pub fn inventory_state(&self) -> InventoryState<'_> {
        match &self.inventory {
            Some(inventory) => InventoryState::Initialized(inventory),
            None => InventoryState::Uninitialized,
        }
    }

    /// Parse Kptfile content. Blank content is an empty Kptfile.
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
