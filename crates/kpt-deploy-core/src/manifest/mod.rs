//! Rendered manifests and the namespaces they deploy into.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_yaml::Value;

use crate::error::DeployError;

/// Kubernetes manifests, one YAML document each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestList {
    manifests: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ResourceList {
    #[serde(default)]
    items: Vec<Value>,
}

impl ManifestList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split the ResourceList printed by `kpt fn source` into manifests.
    pub fn from_resource_list(bytes: &[u8]) -> Result<Self, serde_yaml::Error> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::new());
        }
        let list: ResourceList = serde_yaml::from_slice(bytes)?;
        let manifests = list
            .items
            .iter()
            .map(serde_yaml::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { manifests })
    }

    pub fn push(&mut self, manifest: impl Into<String>) {
        self.manifests.push(manifest.into());
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.manifests.iter().map(String::as_str)
    }

    /// Sorted, de-duplicated `metadata.namespace` values.
    pub fn collect_namespaces(&self) -> Result<Vec<String>, serde_yaml::Error> {
        let mut namespaces = BTreeSet::new();
        for manifest in self.iter() {
            let doc: Value = serde_yaml::from_str(manifest)?;
            if let Some(ns) = doc
                .get("metadata")
                .and_then(|metadata| metadata.get("namespace"))
                .and_then(Value::as_str)
                .filter(|ns| !ns.is_empty())
            {
                namespaces.insert(ns.to_string());
            }
        }
        Ok(namespaces.into_iter().collect())
    }
}

/// Finds the namespaces a set of manifests deploys into.
pub trait NamespaceCollector {
    fn collect(&self, manifests: &ManifestList) -> Result<Vec<String>, DeployError>;
}

/// Reads `metadata.namespace` from every manifest.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestNamespaces;

impl NamespaceCollector for ManifestNamespaces {
    fn collect(&self, manifests: &ManifestList) -> Result<Vec<String>, DeployError> {
        manifests
            .collect_namespaces()
            .map_err(|e| DeployError::NamespaceCollection {
                reason: e.to_string(),
            })
    }
}
