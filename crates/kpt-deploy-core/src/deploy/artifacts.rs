//! Build artifacts and the image list used to select deployed pods.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A built image: the name from the build config and the pushed reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artifact {
    pub image_name: String,
    pub tag: String,
}

impl Artifact {
    pub fn new(image_name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            image_name: image_name.into(),
            tag: tag.into(),
        }
    }
}

/// Image references that belong to this deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageList {
    images: BTreeSet<String>,
}

impl ImageList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, image: impl Into<String>) {
        self.images.insert(image.into());
    }

    /// Add the tag of every artifact.
    pub fn add_artifacts(&mut self, artifacts: &[Artifact]) {
        for artifact in artifacts {
            self.add(artifact.tag.clone());
        }
    }

    pub fn contains(&self, image: &str) -> bool {
        self.images.contains(image)
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.images.iter().map(String::as_str)
    }
}
