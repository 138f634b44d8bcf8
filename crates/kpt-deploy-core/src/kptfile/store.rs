//! Kptfile load/save for a single deployment unit.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::DeployError;

use super::{KPTFILE_NAME, Kptfile};

/// Reads and writes `<dir>/Kptfile`.
#[derive(Debug, Clone)]
pub struct KptfileStore {
    path: PathBuf,
}

impl KptfileStore {
    pub fn for_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(KPTFILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn read(&self) -> Result<Kptfile, DeployError> {
        let content = fs::read_to_string(&self.path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                DeployError::NotFound {
                    path: self.path.clone(),
                }
            } else {
                DeployError::Io {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;

        Kptfile::from_yaml_str(&content).map_err(|source| DeployError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Save atomically (tmp + rename).
    pub fn write(&self, kptfile: &Kptfile) -> Result<(), DeployError> {
        // Serialize first so a bad document never touches the disk
        let content = kptfile
            .to_yaml_string()
            .map_err(|source| DeployError::Serialize {
                path: self.path.clone(),
                source,
            })?;

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, content).map_err(|source| DeployError::Io {
            path: tmp_path.clone(),
            source,
        })?;

        if let Err(source) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(DeployError::Io {
                path: self.path.clone(),
                source,
            });
        }

        tracing::debug!(path = %self.path.display(), "Wrote Kptfile");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let file_name = format!(".{}.{}.tmp", KPTFILE_NAME, std::process::id());
        match self.path.parent() {
            Some(parent) => parent.join(file_name),
            None => PathBuf::from(file_name),
        }
    }
}
