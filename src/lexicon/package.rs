//! Locally installed lexicon packages
//!
//! A package is a directory holding a `package.yml` manifest and the
//! lexicon files it lists:
//!
//! ```yaml
//! name: Final Fantasy XIV
//! author: someone
//! description: Place and character names
//! files:
//!   - places.pls
//!   - characters.pls
//! ```
//!
//! Each file is registered in the store as `"{package}/{file}"`, where
//! `{package}` is the directory name.

use super::LexiconStore;
use crate::{LexivoxError, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Manifest file name inside a package directory
pub const MANIFEST: &str = "package.yml";

/// Contents of `package.yml`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: String,

    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub description: String,

    /// Hidden from listings when set
    #[serde(default)]
    pub disabled: bool,

    #[serde(default)]
    pub files: Vec<String>,
}

/// A lexicon package on disk
#[derive(Debug, Clone)]
pub struct LexiconPackage {
    /// Directory name, used as the identifier prefix
    internal_name: String,
    dir: PathBuf,
    info: PackageInfo,
}

impl LexiconPackage {
    /// Open a package directory and read its manifest
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let internal_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                LexivoxError::Package(format!("Invalid package directory: {:?}", dir))
            })?;

        let manifest = std::fs::read_to_string(dir.join(MANIFEST)).map_err(|e| {
            LexivoxError::Package(format!("Failed to read {} in {:?}: {}", MANIFEST, dir, e))
        })?;
        let info: PackageInfo = serde_yaml::from_str(&manifest)?;

        debug!(
            "Opened lexicon package {} ({} files)",
            internal_name,
            info.files.len()
        );

        Ok(Self {
            internal_name,
            dir,
            info,
        })
    }

    /// List the enabled packages under `root`, sorted by directory name
    ///
    /// Directories without a readable manifest are skipped with a warning.
    pub fn discover(root: impl AsRef<Path>) -> Result<Vec<Self>> {
        let mut packages = Vec::new();

        for entry in std::fs::read_dir(root.as_ref())? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }

            match Self::open(&path) {
                Ok(package) if package.info.disabled => {
                    debug!("Skipping disabled package {}", package.internal_name);
                }
                Ok(package) => packages.push(package),
                Err(e) => warn!("Ignoring {:?}: {}", path, e),
            }
        }

        packages.sort_by(|a, b| a.internal_name.cmp(&b.internal_name));
        Ok(packages)
    }

    pub fn internal_name(&self) -> &str {
        &self.internal_name
    }

    pub fn info(&self) -> &PackageInfo {
        &self.info
    }

    /// Store identifier used for one of this package's files
    pub fn lexicon_id(&self, file: &str) -> String {
        format!("{}/{}", self.internal_name, file)
    }

    /// Whether any of the package's files is present on disk
    pub fn is_installed(&self) -> bool {
        self.info.files.iter().any(|f| self.dir.join(f).is_file())
    }

    /// Add every file of the package to the store
    ///
    /// Stops at the first file that cannot be read or parsed; files added
    /// before it stay registered. Returns the number of entries added.
    pub fn install(&self, store: &mut LexiconStore) -> Result<usize> {
        let mut added = 0;
        for file in &self.info.files {
            let source = std::fs::read_to_string(self.dir.join(file)).map_err(|e| {
                LexivoxError::Package(format!(
                    "Failed to read {} from package {}: {}",
                    file, self.internal_name, e
                ))
            })?;
            added += store.add_lexicon(&self.lexicon_id(file), &source)?;
        }
        Ok(added)
    }

    /// Remove every file of the package from the store
    pub fn uninstall(&self, store: &mut LexiconStore) {
        for file in &self.info.files {
            store.remove_lexicon(&self.lexicon_id(file));
        }
    }
}
