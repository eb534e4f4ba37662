//! Persistent catalog of labelled sources.
//!
//! The catalog is a small YAML file:
//!
//! ```yaml
//! sources:
//!   site-a:
//!     source: ssh://centos@10.0.0.1/~/.kube/config
//!     insecure: true
//!   laptop:
//!     source: file://~/projects/kube.config
//!     apiaddress: 192.168.1.20:6443
//! destination: ~/.kube/config
//! ```
//!
//! Catalogs are passed around explicitly; there is no process-wide instance.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::document::persist::write_bytes;
use crate::document::WriteOptions;
use crate::error::{Error, Result};
use crate::path::{expand_tilde, resolve_local};
use crate::source::SourceDefinition;

/// File name of the catalog in the home or working directory.
pub const CATALOG_FILE_NAME: &str = ".kubegather.yaml";

/// Destination used when the catalog names none.
pub const DEFAULT_DESTINATION: &str = "~/.kube/config";

fn default_destination() -> String {
    DEFAULT_DESTINATION.to_string()
}

/// Labelled sources plus the destination they are merged into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Sources keyed by label.
    #[serde(default)]
    pub sources: BTreeMap<String, SourceDefinition>,

    /// Destination document location (path or `file://` URI).
    #[serde(default = "default_destination")]
    pub destination: String,

    #[serde(skip)]
    path: PathBuf,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            sources: BTreeMap::new(),
            destination: default_destination(),
            path: PathBuf::new(),
        }
    }
}

impl Catalog {
    /// Creates an empty catalog that will be saved to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Loads the catalog at `path`. A missing or empty file is an empty
    /// catalog bound to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, or is not a
    /// valid catalog.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use kubegather::Catalog;
    /// use std::path::Path;
    ///
    /// let catalog = Catalog::load(Path::new("/home/ops/.kubegather.yaml")).unwrap();
    /// for label in catalog.sources.keys() {
    ///     println!("{label}");
    /// }
    /// ```
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("no catalog at {}, starting empty", path.display());
                return Ok(Self::new(path));
            }
            Err(e) => {
                return Err(Error::InvalidPath {
                    path: path.to_path_buf(),
                    reason: format!("Failed to read catalog: {e}"),
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(Self::new(path));
        }

        let mut catalog: Self = serde_yaml::from_str(&contents)?;
        catalog.path = path.to_path_buf();
        log::debug!(
            "loaded {} sources from {}",
            catalog.sources.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Writes the whole catalog back to its file with owner-only
    /// permissions. No backup is taken.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        write_bytes(
            yaml.as_bytes(),
            &self.path,
            WriteOptions::default().with_backup(false),
        )?;
        log::debug!("saved catalog to {}", self.path.display());
        Ok(())
    }

    /// File the catalog is bound to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolved destination path.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination is not a local location.
    pub fn destination_path(&self) -> Result<PathBuf> {
        resolve_local(&self.destination)
    }

    /// Source registered under `label`.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&SourceDefinition> {
        self.sources.get(label)
    }

    /// Registers `source` under `label`, replacing any previous entry, and
    /// saves the catalog.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty label or an invalid source,
    /// or the save error.
    pub fn add(&mut self, label: &str, source: SourceDefinition) -> Result<()> {
        if label.is_empty() {
            return Err(Error::Validation {
                field: "label".to_string(),
                message: "label must not be empty".to_string(),
            });
        }
        source.validate()?;

        if self.sources.insert(label.to_string(), source).is_some() {
            log::info!("replaced catalog entry {label}");
        } else {
            log::info!("added catalog entry {label}");
        }
        self.save()
    }

    /// Removes `label` from the catalog. The caller persists with
    /// [`Catalog::save`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::LabelNotFound`] if the label is absent; the catalog
    /// is unchanged.
    pub fn delete(&mut self, label: &str) -> Result<SourceDefinition> {
        let removed = self.sources.remove(label).ok_or_else(|| Error::LabelNotFound {
            label: label.to_string(),
        })?;
        log::info!("removed catalog entry {label}");
        Ok(removed)
    }
}

/// Picks the catalog file.
///
/// An explicit path wins. Otherwise `~/.kubegather.yaml` is used if it
/// exists, then `./.kubegather.yaml` if it exists, and finally
/// `~/.kubegather.yaml` (created on first save).
///
/// # Errors
///
/// Returns an error if tilde expansion of the explicit path fails, or the
/// current directory cannot be determined.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return expand_tilde(path);
    }
    let cwd = std::env::current_dir()?;
    Ok(discover_config_path(home::home_dir().as_deref(), &cwd))
}

/// Discovery without an explicit path, against the given home and working
/// directories.
#[must_use]
pub fn discover_config_path(home: Option<&Path>, cwd: &Path) -> PathBuf {
    let home_file = home.map(|h| h.join(CATALOG_FILE_NAME));
    let local_file = cwd.join(CATALOG_FILE_NAME);

    match home_file {
        Some(home_file) if home_file.exists() => home_file,
        _ if local_file.exists() => local_file,
        Some(home_file) => home_file,
        None => local_file,
    }
}
