//! Local path helpers.
//!
//! Paths in the catalog and on the command line may use `~` for the home
//! directory, or be written as `file://` URIs.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Prefix marking a local file URI.
pub const FILE_SCHEME: &str = "file://";

/// Expand tilde (~) to the home directory.
///
/// Handles `~` and `~/path` but not `~user`.
///
/// # Errors
///
/// Returns an error if the path is not valid UTF-8, the home directory
/// cannot be determined, or the path uses `~user` syntax.
///
/// # Examples
///
/// ```
/// use kubegather::path::expand_tilde;
/// use std::path::Path;
///
/// let expanded = expand_tilde(Path::new("~/.kube/config")).unwrap();
/// assert!(expanded.is_absolute());
/// assert!(expanded.ends_with(".kube/config"));
///
/// let expanded = expand_tilde(Path::new("/absolute")).unwrap();
/// assert_eq!(expanded, Path::new("/absolute"));
/// ```
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let path_str = path.to_str().ok_or_else(|| Error::InvalidPath {
        path: path.to_path_buf(),
        reason: "Path contains invalid UTF-8".to_string(),
    })?;

    if !path_str.starts_with('~') {
        return Ok(path.to_path_buf());
    }

    let home = home::home_dir().ok_or_else(|| Error::InvalidPath {
        path: path.to_path_buf(),
        reason: "Cannot determine home directory".to_string(),
    })?;

    if path_str == "~" {
        Ok(home)
    } else if path_str.starts_with("~/") || path_str.starts_with("~\\") {
        Ok(home.join(&path_str[2..]))
    } else {
        Err(Error::InvalidPath {
            path: path.to_path_buf(),
            reason: "~user syntax is not supported; use ~ or ~/path".to_string(),
        })
    }
}

/// Resolve a local location written either as a path or a `file://` URI.
///
/// # Errors
///
/// Returns an error if the location is empty, uses a remote scheme, or
/// tilde expansion fails.
///
/// # Examples
///
/// ```
/// use kubegather::path::resolve_local;
/// use std::path::Path;
///
/// assert_eq!(resolve_local("file:///etc/kube.yaml").unwrap(), Path::new("/etc/kube.yaml"));
/// assert_eq!(resolve_local("/etc/kube.yaml").unwrap(), Path::new("/etc/kube.yaml"));
/// assert!(resolve_local("ssh://host/kube.yaml").is_err());
/// ```
pub fn resolve_local(location: &str) -> Result<PathBuf> {
    let raw = location.strip_prefix(FILE_SCHEME).unwrap_or(location);
    if raw.is_empty() {
        return Err(Error::InvalidPath {
            path: PathBuf::from(location),
            reason: "path is empty".to_string(),
        });
    }
    if raw.contains("://") {
        return Err(Error::InvalidPath {
            path: PathBuf::from(location),
            reason: "only local paths and file:// locations can be written".to_string(),
        });
    }
    expand_tilde(Path::new(raw))
}
