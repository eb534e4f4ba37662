//! Reading and writing documents on local storage.
//!
//! Writes go to a temporary file in the destination directory which is then
//! renamed over the destination, so readers never observe a truncated file.
//! Before the rename, the previous contents are optionally copied to a
//! timestamped backup (`<path>.<unix-seconds>`, with `.1`, `.2`, ... added
//! when several writes land in the same second). Existing backups are never
//! replaced. The backup is best-effort: failing to create it never fails the
//! write.

use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::document::Document;
use crate::error::{Error, Result};

/// Options controlling how a document is written.
///
/// # Examples
///
/// ```
/// use kubegather::WriteOptions;
///
/// let options = WriteOptions::default();
/// assert!(options.backup);
///
/// let options = WriteOptions::default().with_backup(false);
/// assert!(!options.backup);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Copy the previous file to `<path>.<unix-seconds>` before replacing it.
    pub backup: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { backup: true }
    }
}

impl WriteOptions {
    /// Sets whether a timestamped backup is taken.
    #[must_use]
    pub const fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }
}

/// Reads a document from `path`.
///
/// A missing file yields an empty document, so the first gather on a fresh
/// machine creates the destination.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn read_document(path: &Path) -> Result<Document> {
    match fs::read(path) {
        Ok(bytes) => Document::from_yaml(&bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::info!(
                "destination {} does not exist yet, starting empty",
                path.display()
            );
            Ok(Document::default())
        }
        Err(e) => Err(Error::InvalidPath {
            path: path.to_path_buf(),
            reason: format!("Failed to read document: {e}"),
        }),
    }
}

/// Serializes `document` and writes it to `path`.
///
/// # Errors
///
/// Returns [`Error::DocumentWrite`] if serialization or any step of the
/// write fails.
pub fn write_document(document: &Document, path: &Path, options: WriteOptions) -> Result<()> {
    let yaml = document.to_yaml().map_err(|e| Error::DocumentWrite {
        path: path.to_path_buf(),
        reason: format!("serialization failed: {e}"),
    })?;
    write_bytes(yaml.as_bytes(), path, options)
}

/// Writes raw bytes to `path` with owner-only permissions.
///
/// # Errors
///
/// Returns [`Error::DocumentWrite`] if the temporary file cannot be created,
/// written or renamed into place.
pub fn write_bytes(bytes: &[u8], path: &Path, options: WriteOptions) -> Result<()> {
    let write_err = |reason: String| Error::DocumentWrite {
        path: path.to_path_buf(),
        reason,
    };

    if options.backup {
        backup_existing(path);
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| write_err(format!("creating {}: {e}", dir.display())))?;

    let mut tmp = NamedTempFile::new_in(&dir)
        .map_err(|e| write_err(format!("creating temporary file: {e}")))?;
    restrict_permissions(tmp.as_file()).map_err(|e| write_err(format!("setting mode: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| write_err(format!("writing: {e}")))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| write_err(format!("syncing: {e}")))?;
    tmp.persist(path)
        .map_err(|e| write_err(format!("replacing: {}", e.error)))?;

    log::debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Path of the backup taken at `timestamp` seconds.
#[must_use]
pub fn backup_path(path: &Path, timestamp: i64) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{timestamp}"));
    PathBuf::from(name)
}

/// Upper bound on same-second backups of one file.
const MAX_BACKUPS_PER_SECOND: u32 = 1000;

fn backup_existing(path: &Path) {
    let mut current = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) => {
            log::debug!("no backup of {}: {e}", path.display());
            return;
        }
    };

    let base = backup_path(path, chrono::Utc::now().timestamp());
    for attempt in 0..MAX_BACKUPS_PER_SECOND {
        let target = if attempt == 0 {
            base.clone()
        } else {
            let mut name = base.clone().into_os_string();
            name.push(format!(".{attempt}"));
            PathBuf::from(name)
        };

        match OpenOptions::new().write(true).create_new(true).open(&target) {
            Ok(mut backup) => {
                let copied = restrict_permissions(&backup)
                    .and_then(|()| io::copy(&mut current, &mut backup));
                match copied {
                    Ok(_) => log::debug!("backed up {} to {}", path.display(), target.display()),
                    Err(e) => log::debug!("incomplete backup {}: {e}", target.display()),
                }
                return;
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => {
                log::debug!("no backup of {}: {e}", path.display());
                return;
            }
        }
    }
    log::debug!("no free backup name next to {}", path.display());
}

#[cfg(unix)]
fn restrict_permissions(file: &fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &fs::File) -> std::io::Result<()> {
    Ok(())
}
