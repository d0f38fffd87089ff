use crate::host::HostError;
use nix::unistd::{User, chown};
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Mode of every file the operator writes: HAProxy runs unprivileged and
/// must be able to read all of them.
pub const PUBLIC_FILE_MODE: u32 = 0o644;

/// File operations the reconciler needs. Paths are absolute.
pub trait FileSystem: Send + Sync {
    /// Contents of `path`, or `None` if it does not exist.
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>, HostError>;

    /// Atomically replace `path`, creating parent directories as needed.
    fn write(
        &self,
        path: &Path,
        contents: &[u8],
        mode: u32,
        owner: Option<&str>,
    ) -> Result<(), HostError>;

    fn rename(&self, from: &Path, to: &Path) -> Result<(), HostError>;

    /// Remove `path`; returns whether something was removed.
    fn remove(&self, path: &Path) -> Result<bool, HostError>;

    /// Regular files directly inside `dir`, sorted. Empty if `dir` is missing.
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>, HostError>;
}

/// Write `contents` unless the file already holds exactly these bytes.
/// Returns whether a write happened.
pub fn write_if_changed<F: FileSystem + ?Sized>(
    fs: &F,
    path: &Path,
    contents: &[u8],
    owner: Option<&str>,
) -> Result<bool, HostError> {
    if fs.read(path)?.as_deref() == Some(contents) {
        debug!(path = %path.display(), "file unchanged, skipping write");
        return Ok(false);
    }
    fs.write(path, contents, PUBLIC_FILE_MODE, owner)?;
    debug!(path = %path.display(), bytes = contents.len(), "file written");
    Ok(true)
}

/// The real filesystem.
#[derive(Debug, Default, Clone)]
pub struct HostFileSystem;

impl HostFileSystem {
    fn chown(path: &Path, owner: &str) -> Result<(), HostError> {
        let user = User::from_name(owner)
            .map_err(|source| HostError::Chown {
                path: path.to_path_buf(),
                source,
            })?
            .ok_or_else(|| HostError::UnknownUser {
                user: owner.to_string(),
            })?;
        chown(path, Some(user.uid), Some(user.gid)).map_err(|source| HostError::Chown {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl FileSystem for HostFileSystem {
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>, HostError> {
        match fs::read(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HostError::io("read", path, e)),
        }
    }

    fn write(
        &self,
        path: &Path,
        contents: &[u8],
        mode: u32,
        owner: Option<&str>,
    ) -> Result<(), HostError> {
        let dir = path.parent().unwrap_or_else(|| Path::new("/"));
        fs::create_dir_all(dir).map_err(|e| HostError::io("create directory", dir, e))?;

        let mut staged =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| HostError::io("stage", path, e))?;
        staged
            .write_all(contents)
            .map_err(|e| HostError::io("write", path, e))?;
        fs::set_permissions(staged.path(), fs::Permissions::from_mode(mode))
            .map_err(|e| HostError::io("set permissions on", path, e))?;
        if let Some(owner) = owner {
            Self::chown(staged.path(), owner)?;
        }
        staged
            .persist(path)
            .map_err(|e| HostError::io("replace", path, e.error))?;
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), HostError> {
        fs::rename(from, to).map_err(|e| HostError::io("rename", from, e))
    }

    fn remove(&self, path: &Path) -> Result<bool, HostError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(HostError::io("remove", path, e)),
        }
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>, HostError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(HostError::io("list", dir, e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| HostError::io("list", dir, e))?;
            if entry.path().is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }
}
