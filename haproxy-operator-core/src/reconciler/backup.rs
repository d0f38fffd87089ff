use crate::host::{FileSystem, HostError, PUBLIC_FILE_MODE};
use crate::settings::OperatorSettings;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Contents of every file a pass may touch, read before it writes anything.
/// `None` records a file that did not exist.
#[derive(Debug, Default)]
pub(crate) struct Backup {
    files: BTreeMap<PathBuf, Option<Vec<u8>>>,
}

impl Backup {
    pub(crate) fn take<F: FileSystem>(
        fs: &F,
        settings: &OperatorSettings,
    ) -> Result<Self, HostError> {
        let mut paths = fs.list(&settings.certs_dir)?;
        paths.extend([
            settings.ca_bundle_path(),
            settings.dhparam_path(),
            settings.spoe_auth_path(),
            settings.config_path(),
        ]);

        let mut files = BTreeMap::new();
        for path in paths {
            let contents = fs.read(&path)?;
            files.insert(path, contents);
        }
        Ok(Self { files })
    }

    /// Put every path in `touched` back to its recorded state. Paths created
    /// by the pass are removed.
    pub(crate) fn restore<'a, F: FileSystem>(
        &self,
        fs: &F,
        touched: impl IntoIterator<Item = &'a Path>,
        owner: Option<&str>,
    ) -> Result<usize, HostError> {
        let mut restored = 0;
        for path in touched {
            match self.files.get(path).and_then(Option::as_deref) {
                Some(contents) => fs.write(path, contents, PUBLIC_FILE_MODE, owner)?,
                None => {
                    fs.remove(path)?;
                }
            }
            info!(path = %path.display(), "file restored");
            restored += 1;
        }
        Ok(restored)
    }
}
