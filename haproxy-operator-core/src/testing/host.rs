use crate::host::{FileSystem, HaproxyService, HostError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryFile {
    pub contents: Vec<u8>,
    pub mode: u32,
    pub owner: Option<String>,
}

/// In-memory [`FileSystem`] that counts writes.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<BTreeMap<PathBuf, MemoryFile>>,
    writes: Mutex<Vec<PathBuf>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file without counting it as a write.
    pub fn with_file(self, path: impl Into<PathBuf>, contents: &str) -> Self {
        lock(&self.files).insert(
            path.into(),
            MemoryFile {
                contents: contents.as_bytes().to_vec(),
                mode: 0o644,
                owner: None,
            },
        );
        self
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<MemoryFile> {
        lock(&self.files).get(path.as_ref()).cloned()
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.file(path)
            .map(|f| String::from_utf8_lossy(&f.contents).into_owned())
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        lock(&self.files).contains_key(path.as_ref())
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        lock(&self.files).keys().cloned().collect()
    }

    /// Every path written since creation, in order.
    pub fn writes(&self) -> Vec<PathBuf> {
        lock(&self.writes).clone()
    }

    pub fn clear_writes(&self) {
        lock(&self.writes).clear();
    }
}

impl FileSystem for MemoryFileSystem {
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>, HostError> {
        Ok(lock(&self.files).get(path).map(|f| f.contents.clone()))
    }

    fn write(
        &self,
        path: &Path,
        contents: &[u8],
        mode: u32,
        owner: Option<&str>,
    ) -> Result<(), HostError> {
        lock(&self.files).insert(
            path.to_path_buf(),
            MemoryFile {
                contents: contents.to_vec(),
                mode,
                owner: owner.map(str::to_string),
            },
        );
        lock(&self.writes).push(path.to_path_buf());
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), HostError> {
        let mut files = lock(&self.files);
        let file = files.remove(from).ok_or_else(|| {
            HostError::io(
                "rename",
                from,
                std::io::Error::from(std::io::ErrorKind::NotFound),
            )
        })?;
        files.insert(to.to_path_buf(), file);
        lock(&self.writes).push(to.to_path_buf());
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<bool, HostError> {
        Ok(lock(&self.files).remove(path).is_some())
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>, HostError> {
        Ok(lock(&self.files)
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
struct ServiceState {
    installed: bool,
    fail_install: bool,
    rejection: Option<String>,
    validation_timeout: bool,
    failing_reloads: u32,
    active: bool,
    installs: u32,
    validations: Vec<PathBuf>,
    reloads: u32,
}

/// Scripted [`HaproxyService`] recording every call.
#[derive(Debug)]
pub struct FakeHaproxyService {
    state: Mutex<ServiceState>,
}

impl Default for FakeHaproxyService {
    fn default() -> Self {
        Self::new()
    }
}

fn failed(program: &str, stderr: &str) -> HostError {
    HostError::CommandFailed {
        program: program.to_string(),
        status: ExitStatus::from_raw(1 << 8),
        stderr: stderr.to_string(),
    }
}

impl FakeHaproxyService {
    /// Installed, running, accepting every configuration.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ServiceState {
                installed: true,
                active: true,
                ..Default::default()
            }),
        }
    }

    pub fn not_installed(self) -> Self {
        lock(&self.state).installed = false;
        self
    }

    pub fn failing_install(self) -> Self {
        lock(&self.state).fail_install = true;
        self
    }

    /// Refuse every configuration with `stderr`.
    pub fn rejecting(self, stderr: &str) -> Self {
        lock(&self.state).rejection = Some(stderr.to_string());
        self
    }

    /// Refuse configurations from now on.
    pub fn start_rejecting(&self, stderr: &str) {
        lock(&self.state).rejection = Some(stderr.to_string());
    }

    pub fn timing_out(self) -> Self {
        lock(&self.state).validation_timeout = true;
        self
    }

    /// Fail the next `count` reloads.
    pub fn failing_reloads(self, count: u32) -> Self {
        lock(&self.state).failing_reloads = count;
        self
    }

    pub fn inactive(self) -> Self {
        lock(&self.state).active = false;
        self
    }

    pub fn installs(&self) -> u32 {
        lock(&self.state).installs
    }

    pub fn reloads(&self) -> u32 {
        lock(&self.state).reloads
    }

    pub fn validated_paths(&self) -> Vec<PathBuf> {
        lock(&self.state).validations.clone()
    }
}

#[async_trait]
impl HaproxyService for FakeHaproxyService {
    async fn is_installed(&self) -> Result<bool, HostError> {
        Ok(lock(&self.state).installed)
    }

    async fn install(&self) -> Result<(), HostError> {
        let mut state = lock(&self.state);
        state.installs += 1;
        if state.fail_install {
            return Err(failed("apt-get", "E: Unable to locate package haproxy"));
        }
        state.installed = true;
        Ok(())
    }

    async fn validate_config(&self, path: &Path, timeout: Duration) -> Result<(), HostError> {
        let mut state = lock(&self.state);
        state.validations.push(path.to_path_buf());
        if state.validation_timeout {
            return Err(HostError::Timeout {
                program: "haproxy".to_string(),
                seconds: timeout.as_secs(),
            });
        }
        match &state.rejection {
            Some(stderr) => Err(failed("haproxy", stderr)),
            None => Ok(()),
        }
    }

    async fn reload(&self) -> Result<(), HostError> {
        let mut state = lock(&self.state);
        state.reloads += 1;
        if state.failing_reloads > 0 {
            state.failing_reloads -= 1;
            return Err(failed("systemctl", "Job for haproxy.service failed"));
        }
        state.active = true;
        Ok(())
    }

    async fn is_active(&self) -> Result<bool, HostError> {
        Ok(lock(&self.state).active)
    }
}
