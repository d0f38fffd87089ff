use crate::host::HostError;
use crate::settings::OperatorSettings;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// The HAProxy package and its systemd unit.
#[async_trait]
pub trait HaproxyService: Send + Sync {
    async fn is_installed(&self) -> Result<bool, HostError>;

    async fn install(&self) -> Result<(), HostError>;

    /// Run the configuration checker on `path`, bounded by `timeout`.
    async fn validate_config(&self, path: &Path, timeout: Duration) -> Result<(), HostError>;

    async fn reload(&self) -> Result<(), HostError>;

    async fn is_active(&self) -> Result<bool, HostError>;
}

/// HAProxy managed with apt and systemctl.
#[derive(Debug, Clone)]
pub struct SystemdHaproxy {
    binary: String,
    package: String,
    unit: String,
}

impl SystemdHaproxy {
    pub fn new(settings: &OperatorSettings) -> Self {
        Self {
            binary: settings.haproxy_binary.display().to_string(),
            package: settings.package_name.clone(),
            unit: settings.service_unit.clone(),
        }
    }
}

struct Output {
    success: bool,
    status: std::process::ExitStatus,
    stderr: String,
}

async fn run(program: &str, args: &[&str], timeout: Option<Duration>) -> Result<Output, HostError> {
    debug!(program, ?args, "running command");
    let mut command = Command::new(program);
    command.args(args).kill_on_drop(true);

    let output = command.output();
    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, output)
            .await
            .map_err(|_| HostError::Timeout {
                program: program.to_string(),
                seconds: limit.as_secs(),
            })?,
        None => output.await,
    }
    .map_err(|source| HostError::Spawn {
        program: program.to_string(),
        source,
    })?;

    Ok(Output {
        success: output.status.success(),
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

async fn run_checked(
    program: &str,
    args: &[&str],
    timeout: Option<Duration>,
) -> Result<(), HostError> {
    let output = run(program, args, timeout).await?;
    if output.success {
        Ok(())
    } else {
        Err(HostError::CommandFailed {
            program: program.to_string(),
            status: output.status,
            stderr: output.stderr,
        })
    }
}

#[async_trait]
impl HaproxyService for SystemdHaproxy {
    async fn is_installed(&self) -> Result<bool, HostError> {
        Ok(run("dpkg", &["-s", &self.package], None).await?.success)
    }

    async fn install(&self) -> Result<(), HostError> {
        info!(package = self.package.as_str(), "installing package");
        run_checked("apt-get", &["update", "-q"], None).await?;
        run_checked("apt-get", &["install", "-y", "-q", &self.package], None).await?;
        run_checked("systemctl", &["enable", &self.unit], None).await
    }

    async fn validate_config(&self, path: &Path, timeout: Duration) -> Result<(), HostError> {
        let path = path.display().to_string();
        run_checked(&self.binary, &["-c", "-f", &path], Some(timeout)).await
    }

    async fn reload(&self) -> Result<(), HostError> {
        info!(unit = self.unit.as_str(), "reloading service");
        run_checked("systemctl", &["reload-or-restart", &self.unit], None).await
    }

    async fn is_active(&self) -> Result<bool, HostError> {
        Ok(run("systemctl", &["is-active", "--quiet", &self.unit], None)
            .await?
            .success)
    }
}
