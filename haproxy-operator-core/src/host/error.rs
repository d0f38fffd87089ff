use std::path::PathBuf;
use std::process::ExitStatus;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("failed to {action} {path}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown system user '{user}'")]
    UnknownUser { user: String },

    #[error("failed to change owner of {path}")]
    Chown {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },

    #[error("failed to run {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {seconds}s")]
    Timeout { program: String, seconds: u64 },

    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

impl HostError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// First line of the underlying failure, suitable for a status message.
    pub fn summary(&self) -> String {
        match self {
            Self::CommandFailed { stderr, .. } if !stderr.trim().is_empty() => stderr
                .lines()
                .map(str::trim)
                .find(|line| line.contains("ALERT") || line.contains("error"))
                .or_else(|| stderr.lines().map(str::trim).find(|l| !l.is_empty()))
                .unwrap_or_default()
                .to_string(),
            Self::Io { source, .. } => format!("{}: {}", self, source),
            Self::Spawn { source, .. } => format!("{}: {}", self, source),
            Self::Chown { source, .. } => format!("{}: {}", self, source),
            other => other.to_string(),
        }
    }
}
