use crate::databag::DataValidationError;
use crate::host::HostError;
use crate::model::UnitStatus;
use crate::render::RenderError;
use crate::tls::TlsError;

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("failed to install haproxy")]
    Install(#[source] HostError),

    #[error("haproxy refused the configuration")]
    InvalidConfig(#[source] HostError),

    #[error("haproxy reload failed after {attempts} attempts")]
    Reload {
        attempts: u32,
        #[source]
        source: HostError,
    },

    #[error("haproxy is not running after reload")]
    NotRunning,

    #[error("failed to render configuration")]
    Render(#[from] RenderError),

    #[error("certificate handling failed")]
    Tls(#[from] TlsError),

    #[error("host operation failed")]
    Host(#[from] HostError),

    #[error("failed to encode provider data")]
    Encode(#[from] DataValidationError),
}

impl ReconcileError {
    /// Status surfaced for this failure. Every failure blocks; the next
    /// event retries.
    pub fn status(&self) -> UnitStatus {
        let message = match self {
            Self::Install(e) => format!("failed to install haproxy: {}", e.summary()),
            Self::InvalidConfig(e) => format!("invalid haproxy configuration: {}", e.summary()),
            Self::Reload { source, .. } => format!("haproxy reload failed: {}", source.summary()),
            Self::NotRunning => "haproxy service is not running".to_string(),
            Self::Render(e) => format!("failed to render configuration: {}", e),
            Self::Tls(e) => e.to_string(),
            Self::Host(e) => e.summary(),
            Self::Encode(e) => e.to_string(),
        };
        UnitStatus::Blocked(message)
    }
}
