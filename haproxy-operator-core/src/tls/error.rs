use crate::host::HostError;

#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("invalid private key in secret '{secret}'")]
    InvalidKey {
        secret: &'static str,
        #[source]
        source: rcgen::Error,
    },

    #[error("failed to generate private key")]
    KeyGeneration(#[source] rcgen::Error),

    #[error("failed to build certificate signing request for {hostname}")]
    Csr {
        hostname: String,
        #[source]
        source: rcgen::Error,
    },

    #[error("invalid PEM: {0}")]
    Pem(#[from] pem::PemError),

    #[error("invalid {kind}: {reason}")]
    Der { kind: &'static str, reason: String },

    #[error(transparent)]
    Host(#[from] HostError),
}
