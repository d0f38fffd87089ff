#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("No backend with name \"{name}\"")]
    UnknownBackend { name: String },

    #[error("Missing or incomplete certificate data for {hostname}")]
    MissingCertificate { hostname: String },
}
