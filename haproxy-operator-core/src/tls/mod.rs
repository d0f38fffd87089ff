//! Certificates for the hostnames HAProxy terminates TLS for, and the
//! bundle of CAs trusted for HTTPS upstreams.
//!
//! Planning is pure: it decides which CSRs must be published and which
//! issued certificates are usable. Materializing writes the PEM files.

mod error;
mod materialize;
mod plan;
mod x509;

#[cfg(test)]
mod tests;

pub use error::TlsError;
pub use materialize::{MaterializeOutcome, materialize};
pub use plan::{IssuedCertificate, TlsPlan, desired_hostnames, plan};
pub use x509::{certificate_common_name, csr_common_name};

/// Secret label of the application private key signing every CSR.
pub const PRIVATE_KEY_SECRET: &str = "tls-private-key";
