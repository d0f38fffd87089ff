//! Operator actions. Both are read-only views over the model snapshot.

mod certificate;
mod endpoints;
mod error;


pub use certificate::{CertificateData, get_certificate};
pub use endpoints::{ProxiedEndpoints, get_proxied_endpoints};
pub use error::ActionError;
