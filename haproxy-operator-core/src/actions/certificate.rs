use crate::actions::ActionError;
use crate::databag::DatabagModel;
use crate::interfaces::endpoints;
use crate::interfaces::tls_certificates::{ProviderCertificate, TlsProviderAppData};
use crate::model::ModelSnapshot;
use crate::tls::certificate_common_name;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateData {
    pub certificate: String,
    pub ca: String,
    pub chain: Vec<String>,
}

fn matches(certificate: &ProviderCertificate, hostname: &str) -> bool {
    if certificate.is_revoked() || certificate.ca.trim().is_empty() {
        return false;
    }
    match certificate_common_name(&certificate.certificate) {
        Ok(cn) => cn.as_deref() == Some(hostname),
        Err(e) => {
            warn!(error = %e, "skipping unreadable provider certificate");
            false
        }
    }
}

/// Provider certificate whose subject CN is exactly `hostname`.
pub fn get_certificate(snapshot: &ModelSnapshot, hostname: &str) -> Result<CertificateData, ActionError> {
    snapshot
        .relations(endpoints::CERTIFICATES)
        .into_iter()
        .filter_map(|relation| TlsProviderAppData::load(&relation.app_data).ok())
        .flat_map(|data| data.certificates)
        .find(|certificate| matches(certificate, hostname))
        .map(|certificate| CertificateData {
            certificate: certificate.certificate,
            ca: certificate.ca,
            chain: certificate.chain,
        })
        .ok_or_else(|| ActionError::MissingCertificate {
            hostname: hostname.to_string(),
        })
}
