//! `tls-certificates` v4, app-level requests.

use crate::databag::DatabagModel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedCertificate {
    pub certificate_signing_request: String,
    #[serde(default)]
    pub ca: bool,
}

/// What this application publishes on the `certificates` relation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsRequirerAppData {
    #[serde(default)]
    pub certificate_signing_requests: Vec<RequestedCertificate>,
}

impl DatabagModel for TlsRequirerAppData {
    const KEYS: &'static [&'static str] = &["certificate_signing_requests"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCertificate {
    pub certificate: String,
    pub certificate_signing_request: String,
    pub ca: String,
    #[serde(default)]
    pub chain: Vec<String>,
    #[serde(default)]
    pub revoked: Option<bool>,
}

impl ProviderCertificate {
    pub fn is_revoked(&self) -> bool {
        self.revoked.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsProviderAppData {
    #[serde(default)]
    pub certificates: Vec<ProviderCertificate>,
}

impl DatabagModel for TlsProviderAppData {
    const KEYS: &'static [&'static str] = &["certificates"];

    fn validate(&self) -> Result<(), Vec<String>> {
        let reasons: Vec<String> = self
            .certificates
            .iter()
            .filter(|c| c.certificate.trim().is_empty())
            .map(|c| {
                format!(
                    "certificates: empty certificate for request {}",
                    c.certificate_signing_request.lines().nth(1).unwrap_or("?")
                )
            })
            .collect();
        if reasons.is_empty() { Ok(()) } else { Err(reasons) }
    }
}
