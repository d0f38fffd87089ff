//! `certificate_transfer` v1: trusted CAs pushed by a provider.

use crate::databag::DatabagModel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateTransferProviderAppData {
    #[serde(default)]
    pub certificates: BTreeSet<String>,
}

impl DatabagModel for CertificateTransferProviderAppData {
    const KEYS: &'static [&'static str] = &["certificates"];

    fn validate(&self) -> Result<(), Vec<String>> {
        if self
            .certificates
            .iter()
            .all(|c| c.trim_start().starts_with("-----BEGIN CERTIFICATE-----"))
        {
            Ok(())
        } else {
            Err(vec!["certificates: expected PEM encoded certificates".to_string()])
        }
    }
}
