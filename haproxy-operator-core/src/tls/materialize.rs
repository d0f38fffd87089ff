use crate::host::{FileSystem, write_if_changed};
use crate::settings::OperatorSettings;
use crate::tls::{TlsError, TlsPlan};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeOutcome {
    pub written: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    /// Certificate files present on disk after materializing.
    pub certificates: Vec<PathBuf>,
}

impl MaterializeOutcome {
    pub fn changed(&self) -> bool {
        !self.written.is_empty() || !self.removed.is_empty()
    }
}

/// Bring the certificate directory and CA bundle in line with `plan`.
pub fn materialize<F: FileSystem + ?Sized>(
    fs: &F,
    settings: &OperatorSettings,
    plan: &TlsPlan,
    ca_certificates: &BTreeSet<String>,
) -> Result<MaterializeOutcome, TlsError> {
    let mut outcome = MaterializeOutcome::default();
    let owner = Some(settings.haproxy_user.as_str());

    if let Some(key) = &plan.private_key {
        for issued in &plan.issued {
            let path = settings.certificate_path(&issued.hostname);
            if write_if_changed(fs, &path, issued.pem_bundle(key).as_bytes(), owner)? {
                info!(hostname = issued.hostname.as_str(), path = %path.display(), "certificate installed");
                outcome.written.push(path.clone());
            }
            outcome.certificates.push(path);
        }
    }

    for path in fs.list(&settings.certs_dir)? {
        let is_pem = path.extension().is_some_and(|ext| ext == "pem");
        if is_pem && !outcome.certificates.contains(&path) && fs.remove(&path)? {
            info!(path = %path.display(), "stale certificate removed");
            outcome.removed.push(path);
        }
    }

    let bundle_path = settings.ca_bundle_path();
    if ca_certificates.is_empty() {
        if fs.remove(&bundle_path)? {
            outcome.removed.push(bundle_path);
        }
    } else {
        let mut bundle = ca_certificates
            .iter()
            .map(|c| c.trim())
            .collect::<Vec<_>>()
            .join("\n");
        bundle.push('\n');
        if write_if_changed(fs, &bundle_path, bundle.as_bytes(), owner)? {
            info!(count = ca_certificates.len(), "trusted CA bundle updated");
            outcome.written.push(bundle_path);
        }
    }

    Ok(outcome)
}
