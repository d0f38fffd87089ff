use crate::databag::DatabagModel;
use crate::interfaces::endpoints;
use crate::interfaces::tls_certificates::{
    ProviderCertificate, RequestedCertificate, TlsProviderAppData, TlsRequirerAppData,
};
use crate::model::{ModelSnapshot, Relation};
use crate::state::{ProxyMode, ProxyState};
use crate::tls::{PRIVATE_KEY_SECRET, TlsError, csr_common_name};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// A provider certificate matched to one of our requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCertificate {
    pub hostname: String,
    pub certificate: String,
    pub ca: String,
    pub chain: Vec<String>,
}

impl IssuedCertificate {
    /// Leaf, chain, then key, as HAProxy reads a `crt` file. Each part is
    /// trimmed and joined by a single newline; empty chain entries and
    /// entries repeating the leaf are dropped.
    pub fn pem_bundle(&self, private_key: &str) -> String {
        let leaf = self.certificate.trim();
        let mut parts = vec![leaf];
        parts.extend(
            self.chain
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty() && *c != leaf),
        );
        parts.push(private_key.trim());
        let mut bundle = parts.join("\n");
        bundle.push('\n');
        bundle
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsPlan {
    pub hostnames: BTreeSet<String>,
    /// Application key; `None` until a leader has created it.
    pub private_key: Option<String>,
    /// Set when the key was generated during this reconcile and must be
    /// stored as a secret.
    pub new_private_key: bool,
    /// Requests to publish on the certificates relation.
    pub requests: Vec<RequestedCertificate>,
    pub issued: Vec<IssuedCertificate>,
    /// Hostnames still waiting for a certificate.
    pub pending: Vec<String>,
}

impl TlsPlan {
    /// Databag this application should publish on the certificates
    /// relation, if one exists.
    pub fn requirer_data(&self) -> TlsRequirerAppData {
        TlsRequirerAppData {
            certificate_signing_requests: self.requests.clone(),
        }
    }

    pub fn waiting_message(&self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(format!(
                "waiting for certificates: {}",
                self.pending.join(", ")
            ))
        }
    }
}

/// Hostnames HAProxy terminates TLS for: the external hostname, every
/// HTTP backend hostname and the SNI of terminating TCP routes. Wildcards
/// cannot be requested.
pub fn desired_hostnames(snapshot: &ModelSnapshot, state: &ProxyState) -> BTreeSet<String> {
    let mut hostnames = BTreeSet::new();
    if state.mode == ProxyMode::Legacy {
        return hostnames;
    }
    if let Some(external) = &snapshot.config.external_hostname {
        hostnames.insert(external.clone());
    }
    for backend in &state.requirers.backends {
        hostnames.extend(backend.hostnames.iter().cloned());
    }
    for backend in state.requirers.tcp_backends() {
        if let Some(sni) = &backend.sni
            && backend.terminate_tls
        {
            hostnames.insert(sni.clone());
        }
    }
    hostnames.retain(|h| !h.starts_with("*."));
    hostnames
}

fn load_or_generate_key(snapshot: &ModelSnapshot) -> Result<Option<(KeyPair, bool)>, TlsError> {
    if let Some(pem) = snapshot.secrets.get(PRIVATE_KEY_SECRET) {
        let key = KeyPair::from_pem(pem).map_err(|source| TlsError::InvalidKey {
            secret: PRIVATE_KEY_SECRET,
            source,
        })?;
        return Ok(Some((key, false)));
    }
    if !snapshot.is_leader {
        debug!("private key not created yet, waiting for the leader");
        return Ok(None);
    }
    info!("generating application private key");
    let key = KeyPair::generate().map_err(TlsError::KeyGeneration)?;
    Ok(Some((key, true)))
}

fn build_csr(hostname: &str, key: &KeyPair) -> Result<String, TlsError> {
    let csr_error = |source| TlsError::Csr {
        hostname: hostname.to_string(),
        source,
    };
    let mut params = CertificateParams::new(vec![hostname.to_string()]).map_err(csr_error)?;
    let mut name = DistinguishedName::new();
    name.push(DnType::CommonName, hostname);
    params.distinguished_name = name;
    params
        .serialize_request(key)
        .and_then(|csr| csr.pem())
        .map_err(csr_error)
}

fn published_requests(relation: &Relation) -> Vec<RequestedCertificate> {
    if relation.local_app_data.is_empty() {
        return Vec::new();
    }
    match TlsRequirerAppData::load(&relation.local_app_data) {
        Ok(data) => data.certificate_signing_requests,
        Err(e) => {
            warn!(error = %e, "discarding unreadable certificate requests");
            Vec::new()
        }
    }
}

fn provider_certificates(relation: &Relation) -> Vec<ProviderCertificate> {
    if relation.app_data.is_empty() {
        return Vec::new();
    }
    match TlsProviderAppData::load(&relation.app_data) {
        Ok(data) => data.certificates,
        Err(e) => {
            warn!(
                relation_id = relation.id.get(),
                error = %e,
                "ignoring invalid certificates from provider"
            );
            Vec::new()
        }
    }
}

/// Decide requests and usable certificates for the current state.
pub fn plan(snapshot: &ModelSnapshot, state: &ProxyState) -> Result<TlsPlan, TlsError> {
    let hostnames = desired_hostnames(snapshot, state);
    let mut plan = TlsPlan {
        hostnames: hostnames.clone(),
        ..Default::default()
    };
    if hostnames.is_empty() {
        return Ok(plan);
    }

    let Some(relation) = snapshot.relations(endpoints::CERTIFICATES).into_iter().next() else {
        debug!("no certificates integration, serving without TLS certificates");
        plan.pending = hostnames.into_iter().collect();
        return Ok(plan);
    };

    let Some((key, new_key)) = load_or_generate_key(snapshot)? else {
        plan.pending = hostnames.into_iter().collect();
        return Ok(plan);
    };
    plan.private_key = Some(key.serialize_pem());
    plan.new_private_key = new_key;

    // Requests signed by a replaced key are useless.
    let published = if new_key {
        Vec::new()
    } else {
        published_requests(relation)
    };
    let certificates = provider_certificates(relation);

    for hostname in &hostnames {
        let existing = published.iter().find(|request| {
            csr_common_name(&request.certificate_signing_request)
                .ok()
                .flatten()
                .as_deref()
                == Some(hostname.as_str())
        });
        let request = match existing {
            Some(request) => request.clone(),
            None => {
                if !snapshot.is_leader {
                    plan.pending.push(hostname.clone());
                    continue;
                }
                info!(hostname = hostname.as_str(), "requesting certificate");
                RequestedCertificate {
                    certificate_signing_request: build_csr(hostname, &key)?,
                    ca: false,
                }
            }
        };

        let issued = certificates.iter().find(|c| {
            !c.is_revoked()
                && c.certificate_signing_request.trim() == request.certificate_signing_request.trim()
        });
        match issued {
            Some(certificate) => plan.issued.push(IssuedCertificate {
                hostname: hostname.clone(),
                certificate: certificate.certificate.clone(),
                ca: certificate.ca.clone(),
                chain: certificate.chain.clone(),
            }),
            None => plan.pending.push(hostname.clone()),
        }
        plan.requests.push(request);
    }

    Ok(plan)
}
