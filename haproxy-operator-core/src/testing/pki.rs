use crate::databag::DatabagModel;
use crate::interfaces::endpoints;
use crate::interfaces::tls_certificates::{
    ProviderCertificate, TlsProviderAppData, TlsRequirerAppData,
};
use crate::model::ModelSnapshot;
use crate::tls::{PRIVATE_KEY_SECRET, csr_common_name};
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, IsCa, KeyPair, KeyUsagePurpose,
};

/// A throwaway certificate authority standing in for a TLS provider.
pub struct TestCa {
    certificate: Certificate,
    key: KeyPair,
}

impl Default for TestCa {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCa {
    pub fn new() -> Self {
        let key = KeyPair::generate().expect("generate CA key");
        let mut params = CertificateParams::default();
        params
            .distinguished_name
            .push(DnType::CommonName, "Test Provider CA");
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
        let certificate = params.self_signed(&key).expect("self-sign CA");
        Self { certificate, key }
    }

    pub fn ca_pem(&self) -> String {
        self.certificate.pem()
    }

    /// Certificate for `hostname` over the public half of `key_pem`, as a
    /// provider answering one of our CSRs would issue it.
    pub fn issue(&self, hostname: &str, key_pem: &str) -> String {
        let subject_key = KeyPair::from_pem(key_pem).expect("subject key");
        let mut params =
            CertificateParams::new(vec![hostname.to_string()]).expect("certificate params");
        params.distinguished_name.push(DnType::CommonName, hostname);
        params
            .signed_by(&subject_key, &self.certificate, &self.key)
            .expect("sign certificate")
            .pem()
    }

    /// Answer every request published on the certificates relation of
    /// `snapshot`, the way a provider would between two events.
    pub fn fulfill(&self, snapshot: &mut ModelSnapshot) {
        let key_pem = snapshot
            .secrets
            .get(PRIVATE_KEY_SECRET)
            .cloned()
            .expect("private key secret stored");
        let relation = snapshot
            .relations
            .iter_mut()
            .find(|r| r.endpoint == endpoints::CERTIFICATES)
            .expect("certificates relation");
        let requests = TlsRequirerAppData::load(&relation.local_app_data).expect("requests");

        let certificates = requests
            .certificate_signing_requests
            .into_iter()
            .map(|request| {
                let hostname = csr_common_name(&request.certificate_signing_request)
                    .expect("parse csr")
                    .expect("csr common name");
                ProviderCertificate {
                    certificate: self.issue(&hostname, &key_pem),
                    certificate_signing_request: request.certificate_signing_request,
                    ca: self.ca_pem(),
                    chain: vec![self.ca_pem()],
                    revoked: None,
                }
            })
            .collect();
        relation.app_data = TlsProviderAppData { certificates }
            .dump()
            .expect("encode certificates");
    }
}
