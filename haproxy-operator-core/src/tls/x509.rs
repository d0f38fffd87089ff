use crate::tls::TlsError;
use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::prelude::{FromDer, X509Certificate, X509Name};

fn common_name(name: &X509Name<'_>) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
}

/// Subject CN of a PEM certificate.
pub fn certificate_common_name(certificate: &str) -> Result<Option<String>, TlsError> {
    let pem = pem::parse(certificate.trim())?;
    let (_, cert) = X509Certificate::from_der(pem.contents()).map_err(|e| TlsError::Der {
        kind: "certificate",
        reason: e.to_string(),
    })?;
    Ok(common_name(cert.subject()))
}

/// Subject CN of a PEM certificate signing request.
pub fn csr_common_name(csr: &str) -> Result<Option<String>, TlsError> {
    let pem = pem::parse(csr.trim())?;
    let (_, request) =
        X509CertificationRequest::from_der(pem.contents()).map_err(|e| TlsError::Der {
            kind: "certificate signing request",
            reason: e.to_string(),
        })?;
    Ok(common_name(&request.certification_request_info.subject))
}
