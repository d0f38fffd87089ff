use crate::interfaces::certificate_transfer::CertificateTransferProviderAppData;
use crate::interfaces::endpoints;
use crate::state::RejectionKind;
use crate::state::assembly::{Assembly, Side, load_app};
use std::collections::BTreeSet;

/// Union of the CA certificates published on every `receive-ca-certs`
/// relation. PEMs are trimmed so that formatting differences do not
/// produce duplicates.
pub(crate) fn collect(assembly: &mut Assembly<'_>) -> BTreeSet<String> {
    let mut certificates = BTreeSet::new();

    let snapshot = assembly.snapshot;
    for relation in snapshot.relations(endpoints::RECEIVE_CA_CERTS) {
        match load_app::<CertificateTransferProviderAppData>(relation) {
            None => {}
            Some(Ok(data)) => {
                certificates.extend(data.certificates.iter().map(|c| c.trim().to_string()));
            }
            Some(Err(reason)) => {
                assembly.reject_relation(relation, Side::Http, RejectionKind::InvalidData, reason)
            }
        }
    }

    certificates
}
