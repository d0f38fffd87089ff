use crate::interfaces::ddos_protection::DdosProtectionProviderAppData;
use crate::interfaces::endpoints;
use crate::model::RelationId;
use crate::state::RejectionKind;
use crate::state::assembly::{Assembly, Side, load_app};

/// The single DDoS protection configurator, if any.
pub(crate) fn collect(assembly: &mut Assembly<'_>) -> Option<DdosProtectionProviderAppData> {
    let mut admitted: Option<(RelationId, DdosProtectionProviderAppData)> = None;

    let snapshot = assembly.snapshot;
    for relation in snapshot.relations(endpoints::DDOS_PROTECTION) {
        match load_app::<DdosProtectionProviderAppData>(relation) {
            None => {}
            Some(Err(reason)) => {
                assembly.reject_relation(relation, Side::Http, RejectionKind::InvalidData, reason)
            }
            Some(Ok(_)) if admitted.is_some() => {
                let first = admitted.as_ref().map(|(id, _)| id.get()).unwrap_or_default();
                assembly.reject_relation(
                    relation,
                    Side::Http,
                    RejectionKind::Conflict,
                    format!(
                        "only one ddos-protection provider is supported, relation {} is in use",
                        first
                    ),
                );
            }
            Some(Ok(data)) => admitted = Some((relation.id, data)),
        }
    }

    admitted.map(|(_, data)| data)
}
