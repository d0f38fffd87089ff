use crate::interfaces::endpoints;
use crate::interfaces::spoe_auth::{SpoeAuthProviderAppData, SpoeAuthProviderUnitData};
use crate::state::assembly::{Assembly, Side, load_app, load_units, servers_for};
use crate::state::{HttpBackend, RejectionKind, SpoeAgent};
use std::net::IpAddr;
use tracing::info;

/// Admitted authentication agents; hostnames must be unique across agents.
pub(crate) fn collect(assembly: &mut Assembly<'_>) -> Vec<SpoeAgent> {
    let snapshot = assembly.snapshot;
    let mut agents: Vec<SpoeAgent> = Vec::new();

    for relation in snapshot.relations(endpoints::SPOE_AUTH) {
        let config = match load_app::<SpoeAuthProviderAppData>(relation) {
            None => continue,
            Some(Ok(config)) => config,
            Some(Err(reason)) => {
                assembly.reject_relation(relation, Side::Http, RejectionKind::InvalidData, reason);
                continue;
            }
        };

        if let Some(other) = agents.iter().find(|a| a.config.hostname == config.hostname) {
            let reason = format!(
                "hostname {} is already protected by relation {}",
                config.hostname, other.relation_id
            );
            assembly.reject_relation(relation, Side::Http, RejectionKind::Conflict, reason);
            continue;
        }

        let addresses: Vec<IpAddr> = match load_units::<SpoeAuthProviderUnitData>(relation) {
            Ok(units) => units.into_iter().map(|(_, unit)| unit.address).collect(),
            Err(reason) => {
                assembly.reject_relation(relation, Side::Http, RejectionKind::InvalidData, reason);
                continue;
            }
        };

        let name = format!("spoe_auth_{}", relation.id);
        let callback_name = format!("{}_callback", name);
        agents.push(SpoeAgent {
            relation_id: relation.id,
            agent_servers: servers_for(&name, &addresses, &[config.spop_port]),
            callback_servers: servers_for(&callback_name, &addresses, &[config.oidc_callback_port]),
            name,
            config,
        });
    }

    agents
}

/// Attach each agent to the backends serving its hostname.
pub(crate) fn protect(backends: &mut [HttpBackend], agents: &[SpoeAgent]) {
    for backend in backends.iter_mut() {
        if let Some(agent) = agents
            .iter()
            .find(|a| backend.hostnames.contains(&a.config.hostname))
        {
            info!(
                backend = backend.name.as_str(),
                agent = agent.name.as_str(),
                "backend protected by spoe authentication"
            );
            backend.spoe_agent = Some(agent.name.clone());
        }
    }
}
