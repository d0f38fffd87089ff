use crate::databag::DatabagModel;
use crate::interfaces::endpoints;
use crate::interfaces::haproxy_route::RouteRequirerUnitData;
use crate::interfaces::haproxy_route_tcp::HaproxyRouteTcpRequirerAppData;
use crate::model::Relation;
use crate::state::assembly::{Assembly, Side, load_units, servers_for};
use crate::state::{RejectionKind, TcpBackend};
use std::net::IpAddr;
use tracing::debug;

/// Candidate backends of every `haproxy-route-tcp` relation, in relation
/// order.
pub(crate) fn collect(assembly: &mut Assembly<'_>) -> Vec<TcpBackend> {
    let snapshot = assembly.snapshot;
    let mut candidates = Vec::new();

    for relation in snapshot.relations(endpoints::HAPROXY_ROUTE_TCP) {
        if relation.app_data.is_empty() {
            debug!(relation_id = relation.id.get(), "haproxy-route-tcp data not published yet");
            continue;
        }
        match candidate(relation) {
            Ok(backend) => candidates.push(backend),
            Err(reason) => assembly.reject_relation(
                relation,
                Side::Tcp,
                RejectionKind::InvalidData,
                reason,
            ),
        }
    }

    candidates
}

fn candidate(relation: &Relation) -> Result<TcpBackend, String> {
    let data =
        HaproxyRouteTcpRequirerAppData::load(&relation.app_data).map_err(|e| e.to_string())?;

    let addresses: Vec<IpAddr> = if data.hosts.is_empty() {
        load_units::<RouteRequirerUnitData>(relation)?
            .into_iter()
            .map(|(_, unit)| unit.address)
            .collect()
    } else {
        data.hosts.clone()
    };

    let name = format!("{}_tcp_{}", relation.remote_app, relation.id);
    let backend_port = data.backend_port();
    let servers = servers_for(&name, &addresses, &[backend_port]);
    let stick_table = data
        .rate_limit
        .as_ref()
        .map(|_| format!("{}_rate_limit", name));

    Ok(TcpBackend {
        relation_id: relation.id,
        port: data.port,
        backend_port,
        sni: data.sni.clone(),
        enforce_tls: data.enforce_tls,
        terminate_tls: data.terminates_tls(),
        servers,
        check: data.check.clone(),
        load_balancing: data.load_balancing.clone().unwrap_or_default(),
        rate_limit: data.rate_limit.clone(),
        stick_table,
        bandwidth_limit: data.bandwidth_limit.clone(),
        retry: data.retry.clone(),
        timeout: data.timeout.clone().unwrap_or_default(),
        server_maxconn: data.server_maxconn,
        ip_deny_list: data.ip_deny_list.iter().map(|net| net.to_string()).collect(),
        name,
    })
}
