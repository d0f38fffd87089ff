use crate::databag::DatabagModel;
use crate::interfaces::endpoints;
use crate::interfaces::haproxy_route::{
    HaproxyRouteRequirerAppData, HttpProtocol, RouteRequirerUnitData,
};
use crate::model::Relation;
use crate::state::assembly::{
    Assembly, Side, dedup_preserving_order, load_units, normalize_path, servers_for,
};
use crate::state::{HttpBackend, RejectionKind, RewriteRule};
use std::net::IpAddr;
use tracing::debug;

/// Candidate backends of every `haproxy-route` relation, in relation order.
/// Cross-relation checks happen later in the arbiter.
pub(crate) fn collect(assembly: &mut Assembly<'_>) -> Vec<HttpBackend> {
    let snapshot = assembly.snapshot;
    let mut candidates = Vec::new();

    for relation in snapshot.relations(endpoints::HAPROXY_ROUTE) {
        if relation.app_data.is_empty() {
            debug!(relation_id = relation.id.get(), "haproxy-route data not published yet");
            continue;
        }
        match candidate(assembly, relation) {
            Ok(backend) => candidates.push(backend),
            Err((kind, reason)) => assembly.reject_relation(relation, Side::Http, kind, reason),
        }
    }

    candidates
}

fn candidate(
    assembly: &Assembly<'_>,
    relation: &Relation,
) -> Result<HttpBackend, (RejectionKind, String)> {
    let invalid = |reason: String| (RejectionKind::InvalidData, reason);

    let data = HaproxyRouteRequirerAppData::load(&relation.app_data)
        .map_err(|e| invalid(e.to_string()))?;
    let units = load_units::<RouteRequirerUnitData>(relation).map_err(invalid)?;

    let mut hostnames = data.declared_hostnames();
    if hostnames.is_empty() {
        match assembly.external_hostname() {
            Some(hostname) => hostnames.push(hostname.to_string()),
            None => {
                return Err((
                    RejectionKind::MissingHostname,
                    "no hostname declared and external-hostname is not configured".to_string(),
                ));
            }
        }
    }

    let https = data.protocol == HttpProtocol::Https;
    let ca_file = if https {
        if assembly.ca_certificates.is_empty() {
            return Err((
                RejectionKind::MissingCaBundle,
                "https upstreams require trusted CAs from the receive-ca-certs integration"
                    .to_string(),
            ));
        }
        Some(assembly.settings.ca_bundle_path().display().to_string())
    } else {
        None
    };

    let addresses: Vec<IpAddr> = units.iter().map(|(_, unit)| unit.address).collect();
    let servers = servers_for(&data.service, &addresses, &data.ports);

    let rewrites = data
        .rewrites
        .iter()
        .map(|r| RewriteRule {
            directive: r.method.directive(),
            header: r.header.clone(),
            expression: r.expression.clone(),
        })
        .collect();

    let redispatch =
        data.retry_redispatch || data.retry.as_ref().is_some_and(|retry| retry.redispatch);
    let stick_table = data
        .rate_limit
        .as_ref()
        .map(|_| format!("{}_rate_limit", data.service));

    Ok(HttpBackend {
        relation_id: relation.id,
        endpoint: relation.endpoint.clone(),
        unit: None,
        hostnames: dedup_preserving_order(hostnames),
        paths: dedup_preserving_order(data.paths.iter().map(|p| normalize_path(p)).collect()),
        deny_paths: data.deny_paths.iter().map(|p| normalize_path(p)).collect(),
        servers,
        https,
        ca_file,
        rewrites,
        check: data.check.clone(),
        load_balancing: data.load_balancing.clone().unwrap_or_default(),
        rate_limit: data.rate_limit.clone(),
        stick_table,
        bandwidth_limit: data.bandwidth_limit.clone(),
        retry: data.retry.clone(),
        redispatch,
        timeout: data.timeout.clone().unwrap_or_default(),
        server_maxconn: data.server_maxconn,
        allow_http: data.allow_http,
        external_grpc_port: data.external_grpc_port,
        http_server_close: data.http_server_close,
        spoe_agent: None,
        name: data.service,
    })
}
