use crate::databag::DatabagModel;
use crate::interfaces::endpoints;
use crate::model::{ModelSnapshot, Relation, RelationId};
use crate::settings::OperatorSettings;
use crate::state::{
    ProxyMode, ProxyState, Rejection, RejectionKind, RequirersInformation, Server, arbiter, ca,
    ddos, ingress, legacy, mode, peers, route, route_tcp, spoe,
};
use crate::validation::{Origin, ValidationReport};
use std::collections::BTreeSet;
use std::net::{IpAddr, SocketAddr};
use tracing::{debug, info, warn};

/// Which invalid set a rejected relation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Http,
    Tcp,
}

/// Accumulates rejections and diagnostics while collectors walk the
/// snapshot.
pub(crate) struct Assembly<'a> {
    pub snapshot: &'a ModelSnapshot,
    pub settings: &'a OperatorSettings,
    pub ca_certificates: BTreeSet<String>,
    pub report: ValidationReport,
    pub info: RequirersInformation,
}

impl<'a> Assembly<'a> {
    pub fn new(snapshot: &'a ModelSnapshot, settings: &'a OperatorSettings) -> Self {
        Self {
            snapshot,
            settings,
            ca_certificates: BTreeSet::new(),
            report: ValidationReport::default(),
            info: RequirersInformation::default(),
        }
    }

    pub fn external_hostname(&self) -> Option<&str> {
        self.snapshot.config.external_hostname.as_deref()
    }

    pub fn reject(
        &mut self,
        relation_id: RelationId,
        endpoint: &str,
        side: Side,
        kind: RejectionKind,
        reason: impl Into<String>,
    ) {
        let reason = reason.into();
        warn!(
            relation_id = relation_id.get(),
            endpoint,
            reason = reason.as_str(),
            "relation data rejected"
        );

        self.report
            .rejected_relation(&reason, &Origin::relation(endpoint, relation_id));
        match side {
            Side::Http => self.info.relation_ids_with_invalid_data.insert(relation_id),
            Side::Tcp => self.info.relation_ids_with_invalid_data_tcp.insert(relation_id),
        };
        self.info.rejections.push(Rejection {
            relation_id,
            endpoint: endpoint.to_string(),
            kind,
            reason,
        });
    }

    pub fn reject_relation(
        &mut self,
        relation: &Relation,
        side: Side,
        kind: RejectionKind,
        reason: impl Into<String>,
    ) {
        self.reject(relation.id, &relation.endpoint, side, kind, reason);
    }
}

/// Decode the remote application databag. `None` while the remote side has
/// not published anything yet.
pub(crate) fn load_app<T: DatabagModel>(relation: &Relation) -> Option<Result<T, String>> {
    if relation.app_data.is_empty() {
        debug!(
            relation_id = relation.id.get(),
            endpoint = relation.endpoint.as_str(),
            "remote application data not published yet"
        );
        return None;
    }
    Some(T::load(&relation.app_data).map_err(|e| e.to_string()))
}

/// Decode every non-empty remote unit databag in unit order. A single
/// invalid unit fails the whole relation.
pub(crate) fn load_units<T: DatabagModel>(relation: &Relation) -> Result<Vec<(String, T)>, String> {
    let mut units = Vec::new();
    for (name, databag) in relation.ordered_units() {
        if databag.is_empty() {
            continue;
        }
        let data = T::load(databag).map_err(|e| format!("unit {}: {}", name, e))?;
        units.push((name.to_string(), data));
    }
    Ok(units)
}

/// One server per unit address and port, ordered by (unit index, port).
pub(crate) fn servers_for(name: &str, addresses: &[IpAddr], ports: &[u16]) -> Vec<Server> {
    let mut ports = ports.to_vec();
    ports.sort_unstable();
    ports.dedup();

    let mut servers = Vec::with_capacity(addresses.len() * ports.len());
    for (unit_index, address) in addresses.iter().enumerate() {
        for port in &ports {
            servers.push(Server {
                name: format!("{}_{}_{}", name, port, unit_index),
                address: SocketAddr::new(*address, *port).to_string(),
                unit_index,
                port: *port,
            });
        }
    }
    servers
}

pub(crate) fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

pub(crate) fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Build the aggregate state for one reconcile from a snapshot.
pub fn assemble(snapshot: &ModelSnapshot, settings: &OperatorSettings) -> ProxyState {
    let mut assembly = Assembly::new(snapshot, settings);
    snapshot.config.validate(&mut assembly.report);
    let config_error = assembly.report.first_error();

    let mode = mode::select_mode(snapshot);
    let mut blocking = config_error.or_else(|| mode::exclusive_conflict(snapshot));
    info!(mode = %mode, "selected proxy mode");

    assembly.ca_certificates = ca::collect(&mut assembly);
    let ddos = match mode {
        ProxyMode::Legacy => None,
        _ => ddos::collect(&mut assembly),
    };
    assembly.info.peers = peers::collect(snapshot);

    let mut legacy_frontends = Vec::new();
    let mut spoe_agents = Vec::new();

    match mode {
        ProxyMode::HaproxyRoute => {
            spoe_agents = spoe::collect(&mut assembly);
            let http = route::collect(&mut assembly);
            let tcp = route_tcp::collect(&mut assembly);
            let (mut backends, tcp_frontends) = arbiter::arbitrate(&mut assembly, http, tcp);
            spoe::protect(&mut backends, &spoe_agents);
            assembly.info.backends = backends;
            assembly.info.tcp_frontends = tcp_frontends;

            if blocking.is_none() {
                blocking = missing_hostname_blocks(&assembly);
            }
        }
        ProxyMode::Ingress | ProxyMode::IngressPerUnit => {
            if assembly.external_hostname().is_none() {
                let endpoint = if mode == ProxyMode::Ingress {
                    endpoints::INGRESS
                } else {
                    endpoints::INGRESS_PER_UNIT
                };
                blocking.get_or_insert_with(|| {
                    format!("external-hostname must be set to use the {} integration", endpoint)
                });
            } else {
                let candidates = if mode == ProxyMode::Ingress {
                    ingress::collect_ingress(&mut assembly)
                } else {
                    ingress::collect_ingress_per_unit(&mut assembly)
                };
                assembly.info.backends = arbiter::admit_http(&mut assembly, candidates);
            }
        }
        ProxyMode::Legacy => {
            legacy_frontends = legacy::collect(&mut assembly);
        }
        ProxyMode::Default => {}
    }

    assembly.info.stick_table_entries = stick_tables(&assembly.info);

    ProxyState {
        mode,
        requirers: assembly.info,
        legacy: legacy_frontends,
        spoe_agents,
        ddos,
        ca_certificates: assembly.ca_certificates,
        report: assembly.report,
        blocking,
    }
}

/// Without an external hostname, haproxy-route is only unusable when nothing
/// at all could be admitted because of it.
fn missing_hostname_blocks(assembly: &Assembly<'_>) -> Option<String> {
    let lacks_hostname = assembly
        .info
        .rejections
        .iter()
        .any(|r| r.kind == RejectionKind::MissingHostname);

    if assembly.info.is_empty() && lacks_hostname {
        Some(
            "external-hostname must be set: haproxy-route requirers declare no hostname"
                .to_string(),
        )
    } else {
        None
    }
}

fn stick_tables(info: &RequirersInformation) -> Vec<String> {
    let mut entries: Vec<String> = info
        .backends
        .iter()
        .filter_map(|b| b.stick_table.clone())
        .chain(info.tcp_backends().filter_map(|b| b.stick_table.clone()))
        .collect();
    entries.sort();
    entries
}
