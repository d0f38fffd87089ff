use crate::databag::DatabagModel;
use crate::interfaces::endpoints;
use crate::interfaces::ingress::{IngressRequirerAppData, IngressRequirerUnitData, IngressScheme};
use crate::interfaces::ingress_per_unit::IngressPerUnitRequirerUnitData;
use crate::model::Relation;
use crate::state::assembly::{Assembly, Side, load_app, load_units};
use crate::state::{HttpBackend, RejectionKind, RewriteRule, Server};
use std::net::SocketAddr;

const SYSTEM_CA: &str = "@system-ca";

/// Shared shape of the traefik-style routes: one path prefix on the
/// external hostname.
struct IngressRoute<'r> {
    relation: &'r Relation,
    unit: Option<String>,
    name: String,
    scheme: IngressScheme,
    strip_prefix: bool,
    redirect_https: bool,
    servers: Vec<Server>,
}

fn server_address(host: &str, port: u16) -> String {
    match host.parse() {
        Ok(ip) => SocketAddr::new(ip, port).to_string(),
        Err(_) => format!("{}:{}", host, port),
    }
}

fn into_backend(assembly: &Assembly<'_>, route: IngressRoute<'_>) -> HttpBackend {
    let prefix = format!("/{}", route.name);
    let rewrites = if route.strip_prefix {
        vec![RewriteRule {
            directive: "set-path",
            header: None,
            expression: format!("%[path,regsub(^{}/?,/)]", prefix),
        }]
    } else {
        Vec::new()
    };

    let https = route.scheme == IngressScheme::Https;
    let ca_file = https.then(|| {
        if assembly.ca_certificates.is_empty() {
            SYSTEM_CA.to_string()
        } else {
            assembly.settings.ca_bundle_path().display().to_string()
        }
    });

    HttpBackend {
        relation_id: route.relation.id,
        endpoint: route.relation.endpoint.clone(),
        unit: route.unit,
        hostnames: assembly.external_hostname().map(str::to_string).into_iter().collect(),
        paths: vec![prefix],
        deny_paths: Vec::new(),
        servers: route.servers,
        https,
        ca_file,
        rewrites,
        check: None,
        load_balancing: Default::default(),
        rate_limit: None,
        stick_table: None,
        bandwidth_limit: None,
        retry: None,
        redispatch: false,
        timeout: Default::default(),
        server_maxconn: None,
        allow_http: !route.redirect_https,
        external_grpc_port: None,
        http_server_close: false,
        spoe_agent: None,
        name: route.name,
    }
}

/// One backend per `ingress` relation, served under `/<model>-<app>`.
pub(crate) fn collect_ingress(assembly: &mut Assembly<'_>) -> Vec<HttpBackend> {
    let snapshot = assembly.snapshot;
    let mut candidates = Vec::new();

    for relation in snapshot.relations(endpoints::INGRESS) {
        let data = match load_app::<IngressRequirerAppData>(relation) {
            None => continue,
            Some(Ok(data)) => data,
            Some(Err(reason)) => {
                assembly.reject_relation(relation, Side::Http, RejectionKind::InvalidData, reason);
                continue;
            }
        };
        let units = match load_units::<IngressRequirerUnitData>(relation) {
            Ok(units) => units,
            Err(reason) => {
                assembly.reject_relation(relation, Side::Http, RejectionKind::InvalidData, reason);
                continue;
            }
        };

        let name = data.route_name();
        let servers = units
            .iter()
            .enumerate()
            .map(|(unit_index, (_, unit))| {
                let address = match unit.ip {
                    Some(ip) => SocketAddr::new(ip, data.port).to_string(),
                    None => server_address(&unit.host, data.port),
                };
                Server {
                    name: format!("{}_{}_{}", name, data.port, unit_index),
                    address,
                    unit_index,
                    port: data.port,
                }
            })
            .collect();

        let route = IngressRoute {
            relation,
            unit: None,
            name,
            scheme: data.scheme,
            strip_prefix: data.strip_prefix,
            redirect_https: data.redirect_https,
            servers,
        };
        candidates.push(into_backend(assembly, route));
    }

    candidates
}

/// One backend per requirer unit of every `ingress-per-unit` relation.
/// Invalid units are rejected individually; the rest of the relation still
/// gets routes.
pub(crate) fn collect_ingress_per_unit(assembly: &mut Assembly<'_>) -> Vec<HttpBackend> {
    let snapshot = assembly.snapshot;
    let mut candidates = Vec::new();

    for relation in snapshot.relations(endpoints::INGRESS_PER_UNIT) {
        for (unit_name, databag) in relation.ordered_units() {
            if databag.is_empty() {
                continue;
            }
            let data = match IngressPerUnitRequirerUnitData::load(databag) {
                Ok(data) => data,
                Err(e) => {
                    assembly.reject_relation(
                        relation,
                        Side::Http,
                        RejectionKind::InvalidData,
                        format!("unit {}: {}", unit_name, e),
                    );
                    continue;
                }
            };

            let name = data.route_name();
            let server = Server {
                name: format!("{}_{}_0", name, data.port),
                address: server_address(&data.host, data.port),
                unit_index: 0,
                port: data.port,
            };
            let route = IngressRoute {
                relation,
                unit: Some(unit_name.to_string()),
                name,
                scheme: data.scheme,
                strip_prefix: data.strip_prefix,
                redirect_https: data.redirect_https,
                servers: vec![server],
            };
            candidates.push(into_backend(assembly, route));
        }
    }

    candidates
}
