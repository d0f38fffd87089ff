//! Cross-relation conflict resolution.
//!
//! Collectors validate each relation in isolation. The arbiter then looks at
//! all candidates together and rejects the ones that clash, always keeping
//! the relation with the lowest id.

use crate::interfaces::endpoints;
use crate::state::assembly::{Assembly, Side};
use crate::state::{HttpBackend, RejectionKind, TcpBackend, TcpFrontend};
use crate::validation::Origin;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

const RESERVED_HTTP_PORTS: [u16; 2] = [80, 443];

/// Sections the generated configuration declares for itself.
const RESERVED_SECTIONS: [&str; 2] = ["default", "ddos_protection"];
const RESERVED_PREFIXES: [&str; 2] = ["spoe_auth_", "haproxy_route_tcp_"];
const RESERVED_SUFFIXES: [&str; 1] = ["_rate_limit"];

/// Resolve HTTP and TCP candidates of the haproxy-route mode.
pub(crate) fn arbitrate(
    assembly: &mut Assembly<'_>,
    http: Vec<HttpBackend>,
    tcp: Vec<TcpBackend>,
) -> (Vec<HttpBackend>, Vec<TcpFrontend>) {
    let http = unique_services(assembly, http);
    let http = unique_grpc_ports(assembly, http);
    let (http, tcp) = grpc_port_collisions(assembly, http, tcp);
    let tcp = reserved_ports(assembly, tcp, !http.is_empty());
    let tcp = shared_ports(assembly, tcp);

    let http = order_and_warn(assembly, http);
    (http, tcp)
}

/// Resolve HTTP candidates of the ingress modes.
pub(crate) fn admit_http(assembly: &mut Assembly<'_>, http: Vec<HttpBackend>) -> Vec<HttpBackend> {
    let http = unique_services(assembly, http);
    order_and_warn(assembly, http)
}

fn reject_http(assembly: &mut Assembly<'_>, backend: &HttpBackend, reason: String) {
    assembly.reject(
        backend.relation_id,
        &backend.endpoint,
        Side::Http,
        RejectionKind::Conflict,
        reason,
    );
}

fn reject_tcp(assembly: &mut Assembly<'_>, backend: &TcpBackend, reason: String) {
    assembly.reject(
        backend.relation_id,
        endpoints::HAPROXY_ROUTE_TCP,
        Side::Tcp,
        RejectionKind::Conflict,
        reason,
    );
}

fn unique_services(assembly: &mut Assembly<'_>, http: Vec<HttpBackend>) -> Vec<HttpBackend> {
    let mut owners: BTreeMap<String, u32> = BTreeMap::new();
    let mut admitted = Vec::with_capacity(http.len());

    for backend in http {
        if is_reserved_name(&backend.name) {
            let reason = format!("service name '{}' is reserved", backend.name);
            reject_http(assembly, &backend, reason);
            continue;
        }
        match owners.get(&backend.name) {
            Some(owner) => {
                let reason = format!(
                    "service '{}' is already provided by relation {}",
                    backend.name, owner
                );
                reject_http(assembly, &backend, reason);
            }
            None => {
                owners.insert(backend.name.clone(), backend.relation_id.get());
                admitted.push(backend);
            }
        }
    }
    admitted
}

/// Names that would clash with a section emitted for another purpose: the
/// fallback backend, stick tables, SPOE agents and TCP routes.
fn is_reserved_name(name: &str) -> bool {
    RESERVED_SECTIONS.contains(&name)
        || RESERVED_PREFIXES.iter().any(|p| name.starts_with(p))
        || RESERVED_SUFFIXES.iter().any(|s| name.ends_with(s))
        || is_tcp_backend_name(name)
}

/// TCP route backends are named `<app>_tcp_<relation id>`.
fn is_tcp_backend_name(name: &str) -> bool {
    name.rsplit_once("_tcp_").is_some_and(|(app, id)| {
        !app.is_empty() && !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
    })
}

fn unique_grpc_ports(assembly: &mut Assembly<'_>, http: Vec<HttpBackend>) -> Vec<HttpBackend> {
    let mut owners: BTreeMap<u16, String> = BTreeMap::new();
    let mut admitted = Vec::with_capacity(http.len());

    for backend in http {
        let Some(port) = backend.external_grpc_port else {
            admitted.push(backend);
            continue;
        };
        match owners.get(&port) {
            Some(owner) => {
                let reason = format!(
                    "external gRPC port {} is already used by service '{}'",
                    port, owner
                );
                reject_http(assembly, &backend, reason);
            }
            None => {
                owners.insert(port, backend.name.clone());
                admitted.push(backend);
            }
        }
    }
    admitted
}

/// A TCP port equal to an HTTP backend's external gRPC port invalidates both.
fn grpc_port_collisions(
    assembly: &mut Assembly<'_>,
    http: Vec<HttpBackend>,
    tcp: Vec<TcpBackend>,
) -> (Vec<HttpBackend>, Vec<TcpBackend>) {
    let tcp_ports: BTreeSet<u16> = tcp.iter().map(|t| t.port).collect();
    let grpc_ports: BTreeSet<u16> = http.iter().filter_map(|b| b.external_grpc_port).collect();

    let mut admitted_http = Vec::with_capacity(http.len());
    for backend in http {
        match backend.external_grpc_port {
            Some(port) if tcp_ports.contains(&port) => {
                let reason = format!("external gRPC port {} collides with a TCP route", port);
                reject_http(assembly, &backend, reason);
            }
            _ => admitted_http.push(backend),
        }
    }

    let mut admitted_tcp = Vec::with_capacity(tcp.len());
    for backend in tcp {
        if grpc_ports.contains(&backend.port) {
            let reason = format!(
                "port {} collides with the external gRPC port of an HTTP route",
                backend.port
            );
            reject_tcp(assembly, &backend, reason);
        } else {
            admitted_tcp.push(backend);
        }
    }

    (admitted_http, admitted_tcp)
}

/// 80 and 443 belong to the HTTP frontends once any HTTP route is admitted;
/// the peer port always belongs to stick-table replication.
fn reserved_ports(
    assembly: &mut Assembly<'_>,
    tcp: Vec<TcpBackend>,
    serves_http: bool,
) -> Vec<TcpBackend> {
    let peer_port = assembly.snapshot.config.peer_port;
    let mut admitted = Vec::with_capacity(tcp.len());

    for backend in tcp {
        if serves_http && RESERVED_HTTP_PORTS.contains(&backend.port) {
            let reason = format!("port {} is reserved for HTTP routes", backend.port);
            reject_tcp(assembly, &backend, reason);
        } else if backend.port == peer_port {
            let reason = format!("port {} is reserved for peer replication", backend.port);
            reject_tcp(assembly, &backend, reason);
        } else {
            admitted.push(backend);
        }
    }
    admitted
}

/// Group TCP backends by port. Sharing a port requires every sharer to route
/// by a distinct SNI; among sharers, terminating backends win.
fn shared_ports(assembly: &mut Assembly<'_>, tcp: Vec<TcpBackend>) -> Vec<TcpFrontend> {
    let mut by_port: BTreeMap<u16, Vec<TcpBackend>> = BTreeMap::new();
    for backend in tcp {
        by_port.entry(backend.port).or_default().push(backend);
    }

    let mut frontends = Vec::with_capacity(by_port.len());
    for (port, candidates) in by_port {
        let mut admitted: Vec<TcpBackend> = Vec::with_capacity(candidates.len());

        for backend in candidates {
            let Some(first) = admitted.first() else {
                admitted.push(backend);
                continue;
            };
            let all_sni = admitted.iter().all(|b| b.sni.is_some());
            let duplicate_sni = admitted.iter().any(|b| b.sni == backend.sni);

            if backend.sni.is_none() || !all_sni || duplicate_sni {
                let reason = format!(
                    "port {} is already used by relation {} without a distinct sni",
                    port, first.relation_id
                );
                reject_tcp(assembly, &backend, reason);
            } else {
                admitted.push(backend);
            }
        }

        if admitted.iter().any(|b| b.terminate_tls) {
            let (terminating, passthrough): (Vec<_>, Vec<_>) =
                admitted.into_iter().partition(|b| b.terminate_tls);
            for backend in &passthrough {
                let reason = format!(
                    "port {} is shared with TLS terminating routes; passthrough is not possible",
                    port
                );
                reject_tcp(assembly, backend, reason);
            }
            admitted = terminating;
        }

        admitted.sort_by(|a, b| a.name.cmp(&b.name));
        frontends.push(TcpFrontend {
            port,
            terminate_tls: admitted.iter().any(|b| b.terminate_tls),
            enforce_tls: admitted.iter().all(|b| b.enforce_tls),
            backends: admitted,
        });
    }
    frontends
}

/// Sort by descending path depth so that deeper prefixes match first, and
/// warn about routes that shadow each other.
fn order_and_warn(assembly: &mut Assembly<'_>, mut http: Vec<HttpBackend>) -> Vec<HttpBackend> {
    http.sort_by_key(|b| Reverse(b.max_path_depth()));

    for (i, first) in http.iter().enumerate() {
        for second in &http[i + 1..] {
            let Some(overlap) = overlap(first, second) else {
                continue;
            };
            let message = format!(
                "backends '{}' and '{}' both route {}; '{}' is matched first",
                first.name, second.name, overlap, first.name
            );
            warn!(
                first = first.name.as_str(),
                second = second.name.as_str(),
                "overlapping routes"
            );
            assembly.report.overlapping_routes(
                &message,
                &Origin::relation(&second.endpoint, second.relation_id),
            );
        }
    }
    http
}

fn overlap(a: &HttpBackend, b: &HttpBackend) -> Option<String> {
    let host = a.hostnames.iter().find(|h| b.hostnames.contains(h))?;
    if a.paths.is_empty() && b.paths.is_empty() {
        return Some(host.clone());
    }
    a.paths
        .iter()
        .find(|p| b.paths.contains(p))
        .map(|path| format!("{}{}", host, path))
}
