//! Template views.
//!
//! Templates only iterate and print: every decision that depends on requirer
//! options or charm config is taken here.

use crate::model::ModelSnapshot;
use crate::render::lines;
use crate::settings::OperatorSettings;
use crate::state::{HttpBackend, LegacyFrontend, ProxyState, SpoeAgent, TcpFrontend, peer_name};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::Path;

const HSTS_HEADER: &str = "Strict-Transport-Security \"max-age=2592000\"";
const DDOS_COUNTERS: &str = "conn_rate(60s),conn_cur,http_req_rate(60s),http_err_rate(60s)";
const RATE_LIMIT_COUNTERS: &str = "conn_rate(60s)";

#[derive(Debug, Serialize)]
struct GlobalView {
    maxconn: u32,
    user: String,
    dhparam_file: String,
    local_peer: Option<String>,
}

#[derive(Debug, Serialize)]
struct TlsView<'a> {
    enabled: bool,
    certs_dir: &'a Path,
}

#[derive(Debug, Serialize)]
struct DdosView {
    lines: Vec<String>,
    /// `stick-table` line of the tracking table, when any counter is limited.
    table: Option<String>,
}

#[derive(Debug, Serialize)]
struct PeerView {
    name: String,
    address: String,
}

#[derive(Debug, Serialize)]
struct HttpBackendView {
    name: String,
    hosts: String,
    paths: String,
    deny_paths: String,
    redirect_https: bool,
    condition: String,
    lines: Vec<String>,
    servers: Vec<String>,
    grpc_port: Option<u16>,
}

#[derive(Debug, Serialize)]
struct TcpBackendView {
    name: String,
    lines: Vec<String>,
    servers: Vec<String>,
}

#[derive(Debug, Serialize)]
struct TcpFrontendView {
    name: String,
    bind: String,
    inspect_delay: bool,
    rules: Vec<String>,
    routes: Vec<String>,
    default_backend: Option<String>,
    backends: Vec<TcpBackendView>,
}

#[derive(Debug, Serialize)]
struct StickTableView {
    name: String,
    line: String,
}

#[derive(Debug, Serialize)]
struct LegacyView {
    name: String,
    bind: String,
    options: Vec<String>,
    servers: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SpoeView {
    name: String,
    hostname: String,
    callback_path: String,
    authenticated_var: String,
    redirect_var: String,
    message_name: String,
    cookie_name: String,
    event: &'static str,
    servers: Vec<String>,
    callback_servers: Vec<String>,
}

/// Everything `haproxy.cfg.j2` and `spoe_auth.conf.j2` read. Optional views
/// are always serialized so that strict undefined checks stay meaningful.
#[derive(Debug, Serialize)]
pub(crate) struct RenderContext<'a> {
    global: GlobalView,
    mode: String,
    tls: TlsView<'a>,
    ddos: Option<DdosView>,
    hsts: Vec<String>,
    peers: Vec<PeerView>,
    peers_section: &'static str,
    http: Vec<HttpBackendView>,
    tcp: Vec<TcpFrontendView>,
    stick_tables: Vec<StickTableView>,
    legacy: Vec<LegacyView>,
    spoe: Vec<SpoeView>,
    spoe_file: String,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn build(
        snapshot: &ModelSnapshot,
        settings: &'a OperatorSettings,
        state: &ProxyState,
        tls_enabled: bool,
    ) -> Self {
        let info = &state.requirers;
        let config = &snapshot.config;
        let replicated = !info.peers.is_empty();
        let local_peer = peer_name(&snapshot.unit_name);

        let global = GlobalView {
            maxconn: config.global_maxconn,
            user: settings.haproxy_user.clone(),
            dhparam_file: settings.dhparam_path().display().to_string(),
            local_peer: info
                .peers
                .iter()
                .any(|p| p.name == local_peer)
                .then_some(local_peer),
        };

        let peers = info
            .peers
            .iter()
            .map(|peer| PeerView {
                name: peer.name.clone(),
                address: SocketAddr::new(peer.address, config.peer_port).to_string(),
            })
            .collect();

        let ddos = (!config.disable_ddos_protection).then(|| ddos_view(state, replicated));
        let hsts = if config.enable_hsts && tls_enabled {
            hsts_lines(&info.backends)
        } else {
            Vec::new()
        };

        let mut stick_tables: Vec<StickTableView> = info
            .stick_table_entries
            .iter()
            .map(|name| StickTableView {
                name: name.clone(),
                line: lines::stick_table(RATE_LIMIT_COUNTERS, replicated),
            })
            .collect();
        if let Some(line) = ddos.as_ref().and_then(|d| d.table.clone()) {
            stick_tables.push(StickTableView {
                name: lines::DDOS_TABLE.to_string(),
                line,
            });
        }

        Self {
            global,
            mode: state.mode.to_string(),
            tls: TlsView {
                enabled: tls_enabled,
                certs_dir: &settings.certs_dir,
            },
            ddos,
            hsts,
            peers,
            peers_section: lines::PEERS_SECTION,
            http: info
                .backends
                .iter()
                .map(|b| http_view(b, tls_enabled))
                .collect(),
            tcp: info
                .tcp_frontends
                .iter()
                .filter(|f| tls_enabled || !f.terminate_tls)
                .map(|f| tcp_view(f, &settings.certs_dir))
                .collect(),
            stick_tables,
            legacy: state.legacy.iter().map(legacy_view).collect(),
            spoe: state.spoe_agents.iter().map(spoe_view).collect(),
            spoe_file: settings.spoe_auth_path().display().to_string(),
        }
    }

    pub(crate) fn has_spoe(&self) -> bool {
        !self.spoe.is_empty()
    }
}

fn ddos_view(state: &ProxyState, replicated: bool) -> DdosView {
    let mut lines = lines::ddos_baseline();
    let mut table = None;
    if let Some(ddos) = &state.ddos {
        lines.extend(lines::ddos_limits(ddos));
        if ddos.tracks_clients() {
            table = Some(lines::stick_table(DDOS_COUNTERS, replicated));
        }
    }
    DdosView { lines, table }
}

/// HSTS for TLS traffic, except on hosts some backend also serves over
/// plain HTTP.
fn hsts_lines(backends: &[HttpBackend]) -> Vec<String> {
    let mut exempt: Vec<&str> = backends
        .iter()
        .filter(|b| b.allow_http)
        .flat_map(|b| b.hostnames.iter().map(String::as_str))
        .collect();
    exempt.sort_unstable();
    exempt.dedup();

    if exempt.is_empty() {
        return vec![format!(
            "http-response set-header {} if {{ ssl_fc }}",
            HSTS_HEADER
        )];
    }
    vec![
        "http-request set-var(txn.host) hdr(host)".to_string(),
        format!(
            "http-response set-header {} if {{ ssl_fc }} !{{ var(txn.host) -m str {} }}",
            HSTS_HEADER,
            exempt.join(" ")
        ),
    ]
}

fn http_view(backend: &HttpBackend, tls_enabled: bool) -> HttpBackendView {
    HttpBackendView {
        name: backend.name.clone(),
        hosts: backend.hostnames.join(" "),
        paths: backend.paths.join(" "),
        deny_paths: backend.deny_paths.join(" "),
        redirect_https: tls_enabled && !backend.allow_http,
        condition: lines::http_condition(backend),
        lines: lines::http_backend(backend),
        servers: lines::http_servers(backend),
        grpc_port: backend.external_grpc_port.filter(|_| tls_enabled),
    }
}

fn tcp_view(frontend: &TcpFrontend, certs_dir: &Path) -> TcpFrontendView {
    let mut bind = format!("[::]:{} v4v6", frontend.port);
    if frontend.terminate_tls {
        bind.push_str(&format!(" ssl crt {}", certs_dir.display()));
    }

    let mut rules: Vec<String> = frontend.reject_rule().into_iter().collect();
    if frontend.routes_by_sni() && !frontend.terminate_tls {
        rules.push("tcp-request content accept if { req_ssl_hello_type 1 }".to_string());
    }

    let fetch = frontend.sni_fetch();
    let routes = frontend
        .backends
        .iter()
        .filter_map(|b| {
            b.sni
                .as_deref()
                .map(|sni| format!("use_backend {} if {}", b.name, lines::sni_condition(fetch, sni)))
        })
        .collect();

    TcpFrontendView {
        name: format!("haproxy_route_tcp_{}", frontend.port),
        bind,
        inspect_delay: frontend.needs_inspect_delay(),
        rules,
        routes,
        default_backend: frontend.default_backend().map(|b| b.name.clone()),
        backends: frontend
            .backends
            .iter()
            .map(|b| TcpBackendView {
                name: b.name.clone(),
                lines: lines::tcp_backend(b),
                servers: lines::tcp_servers(b),
            })
            .collect(),
    }
}

fn legacy_view(frontend: &LegacyFrontend) -> LegacyView {
    LegacyView {
        name: frontend.name.clone(),
        bind: format!("{}:{}", frontend.bind_address, frontend.port),
        options: frontend.service_options.clone(),
        servers: frontend
            .servers
            .iter()
            .map(|server| {
                let mut line = format!("server {} {}", server.name, server.address);
                for option in &server.options {
                    line.push(' ');
                    line.push_str(option);
                }
                line
            })
            .collect(),
    }
}

fn spoe_view(agent: &SpoeAgent) -> SpoeView {
    let config = &agent.config;
    SpoeView {
        name: agent.name.clone(),
        hostname: config.hostname.clone(),
        callback_path: config.oidc_callback_path.clone(),
        authenticated_var: config.authenticated_var(&agent.name),
        redirect_var: config.redirect_url_var(&agent.name),
        message_name: config.message_name.clone(),
        cookie_name: config.cookie_name.clone(),
        event: config.event.as_str(),
        servers: lines::plain_servers(&agent.agent_servers),
        callback_servers: lines::plain_servers(&agent.callback_servers),
    }
}
