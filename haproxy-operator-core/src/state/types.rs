use crate::interfaces::ddos_protection::DdosProtectionProviderAppData;
use crate::interfaces::haproxy_route::{
    BandwidthLimit, LoadBalancingConfiguration, RateLimit, Retry, ServerHealthCheck,
    TimeoutConfiguration,
};
use crate::interfaces::haproxy_route_tcp::{TcpRateLimit, TcpServerHealthCheck};
use crate::interfaces::spoe_auth::SpoeAuthProviderAppData;
use crate::model::RelationId;
use crate::validation::ValidationReport;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;

/// Which family of templates drives the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProxyMode {
    HaproxyRoute,
    Ingress,
    IngressPerUnit,
    Legacy,
    Default,
}

impl fmt::Display for ProxyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HaproxyRoute => "haproxy-route",
            Self::Ingress => "ingress",
            Self::IngressPerUnit => "ingress-per-unit",
            Self::Legacy => "legacy",
            Self::Default => "default",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectionKind {
    /// The databags could not be decoded or failed record validation.
    InvalidData,
    /// No hostname declared and no external hostname configured.
    MissingHostname,
    /// HTTPS upstream without a trusted CA bundle.
    MissingCaBundle,
    /// Clashes with another admitted requirer.
    Conflict,
}

/// Why a relation contributes nothing to the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub relation_id: RelationId,
    pub endpoint: String,
    pub kind: RejectionKind,
    pub reason: String,
}

/// One `server` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Server {
    pub name: String,
    /// `host:port`, with IPv6 hosts bracketed.
    pub address: String,
    #[serde(skip)]
    pub unit_index: usize,
    #[serde(skip)]
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteRule {
    pub directive: &'static str,
    pub header: Option<String>,
    pub expression: String,
}

/// An admitted HTTP backend, whatever integration it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpBackend {
    pub relation_id: RelationId,
    pub endpoint: String,
    /// Requirer unit, for backends that route to a single unit.
    #[serde(skip)]
    pub unit: Option<String>,
    pub name: String,
    /// Host ACL values: declared hostnames, or the external hostname.
    pub hostnames: Vec<String>,
    /// Path prefixes, always starting with `/`.
    pub paths: Vec<String>,
    pub deny_paths: Vec<String>,
    pub servers: Vec<Server>,
    pub https: bool,
    /// CA file used to verify HTTPS upstreams.
    pub ca_file: Option<String>,
    pub rewrites: Vec<RewriteRule>,
    pub check: Option<ServerHealthCheck>,
    pub load_balancing: LoadBalancingConfiguration,
    pub rate_limit: Option<RateLimit>,
    pub stick_table: Option<String>,
    pub bandwidth_limit: Option<BandwidthLimit>,
    pub retry: Option<Retry>,
    pub redispatch: bool,
    pub timeout: TimeoutConfiguration,
    pub server_maxconn: Option<u32>,
    pub allow_http: bool,
    pub external_grpc_port: Option<u16>,
    pub http_server_close: bool,
    /// Name of the SPOE agent guarding this backend's hostnames.
    pub spoe_agent: Option<String>,
}

impl HttpBackend {
    /// Deepest path in `/`-separated segments, 0 when no path is declared.
    pub fn max_path_depth(&self) -> usize {
        self.paths
            .iter()
            .map(|p| p.split('/').filter(|s| !s.is_empty()).count())
            .max()
            .unwrap_or(0)
    }

    /// `https://<host><path>` for every hostname and path, hostname first.
    pub fn urls(&self) -> Vec<String> {
        let mut urls = Vec::new();
        for hostname in &self.hostnames {
            if self.paths.is_empty() {
                urls.push(format!("https://{}/", hostname));
            }
            for path in &self.paths {
                urls.push(format!("https://{}{}", hostname, path));
            }
        }
        urls
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TcpBackend {
    pub relation_id: RelationId,
    pub name: String,
    pub port: u16,
    pub backend_port: u16,
    pub sni: Option<String>,
    pub enforce_tls: bool,
    pub terminate_tls: bool,
    pub servers: Vec<Server>,
    pub check: Option<TcpServerHealthCheck>,
    pub load_balancing: LoadBalancingConfiguration,
    pub rate_limit: Option<TcpRateLimit>,
    pub stick_table: Option<String>,
    pub bandwidth_limit: Option<BandwidthLimit>,
    pub retry: Option<Retry>,
    pub timeout: TimeoutConfiguration,
    pub server_maxconn: Option<u32>,
    pub ip_deny_list: Vec<String>,
}

/// All admitted TCP backends bound to one port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TcpFrontend {
    pub port: u16,
    pub terminate_tls: bool,
    pub enforce_tls: bool,
    pub backends: Vec<TcpBackend>,
}

impl TcpFrontend {
    pub fn routes_by_sni(&self) -> bool {
        self.backends.iter().any(|b| b.sni.is_some())
    }

    /// Sample fetch that yields the SNI at routing time.
    pub fn sni_fetch(&self) -> &'static str {
        if self.terminate_tls {
            "ssl_fc_sni"
        } else {
            "req_ssl_sni"
        }
    }

    /// Content inspection is needed whenever routing or rejection looks
    /// into the TLS ClientHello before forwarding.
    pub fn needs_inspect_delay(&self) -> bool {
        self.routes_by_sni() || (self.enforce_tls && !self.terminate_tls)
    }

    /// Rule dropping connections that do not meet the TLS requirement.
    pub fn reject_rule(&self) -> Option<String> {
        if !self.enforce_tls {
            return None;
        }
        if self.routes_by_sni() {
            Some(format!(
                "tcp-request content reject unless {{ {} -m found }}",
                self.sni_fetch()
            ))
        } else if !self.terminate_tls {
            Some("tcp-request content reject unless { req_ssl_hello_type 1 }".to_string())
        } else {
            None
        }
    }

    pub fn default_backend(&self) -> Option<&TcpBackend> {
        self.backends.iter().find(|b| b.sni.is_none())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Peer {
    pub name: String,
    pub address: IpAddr,
}

/// An admitted OIDC agent reached through SPOE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpoeAgent {
    pub relation_id: RelationId,
    pub name: String,
    pub config: SpoeAuthProviderAppData,
    pub agent_servers: Vec<Server>,
    pub callback_servers: Vec<Server>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyServerLine {
    pub name: String,
    pub address: String,
    pub options: Vec<String>,
}

/// One service of the legacy interface: its own listening socket and pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyFrontend {
    pub name: String,
    pub bind_address: String,
    pub port: u16,
    pub service_options: Vec<String>,
    pub servers: Vec<LegacyServerLine>,
    #[serde(skip)]
    pub relation_ids: BTreeSet<RelationId>,
}

/// Aggregate of every admitted requirer, derived fresh on each reconcile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequirersInformation {
    pub backends: Vec<HttpBackend>,
    pub tcp_frontends: Vec<TcpFrontend>,
    pub stick_table_entries: Vec<String>,
    pub peers: Vec<Peer>,
    pub relation_ids_with_invalid_data: BTreeSet<RelationId>,
    pub relation_ids_with_invalid_data_tcp: BTreeSet<RelationId>,
    pub rejections: Vec<Rejection>,
}

impl RequirersInformation {
    pub fn backend(&self, name: &str) -> Option<&HttpBackend> {
        self.backends.iter().find(|b| b.name == name)
    }

    pub fn tcp_backends(&self) -> impl Iterator<Item = &TcpBackend> {
        self.tcp_frontends.iter().flat_map(|f| f.backends.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty() && self.tcp_frontends.is_empty()
    }
}

/// Everything the renderer and the publishers need for one reconcile.
#[derive(Debug, Clone)]
pub struct ProxyState {
    pub mode: ProxyMode,
    pub requirers: RequirersInformation,
    pub legacy: Vec<LegacyFrontend>,
    pub spoe_agents: Vec<SpoeAgent>,
    pub ddos: Option<DdosProtectionProviderAppData>,
    /// Trusted CA certificates received from providers, sorted.
    pub ca_certificates: BTreeSet<String>,
    pub report: ValidationReport,
    /// Human message when the configuration must not be applied at all.
    pub blocking: Option<String>,
}

impl ProxyState {
    pub fn has_ca_bundle(&self) -> bool {
        !self.ca_certificates.is_empty()
    }
}
