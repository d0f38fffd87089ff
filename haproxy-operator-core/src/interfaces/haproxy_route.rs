//! `haproxy-route`: HTTP routing requested by a requirer application.

use crate::databag::{DatabagModel, Violations};
use crate::interfaces::validators::has_line_break;
use crate::interfaces::{is_valid_fqdn, is_valid_identifier};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use url::Url;

const RESERVED_HTTP_PORTS: [u16; 2] = [80, 443];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpProtocol {
    #[default]
    Http,
    Https,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewriteMethod {
    SetPath,
    SetQuery,
    SetHeader,
}

impl RewriteMethod {
    pub fn directive(self) -> &'static str {
        match self {
            Self::SetPath => "set-path",
            Self::SetQuery => "set-query",
            Self::SetHeader => "set-header",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteConfiguration {
    pub method: RewriteMethod,
    pub expression: String,
    #[serde(default)]
    pub header: Option<String>,
}

impl RewriteConfiguration {
    fn validate(&self) -> Violations {
        let mut v = Violations::default();
        v.ensure(
            !has_line_break(&self.expression),
            "expression",
            "must not contain line breaks",
        );
        v.ensure(!self.expression.is_empty(), "expression", "must not be empty");

        match (self.method, &self.header) {
            (RewriteMethod::SetHeader, None) => v.push("header", "required by set-header"),
            (RewriteMethod::SetHeader, Some(header)) => v.ensure(
                is_valid_identifier(header),
                "header",
                format!("invalid header name '{}'", header),
            ),
            (_, Some(_)) => v.push("header", "only allowed with set-header"),
            (_, None) => {}
        }
        v
    }
}

fn default_check_interval() -> u32 {
    60
}

fn default_check_rise() -> u32 {
    2
}

fn default_check_fall() -> u32 {
    3
}

/// Active health check; `paths` switches the check to HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerHealthCheck {
    #[serde(default = "default_check_interval")]
    pub interval: u32,
    #[serde(default = "default_check_rise")]
    pub rise: u32,
    #[serde(default = "default_check_fall")]
    pub fall: u32,
    #[serde(default)]
    pub paths: Vec<String>,
}

impl Default for ServerHealthCheck {
    fn default() -> Self {
        Self {
            interval: default_check_interval(),
            rise: default_check_rise(),
            fall: default_check_fall(),
            paths: Vec::new(),
        }
    }
}

impl ServerHealthCheck {
    pub(crate) fn validate(&self) -> Violations {
        let mut v = Violations::default();
        v.ensure(self.interval > 0, "interval", "must be positive");
        v.ensure(self.rise > 0, "rise", "must be positive");
        v.ensure(self.fall > 0, "fall", "must be positive");
        for path in &self.paths {
            v.ensure(
                path.starts_with('/') && !path.contains(char::is_whitespace),
                "paths",
                format!("invalid health check path '{}'", path),
            );
        }
        v
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadBalancingAlgorithm {
    Leastconn,
    Source,
    #[default]
    Roundrobin,
    Cookie,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancingConfiguration {
    #[serde(default)]
    pub algorithm: LoadBalancingAlgorithm,
    #[serde(default)]
    pub cookie: Option<String>,
    #[serde(default)]
    pub consistent_hashing: bool,
}

impl LoadBalancingConfiguration {
    pub(crate) fn validate(&self) -> Violations {
        let mut v = Violations::default();
        let is_cookie = self.algorithm == LoadBalancingAlgorithm::Cookie;

        match &self.cookie {
            None if is_cookie => v.push("cookie", "required by the cookie algorithm"),
            Some(cookie) if !is_cookie => {
                v.push("cookie", format!("'{}' requires the cookie algorithm", cookie))
            }
            Some(cookie) => v.ensure(
                is_valid_identifier(cookie),
                "cookie",
                format!("invalid cookie name '{}'", cookie),
            ),
            None => {}
        }

        v.ensure(
            !self.consistent_hashing
                || matches!(
                    self.algorithm,
                    LoadBalancingAlgorithm::Cookie | LoadBalancingAlgorithm::Source
                ),
            "consistent_hashing",
            "only supported with the cookie or source algorithm",
        );
        v
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RateLimitPolicy {
    #[default]
    Deny,
    Reject,
    SilentDrop,
}

impl RateLimitPolicy {
    pub fn action(self) -> &'static str {
        match self {
            Self::Deny => "deny",
            Self::Reject => "reject",
            Self::SilentDrop => "silent-drop",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub connections_per_minute: u32,
    #[serde(default)]
    pub policy: RateLimitPolicy,
    #[serde(default)]
    pub reject_code: Option<u16>,
}

impl RateLimit {
    fn validate(&self) -> Violations {
        let mut v = Violations::default();
        v.ensure(
            self.connections_per_minute > 0,
            "connections_per_minute",
            "must be positive",
        );
        if let Some(code) = self.reject_code {
            v.ensure(
                self.policy == RateLimitPolicy::Deny,
                "reject_code",
                "only allowed with the deny policy",
            );
            v.ensure(
                (400..=599).contains(&code),
                "reject_code",
                format!("{} is not an HTTP error status", code),
            );
        }
        v
    }
}

/// Per-connection bandwidth caps in bytes per second.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthLimit {
    #[serde(default)]
    pub download: Option<u64>,
    #[serde(default)]
    pub upload: Option<u64>,
}

impl BandwidthLimit {
    pub(crate) fn validate(&self) -> Violations {
        let mut v = Violations::default();
        v.ensure(self.download != Some(0), "download", "must be positive");
        v.ensure(self.upload != Some(0), "upload", "must be positive");
        v
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retry {
    pub count: u32,
    /// Seconds to wait for each connection attempt.
    #[serde(default)]
    pub interval: Option<u32>,
    #[serde(default)]
    pub redispatch: bool,
}

impl Retry {
    pub(crate) fn validate(&self) -> Violations {
        let mut v = Violations::default();
        v.ensure(self.count > 0, "count", "must be positive");
        v.ensure(self.interval != Some(0), "interval", "must be positive");
        v
    }
}

fn default_timeout() -> u32 {
    60
}

/// Timeouts in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfiguration {
    #[serde(default = "default_timeout")]
    pub server: u32,
    #[serde(default = "default_timeout")]
    pub client: u32,
    #[serde(default = "default_timeout")]
    pub queue: u32,
}

impl Default for TimeoutConfiguration {
    fn default() -> Self {
        Self {
            server: default_timeout(),
            client: default_timeout(),
            queue: default_timeout(),
        }
    }
}

impl TimeoutConfiguration {
    pub(crate) fn validate(&self) -> Violations {
        let mut v = Violations::default();
        v.ensure(self.server > 0, "server", "must be positive");
        v.ensure(self.client > 0, "client", "must be positive");
        v.ensure(self.queue > 0, "queue", "must be positive");
        v
    }
}

/// Application databag of a `haproxy-route` requirer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaproxyRouteRequirerAppData {
    pub service: String,
    pub ports: Vec<u16>,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub deny_paths: Vec<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub additional_hostnames: Vec<String>,
    #[serde(default)]
    pub protocol: HttpProtocol,
    #[serde(default)]
    pub rewrites: Vec<RewriteConfiguration>,
    #[serde(default)]
    pub check: Option<ServerHealthCheck>,
    #[serde(default)]
    pub load_balancing: Option<LoadBalancingConfiguration>,
    #[serde(default)]
    pub rate_limit: Option<RateLimit>,
    #[serde(default)]
    pub bandwidth_limit: Option<BandwidthLimit>,
    #[serde(default)]
    pub retry: Option<Retry>,
    #[serde(default)]
    pub timeout: Option<TimeoutConfiguration>,
    #[serde(default)]
    pub server_maxconn: Option<u32>,
    #[serde(default)]
    pub allow_http: bool,
    #[serde(default)]
    pub external_grpc_port: Option<u16>,
    #[serde(default)]
    pub retry_redispatch: bool,
    #[serde(default)]
    pub http_server_close: bool,
}

impl HaproxyRouteRequirerAppData {
    /// Declared hostname followed by the additional ones.
    pub fn declared_hostnames(&self) -> Vec<String> {
        self.hostname
            .iter()
            .chain(self.additional_hostnames.iter())
            .cloned()
            .collect()
    }
}

fn validate_path(path: &str) -> Option<String> {
    if path.is_empty() || path.contains(char::is_whitespace) {
        Some(format!("invalid path '{}'", path))
    } else {
        None
    }
}

impl DatabagModel for HaproxyRouteRequirerAppData {
    const KEYS: &'static [&'static str] = &[
        "service",
        "ports",
        "paths",
        "deny_paths",
        "hostname",
        "additional_hostnames",
        "protocol",
        "rewrites",
        "check",
        "load_balancing",
        "rate_limit",
        "bandwidth_limit",
        "retry",
        "timeout",
        "server_maxconn",
        "allow_http",
        "external_grpc_port",
        "retry_redispatch",
        "http_server_close",
    ];

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut v = Violations::default();

        v.ensure(
            is_valid_identifier(&self.service),
            "service",
            format!("invalid service name '{}'", self.service),
        );
        v.ensure(!self.ports.is_empty(), "ports", "at least one port is required");
        v.ensure(
            !self.ports.contains(&0),
            "ports",
            "must be between 1 and 65535",
        );

        for path in self.paths.iter().chain(self.deny_paths.iter()) {
            if let Some(reason) = validate_path(path) {
                v.push("paths", reason);
            }
        }

        for hostname in self.declared_hostnames() {
            v.ensure(
                is_valid_fqdn(&hostname),
                "hostname",
                format!("invalid hostname '{}'", hostname),
            );
        }

        for (i, rewrite) in self.rewrites.iter().enumerate() {
            v.extend_nested(&format!("rewrites[{}]", i), rewrite.validate());
        }
        if let Some(check) = &self.check {
            v.extend_nested("check", check.validate());
        }
        if let Some(load_balancing) = &self.load_balancing {
            v.extend_nested("load_balancing", load_balancing.validate());
        }
        if let Some(rate_limit) = &self.rate_limit {
            v.extend_nested("rate_limit", rate_limit.validate());
        }
        if let Some(bandwidth_limit) = &self.bandwidth_limit {
            v.extend_nested("bandwidth_limit", bandwidth_limit.validate());
        }
        if let Some(retry) = &self.retry {
            v.extend_nested("retry", retry.validate());
        }
        if let Some(timeout) = &self.timeout {
            v.extend_nested("timeout", timeout.validate());
        }
        v.ensure(
            self.server_maxconn != Some(0),
            "server_maxconn",
            "must be positive",
        );

        if let Some(port) = self.external_grpc_port {
            v.ensure(
                self.protocol == HttpProtocol::Https,
                "external_grpc_port",
                "requires protocol https",
            );
            v.ensure(
                port != 0 && !RESERVED_HTTP_PORTS.contains(&port),
                "external_grpc_port",
                format!("port {} is reserved", port),
            );
        }

        v.into_result()
    }
}

/// Unit databag of a `haproxy-route` or `haproxy-route-tcp` requirer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequirerUnitData {
    pub address: IpAddr,
}

impl Default for RouteRequirerUnitData {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }
}

impl DatabagModel for RouteRequirerUnitData {
    const KEYS: &'static [&'static str] = &["address"];

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut v = Violations::default();
        v.ensure(
            !self.address.is_unspecified(),
            "address",
            "unspecified address",
        );
        v.into_result()
    }
}

/// Application databag published back to an admitted route requirer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteProviderAppData {
    #[serde(default)]
    pub endpoints: Vec<Url>,
}

impl DatabagModel for RouteProviderAppData {
    const KEYS: &'static [&'static str] = &["endpoints"];
}
