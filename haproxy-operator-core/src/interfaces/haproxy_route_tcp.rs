//! `haproxy-route-tcp`: a TCP frontend port requested by a requirer.

use crate::databag::{DatabagModel, Violations};
use crate::interfaces::haproxy_route::{
    BandwidthLimit, LoadBalancingAlgorithm, LoadBalancingConfiguration, Retry,
    TimeoutConfiguration,
};
use crate::interfaces::is_valid_sni;
use crate::interfaces::validators::has_line_break;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TcpHealthCheckType {
    #[default]
    Generic,
    Mysql,
    Postgres,
    Redis,
    Smtp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpServerHealthCheck {
    #[serde(default = "default_check_interval")]
    pub interval: u32,
    #[serde(default = "default_check_rise")]
    pub rise: u32,
    #[serde(default = "default_check_fall")]
    pub fall: u32,
    #[serde(rename = "type", default)]
    pub check_type: Option<TcpHealthCheckType>,
    #[serde(default)]
    pub send: Option<String>,
    #[serde(default)]
    pub expect: Option<String>,
    #[serde(default)]
    pub db_user: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
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

impl Default for TcpServerHealthCheck {
    fn default() -> Self {
        Self {
            interval: default_check_interval(),
            rise: default_check_rise(),
            fall: default_check_fall(),
            check_type: None,
            send: None,
            expect: None,
            db_user: None,
            domain: None,
        }
    }
}

impl TcpServerHealthCheck {
    fn validate(&self) -> Violations {
        let mut v = Violations::default();
        v.ensure(self.interval > 0, "interval", "must be positive");
        v.ensure(self.rise > 0, "rise", "must be positive");
        v.ensure(self.fall > 0, "fall", "must be positive");

        let check_type = self.check_type;
        let is_generic = check_type == Some(TcpHealthCheckType::Generic);
        for (field, value) in [("send", &self.send), ("expect", &self.expect)] {
            if let Some(value) = value {
                v.ensure(is_generic, field, "only allowed with the generic check type");
                v.ensure(!has_line_break(value), field, "must not contain line breaks");
            }
        }

        if let Some(db_user) = &self.db_user {
            v.ensure(
                matches!(
                    check_type,
                    Some(TcpHealthCheckType::Mysql | TcpHealthCheckType::Postgres)
                ),
                "db_user",
                "only allowed with the mysql or postgres check type",
            );
            v.ensure(
                !db_user.is_empty() && !db_user.contains(char::is_whitespace),
                "db_user",
                "must be a single word",
            );
        }
        v.ensure(
            check_type != Some(TcpHealthCheckType::Postgres) || self.db_user.is_some(),
            "db_user",
            "required by the postgres check type",
        );

        if let Some(domain) = &self.domain {
            v.ensure(
                check_type == Some(TcpHealthCheckType::Smtp),
                "domain",
                "only allowed with the smtp check type",
            );
            v.ensure(
                !domain.is_empty() && !domain.contains(char::is_whitespace),
                "domain",
                "must be a single word",
            );
        }
        v
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TcpRateLimitPolicy {
    #[default]
    Reject,
    SilentDrop,
}

impl TcpRateLimitPolicy {
    pub fn action(self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::SilentDrop => "silent-drop",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpRateLimit {
    pub connections_per_minute: u32,
    #[serde(default)]
    pub policy: TcpRateLimitPolicy,
}

fn default_true() -> bool {
    true
}

/// Application databag of a `haproxy-route-tcp` requirer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaproxyRouteTcpRequirerAppData {
    pub port: u16,
    #[serde(default)]
    pub backend_port: Option<u16>,
    /// Server addresses that replace the unit addresses when set.
    #[serde(default)]
    pub hosts: Vec<IpAddr>,
    #[serde(default)]
    pub sni: Option<String>,
    #[serde(default)]
    pub check: Option<TcpServerHealthCheck>,
    #[serde(default)]
    pub load_balancing: Option<LoadBalancingConfiguration>,
    #[serde(default)]
    pub rate_limit: Option<TcpRateLimit>,
    #[serde(default)]
    pub bandwidth_limit: Option<BandwidthLimit>,
    #[serde(default)]
    pub retry: Option<Retry>,
    #[serde(default)]
    pub timeout: Option<TimeoutConfiguration>,
    #[serde(default)]
    pub server_maxconn: Option<u32>,
    #[serde(default)]
    pub ip_deny_list: Vec<IpNet>,
    #[serde(default = "default_true")]
    pub enforce_tls: bool,
    #[serde(default = "default_true")]
    pub tls_terminate: bool,
}

impl Default for HaproxyRouteTcpRequirerAppData {
    fn default() -> Self {
        Self {
            port: 0,
            backend_port: None,
            hosts: Vec::new(),
            sni: None,
            check: None,
            load_balancing: None,
            rate_limit: None,
            bandwidth_limit: None,
            retry: None,
            timeout: None,
            server_maxconn: None,
            ip_deny_list: Vec::new(),
            enforce_tls: true,
            tls_terminate: true,
        }
    }
}

impl HaproxyRouteTcpRequirerAppData {
    pub fn backend_port(&self) -> u16 {
        self.backend_port.unwrap_or(self.port)
    }

    /// HAProxy decrypts the stream only when TLS is both enforced and
    /// terminated here.
    pub fn terminates_tls(&self) -> bool {
        self.enforce_tls && self.tls_terminate
    }
}

impl DatabagModel for HaproxyRouteTcpRequirerAppData {
    const KEYS: &'static [&'static str] = &[
        "port",
        "backend_port",
        "hosts",
        "sni",
        "check",
        "load_balancing",
        "rate_limit",
        "bandwidth_limit",
        "retry",
        "timeout",
        "server_maxconn",
        "ip_deny_list",
        "enforce_tls",
        "tls_terminate",
    ];

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut v = Violations::default();

        v.ensure(self.port > 0, "port", "must be between 1 and 65535");
        v.ensure(
            self.backend_port != Some(0),
            "backend_port",
            "must be between 1 and 65535",
        );

        if let Some(sni) = &self.sni {
            v.ensure(is_valid_sni(sni), "sni", format!("invalid sni '{}'", sni));
            v.ensure(self.enforce_tls, "sni", "requires enforce_tls");
        }

        if let Some(check) = &self.check {
            v.extend_nested("check", check.validate());
        }
        if let Some(load_balancing) = &self.load_balancing {
            v.ensure(
                load_balancing.algorithm != LoadBalancingAlgorithm::Cookie,
                "load_balancing.algorithm",
                "cookie is not available for TCP routes",
            );
            v.extend_nested("load_balancing", load_balancing.validate());
        }
        if let Some(rate_limit) = &self.rate_limit {
            v.ensure(
                rate_limit.connections_per_minute > 0,
                "rate_limit.connections_per_minute",
                "must be positive",
            );
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

        v.into_result()
    }
}
