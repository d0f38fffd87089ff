//! `ddos-protection`: frontend-wide limits supplied by a configurator app.

use crate::databag::{DatabagModel, Violations};
use crate::interfaces::haproxy_route::RateLimitPolicy;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdosProtectionProviderAppData {
    #[serde(default)]
    pub rate_limit_requests_per_minute: Option<u32>,
    #[serde(default)]
    pub rate_limit_connections_per_minute: Option<u32>,
    #[serde(default)]
    pub concurrent_connections_limit: Option<u32>,
    #[serde(default)]
    pub error_rate_per_minute: Option<u32>,
    #[serde(default)]
    pub limit_policy_http: Option<RateLimitPolicy>,
    #[serde(default)]
    pub policy_status_code: Option<u16>,
    #[serde(default)]
    pub ip_allow_list: Vec<IpNet>,
    #[serde(default)]
    pub deny_paths: Vec<String>,
    #[serde(default)]
    pub http_request_timeout: Option<u32>,
    #[serde(default)]
    pub http_keepalive_timeout: Option<u32>,
    #[serde(default)]
    pub client_timeout: Option<u32>,
}

impl DdosProtectionProviderAppData {
    /// Whether any counter needs a tracking stick table.
    pub fn tracks_clients(&self) -> bool {
        self.rate_limit_requests_per_minute.is_some()
            || self.rate_limit_connections_per_minute.is_some()
            || self.concurrent_connections_limit.is_some()
            || self.error_rate_per_minute.is_some()
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.limit_policy_http.unwrap_or_default()
    }
}

impl DatabagModel for DdosProtectionProviderAppData {
    const KEYS: &'static [&'static str] = &[
        "rate_limit_requests_per_minute",
        "rate_limit_connections_per_minute",
        "concurrent_connections_limit",
        "error_rate_per_minute",
        "limit_policy_http",
        "policy_status_code",
        "ip_allow_list",
        "deny_paths",
        "http_request_timeout",
        "http_keepalive_timeout",
        "client_timeout",
    ];

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut v = Violations::default();
        for (field, value) in [
            ("rate_limit_requests_per_minute", self.rate_limit_requests_per_minute),
            (
                "rate_limit_connections_per_minute",
                self.rate_limit_connections_per_minute,
            ),
            ("concurrent_connections_limit", self.concurrent_connections_limit),
            ("error_rate_per_minute", self.error_rate_per_minute),
            ("http_request_timeout", self.http_request_timeout),
            ("http_keepalive_timeout", self.http_keepalive_timeout),
            ("client_timeout", self.client_timeout),
        ] {
            v.ensure(value != Some(0), field, "must be positive");
        }

        if let Some(code) = self.policy_status_code {
            v.ensure(
                self.policy() == RateLimitPolicy::Deny,
                "policy_status_code",
                "only allowed with the deny policy",
            );
            v.ensure(
                (400..=599).contains(&code),
                "policy_status_code",
                format!("{} is not an HTTP error status", code),
            );
        }

        for path in &self.deny_paths {
            v.ensure(
                !path.is_empty() && !path.contains(char::is_whitespace),
                "deny_paths",
                format!("invalid path '{}'", path),
            );
        }
        v.into_result()
    }
}
