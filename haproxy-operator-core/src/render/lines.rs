//! Single HAProxy directives derived from admitted backends.
//!
//! Templates lay out sections; anything that needs branching on requirer
//! options is assembled here as finished lines.

use crate::interfaces::ddos_protection::DdosProtectionProviderAppData;
use crate::interfaces::haproxy_route::{
    BandwidthLimit, LoadBalancingAlgorithm, LoadBalancingConfiguration, RateLimitPolicy, Retry,
    TimeoutConfiguration,
};
use crate::interfaces::haproxy_route_tcp::{TcpHealthCheckType, TcpServerHealthCheck};
use crate::state::{HttpBackend, Server, TcpBackend};

pub(crate) const PEERS_SECTION: &str = "haproxy_peers";
pub(crate) const DDOS_TABLE: &str = "ddos_protection";
const DEFAULT_DENY_STATUS: u16 = 429;

fn balance(lb: &LoadBalancingConfiguration) -> Vec<String> {
    let mut lines = match lb.algorithm {
        LoadBalancingAlgorithm::Leastconn => vec!["balance leastconn".to_string()],
        LoadBalancingAlgorithm::Source => vec!["balance source".to_string()],
        LoadBalancingAlgorithm::Roundrobin => vec!["balance roundrobin".to_string()],
        LoadBalancingAlgorithm::Cookie => {
            let mut lines = vec!["balance roundrobin".to_string()];
            if let Some(cookie) = &lb.cookie {
                lines.push(format!("cookie {} insert indirect nocache", cookie));
            }
            lines
        }
    };
    if lb.consistent_hashing {
        lines.push("hash-type consistent".to_string());
    }
    lines
}

fn retry_and_timeouts(retry: Option<&Retry>, redispatch: bool, timeout: &TimeoutConfiguration) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(retry) = retry {
        lines.push(format!("retries {}", retry.count));
        if let Some(interval) = retry.interval {
            lines.push(format!("timeout connect {}s", interval));
        }
    }
    if redispatch {
        lines.push("option redispatch".to_string());
    }
    lines.push(format!("timeout server {}s", timeout.server));
    lines.push(format!("timeout queue {}s", timeout.queue));
    lines
}

fn bandwidth(name: &str, limit: &BandwidthLimit, mode: &str) -> Vec<String> {
    let (request, response) = match mode {
        "tcp" => ("tcp-request content", "tcp-response content"),
        _ => ("http-request", "http-response"),
    };
    let mut lines = Vec::new();
    if let Some(upload) = limit.upload {
        lines.push(format!(
            "filter bwlim-in {}_upload default-limit {} default-period 1s",
            name, upload
        ));
    }
    if let Some(download) = limit.download {
        lines.push(format!(
            "filter bwlim-out {}_download default-limit {} default-period 1s",
            name, download
        ));
    }
    if limit.upload.is_some() {
        lines.push(format!("{} set-bandwidth-limit {}_upload", request, name));
    }
    if limit.download.is_some() {
        lines.push(format!("{} set-bandwidth-limit {}_download", response, name));
    }
    lines
}

/// `server` lines of an HTTP backend.
pub(crate) fn http_servers(backend: &HttpBackend) -> Vec<String> {
    backend
        .servers
        .iter()
        .map(|server| {
            let mut line = format!("server {} {}", server.name, server.address);
            if let Some(check) = &backend.check {
                line.push_str(&format!(
                    " check inter {}s rise {} fall {}",
                    check.interval, check.rise, check.fall
                ));
            }
            if let Some(maxconn) = backend.server_maxconn {
                line.push_str(&format!(" maxconn {}", maxconn));
            }
            if let Some(ca_file) = &backend.ca_file {
                line.push_str(&format!(" ssl verify required ca-file {}", ca_file));
                if backend.external_grpc_port.is_some() {
                    line.push_str(" alpn h2");
                }
            }
            if backend.load_balancing.algorithm == LoadBalancingAlgorithm::Cookie {
                line.push_str(&format!(" cookie {}", server.name));
            }
            line
        })
        .collect()
}

/// Directives of an HTTP backend, before its `server` lines.
pub(crate) fn http_backend(backend: &HttpBackend) -> Vec<String> {
    let mut lines = balance(&backend.load_balancing);

    if let Some(check) = &backend.check {
        lines.push("option httpchk".to_string());
        for path in &check.paths {
            lines.push("http-check connect".to_string());
            lines.push(format!("http-check send meth GET uri {}", path));
            lines.push("http-check expect status 200-399".to_string());
        }
    }

    lines.extend(retry_and_timeouts(
        backend.retry.as_ref(),
        backend.redispatch,
        &backend.timeout,
    ));
    if backend.http_server_close {
        lines.push("option http-server-close".to_string());
    }
    if let Some(limit) = &backend.bandwidth_limit {
        lines.extend(bandwidth(&backend.name, limit, "http"));
    }

    if let (Some(table), Some(limit)) = (&backend.stick_table, &backend.rate_limit) {
        lines.push(format!("http-request track-sc0 src table {}", table));
        let condition = format!(
            "{{ sc0_conn_rate({}) gt {} }}",
            table, limit.connections_per_minute
        );
        let action = match limit.policy {
            RateLimitPolicy::Deny => format!(
                "deny deny_status {}",
                limit.reject_code.unwrap_or(DEFAULT_DENY_STATUS)
            ),
            other => other.action().to_string(),
        };
        lines.push(format!("http-request {} if {}", action, condition));
    }

    for rewrite in &backend.rewrites {
        match &rewrite.header {
            Some(header) => lines.push(format!(
                "http-request {} {} {}",
                rewrite.directive, header, rewrite.expression
            )),
            None => lines.push(format!(
                "http-request {} {}",
                rewrite.directive, rewrite.expression
            )),
        }
    }
    lines
}

/// `use_backend` condition of an HTTP backend in the shared frontend.
pub(crate) fn http_condition(backend: &HttpBackend) -> String {
    let mut condition = format!("acl_host_{}", backend.name);
    if !backend.paths.is_empty() {
        condition.push_str(&format!(" acl_path_{}", backend.name));
    }
    if !backend.deny_paths.is_empty() {
        condition.push_str(&format!(" !acl_deny_path_{}", backend.name));
    }
    condition
}

fn tcp_check(check: &TcpServerHealthCheck) -> Vec<String> {
    match check.check_type.unwrap_or_default() {
        TcpHealthCheckType::Generic => {
            let mut lines = vec!["option tcp-check".to_string()];
            if let Some(send) = &check.send {
                lines.push(format!("tcp-check send {}", send));
            }
            if let Some(expect) = &check.expect {
                lines.push(format!("tcp-check expect string {}", expect));
            }
            lines
        }
        TcpHealthCheckType::Mysql => vec![match &check.db_user {
            Some(user) => format!("option mysql-check user {}", user),
            None => "option mysql-check".to_string(),
        }],
        TcpHealthCheckType::Postgres => vec![format!(
            "option pgsql-check user {}",
            check.db_user.as_deref().unwrap_or("postgres")
        )],
        TcpHealthCheckType::Redis => vec!["option redis-check".to_string()],
        TcpHealthCheckType::Smtp => vec![match &check.domain {
            Some(domain) => format!("option smtpchk HELO {}", domain),
            None => "option smtpchk".to_string(),
        }],
    }
}

/// Directives of a TCP backend, before its `server` lines.
pub(crate) fn tcp_backend(backend: &TcpBackend) -> Vec<String> {
    let mut lines = vec!["mode tcp".to_string()];
    lines.extend(balance(&backend.load_balancing));
    if let Some(check) = &backend.check {
        lines.extend(tcp_check(check));
    }
    lines.extend(retry_and_timeouts(
        backend.retry.as_ref(),
        backend.retry.as_ref().is_some_and(|r| r.redispatch),
        &backend.timeout,
    ));
    if !backend.ip_deny_list.is_empty() {
        lines.push(format!(
            "tcp-request content reject if {{ src {} }}",
            backend.ip_deny_list.join(" ")
        ));
    }
    if let (Some(table), Some(limit)) = (&backend.stick_table, &backend.rate_limit) {
        lines.push(format!("tcp-request content track-sc0 src table {}", table));
        lines.push(format!(
            "tcp-request content {} if {{ sc0_conn_rate({}) gt {} }}",
            limit.policy.action(),
            table,
            limit.connections_per_minute
        ));
    }
    if let Some(limit) = &backend.bandwidth_limit {
        lines.extend(bandwidth(&backend.name, limit, "tcp"));
    }
    lines
}

pub(crate) fn tcp_servers(backend: &TcpBackend) -> Vec<String> {
    backend
        .servers
        .iter()
        .map(|server| {
            let mut line = format!("server {} {}", server.name, server.address);
            if let Some(check) = &backend.check {
                line.push_str(&format!(
                    " check inter {}s rise {} fall {}",
                    check.interval, check.rise, check.fall
                ));
            }
            if let Some(maxconn) = backend.server_maxconn {
                line.push_str(&format!(" maxconn {}", maxconn));
            }
            line
        })
        .collect()
}

pub(crate) fn plain_servers(servers: &[Server]) -> Vec<String> {
    servers
        .iter()
        .map(|s| format!("server {} {}", s.name, s.address))
        .collect()
}

/// Condition selecting a TCP backend by SNI; wildcards match any label.
pub(crate) fn sni_condition(fetch: &str, sni: &str) -> String {
    match sni.strip_prefix('*') {
        Some(suffix) => format!("{{ {} -m end {} }}", fetch, suffix),
        None => format!("{{ {} -i {} }}", fetch, sni),
    }
}

/// `stick-table` line of a rate limiting table.
pub(crate) fn stick_table(store: &str, replicated: bool) -> String {
    let mut line = format!("stick-table type ip size 1m expire 60s store {}", store);
    if replicated {
        line.push_str(&format!(" peers {}", PEERS_SECTION));
    }
    line
}

/// Baseline request hygiene applied to every HTTP frontend.
pub(crate) fn ddos_baseline() -> Vec<String> {
    vec![
        "acl invalid_method method -m reg [^A-Z]".to_string(),
        "acl empty_method method -m len 0".to_string(),
        "acl has_host req.hdr(host) -m found".to_string(),
        "http-request silent-drop if invalid_method || empty_method || !has_host".to_string(),
    ]
}

/// Frontend lines enforcing the limits of a DDoS protection provider.
pub(crate) fn ddos_limits(ddos: &DdosProtectionProviderAppData) -> Vec<String> {
    let mut lines = Vec::new();
    let allowed = if ddos.ip_allow_list.is_empty() {
        ""
    } else {
        let nets: Vec<String> = ddos.ip_allow_list.iter().map(|n| n.to_string()).collect();
        lines.push(format!("acl ddos_allowed src {}", nets.join(" ")));
        " !ddos_allowed"
    };

    if ddos.tracks_clients() {
        let unless = if allowed.is_empty() { "" } else { " unless ddos_allowed" };
        lines.push(format!("http-request track-sc1 src table {}{}", DDOS_TABLE, unless));
    }

    let action = match ddos.policy() {
        RateLimitPolicy::Deny => format!(
            "deny deny_status {}",
            ddos.policy_status_code.unwrap_or(DEFAULT_DENY_STATUS)
        ),
        other => other.action().to_string(),
    };
    let limits = [
        ("sc1_http_req_rate", ddos.rate_limit_requests_per_minute),
        ("sc1_conn_rate", ddos.rate_limit_connections_per_minute),
        ("sc1_conn_cur", ddos.concurrent_connections_limit),
        ("sc1_http_err_rate", ddos.error_rate_per_minute),
    ];
    for (fetch, limit) in limits {
        if let Some(limit) = limit {
            lines.push(format!(
                "http-request {} if {{ {}({}) gt {} }}{}",
                action, fetch, DDOS_TABLE, limit, allowed
            ));
        }
    }

    if !ddos.deny_paths.is_empty() {
        lines.push(format!(
            "http-request deny if {{ path_beg {} }}",
            ddos.deny_paths.join(" ")
        ));
    }
    if let Some(timeout) = ddos.http_request_timeout {
        lines.push(format!("timeout http-request {}s", timeout));
    }
    if let Some(timeout) = ddos.http_keepalive_timeout {
        lines.push(format!("timeout http-keep-alive {}s", timeout));
    }
    if let Some(timeout) = ddos.client_timeout {
        lines.push(format!("timeout client {}s", timeout));
    }
    lines
}
