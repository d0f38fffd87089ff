use super::{render, section};
use crate::testing::{RelationBuilder, SnapshotBuilder};
use pretty_assertions::assert_eq;
use serde_json::json;

fn protected_snapshot() -> crate::model::ModelSnapshot {
    SnapshotBuilder::new()
        .relation(
            RelationBuilder::new(1, "haproxy-route", "api")
                .app(json!({"service": "api", "ports": [80], "hostname": "api.example.com"}))
                .unit_address("api/0", "10.0.0.1"),
        )
        .relation(
            RelationBuilder::new(6, "spoe-auth", "oauth")
                .app(json!({
                    "spop_port": 12345,
                    "oidc_callback_port": 5000,
                    "message_name": "try-auth-oidc",
                    "var_authenticated": "is_authenticated",
                    "var_redirect_url": "redirect_url",
                    "cookie_name": "authsession",
                    "hostname": "api.example.com"
                }))
                .unit_address("oauth/0", "10.0.0.50"),
        )
        .build()
}

#[test]
fn frontend_redirects_unauthenticated_requests() {
    // Arrange
    let snapshot = protected_snapshot();

    // Act
    let config = render(&snapshot, false).haproxy_cfg;

    // Assert
    assert!(config.contains(
        "    filter spoe engine spoe_auth_6 config /etc/haproxy/spoe_auth.conf\n"
    ));
    assert!(config.contains(
        "    acl acl_authenticated_spoe_auth_6 var(sess.spoe_auth_6.is_authenticated) -m bool\n"
    ));
    assert!(config.contains(
        "    http-request redirect location %[var(sess.spoe_auth_6.redirect_url)] code 302 if acl_host_spoe_auth_6 !acl_callback_spoe_auth_6 !acl_authenticated_spoe_auth_6\n"
    ));
    assert!(config.contains(
        "    use_backend spoe_auth_6_callback if acl_host_spoe_auth_6 acl_callback_spoe_auth_6\n"
    ));
    assert_eq!(
        section(&config, "backend spoe_auth_6_callback"),
        vec![
            "backend spoe_auth_6_callback",
            "    server spoe_auth_6_callback_5000_0 10.0.0.50:5000",
        ]
    );
}

#[test]
fn agent_file_declares_message_and_backend() {
    // Arrange
    let snapshot = protected_snapshot();

    // Act
    let spoe = render(&snapshot, false).spoe_auth.expect("agent admitted");

    // Assert
    assert_eq!(
        section(&spoe, "[spoe_auth_6]"),
        vec![
            "[spoe_auth_6]",
            "spoe-agent spoe_auth_6-agent",
            "    messages try-auth-oidc",
            "    option var-prefix spoe_auth_6",
            "    timeout hello 2s",
            "    timeout idle 2m",
            "    timeout processing 500ms",
            "    use-backend spoe_auth_6",
            "    log global",
        ]
    );
    assert!(spoe.contains(
        "    event on-frontend-http-request if { req.hdr(Host) -m str api.example.com }\n"
    ));
}
