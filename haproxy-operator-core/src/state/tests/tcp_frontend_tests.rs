use super::assemble_default;
use crate::testing::{RelationBuilder, SnapshotBuilder};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn tcp_backend_is_named_after_app_and_relation() {
    // Arrange
    let snapshot = SnapshotBuilder::new()
        .relation(
            RelationBuilder::new(7, "haproxy-route-tcp", "postgres")
                .app(json!({"port": 5432, "backend_port": 5433}))
                .unit_address("postgres/0", "10.0.2.1"),
        )
        .build();

    // Act
    let state = assemble_default(&snapshot);

    // Assert
    let backend = state.requirers.tcp_backends().next().expect("admitted");
    assert_eq!(backend.name, "postgres_tcp_7");
    assert_eq!(backend.servers[0].name, "postgres_tcp_7_5433_0");
    assert_eq!(backend.servers[0].address, "10.0.2.1:5433");
}

#[test]
fn hosts_override_unit_addresses() {
    // Arrange
    let snapshot = SnapshotBuilder::new()
        .relation(
            RelationBuilder::new(7, "haproxy-route-tcp", "postgres")
                .app(json!({"port": 5432, "hosts": ["192.168.0.1", "192.168.0.2"]}))
                .unit_address("postgres/0", "10.0.2.1"),
        )
        .build();

    // Act
    let state = assemble_default(&snapshot);

    // Assert
    let addresses: Vec<_> = state
        .requirers
        .tcp_backends()
        .flat_map(|b| b.servers.iter().map(|s| s.address.clone()))
        .collect();
    assert_eq!(addresses, vec!["192.168.0.1:5432", "192.168.0.2:5432"]);
}

#[test]
fn frontend_rules_follow_tls_settings() {
    // Arrange
    let snapshot = SnapshotBuilder::new()
        .relation(
            RelationBuilder::new(1, "haproxy-route-tcp", "sni")
                .app(json!({"port": 6000, "sni": "db.example.com"}))
                .unit_address("sni/0", "10.0.2.1"),
        )
        .relation(
            RelationBuilder::new(2, "haproxy-route-tcp", "pass")
                .app(json!({"port": 6001, "tls_terminate": false}))
                .unit_address("pass/0", "10.0.2.2"),
        )
        .relation(
            RelationBuilder::new(3, "haproxy-route-tcp", "plain")
                .app(json!({"port": 6002, "enforce_tls": false}))
                .unit_address("plain/0", "10.0.2.3"),
        )
        .build();

    // Act
    let state = assemble_default(&snapshot);

    // Assert
    let frontends = &state.requirers.tcp_frontends;
    assert_eq!(
        frontends[0].reject_rule().as_deref(),
        Some("tcp-request content reject unless { ssl_fc_sni -m found }")
    );
    assert_eq!(
        frontends[1].reject_rule().as_deref(),
        Some("tcp-request content reject unless { req_ssl_hello_type 1 }")
    );
    assert!(frontends[1].needs_inspect_delay());
    assert_eq!(frontends[2].reject_rule(), None);
    assert!(!frontends[2].needs_inspect_delay());
    assert!(frontends[2].default_backend().is_some());
}
