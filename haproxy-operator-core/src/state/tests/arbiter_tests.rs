use super::assemble_default;
use crate::model::RelationId;
use crate::state::RejectionKind;
use crate::testing::{RelationBuilder, SnapshotBuilder};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn http(id: u32, app: Value) -> RelationBuilder {
    RelationBuilder::new(id, "haproxy-route", &format!("http-{id}"))
        .app(app)
        .unit_address(&format!("http-{id}/0"), "10.0.0.1")
}

fn tcp(id: u32, app: Value) -> RelationBuilder {
    RelationBuilder::new(id, "haproxy-route-tcp", "db")
        .app(app)
        .unit_address("db/0", "10.0.1.1")
}

fn ids(set: &std::collections::BTreeSet<RelationId>) -> Vec<u32> {
    set.iter().map(|id| id.get()).collect()
}

#[test]
fn grpc_port_colliding_with_tcp_port_invalidates_both() {
    // Arrange
    let snapshot = SnapshotBuilder::new()
        .relation(http(
            1,
            json!({
                "service": "grpc",
                "ports": [8443],
                "hostname": "grpc.example.com",
                "protocol": "https",
                "external_grpc_port": 5000
            }),
        ))
        .relation(
            RelationBuilder::new(9, "receive-ca-certs", "ca")
                .app(json!({"certificates": [super::CA_PEM]})),
        )
        .relation(tcp(2, json!({"port": 5000})))
        .build();

    // Act
    let state = assemble_default(&snapshot);

    // Assert
    assert!(state.requirers.backends.is_empty());
    assert!(state.requirers.tcp_frontends.is_empty());
    assert_eq!(ids(&state.requirers.relation_ids_with_invalid_data), vec![1]);
    assert_eq!(ids(&state.requirers.relation_ids_with_invalid_data_tcp), vec![2]);
}

#[test]
fn duplicate_grpc_port_keeps_the_first_service() {
    // Arrange
    let grpc = |id: u32, service: &str| {
        http(
            id,
            json!({
                "service": service,
                "ports": [8443],
                "hostname": format!("{service}.example.com"),
                "protocol": "https",
                "external_grpc_port": 5000
            }),
        )
    };
    let snapshot = SnapshotBuilder::new()
        .relation(grpc(1, "one"))
        .relation(grpc(2, "two"))
        .relation(
            RelationBuilder::new(9, "receive-ca-certs", "ca")
                .app(json!({"certificates": [super::CA_PEM]})),
        )
        .build();

    // Act
    let state = assemble_default(&snapshot);

    // Assert
    assert!(state.requirers.backend("one").is_some());
    assert!(state.requirers.backend("two").is_none());
    assert_eq!(
        state.requirers.rejections[0].reason,
        "external gRPC port 5000 is already used by service 'one'"
    );
}

#[test]
fn services_named_like_generated_sections_are_rejected() {
    // Arrange
    let route = |id: u32, service: &str| {
        http(
            id,
            json!({
                "service": service,
                "ports": [80],
                "hostname": format!("h{id}.example.com")
            }),
        )
    };
    let snapshot = SnapshotBuilder::new()
        .relation(route(1, "default"))
        .relation(route(2, "ddos_protection"))
        .relation(route(3, "api_rate_limit"))
        .relation(route(4, "spoe_auth_7"))
        .relation(route(5, "db_tcp_2"))
        .relation(route(6, "web"))
        .build();

    // Act
    let state = assemble_default(&snapshot);

    // Assert
    let names: Vec<&str> = state
        .requirers
        .backends
        .iter()
        .map(|b| b.name.as_str())
        .collect();
    assert_eq!(names, vec!["web"]);
    assert_eq!(ids(&state.requirers.relation_ids_with_invalid_data), vec![1, 2, 3, 4, 5]);
    assert_eq!(
        state.requirers.rejections[0].reason,
        "service name 'default' is reserved"
    );
    assert!(
        state
            .requirers
            .rejections
            .iter()
            .all(|r| r.kind == RejectionKind::Conflict)
    );
}

#[test]
fn tcp_routes_cannot_take_http_ports_while_http_routes_exist() {
    // Arrange
    let snapshot = SnapshotBuilder::new()
        .relation(http(
            1,
            json!({"service": "web", "ports": [80], "hostname": "web.example.com"}),
        ))
        .relation(tcp(2, json!({"port": 443})))
        .relation(tcp(3, json!({"port": 10000})))
        .build();

    // Act
    let state = assemble_default(&snapshot);

    // Assert
    assert!(state.requirers.tcp_frontends.is_empty());
    let reasons: Vec<_> = state
        .requirers
        .rejections
        .iter()
        .map(|r| r.reason.as_str())
        .collect();
    assert_eq!(
        reasons,
        vec![
            "port 443 is reserved for HTTP routes",
            "port 10000 is reserved for peer replication",
        ]
    );
}

#[test]
fn tcp_route_may_use_443_without_http_routes() {
    // Arrange
    let snapshot = SnapshotBuilder::new()
        .relation(tcp(2, json!({"port": 443, "tls_terminate": false})))
        .build();

    // Act
    let state = assemble_default(&snapshot);

    // Assert
    assert_eq!(state.requirers.tcp_frontends.len(), 1);
    assert_eq!(state.requirers.tcp_frontends[0].port, 443);
}

#[test]
fn shared_port_requires_distinct_sni() {
    // Arrange
    let snapshot = SnapshotBuilder::new()
        .relation(tcp(1, json!({"port": 5432, "sni": "a.example.com"})))
        .relation(tcp(2, json!({"port": 5432, "sni": "a.example.com"})))
        .relation(tcp(3, json!({"port": 5432})))
        .relation(tcp(4, json!({"port": 5432, "sni": "b.example.com"})))
        .build();

    // Act
    let state = assemble_default(&snapshot);

    // Assert
    let frontend = &state.requirers.tcp_frontends[0];
    let admitted: Vec<_> = frontend.backends.iter().map(|b| b.relation_id.get()).collect();
    assert_eq!(admitted, vec![1, 4]);
    assert_eq!(ids(&state.requirers.relation_ids_with_invalid_data_tcp), vec![2, 3]);
    assert!(frontend.routes_by_sni());
}

#[test]
fn terminating_routes_win_a_shared_port_over_passthrough() {
    // Arrange
    let snapshot = SnapshotBuilder::new()
        .relation(tcp(
            1,
            json!({"port": 8443, "sni": "pass.example.com", "tls_terminate": false}),
        ))
        .relation(tcp(2, json!({"port": 8443, "sni": "term.example.com"})))
        .build();

    // Act
    let state = assemble_default(&snapshot);

    // Assert
    let frontend = &state.requirers.tcp_frontends[0];
    assert!(frontend.terminate_tls);
    assert_eq!(frontend.backends.len(), 1);
    assert_eq!(frontend.backends[0].relation_id, RelationId::new(2));
    let rejection = &state.requirers.rejections[0];
    assert_eq!(rejection.relation_id, RelationId::new(1));
    assert_eq!(rejection.kind, RejectionKind::Conflict);
}

#[test]
fn deeper_paths_are_matched_first_and_overlaps_warn() {
    // Arrange
    let snapshot = SnapshotBuilder::new()
        .relation(http(
            1,
            json!({"service": "root", "ports": [80], "hostname": "app.example.com", "paths": ["/api"]}),
        ))
        .relation(http(
            2,
            json!({"service": "deep", "ports": [80], "hostname": "app.example.com", "paths": ["/api/v2/items"]}),
        ))
        .relation(http(
            3,
            json!({"service": "twin", "ports": [80], "hostname": "app.example.com", "paths": ["/api"]}),
        ))
        .build();

    // Act
    let state = assemble_default(&snapshot);

    // Assert
    let order: Vec<_> = state
        .requirers
        .backends
        .iter()
        .map(|b| b.name.as_str())
        .collect();
    assert_eq!(order, vec!["deep", "root", "twin"]);
    assert_eq!(state.report.warnings.len(), 1);
    assert!(state.report.warnings[0].message.contains("app.example.com/api"));
    assert_eq!(state.blocking, None);
}
