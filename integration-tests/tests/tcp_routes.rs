use haproxy_operator_core::model::{Event, RelationId};
use haproxy_operator_core::reconciler::DatabagScope;
use haproxy_operator_core::testing::{RelationBuilder, SnapshotBuilder, TestCa, raw_databag};
use integration_tests::harness::TestOperator;
use pretty_assertions::assert_eq;
use serde_json::json;

/// A TCP port equal to an HTTP route's gRPC port invalidates both
#[tokio::test]
async fn tcp_port_colliding_with_grpc_port_rejects_both() {
    // Arrange
    let ca = TestCa::new();
    let model = SnapshotBuilder::new()
        .relation(
            RelationBuilder::new(1, "haproxy-route", "grpc")
                .app(json!({
                    "service": "grpc",
                    "ports": [8443],
                    "hostname": "grpc.example.com",
                    "protocol": "https",
                    "external_grpc_port": 5000
                }))
                .unit_address("grpc/0", "10.0.0.1"),
        )
        .relation(
            RelationBuilder::new(2, "haproxy-route-tcp", "postgres")
                .app(json!({"port": 5000}))
                .unit_address("postgres/0", "10.0.2.1"),
        )
        .relation(
            RelationBuilder::new(9, "receive-ca-certs", "ca")
                .app(json!({"certificates": [ca.ca_pem()]})),
        )
        .build();
    let mut operator = TestOperator::new(model);

    // Act
    let outcome = operator.event(Event::ConfigChanged).await;

    // Assert
    let mut rejected: Vec<_> = outcome.rejections.iter().map(|r| r.relation_id).collect();
    rejected.sort();
    assert_eq!(rejected, vec![RelationId::new(1), RelationId::new(2)]);
    let config = operator.config();
    assert!(!config.contains("backend grpc"));
    assert!(!config.contains(":5000"));
}

/// Passthrough routes sharing a port are split by SNI and advertised on
/// the unit address
#[tokio::test]
async fn passthrough_routes_share_a_port_by_sni() {
    // Arrange
    let route = |id, app: &str, sni: &str, address: &str| {
        RelationBuilder::new(id, "haproxy-route-tcp", app)
            .app(json!({"port": 5432, "sni": sni, "tls_terminate": false}))
            .unit_address(&format!("{app}/0"), address)
    };
    let model = SnapshotBuilder::new()
        .relation(route(1, "db", "db.example.com", "10.0.2.1"))
        .relation(route(2, "replica", "replica.example.com", "10.0.2.2"))
        .build();
    let mut operator = TestOperator::new(model);

    // Act
    let outcome = operator.event(Event::ConfigChanged).await;

    // Assert
    assert!(outcome.rejections.is_empty());
    let frontend = operator.section("frontend haproxy_route_tcp_5432");
    assert!(frontend.contains(&"    bind [::]:5432 v4v6".to_string()));
    assert!(
        frontend
            .iter()
            .any(|line| line.contains("req_ssl_sni -i db.example.com"))
    );
    assert!(
        frontend
            .iter()
            .any(|line| line.contains("req_ssl_sni -i replica.example.com"))
    );
    assert_eq!(
        outcome.write_for(RelationId::new(2), DatabagScope::App),
        Some(&raw_databag(&[("endpoints", r#"["tcp://10.1.0.10:5432"]"#)]))
    );
}
