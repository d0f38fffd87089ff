use super::assemble_default;
use crate::state::{LegacyServerLine, ProxyMode};
use crate::testing::{RelationBuilder, SnapshotBuilder};
use pretty_assertions::assert_eq;

const SERVICES: &str = "
- service_name: web
  service_host: 0.0.0.0
  service_port: 8080
  service_options: [balance leastconn]
  server_options: check inter 2000
";

#[test]
fn units_sharing_a_service_name_are_merged() {
    // Arrange
    let snapshot = SnapshotBuilder::new()
        .relation(
            RelationBuilder::new(3, "reverseproxy", "web")
                .raw_unit(
                    "web/0",
                    &[("private-address", "10.0.0.1"), ("port", "8000"), ("services", SERVICES)],
                )
                .raw_unit(
                    "web/1",
                    &[("private-address", "10.0.0.2"), ("port", "8000"), ("services", SERVICES)],
                ),
        )
        .build();

    // Act
    let state = assemble_default(&snapshot);

    // Assert
    assert_eq!(state.mode, ProxyMode::Legacy);
    assert_eq!(state.legacy.len(), 1);
    let frontend = &state.legacy[0];
    assert_eq!(frontend.name, "web");
    assert_eq!(frontend.port, 8080);
    assert_eq!(frontend.service_options, vec!["balance leastconn".to_string()]);
    assert_eq!(
        frontend.servers,
        vec![
            LegacyServerLine {
                name: "web-0".to_string(),
                address: "10.0.0.1:8000".to_string(),
                options: vec!["check inter 2000".to_string()],
            },
            LegacyServerLine {
                name: "web-1".to_string(),
                address: "10.0.0.2:8000".to_string(),
                options: vec!["check inter 2000".to_string()],
            },
        ]
    );
}

#[test]
fn unit_without_services_joins_the_implicit_service() {
    // Arrange
    let snapshot = SnapshotBuilder::new()
        .relation(
            RelationBuilder::new(3, "reverseproxy", "blog")
                .raw_unit("blog/0", &[("hostname", "10.0.0.9")]),
        )
        .build();

    // Act
    let state = assemble_default(&snapshot);

    // Assert
    let frontend = &state.legacy[0];
    assert_eq!(frontend.name, "blog");
    assert_eq!(frontend.port, 80);
    assert_eq!(frontend.servers[0].address, "10.0.0.9:80");
}

#[test]
fn port_taken_by_another_service_is_a_conflict() {
    // Arrange
    let other = "
- service_name: api
  service_port: 8080
";
    let snapshot = SnapshotBuilder::new()
        .relation(
            RelationBuilder::new(3, "reverseproxy", "web")
                .raw_unit("web/0", &[("private-address", "10.0.0.1"), ("services", SERVICES)]),
        )
        .relation(
            RelationBuilder::new(4, "reverseproxy", "api")
                .raw_unit("api/0", &[("private-address", "10.0.0.2"), ("services", other)]),
        )
        .build();

    // Act
    let state = assemble_default(&snapshot);

    // Assert
    assert_eq!(state.legacy.len(), 1);
    assert_eq!(state.legacy[0].name, "web");
    assert_eq!(
        state.requirers.rejections[0].reason,
        "service 'api' port 8080 is already used by service 'web'"
    );
}

#[test]
fn malformed_port_rejects_the_relation() {
    // Arrange
    let snapshot = SnapshotBuilder::new()
        .relation(
            RelationBuilder::new(3, "reverseproxy", "web")
                .raw_unit("web/0", &[("private-address", "10.0.0.1"), ("port", "eighty")]),
        )
        .build();

    // Act
    let state = assemble_default(&snapshot);

    // Assert
    assert!(state.legacy.is_empty());
    assert_eq!(
        state.requirers.rejections[0].reason,
        "unit web/0: data validation: port: invalid port 'eighty'"
    );
}

#[test]
fn conflicting_relation_contributes_none_of_its_services() {
    // Arrange
    let first = "
- service_name: x
  service_port: 8000
";
    let second = "
- service_name: a
  service_port: 8001
- service_name: b
  service_port: 8000
";
    let snapshot = SnapshotBuilder::new()
        .relation(
            RelationBuilder::new(3, "reverseproxy", "x")
                .raw_unit("x/0", &[("private-address", "10.0.0.1"), ("services", first)]),
        )
        .relation(
            RelationBuilder::new(4, "reverseproxy", "ab")
                .raw_unit("ab/0", &[("private-address", "10.0.0.2"), ("services", second)]),
        )
        .build();

    // Act
    let state = assemble_default(&snapshot);

    // Assert
    let names: Vec<&str> = state.legacy.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["x"]);
    let invalid: Vec<u32> = state
        .requirers
        .relation_ids_with_invalid_data
        .iter()
        .map(|id| id.get())
        .collect();
    assert_eq!(invalid, vec![4]);
}
