use super::databag;
use crate::interfaces::reverseproxy::{LegacyServer, LegacyUnitData, parse_services};
use pretty_assertions::assert_eq;

#[test]
fn parses_services_with_mixed_server_shapes() {
    // Arrange
    let raw = r#"
- service_name: web
  service_port: "8080"
  service_options: [balance leastconn]
  server_options: check inter 2000
  servers:
    - [web-0, 10.0.0.5, 80, [maxconn 100]]
    - [web-1, 10.0.0.6, "80"]
"#;

    // Act
    let services = parse_services(raw).expect("valid services");

    // Assert
    assert_eq!(services.len(), 1);
    let web = &services[0];
    assert_eq!(web.service_name, "web");
    assert_eq!(web.service_host, "0.0.0.0");
    assert_eq!(web.service_port, 8080);
    assert_eq!(web.service_options, vec!["balance leastconn".to_string()]);
    assert_eq!(web.server_options, vec!["check inter 2000".to_string()]);
    assert_eq!(
        web.servers,
        vec![
            LegacyServer {
                name: "web-0".to_string(),
                host: "10.0.0.5".to_string(),
                port: 80,
                options: vec!["maxconn 100".to_string()],
            },
            LegacyServer {
                name: "web-1".to_string(),
                host: "10.0.0.6".to_string(),
                port: 80,
                options: Vec::new(),
            },
        ]
    );
}

#[test]
fn rejects_options_with_line_breaks() {
    // Arrange
    let raw = "- service_name: web\n  service_port: 80\n  service_options: [\"a\\nb\"]\n";

    // Act
    let err = parse_services(raw).unwrap_err();

    // Assert
    assert!(err.to_string().contains("must not contain line breaks"));
}

#[test]
fn rejects_bind_address_carrying_extra_directives() {
    // Arrange
    let raw = "- service_name: web\n  service_host: \"0.0.0.0 ssl crt /etc/shadow\"\n  service_port: 80\n";

    // Act
    let err = parse_services(raw).unwrap_err();

    // Assert
    assert!(err.to_string().contains("invalid bind address '0.0.0.0 ssl crt /etc/shadow'"));
}

#[test]
fn accepts_ip_and_hostname_bind_addresses() {
    // Arrange
    let raw = "- service_name: a\n  service_host: \"::\"\n  service_port: 80\n- service_name: b\n  service_host: lb.example.com\n  service_port: 81\n";

    // Act
    let services = parse_services(raw).expect("valid services");

    // Assert
    assert_eq!(services[0].service_host, "::");
    assert_eq!(services[1].service_host, "lb.example.com");
}

#[test]
fn unit_without_services_exposes_its_address() {
    // Arrange
    let bag = databag(&[
        ("private-address", "10.0.0.9"),
        ("port", "8000"),
        ("hostname", ""),
    ]);

    // Act
    let unit = LegacyUnitData::load(&bag).expect("valid unit");

    // Assert
    assert_eq!(unit.address(), Some("10.0.0.9"));
    assert_eq!(unit.port, Some(8000));
    assert!(unit.services.is_empty());
}

#[test]
fn invalid_port_is_rejected() {
    // Arrange
    let bag = databag(&[("private-address", "10.0.0.9"), ("port", "http")]);

    // Act
    let err = LegacyUnitData::load(&bag).unwrap_err();

    // Assert
    assert_eq!(err.to_string(), "data validation: port: invalid port 'http'");
}
