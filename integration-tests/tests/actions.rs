use haproxy_operator_core::actions::{ActionError, get_proxied_endpoints};
use haproxy_operator_core::settings::OperatorSettings;
use integration_tests::harness::load_model;
use pretty_assertions::assert_eq;

/// Hostnames times paths, hostname first
#[test]
fn proxied_endpoints_cover_every_hostname_and_path() {
    // Arrange
    let model = load_model("api_route_with_paths.yaml");

    // Act
    let result = get_proxied_endpoints(&model, &OperatorSettings::default(), None).unwrap();

    // Assert
    assert_eq!(
        serde_json::to_value(&result.endpoints).unwrap(),
        serde_json::json!([
            "https://api.example.com/v1",
            "https://api.example.com/v2",
            "https://ok2.example.com/v1",
            "https://ok2.example.com/v2",
            "https://ok3.example.com/v1",
            "https://ok3.example.com/v2",
        ])
    );
}

/// Filtering on a rejected or unknown backend fails with its name
#[test]
fn unknown_backend_filter_fails() {
    // Arrange
    let model = load_model("https_without_ca.yaml");

    // Act
    let err = get_proxied_endpoints(&model, &OperatorSettings::default(), Some("secure"))
        .unwrap_err();

    // Assert
    assert!(matches!(err, ActionError::UnknownBackend { .. }));
    assert_eq!(err.to_string(), r#"No backend with name "secure""#);
}
