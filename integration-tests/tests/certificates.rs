use haproxy_operator_core::actions::get_certificate;
use haproxy_operator_core::model::{Event, UnitStatus};
use haproxy_operator_core::testing::TestCa;
use integration_tests::harness::{TestOperator, load_model};
use pretty_assertions::assert_eq;

const EXTERNAL_PEM: &str = "/var/lib/haproxy/certs/haproxy.internal.pem";

/// A CSR goes out first; the certificate is installed once issued
#[tokio::test]
async fn certificate_is_requested_then_installed() {
    // Arrange
    let ca = TestCa::new();
    let mut operator = TestOperator::new(load_model("external_hostname.yaml"));

    // Act
    let requested = operator.event(Event::ConfigChanged).await;
    ca.fulfill(&mut operator.model);
    let installed = operator.event(Event::CertificateAvailable).await;

    // Assert
    assert_eq!(
        requested.status,
        UnitStatus::Active("waiting for certificates: haproxy.internal".to_string())
    );
    assert!(!requested.new_secrets.is_empty());
    assert!(!operator.model.relations[0].local_app_data.is_empty());

    assert_eq!(installed.status, UnitStatus::active());
    let file = operator.fs().file(EXTERNAL_PEM).expect("certificate installed");
    assert_eq!(file.mode, 0o644);
    assert_eq!(file.owner.as_deref(), Some("haproxy"));
    assert!(installed.reloaded);
}

/// The get-certificate action serves what the provider issued
#[tokio::test]
async fn issued_certificate_is_exposed_by_the_action() {
    // Arrange
    let ca = TestCa::new();
    let mut operator = TestOperator::new(load_model("external_hostname.yaml"));
    operator.event(Event::ConfigChanged).await;
    ca.fulfill(&mut operator.model);
    operator.event(Event::CertificateAvailable).await;

    // Act
    let data = get_certificate(&operator.model, "haproxy.internal").expect("certificate available");

    // Assert
    assert_eq!(data.ca, ca.ca_pem());
    let bundle = operator.fs().contents(EXTERNAL_PEM).expect("bundle installed");
    assert!(bundle.starts_with(data.certificate.trim()));
}
