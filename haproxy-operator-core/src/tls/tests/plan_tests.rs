use crate::databag::{Databag, DatabagModel};
use crate::settings::OperatorSettings;
use crate::state::assemble;
use crate::testing::{RelationBuilder, SnapshotBuilder, TestCa};
use crate::tls::{
    IssuedCertificate, PRIVATE_KEY_SECRET, certificate_common_name, csr_common_name,
    desired_hostnames, plan,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn route(id: u32, service: &str, hostname: &str) -> RelationBuilder {
    RelationBuilder::new(id, "haproxy-route", service)
        .app(json!({"service": service, "ports": [80], "hostname": hostname}))
        .unit_address(&format!("{service}/0"), "10.0.0.1")
}

#[test]
fn hostnames_cover_external_backends_and_terminated_sni() {
    // Arrange
    let snapshot = SnapshotBuilder::new()
        .external_hostname("haproxy.internal")
        .relation(route(1, "api", "api.example.com"))
        .relation(
            RelationBuilder::new(2, "haproxy-route-tcp", "db")
                .app(json!({"port": 5432, "sni": "db.example.com"}))
                .unit_address("db/0", "10.0.0.2"),
        )
        .relation(
            RelationBuilder::new(3, "haproxy-route-tcp", "wild")
                .app(json!({"port": 5433, "sni": "*.example.com"}))
                .unit_address("wild/0", "10.0.0.3"),
        )
        .relation(
            RelationBuilder::new(4, "haproxy-route-tcp", "pass")
                .app(json!({"port": 5434, "sni": "pass.example.com", "tls_terminate": false}))
                .unit_address("pass/0", "10.0.0.4"),
        )
        .build();
    let state = assemble(&snapshot, &OperatorSettings::default());

    // Act
    let hostnames: Vec<_> = desired_hostnames(&snapshot, &state).into_iter().collect();

    // Assert
    assert_eq!(
        hostnames,
        vec!["api.example.com", "db.example.com", "haproxy.internal"]
    );
}

#[test]
fn without_certificates_integration_everything_is_pending() {
    // Arrange
    let snapshot = SnapshotBuilder::new()
        .external_hostname("haproxy.internal")
        .build();
    let state = assemble(&snapshot, &OperatorSettings::default());

    // Act
    let plan = plan(&snapshot, &state).unwrap();

    // Assert
    assert_eq!(plan.private_key, None);
    assert!(plan.requests.is_empty());
    assert_eq!(
        plan.waiting_message().as_deref(),
        Some("waiting for certificates: haproxy.internal")
    );
}

#[test]
fn leader_generates_key_and_requests_one_csr_per_hostname() {
    // Arrange
    let snapshot = SnapshotBuilder::new()
        .external_hostname("haproxy.internal")
        .relation(route(1, "api", "api.example.com"))
        .relation(RelationBuilder::new(7, "certificates", "ca"))
        .build();
    let state = assemble(&snapshot, &OperatorSettings::default());

    // Act
    let plan = plan(&snapshot, &state).unwrap();

    // Assert
    assert!(plan.new_private_key);
    assert!(plan.private_key.is_some());
    let names: Vec<_> = plan
        .requests
        .iter()
        .map(|r| csr_common_name(&r.certificate_signing_request).unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            Some("api.example.com".to_string()),
            Some("haproxy.internal".to_string())
        ]
    );
    assert_eq!(plan.pending.len(), 2);
}

#[test]
fn published_requests_are_reused_with_a_stored_key() {
    // Arrange
    let build = |secret: Option<String>, local: Databag| {
        let mut builder = SnapshotBuilder::new()
            .external_hostname("haproxy.internal")
            .relation(RelationBuilder::new(7, "certificates", "ca").local_app(local));
        if let Some(key) = secret {
            builder = builder.secret(PRIVATE_KEY_SECRET, &key);
        }
        builder.build()
    };
    let first_snapshot = build(None, Databag::new());
    let first_state = assemble(&first_snapshot, &OperatorSettings::default());
    let first = plan(&first_snapshot, &first_state).unwrap();
    let snapshot = build(first.private_key.clone(), first.requirer_data().dump().unwrap());
    let state = assemble(&snapshot, &OperatorSettings::default());

    // Act
    let second = plan(&snapshot, &state).unwrap();

    // Assert
    assert!(!second.new_private_key);
    assert_eq!(second.private_key, first.private_key);
    assert_eq!(second.requests, first.requests);
}

#[test]
fn provider_certificate_matching_the_request_is_issued() {
    // Arrange
    let ca = TestCa::new();
    let seed = SnapshotBuilder::new()
        .external_hostname("haproxy.internal")
        .relation(RelationBuilder::new(7, "certificates", "ca"))
        .build();
    let seed_plan = plan(&seed, &assemble(&seed, &OperatorSettings::default())).unwrap();
    let key = seed_plan.private_key.clone().unwrap();
    let csr = seed_plan.requests[0].certificate_signing_request.clone();
    let certificate = ca.issue("haproxy.internal", &key);

    let snapshot = SnapshotBuilder::new()
        .external_hostname("haproxy.internal")
        .secret(PRIVATE_KEY_SECRET, &key)
        .relation(
            RelationBuilder::new(7, "certificates", "ca")
                .local_app(seed_plan.requirer_data().dump().unwrap())
                .app(json!({"certificates": [{
                    "certificate": certificate,
                    "certificate_signing_request": csr,
                    "ca": ca.ca_pem(),
                    "chain": [certificate, ca.ca_pem()]
                }]})),
        )
        .build();
    let state = assemble(&snapshot, &OperatorSettings::default());

    // Act
    let plan = plan(&snapshot, &state).unwrap();

    // Assert
    assert!(plan.pending.is_empty());
    assert_eq!(plan.waiting_message(), None);
    let issued = &plan.issued[0];
    assert_eq!(issued.hostname, "haproxy.internal");
    assert_eq!(
        certificate_common_name(&issued.certificate).unwrap().as_deref(),
        Some("haproxy.internal")
    );
    let bundle = issued.pem_bundle(&key);
    assert_eq!(bundle.matches("BEGIN CERTIFICATE").count(), 2);
    assert!(bundle.trim_end().ends_with("-----END PRIVATE KEY-----"));
}

#[test]
fn revoked_certificates_are_not_used() {
    // Arrange
    let ca = TestCa::new();
    let seed = SnapshotBuilder::new()
        .external_hostname("haproxy.internal")
        .relation(RelationBuilder::new(7, "certificates", "ca"))
        .build();
    let seed_plan = plan(&seed, &assemble(&seed, &OperatorSettings::default())).unwrap();
    let key = seed_plan.private_key.clone().unwrap();
    let snapshot = SnapshotBuilder::new()
        .external_hostname("haproxy.internal")
        .secret(PRIVATE_KEY_SECRET, &key)
        .relation(
            RelationBuilder::new(7, "certificates", "ca")
                .local_app(seed_plan.requirer_data().dump().unwrap())
                .app(json!({"certificates": [{
                    "certificate": ca.issue("haproxy.internal", &key),
                    "certificate_signing_request": seed_plan.requests[0].certificate_signing_request,
                    "ca": ca.ca_pem(),
                    "revoked": true
                }]})),
        )
        .build();
    let state = assemble(&snapshot, &OperatorSettings::default());

    // Act
    let plan = plan(&snapshot, &state).unwrap();

    // Assert
    assert!(plan.issued.is_empty());
    assert_eq!(plan.pending, vec!["haproxy.internal".to_string()]);
}

#[test]
fn non_leader_waits_for_the_leader_key() {
    // Arrange
    let snapshot = SnapshotBuilder::new()
        .leader(false)
        .external_hostname("haproxy.internal")
        .relation(RelationBuilder::new(7, "certificates", "ca"))
        .build();
    let state = assemble(&snapshot, &OperatorSettings::default());

    // Act
    let plan = plan(&snapshot, &state).unwrap();

    // Assert
    assert_eq!(plan.private_key, None);
    assert!(plan.requests.is_empty());
    assert_eq!(plan.pending, vec!["haproxy.internal".to_string()]);
}

#[test]
fn corrupt_key_secret_is_an_error() {
    // Arrange
    let snapshot = SnapshotBuilder::new()
        .external_hostname("haproxy.internal")
        .secret(PRIVATE_KEY_SECRET, "not a key")
        .relation(RelationBuilder::new(7, "certificates", "ca"))
        .build();
    let state = assemble(&snapshot, &OperatorSettings::default());

    // Act
    let result = plan(&snapshot, &state);

    // Assert
    assert_eq!(
        result.unwrap_err().to_string(),
        "invalid private key in secret 'tls-private-key'"
    );
}

#[test]
fn pem_bundle_trims_parts_and_skips_a_chain_entry_repeating_the_leaf() {
    // Arrange
    let issued = IssuedCertificate {
        hostname: "haproxy.internal".to_string(),
        certificate: "LEAF\n".to_string(),
        ca: "ROOT".to_string(),
        chain: vec!["LEAF".to_string(), "  ".to_string(), "\nINTERMEDIATE\n".to_string()],
    };

    // Act
    let bundle = issued.pem_bundle("KEY\n\n");

    // Assert
    assert_eq!(bundle, "LEAF\nINTERMEDIATE\nKEY\n");
}
