use super::{api_relation, reconciler, reconciler_with};
use crate::model::{Event, RelationId, UnitStatus};
use crate::testing::{
    FakeHaproxyService, MemoryFileSystem, RelationBuilder, SnapshotBuilder, apply_outcome,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::PathBuf;

const CONFIG: &str = "/etc/haproxy/haproxy.cfg";
const CANDIDATE: &str = "/etc/haproxy/haproxy.cfg.candidate";

fn waiting_for_api_certificate() -> UnitStatus {
    UnitStatus::Active("waiting for certificates: api.example.com".to_string())
}

#[tokio::test]
async fn first_pass_validates_writes_and_reloads() {
    // Arrange
    let reconciler = reconciler(FakeHaproxyService::new());
    let snapshot = SnapshotBuilder::new().relation(api_relation(1)).build();

    // Act
    let outcome = reconciler.handle(&Event::ConfigChanged, snapshot).await;

    // Assert
    assert_eq!(outcome.status, waiting_for_api_certificate());
    assert!(outcome.reloaded);
    assert_eq!(
        outcome.files_written,
        vec![
            PathBuf::from("/etc/haproxy/ffdhe2048.txt"),
            PathBuf::from(CONFIG),
        ]
    );
    assert_eq!(
        reconciler.service().validated_paths(),
        vec![PathBuf::from(CANDIDATE)]
    );
    let config = reconciler.fs().file(CONFIG).expect("config written");
    assert_eq!(config.mode, 0o644);
    assert_eq!(config.owner.as_deref(), Some("haproxy"));
    assert!(!reconciler.fs().exists(CANDIDATE));
}

#[tokio::test]
async fn unchanged_input_writes_nothing_and_does_not_reload() {
    // Arrange
    let reconciler = reconciler(FakeHaproxyService::new());
    let mut snapshot = SnapshotBuilder::new().relation(api_relation(1)).build();
    let first = reconciler
        .handle(&Event::ConfigChanged, snapshot.clone())
        .await;
    apply_outcome(&mut snapshot, &first);
    reconciler.fs().clear_writes();

    // Act
    let second = reconciler.handle(&Event::UpdateStatus, snapshot).await;

    // Assert
    assert_eq!(second.status, waiting_for_api_certificate());
    assert!(second.files_written.is_empty());
    assert!(second.databag_writes.is_empty());
    assert!(!second.reloaded);
    assert!(reconciler.fs().writes().is_empty());
    assert_eq!(reconciler.service().reloads(), 1);
}

#[tokio::test]
async fn refused_candidate_keeps_the_live_configuration() {
    // Arrange
    let fs = MemoryFileSystem::new().with_file(CONFIG, "# previous\n");
    let service = FakeHaproxyService::new().rejecting(
        "[NOTICE] (1) : haproxy version is 2.8.5\n[ALERT]    (1) : config : parsing [haproxy.cfg:42] : unknown keyword 'bogus'\n",
    );
    let reconciler = reconciler_with(fs, service);
    let snapshot = SnapshotBuilder::new().relation(api_relation(1)).build();

    // Act
    let outcome = reconciler.handle(&Event::ConfigChanged, snapshot).await;

    // Assert
    assert_eq!(
        outcome.status,
        UnitStatus::Blocked(
            "invalid haproxy configuration: [ALERT]    (1) : config : parsing [haproxy.cfg:42] : unknown keyword 'bogus'"
                .to_string()
        )
    );
    assert_eq!(reconciler.fs().contents(CONFIG).as_deref(), Some("# previous\n"));
    assert!(!reconciler.fs().exists(CANDIDATE));
    assert_eq!(reconciler.service().reloads(), 0);
    assert!(outcome.databag_writes.is_empty());
}

#[tokio::test]
async fn validation_timeout_blocks_without_reload() {
    // Arrange
    let reconciler = reconciler(FakeHaproxyService::new().timing_out());
    let snapshot = SnapshotBuilder::new().relation(api_relation(1)).build();

    // Act
    let outcome = reconciler.handle(&Event::ConfigChanged, snapshot).await;

    // Assert
    assert_eq!(
        outcome.status,
        UnitStatus::Blocked(
            "invalid haproxy configuration: haproxy did not finish within 30s".to_string()
        )
    );
    assert!(!outcome.reloaded);
}

#[tokio::test]
async fn failed_reload_is_retried_once() {
    // Arrange
    let reconciler = reconciler(FakeHaproxyService::new().failing_reloads(1));
    let snapshot = SnapshotBuilder::new().relation(api_relation(1)).build();

    // Act
    let outcome = reconciler.handle(&Event::ConfigChanged, snapshot).await;

    // Assert
    assert_eq!(outcome.status, waiting_for_api_certificate());
    assert!(outcome.reloaded);
    assert_eq!(reconciler.service().reloads(), 2);
}

#[tokio::test]
async fn persistent_reload_failure_blocks() {
    // Arrange
    let reconciler = reconciler(FakeHaproxyService::new().failing_reloads(2));
    let snapshot = SnapshotBuilder::new().relation(api_relation(1)).build();

    // Act
    let outcome = reconciler.handle(&Event::ConfigChanged, snapshot).await;

    // Assert
    assert_eq!(
        outcome.status,
        UnitStatus::Blocked("haproxy reload failed: Job for haproxy.service failed".to_string())
    );
    assert_eq!(reconciler.service().reloads(), 2);
}

#[tokio::test]
async fn failed_reload_restores_previous_files_and_next_pass_reloads_again() {
    // Arrange
    let fs = MemoryFileSystem::new().with_file(CONFIG, "# previous\n");
    let reconciler = reconciler_with(fs, FakeHaproxyService::new().failing_reloads(2));
    let mut snapshot = SnapshotBuilder::new().relation(api_relation(1)).build();
    let first = reconciler
        .handle(&Event::ConfigChanged, snapshot.clone())
        .await;
    let config_after_failure = reconciler.fs().contents(CONFIG);
    let dhparam_after_failure = reconciler.fs().exists("/etc/haproxy/ffdhe2048.txt");
    apply_outcome(&mut snapshot, &first);

    // Act
    let second = reconciler.handle(&Event::UpdateStatus, snapshot).await;

    // Assert
    assert_eq!(
        first.status,
        UnitStatus::Blocked("haproxy reload failed: Job for haproxy.service failed".to_string())
    );
    assert!(first.files_written.is_empty());
    assert_eq!(config_after_failure.as_deref(), Some("# previous\n"));
    assert!(!dhparam_after_failure);

    assert_eq!(second.status, waiting_for_api_certificate());
    assert!(second.reloaded);
    assert_eq!(reconciler.service().reloads(), 3);
    let config = reconciler.fs().contents(CONFIG).expect("config written");
    assert!(config.contains("\nbackend api\n"));
}

#[tokio::test]
async fn stopped_service_is_started_even_without_changes() {
    // Arrange
    let reconciler = reconciler(FakeHaproxyService::new());
    let mut snapshot = SnapshotBuilder::new().build();
    let first = reconciler
        .handle(&Event::ConfigChanged, snapshot.clone())
        .await;
    apply_outcome(&mut snapshot, &first);
    let stopped = reconciler_with(
        MemoryFileSystem::new()
            .with_file(
                CONFIG,
                &reconciler.fs().contents(CONFIG).expect("config written"),
            )
            .with_file(
                "/etc/haproxy/ffdhe2048.txt",
                crate::render::FFDHE2048,
            ),
        FakeHaproxyService::new().inactive(),
    );

    // Act
    let outcome = stopped.handle(&Event::UpdateStatus, snapshot).await;

    // Assert
    assert!(outcome.files_written.is_empty());
    assert!(outcome.reloaded);
    assert_eq!(outcome.status, UnitStatus::active());
}

#[tokio::test]
async fn blocking_conflict_skips_every_host_operation() {
    // Arrange
    let reconciler = reconciler(FakeHaproxyService::new());
    let snapshot = SnapshotBuilder::new()
        .external_hostname("haproxy.internal")
        .relation(
            RelationBuilder::new(1, "ingress", "web")
                .app(json!({"model": "prod", "name": "web", "port": 8080}))
                .unit("web/0", json!({"host": "10.0.0.7"})),
        )
        .relation(
            RelationBuilder::new(2, "reverseproxy", "legacy")
                .raw_unit("legacy/0", &[("private-address", "10.0.0.8")]),
        )
        .build();

    // Act
    let outcome = reconciler.handle(&Event::ConfigChanged, snapshot).await;

    // Assert
    assert_eq!(
        outcome.status,
        UnitStatus::Blocked(
            "ingress and reverseproxy integrations are mutually exclusive".to_string()
        )
    );
    assert!(reconciler.fs().paths().is_empty());
    assert_eq!(reconciler.service().reloads(), 0);
}

#[tokio::test]
async fn install_event_installs_the_package() {
    // Arrange
    let reconciler = reconciler(FakeHaproxyService::new().not_installed());

    // Act
    let outcome = reconciler
        .handle(&Event::Install, SnapshotBuilder::new().build())
        .await;

    // Assert
    assert_eq!(reconciler.service().installs(), 1);
    assert_eq!(outcome.status, UnitStatus::active());
    let config = reconciler.fs().contents(CONFIG).expect("config written");
    assert!(config.contains("frontend default"));
}

#[tokio::test]
async fn failed_install_blocks() {
    // Arrange
    let reconciler = reconciler(FakeHaproxyService::new().not_installed().failing_install());

    // Act
    let outcome = reconciler
        .handle(&Event::Install, SnapshotBuilder::new().build())
        .await;

    // Assert
    assert_eq!(
        outcome.status,
        UnitStatus::Blocked(
            "failed to install haproxy: E: Unable to locate package haproxy".to_string()
        )
    );
    assert!(reconciler.fs().paths().is_empty());
}

#[tokio::test]
async fn broken_relation_no_longer_contributes() {
    // Arrange
    let reconciler = reconciler(FakeHaproxyService::new());
    let snapshot = SnapshotBuilder::new()
        .relation(api_relation(1))
        .relation(
            RelationBuilder::new(2, "haproxy-route", "web")
                .app(json!({"service": "web", "ports": [8080], "hostname": "web.example.com"}))
                .unit_address("web/0", "10.0.0.9"),
        )
        .build();
    let event = Event::RelationBroken {
        endpoint: "haproxy-route".to_string(),
        relation_id: RelationId::new(2),
    };

    // Act
    let outcome = reconciler.handle(&event, snapshot).await;

    // Assert
    let config = reconciler.fs().contents(CONFIG).expect("config written");
    assert!(config.contains("\nbackend api\n"));
    assert!(!config.contains("backend web"));
    assert!(
        outcome
            .databag_writes
            .iter()
            .all(|w| w.relation_id != RelationId::new(2))
    );
}

#[tokio::test]
async fn spoe_file_follows_the_agent_relation() {
    // Arrange
    let fs = MemoryFileSystem::new().with_file("/etc/haproxy/spoe_auth.conf", "[stale]\n");
    let reconciler = reconciler_with(fs, FakeHaproxyService::new());
    let snapshot = SnapshotBuilder::new().relation(api_relation(1)).build();

    // Act
    let outcome = reconciler.handle(&Event::ConfigChanged, snapshot).await;

    // Assert
    assert_eq!(
        outcome.files_removed,
        vec![PathBuf::from("/etc/haproxy/spoe_auth.conf")]
    );
    assert!(!reconciler.fs().exists("/etc/haproxy/spoe_auth.conf"));
}
