mod apply_tests;

use crate::reconciler::Reconciler;
use crate::settings::OperatorSettings;
use crate::testing::{FakeHaproxyService, MemoryFileSystem, RelationBuilder};
use serde_json::json;

pub(crate) type TestReconciler = Reconciler<MemoryFileSystem, FakeHaproxyService>;

pub(crate) fn reconciler(service: FakeHaproxyService) -> TestReconciler {
    reconciler_with(MemoryFileSystem::new(), service)
}

pub(crate) fn reconciler_with(fs: MemoryFileSystem, service: FakeHaproxyService) -> TestReconciler {
    Reconciler::new(OperatorSettings::default(), fs, service).expect("templates load")
}

pub(crate) fn api_relation(id: u32) -> RelationBuilder {
    RelationBuilder::new(id, "haproxy-route", "api")
        .app(json!({"service": "api", "ports": [80], "hostname": "api.example.com"}))
        .unit_address("api/0", "10.0.0.1")
        .unit_address("api/1", "10.0.0.2")
}
