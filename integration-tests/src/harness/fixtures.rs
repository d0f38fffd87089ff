use haproxy_operator_core::model::ModelSnapshot;
use std::path::PathBuf;

/// Model snapshot stored under `integration-tests/fixtures/`.
pub fn load_model(file: &str) -> ModelSnapshot {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(file);

    ModelSnapshot::from_file(&path)
        .unwrap_or_else(|e| panic!("failed to load fixture {}: {e}", path.display()))
}
