use crate::databag::Databag;
use crate::model::{RelationId, UnitStatus};
use crate::state::Rejection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabagScope {
    App,
    Unit,
}

/// A local databag that must be replaced by `databag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabagWrite {
    pub relation_id: RelationId,
    pub endpoint: String,
    pub scope: DatabagScope,
    pub databag: Databag,
}

/// What one reconcile did, for the dispatcher to apply to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub event: String,
    pub status: UnitStatus,
    pub databag_writes: Vec<DatabagWrite>,
    /// Secrets to create, by label.
    pub new_secrets: BTreeMap<String, String>,
    pub files_written: Vec<PathBuf>,
    pub files_removed: Vec<PathBuf>,
    pub reloaded: bool,
    pub rejections: Vec<Rejection>,
}

impl ReconcileOutcome {
    pub(crate) fn new(event: String) -> Self {
        Self {
            event,
            status: UnitStatus::active(),
            databag_writes: Vec::new(),
            new_secrets: BTreeMap::new(),
            files_written: Vec::new(),
            files_removed: Vec::new(),
            reloaded: false,
            rejections: Vec::new(),
        }
    }

    pub fn write_for(&self, relation_id: RelationId, scope: DatabagScope) -> Option<&Databag> {
        self.databag_writes
            .iter()
            .find(|w| w.relation_id == relation_id && w.scope == scope)
            .map(|w| &w.databag)
    }

    pub(crate) fn wrote(&mut self, path: PathBuf) {
        if !self.files_written.contains(&path) {
            self.files_written.push(path);
        }
    }
}
