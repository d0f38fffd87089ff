use crate::model::{CharmConfig, Relation, RelationId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Everything the platform tells this unit at the time of one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub app_name: String,
    pub unit_name: String,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub is_leader: bool,
    /// Address this unit binds and advertises to its peers.
    #[serde(default)]
    pub unit_address: Option<IpAddr>,
    #[serde(default)]
    pub config: CharmConfig,
    /// Application secrets by label.
    #[serde(default)]
    pub secrets: BTreeMap<String, String>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read model snapshot {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid model snapshot {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid model snapshot {path}: {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ModelSnapshot {
    /// Load a snapshot; `.json` files are read as JSON, anything else as YAML.
    pub fn from_file(path: &Path) -> Result<Self, SnapshotError> {
        let raw = fs::read_to_string(path).map_err(|source| SnapshotError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&raw).map_err(|source| SnapshotError::ParseJson {
                path: path.to_path_buf(),
                source,
            })
        } else {
            serde_yaml::from_str(&raw).map_err(|source| SnapshotError::ParseYaml {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    /// Relations on `endpoint`, ordered by relation id.
    pub fn relations(&self, endpoint: &str) -> Vec<&Relation> {
        let mut relations: Vec<_> = self
            .relations
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .collect();
        relations.sort_by_key(|r| r.id);
        relations
    }

    pub fn has_relation(&self, endpoint: &str) -> bool {
        self.relations.iter().any(|r| r.endpoint == endpoint)
    }

    pub fn relation(&self, id: RelationId) -> Option<&Relation> {
        self.relations.iter().find(|r| r.id == id)
    }

    pub fn without_relation(mut self, id: RelationId) -> Self {
        self.relations.retain(|r| r.id != id);
        self
    }
}
