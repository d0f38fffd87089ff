use crate::databag::Databag;
use crate::model::{CharmConfig, ModelSnapshot, Relation, RelationId};
use crate::reconciler::{DatabagScope, ReconcileOutcome};
use serde_json::Value;
use std::net::IpAddr;

/// Encode a JSON object the way requirers publish it: one JSON document per
/// key.
pub fn json_databag(value: Value) -> Databag {
    match value {
        Value::Object(fields) => fields
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect(),
        Value::Null => Databag::new(),
        other => panic!("databag must be a JSON object, got {other}"),
    }
}

pub fn raw_databag(entries: &[(&str, &str)]) -> Databag {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub struct RelationBuilder {
    relation: Relation,
}

impl RelationBuilder {
    pub fn new(id: u32, endpoint: &str, remote_app: &str) -> Self {
        Self {
            relation: Relation {
                id: RelationId::new(id),
                endpoint: endpoint.to_string(),
                remote_app: remote_app.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn app(mut self, value: Value) -> Self {
        self.relation.app_data = json_databag(value);
        self
    }

    pub fn unit(mut self, name: &str, value: Value) -> Self {
        self.relation
            .units
            .insert(name.to_string(), json_databag(value));
        self
    }

    pub fn raw_unit(mut self, name: &str, entries: &[(&str, &str)]) -> Self {
        self.relation
            .units
            .insert(name.to_string(), raw_databag(entries));
        self
    }

    /// A unit of a route requirer publishing only its address.
    pub fn unit_address(self, name: &str, address: &str) -> Self {
        self.unit(name, serde_json::json!({ "address": address }))
    }

    pub fn local_app(mut self, databag: Databag) -> Self {
        self.relation.local_app_data = databag;
        self
    }

    pub fn build(self) -> Relation {
        self.relation
    }
}

/// Snapshot of a leader unit `haproxy/0` at 10.1.0.10 unless told otherwise.
pub struct SnapshotBuilder {
    snapshot: ModelSnapshot,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            snapshot: ModelSnapshot {
                app_name: "haproxy".to_string(),
                unit_name: "haproxy/0".to_string(),
                model_name: "test".to_string(),
                is_leader: true,
                unit_address: "10.1.0.10".parse::<IpAddr>().ok(),
                config: CharmConfig::default(),
                ..Default::default()
            },
        }
    }

    pub fn external_hostname(mut self, hostname: &str) -> Self {
        self.snapshot.config.external_hostname = Some(hostname.to_string());
        self
    }

    pub fn config(mut self, f: impl FnOnce(&mut CharmConfig)) -> Self {
        f(&mut self.snapshot.config);
        self
    }

    pub fn leader(mut self, is_leader: bool) -> Self {
        self.snapshot.is_leader = is_leader;
        self
    }

    pub fn secret(mut self, label: &str, value: &str) -> Self {
        self.snapshot
            .secrets
            .insert(label.to_string(), value.to_string());
        self
    }

    pub fn relation(mut self, relation: RelationBuilder) -> Self {
        self.snapshot.relations.push(relation.build());
        self
    }

    pub fn build(self) -> ModelSnapshot {
        self.snapshot
    }
}

/// Feed what a reconcile published back into the snapshot, the way the
/// platform would before the next event.
pub fn apply_outcome(snapshot: &mut ModelSnapshot, outcome: &ReconcileOutcome) {
    for write in &outcome.databag_writes {
        let Some(relation) = snapshot
            .relations
            .iter_mut()
            .find(|r| r.id == write.relation_id)
        else {
            continue;
        };
        match write.scope {
            DatabagScope::App => relation.local_app_data = write.databag.clone(),
            DatabagScope::Unit => relation.local_unit_data = write.databag.clone(),
        }
    }
    snapshot.secrets.extend(outcome.new_secrets.clone());
}
