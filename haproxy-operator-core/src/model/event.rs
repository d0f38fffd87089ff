use crate::model::RelationId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Platform notifications. Every variant is handled by the same reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Event {
    Install,
    Upgrade,
    ConfigChanged,
    UpdateStatus,
    RelationChanged {
        endpoint: String,
        relation_id: RelationId,
    },
    RelationBroken {
        endpoint: String,
        relation_id: RelationId,
    },
    CertificateAvailable,
    CaCertificatesUpdated,
    PeersChanged,
}

impl Event {
    pub fn requires_install(&self) -> bool {
        matches!(self, Self::Install | Self::Upgrade)
    }

    /// Relation that is going away and must not contribute to this reconcile.
    pub fn departing_relation(&self) -> Option<RelationId> {
        match self {
            Self::RelationBroken { relation_id, .. } => Some(*relation_id),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install => write!(f, "install"),
            Self::Upgrade => write!(f, "upgrade"),
            Self::ConfigChanged => write!(f, "config-changed"),
            Self::UpdateStatus => write!(f, "update-status"),
            Self::RelationChanged {
                endpoint,
                relation_id,
            } => write!(f, "relation-changed:{}:{}", endpoint, relation_id),
            Self::RelationBroken {
                endpoint,
                relation_id,
            } => write!(f, "relation-broken:{}:{}", endpoint, relation_id),
            Self::CertificateAvailable => write!(f, "certificate-available"),
            Self::CaCertificatesUpdated => write!(f, "ca-certificates-updated"),
            Self::PeersChanged => write!(f, "peers-changed"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid event '{input}': {reason}")]
pub struct EventParseError {
    input: String,
    reason: &'static str,
}

impl FromStr for Event {
    type Err = EventParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason| EventParseError {
            input: s.to_string(),
            reason,
        };

        match s {
            "install" => return Ok(Self::Install),
            "upgrade" => return Ok(Self::Upgrade),
            "config-changed" => return Ok(Self::ConfigChanged),
            "update-status" => return Ok(Self::UpdateStatus),
            "certificate-available" => return Ok(Self::CertificateAvailable),
            "ca-certificates-updated" => return Ok(Self::CaCertificatesUpdated),
            "peers-changed" => return Ok(Self::PeersChanged),
            _ => {}
        }

        let mut parts = s.splitn(3, ':');
        let kind = parts.next().unwrap_or_default();
        let endpoint = parts
            .next()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| fail("expected <kind>:<endpoint>:<relation-id>"))?
            .to_string();
        let relation_id = parts
            .next()
            .and_then(|id| id.parse().ok())
            .map(RelationId::new)
            .ok_or_else(|| fail("relation id must be a non-negative integer"))?;

        match kind {
            "relation-changed" => Ok(Self::RelationChanged {
                endpoint,
                relation_id,
            }),
            "relation-broken" => Ok(Self::RelationBroken {
                endpoint,
                relation_id,
            }),
            _ => Err(fail("unknown event kind")),
        }
    }
}
