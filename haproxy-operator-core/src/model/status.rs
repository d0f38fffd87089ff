use serde::{Deserialize, Serialize};
use std::fmt;

/// Workload status surfaced to the platform at the end of every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum UnitStatus {
    Active(String),
    Waiting(String),
    Blocked(String),
    Maintenance(String),
}

impl UnitStatus {
    pub fn active() -> Self {
        Self::Active(String::new())
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Active(m) | Self::Waiting(m) | Self::Blocked(m) | Self::Maintenance(m) => m,
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Active(_) => "active",
            Self::Waiting(_) => "waiting",
            Self::Blocked(_) => "blocked",
            Self::Maintenance(_) => "maintenance",
        };
        if self.message().is_empty() {
            write!(f, "{}", name)
        } else {
            write!(f, "{}: {}", name, self.message())
        }
    }
}
