use crate::model::RelationId;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Where a validation issue comes from: a charm config option, a settings
/// file key, or a relation.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Origin {
    pub(crate) source: String,
    pub(crate) section: String,
    pub(crate) index: Option<u32>,
}

impl Origin {
    pub fn new(source: impl Into<String>, section: &str, index: Option<u32>) -> Self {
        Self {
            source: source.into(),
            section: section.to_owned(),
            index,
        }
    }

    pub fn charm_config(option: &str) -> Self {
        Self::new("charm config", option, None)
    }

    pub fn settings(file: &Path, key: &str) -> Self {
        Self::new(file.display().to_string(), key, None)
    }

    pub fn relation(endpoint: &str, relation_id: RelationId) -> Self {
        Self::new("relation", endpoint, Some(relation_id.get()))
    }

    #[cfg(test)]
    pub(crate) fn test(message: &str) -> Self {
        Self::new("test", message, None)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}: {}:{}", self.source, self.section, i),
            None => write!(f, "{}: {}", self.source, self.section),
        }
    }
}
