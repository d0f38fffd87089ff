//! The platform's view of this unit: charm config, secrets and every
//! relation with its databags, captured once per event.

mod charm_config;
mod event;
mod relation;
mod snapshot;
mod status;

pub use charm_config::CharmConfig;
pub use event::{Event, EventParseError};
pub use relation::{Relation, RelationId};
pub use snapshot::{ModelSnapshot, SnapshotError};
pub use status::UnitStatus;
