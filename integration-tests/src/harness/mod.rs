mod fixtures;
pub mod operator;
pub mod tracing;

pub use fixtures::load_model;
pub use operator::TestOperator;
pub use tracing::{CapturedEvent, capture_events};
