//! JSON-per-field encoding of typed records into relation databags.
//!
//! Every field of a record is stored as its own JSON document under the
//! field's wire key. Loading is strict: a record is either returned whole and
//! valid, or the call fails with a [`DataValidationError`]. Dumping omits
//! fields that equal the record's default to keep the wire form compact.

mod codec;
mod error;
#[cfg(test)]
mod tests;
mod violations;

pub use codec::{Databag, DatabagModel};
pub use error::DataValidationError;
pub use violations::Violations;
