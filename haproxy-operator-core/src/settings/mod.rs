//! Host-local operator settings, read from an optional HCL file.

mod error;
mod operator_settings;

pub use error::SettingsError;
pub use operator_settings::OperatorSettings;
