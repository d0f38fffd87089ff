pub mod actions;
pub mod cli;
pub mod databag;
pub mod host;
pub mod interfaces;
pub mod logging;
pub mod model;
pub mod reconciler;
pub mod render;
pub mod settings;
pub mod state;
pub mod tls;
pub mod validation;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;
