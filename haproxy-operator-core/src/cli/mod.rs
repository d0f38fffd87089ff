//! Subcommand implementations behind the `haproxy-operator` binary.
//!
//! Each one returns `anyhow::Result<()>`; the binary prints the error on a
//! single line and exits with status 1.

pub mod action;
pub mod check;
pub mod reconcile;
pub mod render;

use crate::model::ModelSnapshot;
use crate::settings::OperatorSettings;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Snapshot and host settings shared by every subcommand.
pub struct Inputs {
    pub snapshot: ModelSnapshot,
    pub settings: OperatorSettings,
}

impl Inputs {
    pub fn load(model: &Path, settings: Option<&Path>) -> Result<Self> {
        let snapshot = ModelSnapshot::from_file(model)
            .with_context(|| format!("failed to load model {}", model.display()))?;
        let settings = OperatorSettings::load_or_default(settings)
            .context("failed to load operator settings")?;
        Ok(Self { snapshot, settings })
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    println!("{s}");
    Ok(())
}
