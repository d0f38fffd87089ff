use crate::cli::{Inputs, print_json};
use crate::host::{HostFileSystem, SystemdHaproxy};
use crate::model::Event;
use crate::reconciler::Reconciler;
use anyhow::{Context, Result};
use std::path::Path;

/// Run one reconcile against this machine and print the outcome as JSON.
/// A blocked status is a successful run; the status carries the reason.
pub async fn reconcile(model: &Path, settings: Option<&Path>, event: Option<&str>) -> Result<()> {
    let event: Event = match event {
        Some(raw) => raw.parse()?,
        None => Event::ConfigChanged,
    };
    let inputs = Inputs::load(model, settings)?;

    let service = SystemdHaproxy::new(&inputs.settings);
    let reconciler = Reconciler::new(inputs.settings, HostFileSystem, service)
        .context("failed to load templates")?;
    let outcome = reconciler.handle(&event, inputs.snapshot).await;

    print_json(&outcome)
}
