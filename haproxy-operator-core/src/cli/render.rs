use crate::cli::Inputs;
use crate::render::Renderer;
use crate::state::assemble;
use crate::tls;
use anyhow::{Context, Result, bail};
use std::path::Path;

/// Print the configuration a reconcile of `model` would write. TLS binds
/// are rendered when the snapshot already carries issued certificates.
pub fn render(model: &Path, settings: Option<&Path>) -> Result<()> {
    let inputs = Inputs::load(model, settings)?;
    let state = assemble(&inputs.snapshot, &inputs.settings);
    if let Some(message) = &state.blocking {
        bail!("{}", message);
    }

    let plan = tls::plan(&inputs.snapshot, &state).context("failed to plan certificates")?;
    let rendered = Renderer::new()?.render(
        &inputs.snapshot,
        &inputs.settings,
        &state,
        !plan.issued.is_empty(),
    )?;

    print!("{}", rendered.haproxy_cfg);
    if let Some(spoe) = &rendered.spoe_auth {
        println!();
        println!("# {}", inputs.settings.spoe_auth_path().display());
        print!("{spoe}");
    }
    Ok(())
}
