use crate::cli::Inputs;
use crate::state::{ProxyState, assemble};
use anyhow::{Result, bail};
use std::path::Path;

/// Assemble the state for `model` and report what would be rejected,
/// without touching the host.
pub fn check(model: &Path, settings: Option<&Path>, json: bool, plain: bool) -> Result<()> {
    let inputs = Inputs::load(model, settings)?;
    let state = assemble(&inputs.snapshot, &inputs.settings);

    if json {
        println!("{}", state.report.render_json()?);
    } else if plain {
        print!("{}", state.report.render_plain());
    } else {
        print_summary(&state);
        if state.report.has_violations() {
            println!();
            print!("{}", state.report.render_pretty());
        }
    }

    if let Some(message) = &state.blocking {
        bail!("{}", message);
    }
    if let Some(rejection) = state.requirers.rejections.first() {
        bail!(
            "{} relation(s) rejected, first: {}",
            state.requirers.rejections.len(),
            rejection.reason
        );
    }
    Ok(())
}

fn print_summary(state: &ProxyState) {
    let info = &state.requirers;
    println!("✔ Mode {}", state.mode);
    println!("✔ {} http backends", info.backends.len());
    println!("✔ {} tcp frontends", info.tcp_frontends.len());
    println!(
        "✔ {} servers",
        info.backends.iter().map(|b| b.servers.len()).sum::<usize>()
            + info.tcp_backends().map(|b| b.servers.len()).sum::<usize>()
    );
    println!("✔ {} legacy services", state.legacy.len());
    println!("✔ {} peers", info.peers.len());
}
