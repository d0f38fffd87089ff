use crate::actions::{get_certificate, get_proxied_endpoints};
use crate::cli::{Inputs, print_json};
use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum ActionCmd {
    /// List the URLs served for admitted HTTP backends
    GetProxiedEndpoints {
        /// Model snapshot (YAML or JSON)
        #[arg(long)]
        model: PathBuf,

        /// Only this backend
        #[arg(long)]
        backend: Option<String>,
    },

    /// Print the provider certificate issued for a hostname
    GetCertificate {
        /// Model snapshot (YAML or JSON)
        #[arg(long)]
        model: PathBuf,

        #[arg(long)]
        hostname: String,
    },
}

pub fn run(cmd: ActionCmd, settings: Option<PathBuf>) -> Result<()> {
    match cmd {
        ActionCmd::GetProxiedEndpoints { model, backend } => {
            let inputs = Inputs::load(&model, settings.as_deref())?;
            let endpoints =
                get_proxied_endpoints(&inputs.snapshot, &inputs.settings, backend.as_deref())?;
            print_json(&endpoints)
        }
        ActionCmd::GetCertificate { model, hostname } => {
            let inputs = Inputs::load(&model, settings.as_deref())?;
            print_json(&get_certificate(&inputs.snapshot, &hostname)?)
        }
    }
}
