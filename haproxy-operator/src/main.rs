use clap::{Parser, Subcommand};
use haproxy_operator_core::cli;
use haproxy_operator_core::logging::{LogMode, default_log_mode, init_logging};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "haproxy-operator",
    version,
    about = "Operates HAProxy from the relations of its model"
)]
struct Cli {
    /// Host-local operator settings (HCL)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log output format; defaults to pretty on a terminal, JSON otherwise
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogMode>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile this unit for one event
    Reconcile {
        /// Model snapshot (YAML or JSON)
        #[arg(long)]
        model: PathBuf,

        /// Event name, e.g. config-changed or relation-broken:ingress:4
        #[arg(long)]
        event: Option<String>,
    },

    /// Operator actions
    Action {
        #[command(subcommand)]
        cmd: cli::action::ActionCmd,
    },

    /// Assemble the state and report rejected relations
    Check {
        #[arg(long)]
        model: PathBuf,

        /// Output as JSON
        #[arg(long, conflicts_with = "plain")]
        json: bool,

        /// Plain text without colors
        #[arg(long)]
        plain: bool,
    },

    /// Print the configuration a reconcile would write
    Render {
        #[arg(long)]
        model: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format.unwrap_or_else(default_log_mode));

    let settings = cli.settings.as_deref();
    let result = match cli.command {
        Command::Reconcile { model, event } => {
            cli::reconcile::reconcile(&model, settings, event.as_deref()).await
        }
        Command::Action { cmd } => cli::action::run(cmd, cli.settings.clone()),
        Command::Check { model, json, plain } => cli::check::check(&model, settings, json, plain),
        Command::Render { model } => cli::render::render(&model, settings),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
