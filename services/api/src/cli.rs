use crate::commands::{run_extract, run_reconcile, ExtractArgs, ReconcileArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use estate_recon::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Estate Notice Reconciler",
    about = "Reconcile gazette estate notices against the registry from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Extract notices from a gazette text file and summarize them
    Extract(ExtractArgs),
    /// Match a registry export against a gazette and store accepted matches
    Reconcile(ReconcileArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Extract(args) => run_extract(args),
        Command::Reconcile(args) => run_reconcile(args),
    }
}
