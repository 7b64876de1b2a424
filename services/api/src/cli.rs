use crate::server;
use clap::{Args, Parser, Subcommand};
use seatwatch::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "seatwatch",
    about = "Watch course sections for open seats and push alerts when they open",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service and background jobs (default command)
    Serve(ServeArgs),
    /// Look up a course in the class search and print its sections
    Search(SearchArgs),
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

#[derive(Args, Debug)]
pub(crate) struct SearchArgs {
    /// Course to look up, e.g. "CSE 110"
    pub(crate) class_name: String,
    /// Term code to search instead of the configured one
    #[arg(long)]
    pub(crate) term: Option<String>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Search(args) => server::search(args).await,
    }
}
