use crate::commands::{run_list, run_set_status, run_summary};
use crate::demo::run_demo;
use crate::server;
use clap::{Args, Parser, Subcommand};
use listing_review::config::AppConfig;
use listing_review::error::AppError;
use listing_review::telemetry;
use listing_review::workflows::review::ListingStatus;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Listing Review Console",
    about = "Moderate submitted property listings from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show listing counts per review status
    Summary(ConnectArgs),
    /// Show the first page of listings in one status
    List(ListArgs),
    /// Approve, decline, or return a listing to pending
    SetStatus(SetStatusArgs),
    /// Serve an in-memory copy of the admin listing API
    Sandbox(SandboxArgs),
    /// Approve a listing end to end against an embedded sandbox
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ConnectArgs {
    /// Override the configured admin API base url
    #[arg(long)]
    pub(crate) api_url: Option<String>,
    /// Print JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ListArgs {
    #[command(flatten)]
    pub(crate) connect: ConnectArgs,
    /// pending, approved, or rejected
    #[arg(long, default_value = "pending")]
    pub(crate) status: ListingStatus,
}

#[derive(Args, Debug)]
pub(crate) struct SetStatusArgs {
    #[command(flatten)]
    pub(crate) connect: ConnectArgs,
    /// Listing identifier as shown by `list`
    #[arg(long)]
    pub(crate) id: String,
    /// Target status: pending, approved, or rejected
    #[arg(long)]
    pub(crate) status: ListingStatus,
    /// Bearer token for the status change (defaults to APP_ACCESS_TOKEN)
    #[arg(long)]
    pub(crate) token: Option<String>,
    /// Confirm without prompting
    #[arg(long)]
    pub(crate) yes: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SandboxArgs {
    /// Override the configured host for the sandbox server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the sandbox server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// CSV file of listings to serve instead of the built-in demo set
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
    /// Reject status changes that do not present this bearer token
    #[arg(long)]
    pub(crate) require_token: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Listing to move
    #[arg(long, default_value = "42")]
    pub(crate) listing: String,
    /// Status to move it to
    #[arg(long, default_value = "approved")]
    pub(crate) status: ListingStatus,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Command::Summary(args) => run_summary(&config, args).await,
        Command::List(args) => run_list(&config, args).await,
        Command::SetStatus(args) => run_set_status(&config, args).await,
        Command::Sandbox(args) => server::run(config, args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
