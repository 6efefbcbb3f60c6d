use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod capture;
mod dashboard;
mod render;
mod session;

#[derive(Parser)]
#[command(author, version, about = "DARTA — your business data assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Chat with DARTA (default)
    Chat,
    /// Show the business overview
    Dashboard,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => session::run().await,
        Command::Dashboard => {
            dashboard::render(&darta::dashboard::mock_dashboard());
            Ok(())
        }
    }
}
