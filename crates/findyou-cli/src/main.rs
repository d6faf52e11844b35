use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use findyou_infrastructure::ConfigService;

mod commands;
mod fixture;
mod logging;

#[derive(Parser)]
#[command(name = "findyou")]
#[command(about = "FindYou CLI - explore the match queue and mutual-like protocol", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.config/findyou/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// TOML seed file with the user population
    #[arg(long, global = true, default_value = "fixtures/demo.toml")]
    seed: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the live candidate queue of one user
    Candidates {
        /// Username of the viewing user
        #[arg(long)]
        user: String,
    },
    /// Run a sequence of swipes and print the resulting matches and chats
    Simulate {
        /// Comma-separated swipes: `a+b` means a likes b, `a-b` means a dislikes b
        #[arg(long)]
        actions: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigService::new(cli.config.as_deref())?.load()?;
    logging::init(&config.logging)?;

    match cli.command {
        Commands::Candidates { user } => commands::candidates::run(&config, &cli.seed, &user).await?,
        Commands::Simulate { actions } => {
            commands::simulate::run(&config, &cli.seed, &actions).await?
        }
    }

    Ok(())
}
