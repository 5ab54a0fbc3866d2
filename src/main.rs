use clap::Parser;
use pmp_fetch_cache::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Fetch(args) => cli::fetch::run(args).await,
        Command::Purge(args) => cli::purge::run(args).await,
    }
}
