use anyhow::Result;
use clap::Parser;
use riskmap::cli::{run, Cli};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    run(cli)
}
