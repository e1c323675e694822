//! WMB CLI - Command line tool for tracer mass balances of water bodies.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "wmb",
    version,
    about = "Water body tracer mass balance toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: wmb_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("wmb {}", env!("CARGO_PKG_VERSION"));
    wmb_cmd::run(cli.command)
}
