//! docpack CLI: index a documentation tree and fan the results out into
//! skill bundles.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
