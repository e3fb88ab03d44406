//! CLI entry point for recording and querying probed height maps

use clap::Parser;
use probegrid::io::cli::{Cli, CommandRunner};

fn main() -> probegrid::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let runner = CommandRunner::new(cli);
    runner.run()
}
