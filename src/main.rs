use clap::Parser;
use lookback::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
