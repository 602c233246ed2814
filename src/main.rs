use clap::Parser;
use dualsignal::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
