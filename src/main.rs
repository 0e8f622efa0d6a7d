use clap::Parser;
use std::process::ExitCode;
use tidydir::cli::{Cli, run_cli};
use tidydir::logging::init_logger;
use tidydir::output::OutputFormatter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run_cli(cli) {
        Ok(true) => ExitCode::SUCCESS,
        // Finished, but some files were skipped or failed.
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
