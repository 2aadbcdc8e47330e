// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, hand them to `ui::run`.
// - Every failure ends the run with exit code 1 and a message on stderr.

use clap::Parser;
use faceswap_cli::error::SwapError;
use faceswap_cli::ui::{self, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("Please provide two image file paths as arguments.");
            let _ = e.print();
            return ExitCode::from(1);
        }
    };

    ui::init_tracing();

    match ui::run(&cli) {
        Ok(path) => {
            println!("image saved @ {}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            match err.downcast_ref::<SwapError>() {
                Some(e) if e.is_incomplete() => eprintln!("Nothing to download: {e}"),
                _ => eprintln!("{err:#}"),
            }
            ExitCode::from(1)
        }
    }
}
