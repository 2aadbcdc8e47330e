// UI layer: argument surface, logging setup and the spinner shown while
// the job runs. The actual work is delegated to `pipeline`.

use crate::config::ClientConfig;
use crate::job::SwapImages;
use crate::pipeline::FaceSwapClient;
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Swap the face from one image onto another using the faceswapper service
#[derive(Parser, Debug)]
#[command(name = "faceswap", version, about)]
pub struct Cli {
    /// Image that receives the face
    pub source: PathBuf,

    /// Image the face is taken from
    pub face: PathBuf,
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Spinner on stderr; indicatif hides it when stderr is not a terminal.
pub fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Validate the inputs, then run one swap job. Returns the saved file.
pub fn run(cli: &Cli) -> Result<PathBuf> {
    // Runs before any network call.
    let images = SwapImages::new(&cli.source, &cli.face)
        .context("One or both file paths do not exist.")?;

    let config = ClientConfig::from_env().context("Failed to load configuration")?;
    let progress = spinner("uploading images...");
    let client = FaceSwapClient::new(&config)?.with_progress(progress.clone());

    let result = client.run(&images);
    progress.finish_and_clear();
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SwapError;

    #[test]
    fn cli_takes_exactly_two_paths() {
        assert!(Cli::try_parse_from(["faceswap", "a.jpg"]).is_err());
        assert!(Cli::try_parse_from(["faceswap", "a.jpg", "b.jpg", "c.jpg"]).is_err());

        let cli = Cli::try_parse_from(["faceswap", "a.jpg", "b.jpg"]).unwrap();
        assert_eq!(cli.source, PathBuf::from("a.jpg"));
        assert_eq!(cli.face, PathBuf::from("b.jpg"));
    }

    #[test]
    fn missing_inputs_fail_before_config() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            source: dir.path().join("nope.jpg"),
            face: dir.path().join("nada.jpg"),
        };

        let err = run(&cli).unwrap_err();
        assert!(err.to_string().contains("do not exist"));
        assert!(matches!(
            err.downcast_ref::<SwapError>(),
            Some(SwapError::MissingInput(_))
        ));
    }
}
