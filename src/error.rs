// Error types shared by every stage of the swap pipeline.
// Each stage returns `Result<T>` and the orchestrator composes them with
// `?`; the binary turns the final error into a message and exit code.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SwapError>;

/// Which remote call an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Upload,
    Status,
    Download,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Upload => "uploading images",
            Stage::Status => "getting image status",
            Stage::Download => "downloading result",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum SwapError {
    /// An input image does not exist. Raised before any network call.
    #[error("input file does not exist: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The request never produced a response (DNS, TLS, connection reset...).
    #[error("error {stage}: {source}")]
    Transport {
        stage: Stage,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-2xx status. `detail` is the body text.
    #[error("error {stage}: {status} - {detail}")]
    Remote {
        stage: Stage,
        status: u16,
        detail: String,
    },

    #[error("error {stage}: malformed response: {source}")]
    Malformed {
        stage: Stage,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to get image code from upload")]
    MissingCode,

    #[error("no image URL returned")]
    NoDownloadUrl,

    #[error("job still waiting after {attempts} status checks")]
    PollTimeout { attempts: u32 },

    #[error("cancelled while waiting for the job")]
    Cancelled,

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SwapError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the remote side accepted the work but handed back
    /// nothing to continue with (no code, no download URL).
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::MissingCode | Self::NoDownloadUrl)
    }
}
