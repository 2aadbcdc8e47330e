// Library root
// ------------
// The binary (`main.rs`) is a thin shell over these modules.
//
// Module responsibilities:
// - `api`: HTTP calls to the face-swap service and its wire shapes.
// - `config`: client settings from defaults, header file and environment.
// - `error`: the `SwapError` type every stage returns.
// - `job`: validated inputs, job code and reported status.
// - `pipeline`: submit, poll and fetch, composed into one run.
// - `ui`: argument parsing, logging setup and the progress spinner.
pub mod api;
pub mod config;
pub mod error;
pub mod job;
pub mod pipeline;
pub mod ui;

pub use config::ClientConfig;
pub use error::{Result, SwapError};
pub use pipeline::FaceSwapClient;
