// The swap workflow: submit both images, wait for the job to leave the
// `waiting` state, then stream the result to disk.
// Every stage returns a `Result` and `FaceSwapClient::run` composes them in
// order. Time comes in through `Sleeper` (poll delay) and an explicit `now`
// (result file name), so the loop runs without real waits under test.
// Log events go through `ProgressBar::suspend` so they do not tear the
// spinner line.

use crate::api::{ApiClient, Envelope, StatusData, StatusRequest, Transport, UploadData};
use crate::config::ClientConfig;
use crate::error::{Result, Stage, SwapError};
use crate::job::{Job, JobCode, SwapImages};
use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Suspends the caller between two status checks.
pub trait Sleeper {
    fn sleep(&self, delay: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Shared flag checked before every status request.
#[derive(Debug, Default, Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// File name for a result fetched at `now`: ISO-8601 basic form with the
/// `-`, `:` and `.` separators dropped, e.g. `result_20261016T093015123.jpg`.
pub fn result_file_name(now: &DateTime<Utc>) -> String {
    format!("result_{}.jpg", now.format("%Y%m%dT%H%M%S%3f"))
}

/// Runs one swap job against the service.
pub struct FaceSwapClient<T = ApiClient, S = ThreadSleeper> {
    transport: T,
    sleeper: S,
    poll_delay: Duration,
    max_poll_attempts: u32,
    output_dir: PathBuf,
    cancel: CancelToken,
    progress: ProgressBar,
}

impl FaceSwapClient {
    /// Client talking to the real service with real sleeps.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let transport = ApiClient::new(config)?;
        FaceSwapClient::with_transport(config, transport, ThreadSleeper)
    }
}

impl<T: Transport, S: Sleeper> FaceSwapClient<T, S> {
    pub fn with_transport(config: &ClientConfig, transport: T, sleeper: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            sleeper,
            poll_delay: config.poll_delay,
            max_poll_attempts: config.max_poll_attempts,
            output_dir: config.output_dir.clone(),
            cancel: CancelToken::new(),
            progress: ProgressBar::hidden(),
        })
    }

    /// Use `cancel` to stop the poll loop from elsewhere.
    ///
    /// Library hook only: the `faceswap` binary installs no signal handler,
    /// so Ctrl-C there still terminates the process directly.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Report poll progress on `progress` instead of the hidden default.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Upload both images and return the code the service assigned.
    ///
    /// # Errors
    /// - `Transport`, `Remote` or `Malformed` for a failed upload call
    /// - `MissingCode` when the response carries no usable code
    pub fn submit(&self, images: &SwapImages) -> Result<JobCode> {
        let raw = self.transport.upload(images)?;
        let envelope: Envelope<UploadData> = raw.json(Stage::Upload)?;
        self.progress.suspend(|| info!("images uploaded"));

        let code = envelope.data.and_then(|data| data.code);
        let code = JobCode::from_response(code).ok_or(SwapError::MissingCode)?;
        self.progress.suspend(|| info!(%code, "job submitted"));
        Ok(code)
    }

    /// Poll until the job is no longer waiting and return its first
    /// download URL.
    ///
    /// # Errors
    /// - `Cancelled` if the cancel token fires between checks
    /// - `PollTimeout` after `max_poll_attempts` waiting answers
    /// - `NoDownloadUrl` when the terminal answer has no URL
    /// - `Transport`, `Remote` or `Malformed` for a failed status call
    pub fn wait_for_result(&self, code: JobCode) -> Result<String> {
        let mut job = Job::new(code);

        for attempt in 1..=self.max_poll_attempts {
            if self.cancel.is_cancelled() {
                self.progress
                    .suspend(|| warn!(code = %job.code(), attempt, "status polling cancelled"));
                return Err(SwapError::Cancelled);
            }

            let raw = self
                .transport
                .check_status(&StatusRequest::new(job.code().as_value()))?;
            let envelope: Envelope<StatusData> = raw.json(Stage::Status)?;
            let data = envelope.data.unwrap_or(StatusData {
                status: None,
                download_urls: None,
            });
            job.record(data.status, data.download_urls.unwrap_or_default());

            if !job.is_waiting() {
                self.progress.suspend(|| {
                    debug!(code = %job.code(), status = ?job.status(), attempt, "job finished")
                });
                return job
                    .first_result_url()
                    .map(str::to_string)
                    .ok_or(SwapError::NoDownloadUrl);
            }

            self.progress
                .suspend(|| debug!(code = %job.code(), attempt, "job still waiting"));
            self.progress
                .set_message(format!("swapping faces... (check {attempt})"));
            if attempt < self.max_poll_attempts {
                self.sleeper.sleep(self.poll_delay);
            }
        }

        self.progress.suspend(|| {
            warn!(code = %job.code(), attempts = self.max_poll_attempts, "gave up waiting for job")
        });
        Err(SwapError::PollTimeout {
            attempts: self.max_poll_attempts,
        })
    }

    /// Stream `url` into `result_<timestamp>.jpg` under the output directory.
    ///
    /// The file is written in place; a failed transfer can leave a partial
    /// file behind.
    pub fn fetch(&self, url: &str, now: DateTime<Utc>) -> Result<PathBuf> {
        self.progress.set_message("downloading result...");
        let mut body = self.transport.download(url)?;

        fs::create_dir_all(&self.output_dir).map_err(|e| SwapError::io(&self.output_dir, e))?;
        let path = self.output_dir.join(result_file_name(&now));
        let mut file = File::create(&path).map_err(|e| SwapError::io(&path, e))?;
        let written = std::io::copy(&mut body, &mut file).map_err(|e| SwapError::io(&path, e))?;

        self.progress
            .suspend(|| info!(path = %path.display(), bytes = written, "image saved"));
        Ok(path)
    }

    /// Submit, wait and fetch. The first failing stage ends the run.
    pub fn run(&self, images: &SwapImages) -> Result<PathBuf> {
        let code = self.submit(images)?;
        let url = self.wait_for_result(code)?;
        self.fetch(&url, Utc::now())
    }
}
