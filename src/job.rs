// Job model: the validated input pair, the remote-assigned code and the
// status the service last reported. A job only lives for one run.

use crate::error::{Result, SwapError};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

/// Status string the service reports while the swap is still pending.
pub const WAITING: &str = "waiting";

/// The two images of one swap request. Both paths existed when built.
#[derive(Debug, Clone)]
pub struct SwapImages {
    source: PathBuf,
    face: PathBuf,
}

impl SwapImages {
    /// Check that both files exist. Image content is not inspected.
    pub fn new(source: impl Into<PathBuf>, face: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();
        let face = face.into();
        for path in [&source, &face] {
            if !path.is_file() {
                return Err(SwapError::MissingInput(path.clone()));
            }
        }
        Ok(Self { source, face })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn face(&self) -> &Path {
        &self.face
    }
}

/// Opaque job identifier. The service may hand back a string or a number;
/// it is echoed back unchanged on status checks.
#[derive(Debug, Clone, PartialEq)]
pub struct JobCode(Value);

impl JobCode {
    /// Accept a code from an upload response. Null, empty, `false` and `0`
    /// count as "no code".
    pub fn from_response(value: Option<Value>) -> Option<Self> {
        match value? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            other => Some(Self(other)),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl fmt::Display for JobCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

/// One face-swap request as seen from this client.
#[derive(Debug, Clone)]
pub struct Job {
    code: JobCode,
    status: Option<String>,
    result_urls: Vec<String>,
}

impl Job {
    pub fn new(code: JobCode) -> Self {
        Self {
            code,
            status: None,
            result_urls: Vec::new(),
        }
    }

    pub fn code(&self) -> &JobCode {
        &self.code
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Replace the job state with what the service just reported.
    pub fn record(&mut self, status: Option<String>, result_urls: Vec<String>) {
        self.status = status;
        self.result_urls = result_urls;
    }

    /// Only the literal `"waiting"` keeps a job pending; anything else,
    /// including a missing status, is terminal.
    pub fn is_waiting(&self) -> bool {
        self.status.as_deref() == Some(WAITING)
    }

    pub fn first_result_url(&self) -> Option<&str> {
        self.result_urls.first().map(String::as_str)
    }
}
