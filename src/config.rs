// Client configuration: defaults, an optional JSON header file and
// environment overrides. The resulting `ClientConfig` is handed to the
// client at construction; nothing reads the environment after that.

use crate::error::{Result, SwapError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://access3.faceswapper.ai";
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_millis(5000);
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 120;
pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// Everything the client needs to talk to the service and write results.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Sent verbatim as the `Authorization` header when set.
    pub auth_header: Option<String>,
    pub base_url: String,
    /// Delay between two status checks while the job is waiting.
    pub poll_delay: Duration,
    /// Upper bound on status requests for one job. Must be at least 1.
    pub max_poll_attempts: u32,
    /// Directory the result image is written to. Created if absent.
    pub output_dir: PathBuf,
    /// Extra static headers merged into every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            auth_header: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_delay: DEFAULT_POLL_DELAY,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            headers: BTreeMap::new(),
        }
    }
}

/// Shape of the header file: `{ "headers": { "name": "value" } }`.
#[derive(Deserialize, Debug, Default)]
struct HeaderFile {
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

impl ClientConfig {
    /// Build the configuration from the process environment.
    ///
    /// The header file comes from `FACESWAP_CONFIG`, or
    /// `<config dir>/faceswap/config.json` when that file exists.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ClientConfig::default();

        let header_file = lookup("FACESWAP_CONFIG")
            .map(PathBuf::from)
            .or_else(default_header_file);
        if let Some(path) = header_file {
            config.headers = load_headers(&path)?;
        }

        if let Some(auth) = lookup("FACESWAP_AUTH").filter(|s| !s.is_empty()) {
            config.auth_header = Some(auth);
        }
        if let Some(url) = lookup("FACESWAP_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(ms) = lookup("FACESWAP_POLL_DELAY_MS") {
            let ms: u64 = ms
                .trim()
                .parse()
                .map_err(|_| SwapError::config(format!("FACESWAP_POLL_DELAY_MS is not a number: {ms}")))?;
            config.poll_delay = Duration::from_millis(ms);
        }
        if let Some(n) = lookup("FACESWAP_MAX_POLL_ATTEMPTS") {
            config.max_poll_attempts = n.trim().parse().map_err(|_| {
                SwapError::config(format!("FACESWAP_MAX_POLL_ATTEMPTS is not a number: {n}"))
            })?;
        }
        if let Some(dir) = lookup("FACESWAP_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_poll_attempts == 0 {
            return Err(SwapError::config("max_poll_attempts must be at least 1"));
        }
        reqwest::Url::parse(&self.base_url)
            .map_err(|e| SwapError::config(format!("base url '{}': {e}", self.base_url)))?;
        Ok(())
    }
}

fn default_header_file() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("faceswap").join("config.json");
    path.exists().then_some(path)
}

fn load_headers(path: &Path) -> Result<BTreeMap<String, String>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        SwapError::config(format!("cannot read header file '{}': {e}", path.display()))
    })?;
    let file: HeaderFile = serde_json::from_str(&text).map_err(|e| {
        SwapError::config(format!("cannot parse header file '{}': {e}", path.display()))
    })?;
    Ok(file.headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let headers = dir.path().join("config.json");
        std::fs::write(&headers, r#"{"headers": {"x-client": "cli"}}"#).unwrap();
        let headers = headers.to_string_lossy().into_owned();

        let config = ClientConfig::from_lookup(lookup_from(&[
            ("FACESWAP_CONFIG", headers.as_str()),
            ("FACESWAP_AUTH", "Bearer abc"),
            ("FACESWAP_BASE_URL", "http://localhost:9000/"),
            ("FACESWAP_POLL_DELAY_MS", "250"),
            ("FACESWAP_MAX_POLL_ATTEMPTS", "7"),
            ("FACESWAP_OUTPUT_DIR", "out"),
        ]))
        .unwrap();

        assert_eq!(config.auth_header.as_deref(), Some("Bearer abc"));
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.poll_delay, Duration::from_millis(250));
        assert_eq!(config.max_poll_attempts, 7);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.headers.get("x-client").map(String::as_str), Some("cli"));
    }

    #[test]
    fn bad_numbers_are_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("none.json");
        std::fs::write(&missing, "{}").unwrap();
        let missing = missing.to_string_lossy().into_owned();

        let err = ClientConfig::from_lookup(lookup_from(&[
            ("FACESWAP_CONFIG", missing.as_str()),
            ("FACESWAP_POLL_DELAY_MS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SwapError::Config(_)));

        let err = ClientConfig::from_lookup(lookup_from(&[
            ("FACESWAP_CONFIG", missing.as_str()),
            ("FACESWAP_MAX_POLL_ATTEMPTS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SwapError::Config(_)));
    }

    #[test]
    fn unreadable_header_file_is_reported() {
        let err = ClientConfig::from_lookup(lookup_from(&[(
            "FACESWAP_CONFIG",
            "/definitely/not/here.json",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("header file"));
    }
}
