// API client module: a blocking HTTP client for the face-swap service.
// It only moves bytes; deciding what a response means is left to the
// pipeline, which talks to it through the `Transport` trait so the whole
// flow can run against a fake in tests.

use crate::config::ClientConfig;
use crate::error::{Result, Stage, SwapError};
use crate::job::SwapImages;
use reqwest::blocking::{multipart, Client};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use std::time::Duration;

pub const UPLOAD_PATH: &str = "/api/FaceSwapper/UploadByFile";
pub const STATUS_PATH: &str = "/api/FaceSwapper/CheckStatus";

// Fixed protocol selectors expected by the service.
pub const ALG: u8 = 1;
pub const SERVE_URL: u8 = 3;
pub const SWAP_TYPE: u8 = 13;
pub const IS_GIF: u8 = 0;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Status code and body of a finished request.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON, turning a non-2xx status into a
    /// `Remote` error that carries the body text.
    pub fn json<T: DeserializeOwned>(&self, stage: Stage) -> Result<T> {
        if !self.is_success() {
            return Err(SwapError::Remote {
                stage,
                status: self.status,
                detail: String::from_utf8_lossy(&self.body).into_owned(),
            });
        }
        serde_json::from_slice(&self.body).map_err(|source| SwapError::Malformed { stage, source })
    }
}

/// The service wraps every payload in `{"data": ...}`.
#[derive(Deserialize, Debug)]
pub struct Envelope<T> {
    pub data: Option<T>,
}

#[derive(Deserialize, Debug)]
pub struct UploadData {
    #[serde(default)]
    pub code: Option<Value>,
}

#[derive(Deserialize, Debug)]
pub struct StatusData {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "downloadUrls", default)]
    pub download_urls: Option<Vec<String>>,
}

/// Body of a status check.
#[derive(Serialize, Debug)]
pub struct StatusRequest<'a> {
    pub code: &'a Value,
    #[serde(rename = "serveUrl")]
    pub serve_url: u8,
    #[serde(rename = "isGif")]
    pub is_gif: u8,
    #[serde(rename = "type")]
    pub swap_type: u8,
}

impl<'a> StatusRequest<'a> {
    pub fn new(code: &'a Value) -> Self {
        Self {
            code,
            serve_url: SERVE_URL,
            is_gif: IS_GIF,
            swap_type: SWAP_TYPE,
        }
    }
}

/// The three remote calls the pipeline makes.
pub trait Transport {
    /// Multipart upload of both images plus the fixed selectors.
    fn upload(&self, images: &SwapImages) -> Result<RawResponse>;

    fn check_status(&self, request: &StatusRequest<'_>) -> Result<RawResponse>;

    /// Open the result for streaming. Non-2xx responses are errors.
    fn download(&self, url: &str) -> Result<Box<dyn Read>>;
}

/// reqwest-backed transport.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    // The download URL points at a storage host, so the static headers
    // (auth included) are not sent there.
    download_client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let headers = static_headers(config)?;
        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SwapError::config(format!("failed to build HTTP client: {e}")))?;
        let download_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SwapError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(ApiClient {
            client,
            download_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for ApiClient {
    fn upload(&self, images: &SwapImages) -> Result<RawResponse> {
        // `Form::file` streams the file and guesses the mime type from the
        // extension.
        let form = multipart::Form::new()
            .file("file", images.source())
            .map_err(|e| SwapError::io(images.source(), e))?
            .file("fileother", images.face())
            .map_err(|e| SwapError::io(images.face(), e))?
            .text("alg", ALG.to_string())
            .text("serveUrl", SERVE_URL.to_string())
            .text("type", SWAP_TYPE.to_string());

        let res = self
            .client
            .post(self.url(UPLOAD_PATH))
            .multipart(form)
            .send()
            .map_err(|source| SwapError::Transport {
                stage: Stage::Upload,
                source,
            })?;
        into_raw(res, Stage::Upload)
    }

    fn check_status(&self, request: &StatusRequest<'_>) -> Result<RawResponse> {
        let res = self
            .client
            .post(self.url(STATUS_PATH))
            .json(request)
            .send()
            .map_err(|source| SwapError::Transport {
                stage: Stage::Status,
                source,
            })?;
        into_raw(res, Stage::Status)
    }

    fn download(&self, url: &str) -> Result<Box<dyn Read>> {
        let res = self
            .download_client
            .get(url)
            .send()
            .map_err(|source| SwapError::Transport {
                stage: Stage::Download,
                source,
            })?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let detail = res.text().unwrap_or_default();
            return Err(SwapError::Remote {
                stage: Stage::Download,
                status,
                detail,
            });
        }
        Ok(Box::new(res))
    }
}

fn into_raw(res: reqwest::blocking::Response, stage: Stage) -> Result<RawResponse> {
    let status = res.status().as_u16();
    let body = res
        .bytes()
        .map_err(|source| SwapError::Transport { stage, source })?;
    Ok(RawResponse {
        status,
        body: body.to_vec(),
    })
}

/// Build the header map sent with every service call: the configured
/// extra headers, then the auth header on top.
fn static_headers(config: &ClientConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| SwapError::config(format!("header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| SwapError::config(format!("header '{name}': {e}")))?;
        headers.insert(name, value);
    }
    if let Some(auth) = &config.auth_header {
        let mut value = HeaderValue::from_str(auth)
            .map_err(|e| SwapError::config(format!("auth header: {e}")))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}
