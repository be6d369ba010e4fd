//! HTTP client for the remote inference service.

use std::{path::PathBuf, time::Duration};

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    InferenceBackend,
    error::{ConfigError, ErrorInfo},
    health::HealthStatus,
    wire::{ErrorResponse, HealthResponse, ModelsStatus, PredictResponse},
};

/// Base url the inference service listens on when run with its defaults.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/";

const DEFAULT_USER_AGENT: &str = concat!("lens-predict/", env!("CARGO_PKG_VERSION"));
const FALLBACK_FILE_NAME: &str = "image.jpg";
const FALLBACK_MIME: &str = "image/jpeg";
const UPLOAD_FIELD: &str = "image";

/// Classification returned by the service for one image.
#[derive(Clone, Debug, PartialEq)]
pub struct PredictionResult {
    pub label: String,
    /// Expected in [0, 1]; passed through exactly as the service sent it.
    pub confidence: f64,
    pub message: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl PredictionResult {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
            message: None,
            details: None,
        }
    }
}

impl From<PredictResponse> for PredictionResult {
    fn from(response: PredictResponse) -> Self {
        Self {
            label: response.prediction,
            confidence: response.confidence,
            message: response.message,
            details: response.details,
        }
    }
}

/// Connection settings for [`InferenceClient`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Always ends in `/` so endpoint paths resolve beneath it.
    pub base_url: Url,
    /// Per-request timeout; `None` waits for the service indefinitely.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::UnsupportedBaseUrl(base_url.to_string()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

struct Endpoints {
    predict: Url,
    health: Url,
    models_status: Url,
}

impl Endpoints {
    fn new(base: &Url) -> Result<Self, ConfigError> {
        Ok(Self {
            predict: base.join("predict")?,
            health: base.join("health")?,
            models_status: base.join("models/status")?,
        })
    }
}

/// File name and MIME type an image is uploaded under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadDescriptor {
    pub file_name: String,
    pub mime: &'static str,
}

impl UploadDescriptor {
    /// Derives the upload metadata from the image URI alone.
    pub fn from_uri(uri: &str) -> Self {
        let path = if uri.contains("://") {
            uri.split(['?', '#']).next().unwrap_or(uri)
        } else {
            uri
        };
        let segment = path.rsplit('/').next().filter(|s| !s.is_empty());

        Self {
            file_name: segment.unwrap_or(FALLBACK_FILE_NAME).to_string(),
            mime: segment.map_or(FALLBACK_MIME, mime_for_file_name),
        }
    }
}

fn mime_for_file_name(file_name: &str) -> &'static str {
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return FALLBACK_MIME;
    };

    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "tif" | "tiff" => "image/tiff",
        _ => FALLBACK_MIME,
    }
}

fn local_path(uri: &str) -> Result<PathBuf, ErrorInfo> {
    if !uri.contains("://") {
        return Ok(PathBuf::from(uri));
    }

    let url = Url::parse(uri)
        .map_err(|e| ErrorInfo::image_unavailable(format!("Invalid image uri {uri}: {e}")))?;
    if url.scheme() != "file" {
        return Err(ErrorInfo::image_unavailable(format!(
            "Unsupported image uri scheme: {}",
            url.scheme()
        )));
    }
    url.to_file_path()
        .map_err(|()| ErrorInfo::image_unavailable(format!("Image uri is not a local file: {uri}")))
}

/// Client for the inference service's `/predict`, `/health` and
/// `/models/status` endpoints.
pub struct InferenceClient {
    http: reqwest::Client,
    config: ClientConfig,
    endpoints: Endpoints,
}

impl InferenceClient {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            endpoints: Endpoints::new(&config.base_url)?,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Uploads the image behind `image_uri` and returns the service's
    /// classification.
    pub async fn submit(&self, image_uri: &str) -> Result<PredictionResult, ErrorInfo> {
        let upload = UploadDescriptor::from_uri(image_uri);
        let path = local_path(image_uri)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            ErrorInfo::image_unavailable(format!("Could not read image {}: {e}", path.display()))
        })?;

        log::debug!(
            "Uploading {} ({}, {} bytes) to {}",
            upload.file_name,
            upload.mime,
            bytes.len(),
            self.endpoints.predict
        );

        let part = Part::bytes(bytes)
            .file_name(upload.file_name)
            .mime_str(upload.mime)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .http
            .post(self.endpoints.predict.clone())
            .multipart(form)
            .send()
            .await?;

        let body: PredictResponse = read_json(response, "Prediction failed").await?;
        log::debug!(
            "Prediction received: {} ({:.3})",
            body.prediction,
            body.confidence
        );

        Ok(body.into())
    }

    /// Probes service liveness. Never fails: every problem reads as
    /// [`HealthStatus::Unreachable`].
    pub async fn check_health(&self) -> HealthStatus {
        let response = match self.http.get(self.endpoints.health.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Backend health check failed: {e}");
                return HealthStatus::Unreachable;
            }
        };

        let status = response.status();
        match response.json::<HealthResponse>().await {
            Ok(health) if health.is_healthy() => HealthStatus::Connected,
            Ok(health) => {
                log::warn!(
                    "Backend reported status {:?} ({}): {}",
                    health.status,
                    status,
                    health.message.as_deref().unwrap_or("no message")
                );
                HealthStatus::Unreachable
            }
            Err(e) => {
                log::warn!("Backend health response unreadable ({status}): {e}");
                HealthStatus::Unreachable
            }
        }
    }

    pub async fn get_models_status(&self) -> Result<ModelsStatus, ErrorInfo> {
        let response = self
            .http
            .get(self.endpoints.models_status.clone())
            .send()
            .await?;

        read_json(response, "Could not check models status").await
    }
}

impl InferenceBackend for InferenceClient {
    async fn predict(&self, image_uri: &str) -> Result<PredictionResult, ErrorInfo> {
        self.submit(image_uri).await
    }

    async fn check_health(&self) -> HealthStatus {
        InferenceClient::check_health(self).await
    }
}

// 2xx bodies must parse as `T`; anything else is a structured rejection when
// it parses as an error body and malformed otherwise.
async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    fallback_error: &str,
) -> Result<T, ErrorInfo> {
    let status = response.status();
    let body = response.bytes().await.map_err(|e| {
        ErrorInfo::transport(format!("Failed to read response body: {e}")).with_status(status.as_u16())
    })?;

    if status.is_success() {
        return serde_json::from_slice(&body).map_err(|e| {
            ErrorInfo::malformed(format!("Unexpected response from service: {e}"))
                .with_status(status.as_u16())
        });
    }

    match serde_json::from_slice::<ErrorResponse>(&body) {
        Ok(ErrorResponse { error }) => Err(ErrorInfo::server_rejected(
            error.unwrap_or_else(|| fallback_error.to_string()),
        )
        .with_status(status.as_u16())),
        Err(e) => Err(ErrorInfo::malformed(format!(
            "Service returned {status} with an unreadable body: {e}"
        ))
        .with_status(status.as_u16())),
    }
}
