//! Ingest client
//!
//! HTTP client for the ingestion service: session creation, chunk uploads
//! against the capability grant, and manifest finalize. Error mapping
//! drives the retry policy: timeouts, connection failures and 5xx are
//! transient; an expired capability token is its own recoverable case.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use suburi_model::{
    CapabilityGrant, CreateSessionRequest, CreateSessionResponse, FinalizeRequest,
    FinalizeResponse,
};

use crate::error::{CaptureError, Result};

/// Request timeout for API calls
const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Shape of server error bodies
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    message: String,
}

/// Client for the ingestion service
#[derive(Clone)]
pub struct IngestClient {
    http: reqwest::Client,
    base_url: String,
    bearer: String,
}

impl IngestClient {
    /// Create a client for `base_url` using the given bearer credential
    pub fn new(base_url: impl Into<String>, bearer: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(API_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer: bearer.into(),
        }
    }

    /// Create (or idempotently re-attach) a capture session.
    ///
    /// Returns the response and whether the session already existed.
    pub async fn create_session(
        &self,
        req: &CreateSessionRequest,
    ) -> Result<(CreateSessionResponse, bool)> {
        let url = format!("{}/api/v1/sessions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.bearer)
            .json(req)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if status == StatusCode::CREATED || status == StatusCode::OK {
            let already_exists = status == StatusCode::OK;
            let body = response.json().await.map_err(map_transport)?;
            debug!(already_exists, "Session create acknowledged");
            return Ok((body, already_exists));
        }

        Err(map_status(status, response).await)
    }

    /// Upload one chunk under the capability grant
    pub async fn upload_chunk(
        &self,
        grant: &CapabilityGrant,
        filename: &str,
        body: Vec<u8>,
    ) -> Result<()> {
        let url = format!(
            "{}/storage/{}{}?token={}",
            self.base_url,
            grant.path,
            filename,
            urlencode(&grant.token)
        );

        let response = self
            .http
            .put(&url)
            .body(body)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        Err(map_status(status, response).await)
    }

    /// Finalize the session manifest
    pub async fn finalize(
        &self,
        session_id: i64,
        req: &FinalizeRequest,
    ) -> Result<FinalizeResponse> {
        let url = format!("{}/api/v1/sessions/{}/finalize", self.base_url, session_id);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.bearer)
            .json(req)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await.map_err(map_transport)?);
        }

        Err(map_status(status, response).await)
    }
}

/// Map transport-level failures; timeouts and connection errors retry
fn map_transport(e: reqwest::Error) -> CaptureError {
    if e.is_timeout() || e.is_connect() || e.is_request() {
        CaptureError::NetworkTransient(e.to_string())
    } else {
        CaptureError::Internal(e.to_string())
    }
}

/// Map an error status to the capture taxonomy
async fn map_status(status: StatusCode, response: reqwest::Response) -> CaptureError {
    let body: Option<ErrorBody> = response.json().await.ok();
    let (code, message) = body
        .map(|b| (b.error, b.message))
        .unwrap_or_else(|| (String::new(), String::new()));

    if code == "TOKEN_EXPIRED" {
        return CaptureError::TokenExpired;
    }
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return CaptureError::NetworkTransient(format!("server returned {}", status));
    }

    CaptureError::Rejected {
        status: status.as_u16(),
        message: if message.is_empty() { code } else { message },
    }
}

fn urlencode(s: &str) -> String {
    s.replace('%', "%25").replace('/', "%2F").replace(':', "%3A")
}
