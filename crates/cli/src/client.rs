//! API client for communicating with the classification server

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use screw_lib::health::{HealthResponse, ReadinessResponse};
use screw_lib::requests::{
    CustomRequest, ErrorResponse, ModeInfo, PredictionResponse, TorqueRequest,
};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use url::Url;

/// Non-success answer from the server
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server explained the failure with an error body
    #[error("{} (HTTP {status})", .body.message)]
    Rejected { status: u16, body: ErrorResponse },

    #[error("API error ({status}): {body}")]
    Unexpected { status: u16, body: String },
}

impl ApiError {
    pub fn rejection(&self) -> Option<&ErrorResponse> {
        match self {
            ApiError::Rejected { body, .. } => Some(body),
            ApiError::Unexpected { .. } => None,
        }
    }
}

/// API client for the classification server
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        let response = check_status(response).await?;
        response.json().await.context("Failed to parse response")
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        let response = check_status(response).await?;
        response.json().await.context("Failed to parse response")
    }

    pub async fn predict_torque(&self, request: &TorqueRequest) -> Result<PredictionResponse> {
        self.post("api/v1/predict/torque", request).await
    }

    pub async fn predict_custom(&self, request: &CustomRequest) -> Result<PredictionResponse> {
        self.post("api/v1/predict/custom", request).await
    }

    pub async fn modes(&self) -> Result<Vec<ModeInfo>> {
        self.get("api/v1/modes").await
    }

    /// Health is reported with 503 when a model failed, so the body is read
    /// whatever the status
    pub async fn health(&self) -> Result<HealthResponse> {
        self.get_any_status("healthz").await
    }

    pub async fn readiness(&self) -> Result<ReadinessResponse> {
        self.get_any_status("readyz").await
    }

    async fn get_any_status<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        self.client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?
            .json()
            .await
            .context("Failed to parse response")
    }
}

async fn check_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let error = match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(body) => ApiError::Rejected { status, body },
        Err(_) => ApiError::Unexpected { status, body },
    };
    Err(error.into())
}
