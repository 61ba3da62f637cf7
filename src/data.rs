use std::{future::Future, time::Duration};

use crate::model::{ErrorBody, MatchPrediction, PredictRequest, PredictResponse};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service answered {status}{}", detail_suffix(.detail))]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

/// The two calls the UI makes against the prediction backend.
pub trait PredictionService {
    fn predict(
        &self,
        request: &PredictRequest,
    ) -> impl Future<Output = Result<PredictResponse, ServiceError>> + Send;

    fn fetch_predictions(
        &self,
    ) -> impl Future<Output = Result<Vec<MatchPrediction>, ServiceError>> + Send;
}

pub struct DataClient {
    client: Client,
    base_url: String,
}

impl DataClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ServiceError> {
        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .map(|b| b.detail);
            return Err(ServiceError::Status { status, detail });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

impl PredictionService for DataClient {
    async fn predict(&self, request: &PredictRequest) -> Result<PredictResponse, ServiceError> {
        let url = format!("{}/predict", self.base_url);
        debug!(%url, team1 = %request.team1, team2 = %request.team2, "requesting prediction");
        let resp = self.client.post(&url).json(request).send().await?;
        Self::read_json(resp).await
    }

    async fn fetch_predictions(&self) -> Result<Vec<MatchPrediction>, ServiceError> {
        let url = format!("{}/predictions", self.base_url);
        debug!(%url, "fetching tournament predictions");
        let resp = self.client.get(&url).send().await?;
        Self::read_json(resp).await
    }
}
