use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::types::{
    CheckResponse, DetailResponse, FetchResultsRequest, FetchResultsResponse, ResultDetailRequest,
    SessionRequest, SyncResponse,
};
use super::ApiError;
use crate::config::ServerConfig;
use crate::results::JobId;
use crate::session::SessionId;

/// Backend operations the dashboard depends on.
///
/// Every call carries the session id (or `None` before one is assigned) so
/// the backend can scope cloud access to the operator's live shell.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// Stage whatever credentials the live shell currently has.
    async fn sync_credentials(&self, session_id: Option<&SessionId>)
        -> Result<SyncResponse, ApiError>;

    /// Resolve the identity behind the staged credentials.
    async fn check_credentials(
        &self,
        session_id: Option<&SessionId>,
    ) -> Result<CheckResponse, ApiError>;

    async fn fetch_results(
        &self,
        job_id: &JobId,
        session_id: Option<&SessionId>,
    ) -> Result<FetchResultsResponse, ApiError>;

    async fn get_result_detail(
        &self,
        job_id: &JobId,
        filename: &str,
        session_id: Option<&SessionId>,
    ) -> Result<DetailResponse, ApiError>;
}

/// [`DashboardApi`] over HTTP with `reqwest`.
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(config: &ServerConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// POST a JSON body and decode the JSON answer.
    ///
    /// The backend reports business failures with 4xx/5xx statuses and a
    /// normal `success: false` body, so a decodable body wins over the status.
    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        debug!(%url, status = status.as_u16(), bytes = bytes.len(), "api response");

        match serde_json::from_slice::<R>(&bytes) {
            Ok(value) => Ok(value),
            Err(err) if status.is_success() => Err(ApiError::Decode(err.to_string())),
            Err(_) => Err(ApiError::Status {
                status: status.as_u16(),
            }),
        }
    }
}

#[async_trait]
impl DashboardApi for HttpApi {
    async fn sync_credentials(
        &self,
        session_id: Option<&SessionId>,
    ) -> Result<SyncResponse, ApiError> {
        let body = SessionRequest {
            socket_id: session_id.map(SessionId::as_str),
        };
        self.post("/api/sync-credentials", &body).await
    }

    async fn check_credentials(
        &self,
        session_id: Option<&SessionId>,
    ) -> Result<CheckResponse, ApiError> {
        let body = SessionRequest {
            socket_id: session_id.map(SessionId::as_str),
        };
        self.post("/api/check-credentials", &body).await
    }

    async fn fetch_results(
        &self,
        job_id: &JobId,
        session_id: Option<&SessionId>,
    ) -> Result<FetchResultsResponse, ApiError> {
        let body = FetchResultsRequest {
            job_id: job_id.as_str(),
            socket_id: session_id.map(SessionId::as_str),
        };
        self.post("/api/fetch-results", &body).await
    }

    async fn get_result_detail(
        &self,
        job_id: &JobId,
        filename: &str,
        session_id: Option<&SessionId>,
    ) -> Result<DetailResponse, ApiError> {
        let body = ResultDetailRequest {
            job_id: job_id.as_str(),
            filename,
            socket_id: session_id.map(SessionId::as_str),
        };
        self.post("/api/get-result-detail", &body).await
    }
}
