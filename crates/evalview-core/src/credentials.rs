//! Credential Synchronization State Machine.
//!
//! `checking → connected | disconnected`, driven by two strictly ordered
//! backend calls: stage the shell's credentials, then resolve their identity.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::api::DashboardApi;
use crate::config::CredentialsConfig;
use crate::session::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialState {
    Checking,
    Connected,
    Disconnected,
}

/// Latest credential state plus its operator message. No history is kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredentialStatus {
    pub state: CredentialState,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl CredentialStatus {
    fn new(state: CredentialState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn checking(message: impl Into<String>) -> Self {
        Self::new(CredentialState::Checking, message)
    }

    pub fn connected(message: impl Into<String>) -> Self {
        Self::new(CredentialState::Connected, message)
    }

    pub fn disconnected(message: impl Into<String>) -> Self {
        Self::new(CredentialState::Disconnected, message)
    }
}

impl Default for CredentialStatus {
    fn default() -> Self {
        Self::disconnected("Waiting for terminal connection")
    }
}

/// The one cloud account the dashboard accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedIdentity {
    pub account: String,
    pub label: String,
}

impl From<&CredentialsConfig> for ExpectedIdentity {
    fn from(config: &CredentialsConfig) -> Self {
        Self {
            account: config.expected_account.clone(),
            label: config.account_label.clone(),
        }
    }
}

const NOT_AUTHENTICATED: &str = "✗ Not authenticated";
const CONNECTION_ERROR: &str = "✗ Connection error";

/// Run one full synchronization for `session_id`.
///
/// Every transition is handed to `report` as it happens, and the final
/// status is also returned. The check request is only issued after the sync
/// request has completed successfully. Failures end the run; nothing retries.
pub async fn synchronize<F>(
    api: &dyn DashboardApi,
    session_id: &SessionId,
    expected: &ExpectedIdentity,
    mut report: F,
) -> CredentialStatus
where
    F: FnMut(CredentialStatus),
{
    report(CredentialStatus::checking("Syncing credentials..."));

    let finish = |status: CredentialStatus, report: &mut F| {
        report(status.clone());
        status
    };

    match api.sync_credentials(Some(session_id)).await {
        Ok(resp) if resp.success => {
            info!(session_id = %session_id, count = ?resp.count, "credentials synced from shell");
        }
        Ok(resp) => {
            warn!(session_id = %session_id, error = ?resp.error, "credential sync rejected");
            return finish(CredentialStatus::disconnected(NOT_AUTHENTICATED), &mut report);
        }
        Err(err) => {
            warn!(session_id = %session_id, error = %err, "credential sync failed");
            return finish(CredentialStatus::disconnected(CONNECTION_ERROR), &mut report);
        }
    }

    report(CredentialStatus::checking("Checking credentials..."));

    let resp = match api.check_credentials(Some(session_id)).await {
        Ok(resp) => resp,
        Err(err) => {
            warn!(session_id = %session_id, error = %err, "credential check failed");
            return finish(CredentialStatus::disconnected(CONNECTION_ERROR), &mut report);
        }
    };

    if !resp.success {
        warn!(session_id = %session_id, error = ?resp.error, "credentials not valid");
        return finish(CredentialStatus::disconnected(NOT_AUTHENTICATED), &mut report);
    }

    let account = resp.account.unwrap_or_else(|| "unknown".to_string());
    let status = if account == expected.account {
        info!(session_id = %session_id, %account, "credentials verified");
        CredentialStatus::connected(format!("✓ Connected to {} ({account})", expected.label))
    } else {
        warn!(
            session_id = %session_id,
            found = %account,
            expected = %expected.account,
            "credentials belong to another account"
        );
        CredentialStatus::disconnected(format!(
            "⚠ Wrong account: {account} (need {})",
            expected.account
        ))
    };
    finish(status, &mut report)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::api::{ApiError, CheckResponse, DetailResponse, FetchResultsResponse, SyncResponse};
    use crate::results::JobId;

    struct ScriptedApi {
        sync: Result<SyncResponse, ApiError>,
        check: Result<CheckResponse, ApiError>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl ScriptedApi {
        fn new(
            sync: Result<SyncResponse, ApiError>,
            check: Result<CheckResponse, ApiError>,
        ) -> Self {
            Self {
                sync,
                check,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DashboardApi for ScriptedApi {
        async fn sync_credentials(
            &self,
            _session_id: Option<&SessionId>,
        ) -> Result<SyncResponse, ApiError> {
            self.calls.lock().unwrap().push("sync");
            self.sync.clone()
        }

        async fn check_credentials(
            &self,
            _session_id: Option<&SessionId>,
        ) -> Result<CheckResponse, ApiError> {
            self.calls.lock().unwrap().push("check");
            self.check.clone()
        }

        async fn fetch_results(
            &self,
            _job_id: &JobId,
            _session_id: Option<&SessionId>,
        ) -> Result<FetchResultsResponse, ApiError> {
            unreachable!("not used by credential sync")
        }

        async fn get_result_detail(
            &self,
            _job_id: &JobId,
            _filename: &str,
            _session_id: Option<&SessionId>,
        ) -> Result<DetailResponse, ApiError> {
            unreachable!("not used by credential sync")
        }
    }

    fn synced() -> Result<SyncResponse, ApiError> {
        Ok(SyncResponse {
            success: true,
            count: Some(3),
            error: None,
        })
    }

    fn account(id: &str) -> Result<CheckResponse, ApiError> {
        Ok(CheckResponse {
            success: true,
            account: Some(id.to_string()),
            ..Default::default()
        })
    }

    fn expected() -> ExpectedIdentity {
        ExpectedIdentity::from(&CredentialsConfig::default())
    }

    async fn run(api: &ScriptedApi) -> (CredentialStatus, Vec<CredentialStatus>) {
        let mut seen = Vec::new();
        let session_id = SessionId::new("sid-1");
        let status = synchronize(api, &session_id, &expected(), |s| seen.push(s)).await;
        (status, seen)
    }

    #[tokio::test]
    async fn matching_account_connects() {
        let api = ScriptedApi::new(synced(), account("620778743555"));
        let (status, seen) = run(&api).await;

        assert_eq!(status.state, CredentialState::Connected);
        assert_eq!(status.message, "✓ Connected to ml-models-dev (620778743555)");
        let messages: Vec<_> = seen.iter().map(|s| s.message.as_str()).collect();
        assert_eq!(
            messages,
            [
                "Syncing credentials...",
                "Checking credentials...",
                "✓ Connected to ml-models-dev (620778743555)"
            ]
        );
        assert_eq!(*api.calls.lock().unwrap(), ["sync", "check"]);
    }

    #[tokio::test]
    async fn wrong_account_names_both_values() {
        let api = ScriptedApi::new(synced(), account("999999999999"));
        let (status, _) = run(&api).await;

        assert_eq!(status.state, CredentialState::Disconnected);
        assert!(status.message.contains("999999999999"));
        assert!(status.message.contains("620778743555"));
    }

    #[tokio::test]
    async fn unsuccessful_check_is_not_authenticated() {
        let api = ScriptedApi::new(
            synced(),
            Ok(CheckResponse {
                success: false,
                error: Some("ExpiredToken".into()),
                ..Default::default()
            }),
        );
        let (status, _) = run(&api).await;
        assert_eq!(status.state, CredentialState::Disconnected);
        assert_eq!(status.message, "✗ Not authenticated");
    }

    #[tokio::test]
    async fn transport_failure_in_check_is_connection_error() {
        let api = ScriptedApi::new(synced(), Err(ApiError::Transport("refused".into())));
        let (status, _) = run(&api).await;
        assert_eq!(status.message, "✗ Connection error");
    }

    #[tokio::test]
    async fn failed_sync_never_reaches_check() {
        let api = ScriptedApi::new(
            Err(ApiError::Status { status: 502 }),
            account("620778743555"),
        );
        let (status, seen) = run(&api).await;
        assert_eq!(status.message, "✗ Connection error");
        assert_eq!(seen.len(), 2);
        assert_eq!(*api.calls.lock().unwrap(), ["sync"]);
    }

    #[tokio::test]
    async fn rejected_sync_is_not_authenticated() {
        let api = ScriptedApi::new(
            Ok(SyncResponse {
                success: false,
                count: None,
                error: Some("No AWS credentials found in terminal".into()),
            }),
            account("620778743555"),
        );
        let (status, _) = run(&api).await;
        assert_eq!(status.state, CredentialState::Disconnected);
        assert_eq!(status.message, "✗ Not authenticated");
        assert_eq!(*api.calls.lock().unwrap(), ["sync"]);
    }
}
