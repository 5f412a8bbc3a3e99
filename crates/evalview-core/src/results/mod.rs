//! Results Retrieval Pipeline: job id validation, retrieval, aggregation and
//! the sortable table view.

pub mod aggregate;
pub mod job;
pub mod model;
pub mod tier;
pub mod view;

pub use aggregate::{summarize, MetricAverage, ResultSummary};
pub use job::JobId;
pub use model::{Outcome, ResultSet, Score, TestCaseResult};
pub use tier::{format_average, format_percent, humanize_metric_name, ScoreTier};
pub use view::{
    ResultRow, ResultsView, ScoreCell, ScoreColumn, SortColumn, SortDirection, SortOrder,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::api::{DashboardApi, FetchResultsResponse};
use crate::session::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Operator-facing one-line status for the results panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl StatusLine {
    pub fn new(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(StatusKind::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(StatusKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(StatusKind::Error, message)
    }

    /// Info and success lines may be hidden after a few seconds.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, StatusKind::Info | StatusKind::Success)
    }
}

/// What the results area currently shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResultsPanel {
    #[default]
    Idle,
    /// The job exists but holds no result files.
    NoResults { job_id: JobId },
    /// Backend-reported failure; `searched_path` is a debugging aid only.
    Failed {
        error: String,
        searched_path: Option<String>,
    },
    Loaded(ResultsView),
}

/// Result of one retrieval round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Loaded { set: ResultSet, file_count: usize },
    Rejected {
        error: String,
        searched_path: Option<String>,
    },
    Network(String),
}

/// Issue one `fetch-results` request and classify the answer.
pub async fn fetch_results(
    api: &dyn DashboardApi,
    job_id: &JobId,
    session_id: Option<&SessionId>,
) -> FetchOutcome {
    match api.fetch_results(job_id, session_id).await {
        Ok(FetchResultsResponse::Found(payload)) => FetchOutcome::Loaded {
            set: ResultSet::new(job_id.clone(), payload.score_names, payload.results),
            file_count: payload.file_count,
        },
        Ok(FetchResultsResponse::Failed(failure)) => FetchOutcome::Rejected {
            error: failure.error,
            searched_path: failure.searched_path,
        },
        Err(err) => FetchOutcome::Network(err.to_string()),
    }
}

/// Current result set plus the panel derived from it.
#[derive(Debug, Default)]
pub struct ResultsState {
    current: Option<ResultSet>,
    panel: ResultsPanel,
    in_flight: usize,
}

impl ResultsState {
    pub fn current(&self) -> Option<&ResultSet> {
        self.current.as_ref()
    }

    pub fn current_job(&self) -> Option<&JobId> {
        self.current.as_ref().map(|s| &s.job_id)
    }

    pub fn panel(&self) -> &ResultsPanel {
        &self.panel
    }

    /// Fetches dispatched but not yet answered. Never blocks a new fetch.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn begin_fetch(&mut self, job_id: &JobId) -> StatusLine {
        self.in_flight += 1;
        info!(job_id = %job_id, in_flight = self.in_flight, "fetching results");
        StatusLine::info("Fetching results...")
    }

    /// Apply a completed fetch. The whole set is replaced in one step; a
    /// network failure leaves the panel as it was.
    pub fn apply(&mut self, job_id: &JobId, outcome: FetchOutcome) -> StatusLine {
        self.in_flight = self.in_flight.saturating_sub(1);
        match outcome {
            FetchOutcome::Loaded { set, file_count } => {
                info!(job_id = %job_id, results = set.len(), "results loaded");
                self.panel = if set.is_empty() {
                    ResultsPanel::NoResults {
                        job_id: job_id.clone(),
                    }
                } else {
                    ResultsPanel::Loaded(ResultsView::build(&set))
                };
                self.current = Some(set);
                StatusLine::success(format!("✓ Found {file_count} test case(s)"))
            }
            FetchOutcome::Rejected {
                error,
                searched_path,
            } => {
                warn!(job_id = %job_id, %error, "backend rejected results fetch");
                self.current = None;
                self.panel = ResultsPanel::Failed {
                    error: error.clone(),
                    searched_path,
                };
                StatusLine::error(error)
            }
            FetchOutcome::Network(detail) => {
                warn!(job_id = %job_id, %detail, "results fetch failed in transport");
                StatusLine::error(format!("Network error: {detail}"))
            }
        }
    }

    /// Reorder the displayed rows. No-op unless a table is shown.
    pub fn sort_by(&mut self, order: SortOrder) -> bool {
        match &mut self.panel {
            ResultsPanel::Loaded(view) => view.sort_by(order),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> JobId {
        JobId::parse("11111111-1111-1111-1111-111111111111").unwrap()
    }

    fn loaded(n: usize) -> FetchOutcome {
        let results = (0..n)
            .map(|i| TestCaseResult {
                filename: format!("{i}.jsonl"),
                test_case_id: format!("tc{i}"),
                result: Outcome::new("PASS"),
                scores: Default::default(),
            })
            .collect();
        FetchOutcome::Loaded {
            set: ResultSet::new(job(), vec![], results),
            file_count: n,
        }
    }

    #[test]
    fn success_replaces_panel_and_reports_count() {
        let mut state = ResultsState::default();
        state.begin_fetch(&job());
        let status = state.apply(&job(), loaded(2));
        assert_eq!(status.message, "✓ Found 2 test case(s)");
        assert!(status.is_transient());
        assert_eq!(state.in_flight(), 0);
        assert!(matches!(state.panel(), ResultsPanel::Loaded(v) if v.rows.len() == 2));
        assert_eq!(state.current_job(), Some(&job()));
    }

    #[test]
    fn empty_success_shows_no_results() {
        let mut state = ResultsState::default();
        state.apply(&job(), loaded(0));
        assert!(matches!(state.panel(), ResultsPanel::NoResults { .. }));
    }

    #[test]
    fn rejection_clears_current_set() {
        let mut state = ResultsState::default();
        state.apply(&job(), loaded(1));
        let status = state.apply(
            &job(),
            FetchOutcome::Rejected {
                error: "No results found for JOB_ID: x".into(),
                searched_path: Some("s3://bucket/x/".into()),
            },
        );
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.message, "No results found for JOB_ID: x");
        assert!(state.current().is_none());
        assert_eq!(
            state.panel(),
            &ResultsPanel::Failed {
                error: "No results found for JOB_ID: x".into(),
                searched_path: Some("s3://bucket/x/".into()),
            }
        );
    }

    #[test]
    fn network_error_keeps_previous_table() {
        let mut state = ResultsState::default();
        state.apply(&job(), loaded(1));
        let before = state.panel().clone();
        let status = state.apply(&job(), FetchOutcome::Network("connection refused".into()));
        assert_eq!(status.message, "Network error: connection refused");
        assert!(!status.is_transient());
        assert_eq!(state.panel(), &before);
        assert!(state.current().is_some());
    }

    #[test]
    fn sorting_without_table_is_refused() {
        let mut state = ResultsState::default();
        assert!(!state.sort_by(SortOrder {
            column: SortColumn::TestCase,
            direction: SortDirection::Ascending,
        }));
    }
}
