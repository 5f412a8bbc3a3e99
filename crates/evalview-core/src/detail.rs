//! Detail Drill-down Fetcher: the full stored record of one result file,
//! shown in a modal over the results table.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::{DashboardApi, DetailResponse};
use crate::error::ValidationError;
use crate::results::{format_percent, humanize_metric_name, JobId, Score, ScoreTier};
use crate::session::SessionId;

/// Contexts longer than this many characters are cut.
pub const CONTEXT_LIMIT: usize = 200;

const ELLIPSIS: &str = "...";

/// Cut `text` to `limit` characters and mark the cut with an ellipsis.
pub fn truncate_context(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailMetric {
    pub name: String,
    pub label: String,
    pub value: f64,
    pub text: String,
    pub tier: ScoreTier,
    /// Truncated context, or `-` when the score has none.
    pub context: String,
}

impl From<&Score> for DetailMetric {
    fn from(score: &Score) -> Self {
        Self {
            name: score.name.clone(),
            label: humanize_metric_name(&score.name),
            value: score.value,
            text: format_percent(score.value),
            tier: ScoreTier::classify(score.value),
            context: score
                .context
                .as_deref()
                .map(|c| truncate_context(c, CONTEXT_LIMIT))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub job_id: JobId,
    pub filename: String,
    pub title: String,
    pub metrics: Vec<DetailMetric>,
    /// The whole record, pretty-printed, for auditing.
    pub raw: String,
}

impl DetailView {
    pub fn build(job_id: &JobId, filename: &str, data: &serde_json::Value) -> Self {
        let metrics = data
            .get("scores")
            .and_then(|v| v.as_array())
            .map(|scores| {
                scores
                    .iter()
                    .filter_map(|s| match serde_json::from_value::<Score>(s.clone()) {
                        Ok(score) => Some(DetailMetric::from(&score)),
                        Err(err) => {
                            debug!(error = %err, "skipping malformed score entry");
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            job_id: job_id.clone(),
            filename: filename.to_string(),
            title: modal_title(filename),
            metrics,
            raw: serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string()),
        }
    }
}

fn modal_title(filename: &str) -> String {
    filename
        .strip_suffix(".jsonl")
        .unwrap_or(filename)
        .to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetailModal {
    #[default]
    Closed,
    Loading {
        job_id: JobId,
        filename: String,
        title: String,
    },
    Loaded(DetailView),
    Failed {
        job_id: JobId,
        filename: String,
        title: String,
        message: String,
    },
}

impl DetailModal {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Closed => None,
            Self::Loading { filename, .. } | Self::Failed { filename, .. } => Some(filename),
            Self::Loaded(view) => Some(&view.filename),
        }
    }

    /// The job whose table the modal was opened from.
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Self::Closed => None,
            Self::Loading { job_id, .. } | Self::Failed { job_id, .. } => Some(job_id),
            Self::Loaded(view) => Some(&view.job_id),
        }
    }
}

/// Keys the modal reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKey {
    Escape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailOutcome {
    Loaded(serde_json::Value),
    Rejected(String),
    Network(String),
}

pub async fn fetch_detail(
    api: &dyn DashboardApi,
    job_id: &JobId,
    filename: &str,
    session_id: Option<&SessionId>,
) -> DetailOutcome {
    match api.get_result_detail(job_id, filename, session_id).await {
        Ok(DetailResponse::Found(data)) => DetailOutcome::Loaded(data),
        Ok(DetailResponse::Failed { error }) => DetailOutcome::Rejected(error),
        Err(err) => DetailOutcome::Network(err.to_string()),
    }
}

/// Modal lifecycle. Content is never cached: closing drops it.
#[derive(Debug, Default)]
pub struct DetailState {
    modal: DetailModal,
}

impl DetailState {
    pub fn modal(&self) -> &DetailModal {
        &self.modal
    }

    /// Open the modal in its loading state for `filename` of the current job.
    pub fn open(
        &mut self,
        current_job: Option<&JobId>,
        filename: &str,
    ) -> Result<JobId, ValidationError> {
        let job_id = current_job.cloned().ok_or(ValidationError::NoCurrentJob)?;
        info!(job_id = %job_id, filename, "opening result detail");
        self.modal = DetailModal::Loading {
            job_id: job_id.clone(),
            filename: filename.to_string(),
            title: modal_title(filename),
        };
        Ok(job_id)
    }

    /// Apply a fetch result. Dropped unless the modal is still loading
    /// that same file of that same job.
    pub fn apply(&mut self, job_id: &JobId, filename: &str, outcome: DetailOutcome) -> bool {
        let waiting = matches!(
            &self.modal,
            DetailModal::Loading { job_id: j, filename: f, .. } if j == job_id && f == filename
        );
        if !waiting {
            debug!(job_id = %job_id, filename, "discarding stale detail response");
            return false;
        }

        self.modal = match outcome {
            DetailOutcome::Loaded(data) => {
                DetailModal::Loaded(DetailView::build(job_id, filename, &data))
            }
            DetailOutcome::Rejected(error) => {
                warn!(filename, %error, "backend rejected detail fetch");
                DetailModal::Failed {
                    job_id: job_id.clone(),
                    filename: filename.to_string(),
                    title: modal_title(filename),
                    message: format!("Failed to load details: {error}"),
                }
            }
            DetailOutcome::Network(detail) => {
                warn!(filename, %detail, "detail fetch failed in transport");
                DetailModal::Failed {
                    job_id: job_id.clone(),
                    filename: filename.to_string(),
                    title: modal_title(filename),
                    message: format!("Network error: {detail}"),
                }
            }
        };
        true
    }

    /// Close the modal if it belongs to a job other than `current_job`,
    /// i.e. the table it was opened from has been replaced or dropped.
    pub fn close_if_stale(&mut self, current_job: Option<&JobId>) -> bool {
        match self.modal.job_id() {
            Some(job_id) if Some(job_id) != current_job => {
                debug!(job_id = %job_id, "result set replaced under an open detail");
                self.close()
            }
            _ => false,
        }
    }

    /// Returns whether anything was open.
    pub fn close(&mut self) -> bool {
        let was_open = self.modal.is_open();
        self.modal = DetailModal::Closed;
        was_open
    }

    pub fn handle_key(&mut self, key: ModalKey) -> bool {
        match key {
            ModalKey::Escape => self.close(),
        }
    }
}
