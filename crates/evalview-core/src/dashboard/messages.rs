use serde::Serialize;

use crate::credentials::CredentialStatus;
use crate::detail::{DetailModal, DetailOutcome, ModalKey};
use crate::results::{FetchOutcome, JobId, ResultsPanel, SortOrder, StatusLine};
use crate::session::{SessionId, Viewport};

/// Operator actions dispatched into the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Keystroke(Vec<u8>),
    Resize(Viewport),
    RefreshCredentials,
    /// Raw job id text as typed; validated before anything is sent.
    RequestResults(String),
    /// Filename of one row of the current result set.
    RequestDetail(String),
    CloseDetail,
    Key(ModalKey),
    Sort(SortOrder),
}

/// Output of the dashboard for whatever presents it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ViewUpdate {
    SessionConnected(SessionId),
    SessionDisconnected { reason: Option<String> },
    /// Bytes for the terminal display, escape sequences intact.
    TerminalOutput(Vec<u8>),
    Credential(CredentialStatus),
    Status(StatusLine),
    Results(ResultsPanel),
    /// Result fetches dispatched and not yet answered.
    Busy(usize),
    Detail(DetailModal),
}

/// Network work finished on a spawned task, handed back to the loop.
#[derive(Debug)]
pub(crate) enum Completion {
    Credential(CredentialStatus),
    Results {
        job_id: JobId,
        outcome: FetchOutcome,
    },
    Detail {
        job_id: JobId,
        filename: String,
        outcome: DetailOutcome,
    },
}
